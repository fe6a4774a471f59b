use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::box_filter;
use imageproc::morphology::{dilate, erode};

use crate::error::{ensure_non_empty, DetectionError, Result};
use crate::models::{Mask, BACKGROUND, FOREGROUND};

/// Accept a decoded color image. RGBA drops its alpha; grayscale and
/// 16-bit/float layouts are rejected.
pub fn to_color(img: &DynamicImage) -> Result<RgbImage> {
    ensure_non_empty(img.width(), img.height())?;
    match img {
        DynamicImage::ImageRgb8(rgb) => Ok(rgb.clone()),
        DynamicImage::ImageRgba8(_) => Ok(img.to_rgb8()),
        other => Err(DetectionError::InvalidInput(format!(
            "expected an 8-bit RGB image, got {:?}",
            other.color()
        ))),
    }
}

/// Convert to HSV with every channel in `[0, 1]`; hue is a fraction of a full turn.
pub fn rgb_to_hsv(pixel: Rgb<u8>) -> [f32; 3] {
    let [r, g, b] = pixel.0.map(|c| c as f32 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let sector = if delta == 0.0 {
        0.0
    } else if max == r {
        ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };
    let hue = sector / 6.0;

    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    [hue, saturation, max]
}

/// Foreground wherever all three HSV channels sit inside the inclusive bounds.
pub fn threshold(image: &RgbImage, hsv_low: [f32; 3], hsv_high: [f32; 3]) -> Result<Mask> {
    ensure_non_empty(image.width(), image.height())?;

    let mask = GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let hsv = rgb_to_hsv(*image.get_pixel(x, y));
        let inside = (0..3).all(|c| hsv[c] >= hsv_low[c] && hsv[c] <= hsv_high[c]);
        Luma([if inside { FOREGROUND } else { BACKGROUND }])
    });

    Ok(mask)
}

/// Convert image to grayscale
pub fn to_grayscale(image: &RgbImage) -> GrayImage {
    image::imageops::grayscale(image)
}

/// Mask of the areas enclosed by edges: box blur, Canny (high = 3 * low),
/// thicken the edges, invert, then close small holes left along the borders.
pub fn edge_mask(image: &RgbImage, canny_threshold: f32, blur_radius: u32) -> Result<Mask> {
    ensure_non_empty(image.width(), image.height())?;

    let gray = to_grayscale(image);
    let blurred = if blur_radius > 0 {
        box_filter(&gray, blur_radius, blur_radius)
    } else {
        gray
    };
    let edges = canny(&blurred, canny_threshold, canny_threshold * 3.0);
    let thick = dilate(&edges, Norm::LInf, 2);

    let enclosed = GrayImage::from_fn(thick.width(), thick.height(), |x, y| {
        if thick.get_pixel(x, y)[0] == BACKGROUND {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    });

    let grown = dilate(&enclosed, Norm::LInf, 2);
    Ok(erode(&grown, Norm::LInf, 1))
}
