use image::{GrayImage, Luma, Rgb, RgbImage};

/// Hue 45 degrees, fully saturated: inside the default HSV band.
pub const KEY_YELLOW: Rgb<u8> = Rgb([255, 191, 0]);
/// Too dark for the default value bound.
pub const DARK_BACKGROUND: Rgb<u8> = Rgb([20, 20, 30]);
pub const KEY_BLUE: Rgb<u8> = Rgb([30, 60, 220]);
pub const LIGHT_KEY: Rgb<u8> = Rgb([230, 230, 230]);

pub fn blank_mask(width: u32, height: u32) -> GrayImage {
    GrayImage::new(width, height)
}

/// Fill every pixel with `dx^2 + dy^2 <= r^2`, the same rule the classifier rasterizes with.
pub fn paint_disk(mask: &mut GrayImage, cx: u32, cy: u32, r: u32) {
    let r2 = (r * r) as i64;
    for (x, y, p) in mask.enumerate_pixels_mut() {
        let dx = x as i64 - cx as i64;
        let dy = y as i64 - cy as i64;
        if dx * dx + dy * dy <= r2 {
            *p = Luma([255]);
        }
    }
}

/// Fill a `width` x `height` rectangle whose top-left corner is `(x, y)`.
pub fn paint_rect(mask: &mut GrayImage, x: u32, y: u32, width: u32, height: u32) {
    for py in y..y + height {
        for px in x..x + width {
            mask.put_pixel(px, py, Luma([255]));
        }
    }
}

pub fn disk_mask(width: u32, height: u32, cx: u32, cy: u32, r: u32) -> GrayImage {
    let mut mask = blank_mask(width, height);
    paint_disk(&mut mask, cx, cy, r);
    mask
}

/// Deterministic speckle pattern; roughly `density` of the pixels are set.
pub fn speckle_mask(width: u32, height: u32, seed: u64, density: f64) -> GrayImage {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    GrayImage::from_fn(width, height, |_, _| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let sample = (state >> 33) as f64 / (1u64 << 31) as f64;
        Luma([if sample < density { 255 } else { 0 }])
    })
}

pub fn solid_image(width: u32, height: u32, color: Rgb<u8>) -> RgbImage {
    RgbImage::from_pixel(width, height, color)
}

pub fn paint_color_disk(image: &mut RgbImage, cx: u32, cy: u32, r: u32, color: Rgb<u8>) {
    let r2 = (r * r) as i64;
    for (x, y, p) in image.enumerate_pixels_mut() {
        let dx = x as i64 - cx as i64;
        let dy = y as i64 - cy as i64;
        if dx * dx + dy * dy <= r2 {
            *p = color;
        }
    }
}

pub fn paint_color_rect(image: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
    for py in y..y + height {
        for px in x..x + width {
            image.put_pixel(px, py, color);
        }
    }
}

/// A yellow knob of radius 20 at (60, 60) on a dark 120x120 board.
pub fn yellow_knob_image() -> RgbImage {
    let mut image = solid_image(120, 120, DARK_BACKGROUND);
    paint_color_disk(&mut image, 60, 60, 20, KEY_YELLOW);
    image
}

pub fn round_params() -> keytracker::Parameters {
    keytracker::Parameters {
        shape: keytracker::KeyShape::Round,
        ..Default::default()
    }
}

pub fn rect_params() -> keytracker::Parameters {
    keytracker::Parameters {
        shape: keytracker::KeyShape::Rect,
        ..Default::default()
    }
}
