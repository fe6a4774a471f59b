use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::{close, dilate, erode, open};
use tracing::debug;

use crate::error::{DetectionError, Result};
use crate::models::{LabelMap, Mask, BACKGROUND, FOREGROUND};
use crate::params::{check_kernel, kernel_radius, MorphOp, RefineKernels};

/// Close, open, then smooth. Closing first bridges gaps inside a key before
/// opening strips specks that closing would otherwise weld onto real regions.
pub fn refine(mask: &Mask, kernels: RefineKernels) -> Result<Mask> {
    check_kernel("close_kernel", kernels.close)?;
    check_kernel("open_kernel", kernels.open)?;
    check_kernel("blur_kernel", kernels.blur)?;

    let closed = close(mask, Norm::LInf, kernel_radius(kernels.close));
    let opened = open(&closed, Norm::LInf, kernel_radius(kernels.open));
    let smoothed = smooth(&opened, kernels.blur);

    debug!(
        close = kernels.close,
        open = kernels.open,
        blur = kernels.blur,
        foreground = count_foreground(&smoothed),
        "refined mask"
    );

    Ok(smoothed)
}

/// Gaussian blur with the sigma OpenCV picks for a `size` x `size` kernel,
/// then any pixel the blur touched counts as foreground again.
fn smooth(mask: &Mask, size: u32) -> Mask {
    if size <= 1 {
        return mask.clone();
    }
    let blurred = gaussian_blur_f32(mask, blur_sigma(size));
    binarize(&blurred)
}

fn blur_sigma(size: u32) -> f32 {
    0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Any non-zero pixel becomes `FOREGROUND`.
pub(crate) fn binarize(image: &GrayImage) -> Mask {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y)[0] != BACKGROUND {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Apply a sequence of square-kernel erosions and dilations in order.
pub fn apply_ops(mask: &Mask, ops: &[MorphOp]) -> Result<Mask> {
    for op in ops {
        check_kernel("cleanup", op.kernel())?;
    }

    let mut current = mask.clone();
    for op in ops {
        current = match *op {
            MorphOp::Erode(k) => erode(&current, Norm::LInf, kernel_radius(k)),
            MorphOp::Dilate(k) => dilate(&current, Norm::LInf, kernel_radius(k)),
        };
    }
    Ok(current)
}

/// Clear every pixel whose label is listed in `rejected`.
pub fn subtract(mask: &Mask, labels: &LabelMap, rejected: &[u32]) -> Result<Mask> {
    if mask.dimensions() != labels.dimensions() {
        return Err(DetectionError::InvalidInput(format!(
            "mask is {:?} but label map is {:?}",
            mask.dimensions(),
            labels.dimensions()
        )));
    }

    let mut cleared = vec![false; labels.count() as usize + 1];
    for &label in rejected {
        if let Some(slot) = cleared.get_mut(label as usize) {
            *slot = label != 0;
        }
    }

    Ok(GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        if cleared[labels.get(x, y) as usize] {
            Luma([BACKGROUND])
        } else {
            *mask.get_pixel(x, y)
        }
    }))
}

pub fn count_foreground(mask: &Mask) -> usize {
    mask.pixels().filter(|p| p[0] != BACKGROUND).count()
}
