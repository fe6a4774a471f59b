pub mod aggregate;
pub mod classify;
pub mod labeling;
pub mod morphology;
pub mod preprocessing;

use image::{DynamicImage, RgbImage};
use tracing::{debug, info};

use crate::error::{ensure_non_empty, Result};
use crate::models::{BoundingBox, Classification, LabelMap, Mask};
use crate::params::{KeyShape, MaskSource, Parameters};

pub use aggregate::aggregate;
pub use classify::{circularity, mask_overlap, Overlap};
pub use labeling::{label, regions};
pub use morphology::{apply_ops, refine, subtract};
pub use preprocessing::{edge_mask, threshold};

/// Label / classify rounds of the rectangular variant: one pass that strips
/// elongated regions, one pass over what is left after cleanup.
pub const REFINE_PASSES: usize = 2;

/// Result of one detection run.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Accepted boxes, ascending by label.
    pub boxes: Vec<BoundingBox>,
    /// Raw stage 1 output: the HSV threshold, or the edge mask. Equal to
    /// `source_mask` when detection starts from a prepared mask.
    pub threshold_mask: Mask,
    /// Mask handed to the labeler on the first pass.
    pub source_mask: Mask,
    /// Mask behind `labels`; differs from `source_mask` after the rect cleanup.
    pub mask: Mask,
    pub labels: LabelMap,
}

/// Run the whole pipeline on a decoded color image.
pub fn detect(image: &DynamicImage, params: &Parameters) -> Result<Detection> {
    params.validate()?;
    let rgb = preprocessing::to_color(image)?;
    detect_rgb(&rgb, params)
}

pub fn detect_rgb(image: &RgbImage, params: &Parameters) -> Result<Detection> {
    params.validate()?;
    let (raw, mask) = stage_masks(image, params)?;
    let mut detection = detect_in_mask(&mask, params)?;
    detection.threshold_mask = raw;
    Ok(detection)
}

/// Stages 1 and 2: the binary mask the labeler starts from.
pub fn source_mask(image: &RgbImage, params: &Parameters) -> Result<Mask> {
    stage_masks(image, params).map(|(_, refined)| refined)
}

/// Raw stage 1 mask and the refined mask built from it.
fn stage_masks(image: &RgbImage, params: &Parameters) -> Result<(Mask, Mask)> {
    match params.mask_source {
        MaskSource::Color => {
            let raw = threshold(image, params.hsv_low, params.hsv_high)?;
            debug!(
                foreground = morphology::count_foreground(&raw),
                "thresholded image"
            );
            let refined = refine(&raw, params.refine_kernels())?;
            Ok((raw, refined))
        }
        MaskSource::Edges {
            canny_threshold,
            blur_radius,
        } => {
            let edges = edge_mask(image, canny_threshold, blur_radius)?;
            Ok((edges.clone(), edges))
        }
    }
}

/// Stages 3 to 5 on an already prepared mask.
pub fn detect_in_mask(mask: &Mask, params: &Parameters) -> Result<Detection> {
    params.validate()?;
    ensure_non_empty(mask.width(), mask.height())?;

    let (final_mask, labels, verdicts) = match params.shape {
        KeyShape::Round => {
            let labels = label(mask, params.connectivity);
            let found = regions(&labels);
            let verdicts = classify::classify_circles(&labels, &found, params.iou_threshold);
            (mask.clone(), labels, verdicts)
        }
        KeyShape::Rect => rect_passes(mask, params)?,
    };

    let boxes = aggregate(&labels, &verdicts);
    info!(
        shape = %params.shape,
        components = labels.count(),
        accepted = boxes.len(),
        "detection finished"
    );

    Ok(Detection {
        boxes,
        threshold_mask: mask.clone(),
        source_mask: mask.clone(),
        mask: final_mask,
        labels,
    })
}

/// Aspect-ratio filtering over [`REFINE_PASSES`] rounds. Every round but the
/// last subtracts its rejected regions and runs the cleanup morphology before
/// the mask is labeled again.
fn rect_passes(mask: &Mask, params: &Parameters) -> Result<(Mask, LabelMap, Vec<Classification>)> {
    let mut current = mask.clone();
    let mut labels = label(&current, params.connectivity);
    let mut verdicts =
        classify::filter_aspect_ratio(&regions(&labels), params.aspect_ratio_threshold);

    for pass in 1..REFINE_PASSES {
        let rejected: Vec<u32> = verdicts
            .iter()
            .filter(|c| !c.accepted)
            .map(|c| c.label)
            .collect();
        debug!(
            pass,
            rejected = rejected.len(),
            kept = verdicts.len() - rejected.len(),
            "removing elongated regions"
        );

        let stripped = subtract(&current, &labels, &rejected)?;
        current = apply_ops(&stripped, &params.cleanup)?;
        labels = label(&current, params.connectivity);
        verdicts = classify::filter_aspect_ratio(&regions(&labels), params.aspect_ratio_threshold);
    }

    Ok((current, labels, verdicts))
}
