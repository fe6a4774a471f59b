use image::{GrayImage, Luma};
use tracing::trace;

use crate::error::{DetectionError, Result};
use crate::models::{Classification, LabelMap, Mask, Region, Score, BACKGROUND, FOREGROUND};

/// Pixel counts of `a AND b` and `a OR b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    pub intersection: u64,
    pub union: u64,
}

impl Overlap {
    /// Intersection over union; 0 when both masks are empty.
    pub fn iou(&self) -> f32 {
        if self.union == 0 {
            return 0.0;
        }
        self.intersection as f32 / self.union as f32
    }
}

/// Compare two equally sized masks pixel by pixel.
pub fn mask_overlap(a: &Mask, b: &Mask) -> Result<Overlap> {
    if a.dimensions() != b.dimensions() {
        return Err(DetectionError::InvalidInput(format!(
            "cannot overlap masks of size {:?} and {:?}",
            a.dimensions(),
            b.dimensions()
        )));
    }
    Ok(count_overlap(a, b))
}

fn count_overlap(a: &Mask, b: &Mask) -> Overlap {
    let mut overlap = Overlap {
        intersection: 0,
        union: 0,
    };
    for (pa, pb) in a.pixels().zip(b.pixels()) {
        let (in_a, in_b) = (pa[0] != BACKGROUND, pb[0] != BACKGROUND);
        overlap.intersection += (in_a && in_b) as u64;
        overlap.union += (in_a || in_b) as u64;
    }
    overlap
}

/// Reject regions whose box is more than `threshold` times taller than wide.
pub fn aspect_ratio(region: &Region, threshold: f32) -> Classification {
    let ratio = region.aspect_ratio();
    Classification {
        label: region.label,
        accepted: ratio <= threshold,
        score: Score::AspectRatio(ratio),
    }
}

pub fn filter_aspect_ratio(regions: &[Region], threshold: f32) -> Vec<Classification> {
    regions
        .iter()
        .map(|r| {
            let verdict = aspect_ratio(r, threshold);
            trace!(
                label = r.label,
                ratio = verdict.score.value(),
                accepted = verdict.accepted,
                "aspect ratio"
            );
            verdict
        })
        .collect()
}

/// The region's own pixels and its inscribed circle, rasterized into one
/// window covering both (clipped to the label map).
pub fn circle_window(labels: &LabelMap, region: &Region) -> (Mask, Mask) {
    let (cx, cy) = region.center();
    let r = region.radius();
    let bbox = region.bbox;

    let x0 = bbox.min_x.min(cx.saturating_sub(r));
    let y0 = bbox.min_y.min(cy.saturating_sub(r));
    let x1 = bbox.max_x.max((cx + r).min(labels.width() - 1));
    let y1 = bbox.max_y.max((cy + r).min(labels.height() - 1));
    let (w, h) = (x1 - x0 + 1, y1 - y0 + 1);

    let region_mask = GrayImage::from_fn(w, h, |x, y| {
        if labels.get(x0 + x, y0 + y) == region.label {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    });

    let r2 = (r as i64) * (r as i64);
    let circle_mask = GrayImage::from_fn(w, h, |x, y| {
        let dx = (x0 + x) as i64 - cx as i64;
        let dy = (y0 + y) as i64 - cy as i64;
        if dx * dx + dy * dy <= r2 {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    });

    (region_mask, circle_mask)
}

/// Score how closely a region fills the circle inscribed in its box height.
/// Round caps land near 1.0; bars and irregular blobs fall well below.
pub fn circularity(labels: &LabelMap, region: &Region, iou_threshold: f32) -> Classification {
    if region.pixel_count == 0 {
        return Classification {
            label: region.label,
            accepted: false,
            score: Score::Iou(0.0),
        };
    }

    let (region_mask, circle_mask) = circle_window(labels, region);
    let iou = count_overlap(&circle_mask, &region_mask).iou();

    trace!(
        label = region.label,
        radius = region.radius(),
        iou,
        "circularity"
    );

    Classification {
        label: region.label,
        accepted: iou >= iou_threshold,
        score: Score::Iou(iou),
    }
}

pub fn classify_circles(
    labels: &LabelMap,
    regions: &[Region],
    iou_threshold: f32,
) -> Vec<Classification> {
    regions
        .iter()
        .map(|r| circularity(labels, r, iou_threshold))
        .collect()
}
