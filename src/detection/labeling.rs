use image::{ImageBuffer, Luma};
use imageproc::region_labelling::connected_components;
use tracing::debug;

use crate::detection::morphology::binarize;
use crate::models::{BoundingBox, LabelMap, Mask, Region, BACKGROUND};
use crate::params::Connectivity;

/// Label connected foreground components. Every non-zero pixel is
/// foreground, whatever its value.
///
/// Labels are renumbered so that component `n` is the `n`-th one met in a
/// raster scan; the result depends only on the mask and the connectivity.
pub fn label(mask: &Mask, connectivity: Connectivity) -> LabelMap {
    let binary = binarize(mask);
    let raw = connected_components(&binary, connectivity.into(), Luma([BACKGROUND]));

    let max_raw = raw.pixels().map(|p| p[0]).max().unwrap_or(0);
    let mut remap = vec![0u32; max_raw as usize + 1];
    let mut count = 0u32;

    let labels = ImageBuffer::from_fn(raw.width(), raw.height(), |x, y| {
        let value = raw.get_pixel(x, y)[0];
        if value == 0 {
            return Luma([0u32]);
        }
        let slot = &mut remap[value as usize];
        if *slot == 0 {
            count += 1;
            *slot = count;
        }
        Luma([*slot])
    });

    debug!(components = count, ?connectivity, "labeled mask");

    LabelMap::new(labels, count)
}

/// Bounding box and pixel count of every component, in ascending label order.
pub fn regions(labels: &LabelMap) -> Vec<Region> {
    let mut acc: Vec<Option<Region>> = vec![None; labels.count() as usize];

    for (x, y, label) in labels.iter() {
        if label == 0 {
            continue;
        }

        let entry = &mut acc[label as usize - 1];
        match entry {
            Some(region) => {
                region.bbox.include(x, y);
                region.pixel_count += 1;
            }
            None => {
                *entry = Some(Region {
                    label,
                    bbox: BoundingBox::new(x, y, x, y),
                    pixel_count: 1,
                });
            }
        }
    }

    acc.into_iter().flatten().collect()
}
