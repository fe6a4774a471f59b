use crate::detection::labeling::regions;
use crate::models::{BoundingBox, Classification, LabelMap};

/// Boxes of the accepted regions, in ascending label order.
/// Verdicts for labels the map does not contain are ignored.
pub fn aggregate(labels: &LabelMap, classifications: &[Classification]) -> Vec<BoundingBox> {
    let mut accepted = vec![false; labels.count() as usize + 1];
    for c in classifications {
        if let Some(slot) = accepted.get_mut(c.label as usize) {
            *slot = c.accepted && c.label != 0;
        }
    }

    regions(labels)
        .into_iter()
        .filter(|r| accepted[r.label as usize])
        .map(|r| r.bbox)
        .collect()
}
