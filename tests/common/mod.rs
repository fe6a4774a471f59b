#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from keytracker for tests
pub use keytracker::{
    BoundingBox, Classification, Connectivity, DetectionError, KeyShape, LabelMap, Mask,
    MaskSource, MorphOp, Parameters, Region, Score,
};
