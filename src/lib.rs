pub mod detection;
pub mod error;
pub mod models;
pub mod params;
pub mod pipeline;
pub mod render;

pub use detection::{detect, detect_in_mask, Detection, REFINE_PASSES};
pub use error::{DetectionError, Result};
pub use models::{BoundingBox, Classification, LabelMap, Mask, Region, Score};
pub use params::{Connectivity, KeyShape, MaskSource, MorphOp, Parameters, RefineKernels};
pub use pipeline::{DebugConfig, Pipeline};
