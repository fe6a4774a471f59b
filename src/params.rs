use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DetectionError, Result};

/// Largest kernel side accepted; morphology radii are carried as `u8`.
pub const MAX_KERNEL_SIZE: u32 = 511;

/// Pixel adjacency used by the labeler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Connectivity {
    Four,
    #[default]
    Eight,
}

impl TryFrom<u8> for Connectivity {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            4 => Ok(Connectivity::Four),
            8 => Ok(Connectivity::Eight),
            other => Err(format!("connectivity must be 4 or 8, got {}", other)),
        }
    }
}

impl From<Connectivity> for u8 {
    fn from(value: Connectivity) -> Self {
        match value {
            Connectivity::Four => 4,
            Connectivity::Eight => 8,
        }
    }
}

impl From<Connectivity> for imageproc::region_labelling::Connectivity {
    fn from(value: Connectivity) -> Self {
        match value {
            Connectivity::Four => imageproc::region_labelling::Connectivity::Four,
            Connectivity::Eight => imageproc::region_labelling::Connectivity::Eight,
        }
    }
}

impl FromStr for Connectivity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let value: u8 = s
            .parse()
            .map_err(|_| format!("connectivity must be 4 or 8, got '{}'", s))?;
        Connectivity::try_from(value)
    }
}

/// Which detection variant to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyShape {
    /// Round knobs, accepted by circularity.
    #[default]
    Round,
    /// Rectangular keycaps, two-pass aspect-ratio filtering.
    Rect,
}

impl FromStr for KeyShape {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "round" => Ok(KeyShape::Round),
            "rect" => Ok(KeyShape::Rect),
            other => Err(format!("unknown key shape '{}', expected round or rect", other)),
        }
    }
}

impl fmt::Display for KeyShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyShape::Round => write!(f, "round"),
            KeyShape::Rect => write!(f, "rect"),
        }
    }
}

/// One square-kernel morphology step; the value is the kernel side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MorphOp {
    Erode(u32),
    Dilate(u32),
}

impl MorphOp {
    pub fn kernel(self) -> u32 {
        match self {
            MorphOp::Erode(k) | MorphOp::Dilate(k) => k,
        }
    }
}

/// Where the first foreground mask comes from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskSource {
    /// HSV range threshold followed by the mask refiner.
    #[default]
    Color,
    /// Areas enclosed by Canny edges of the box-blurred grayscale image.
    Edges { canny_threshold: f32, blur_radius: u32 },
}

/// Kernel sizes for the close/open/blur refinement sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefineKernels {
    pub close: u32,
    pub open: u32,
    pub blur: u32,
}

impl Default for RefineKernels {
    fn default() -> Self {
        Self {
            close: 21,
            open: 11,
            blur: 15,
        }
    }
}

/// Everything one detection run needs. Build it, validate it, pass it by reference.
///
/// The defaults were tuned on a single photo of a keyboard with yellow-ish caps;
/// treat them as a starting point for tuning, not as meaningful constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    pub shape: KeyShape,
    pub mask_source: MaskSource,
    /// Inclusive lower HSV bound, each channel a fraction of its maximum.
    pub hsv_low: [f32; 3],
    /// Inclusive upper HSV bound.
    pub hsv_high: [f32; 3],
    pub close_kernel: u32,
    pub open_kernel: u32,
    pub blur_kernel: u32,
    /// Morphology applied after rejected regions are subtracted (rect keys only).
    pub cleanup: Vec<MorphOp>,
    pub aspect_ratio_threshold: f32,
    pub iou_threshold: f32,
    pub connectivity: Connectivity,
}

impl Default for Parameters {
    fn default() -> Self {
        let kernels = RefineKernels::default();
        Self {
            shape: KeyShape::Round,
            mask_source: MaskSource::Color,
            hsv_low: [0.11, 0.60, 0.20],
            hsv_high: [0.14, 1.0, 1.0],
            close_kernel: kernels.close,
            open_kernel: kernels.open,
            blur_kernel: kernels.blur,
            cleanup: vec![MorphOp::Erode(5), MorphOp::Dilate(13)],
            aspect_ratio_threshold: 2.0,
            iou_threshold: 0.8,
            connectivity: Connectivity::Eight,
        }
    }
}

impl Parameters {
    /// Edge-driven rectangular key detection, with the cleanup sequence the
    /// edge masks were tuned against.
    pub fn edge_preset() -> Self {
        Self {
            shape: KeyShape::Rect,
            mask_source: MaskSource::Edges {
                canny_threshold: 30.0,
                blur_radius: 1,
            },
            cleanup: vec![
                MorphOp::Erode(3),
                MorphOp::Dilate(5),
                MorphOp::Erode(5),
                MorphOp::Dilate(3),
            ],
            ..Self::default()
        }
    }

    /// Parse a JSON parameter document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Parameters = serde_json::from_str(json)
            .map_err(|e| DetectionError::config("parameters", e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn refine_kernels(&self) -> RefineKernels {
        RefineKernels {
            close: self.close_kernel,
            open: self.open_kernel,
            blur: self.blur_kernel,
        }
    }

    /// Check every field; the first offending one is reported.
    pub fn validate(&self) -> Result<()> {
        const CHANNELS: [&str; 3] = ["hue", "saturation", "value"];

        for (i, channel) in CHANNELS.iter().enumerate() {
            let (low, high) = (self.hsv_low[i], self.hsv_high[i]);
            if !(0.0..=1.0).contains(&low) {
                return Err(DetectionError::config(
                    "hsv_low",
                    format!("{} bound {} is outside [0, 1]", channel, low),
                ));
            }
            if !(0.0..=1.0).contains(&high) {
                return Err(DetectionError::config(
                    "hsv_high",
                    format!("{} bound {} is outside [0, 1]", channel, high),
                ));
            }
            if low > high {
                return Err(DetectionError::config(
                    "hsv_low",
                    format!("{} lower bound {} exceeds upper bound {}", channel, low, high),
                ));
            }
        }

        check_kernel("close_kernel", self.close_kernel)?;
        check_kernel("open_kernel", self.open_kernel)?;
        check_kernel("blur_kernel", self.blur_kernel)?;
        for op in &self.cleanup {
            check_kernel("cleanup", op.kernel())?;
        }

        if !self.aspect_ratio_threshold.is_finite() || self.aspect_ratio_threshold <= 0.0 {
            return Err(DetectionError::config(
                "aspect_ratio_threshold",
                format!("must be a finite value > 0, got {}", self.aspect_ratio_threshold),
            ));
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(DetectionError::config(
                "iou_threshold",
                format!("must be within [0, 1], got {}", self.iou_threshold),
            ));
        }

        if let MaskSource::Edges {
            canny_threshold, ..
        } = self.mask_source
        {
            if !canny_threshold.is_finite() || canny_threshold <= 0.0 {
                return Err(DetectionError::config(
                    "mask_source",
                    format!("canny threshold must be > 0, got {}", canny_threshold),
                ));
            }
        }

        Ok(())
    }
}

/// Kernel sides must be odd, positive and small enough for a `u8` radius.
pub(crate) fn check_kernel(field: &'static str, size: u32) -> Result<()> {
    if size == 0 || size % 2 == 0 {
        return Err(DetectionError::config(
            field,
            format!("kernel size must be an odd positive integer, got {}", size),
        ));
    }
    if size > MAX_KERNEL_SIZE {
        return Err(DetectionError::config(
            field,
            format!("kernel size {} exceeds {}", size, MAX_KERNEL_SIZE),
        ));
    }
    Ok(())
}

/// Radius of a validated square kernel.
pub(crate) fn kernel_radius(size: u32) -> u8 {
    ((size.saturating_sub(1)) / 2).min(u8::MAX as u32) as u8
}
