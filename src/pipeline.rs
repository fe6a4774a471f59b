use std::path::{Path, PathBuf};

use anyhow::Result;
use image::DynamicImage;
use tracing::debug;

use crate::detection::{self, Detection};
use crate::params::Parameters;
use crate::render;

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
    /// Whether debug mode is enabled
    pub enabled: bool,
}

impl DebugConfig {
    /// Save one stage image as `NN_stage_name/01.png`.
    fn save(&self, index: usize, stage: &str, image: &DynamicImage) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let step_dir_name = format!("{:02}_{}", index, stage.to_lowercase().replace(' ', "_"));
        let step_dir = self.output_dir.join(&step_dir_name);
        std::fs::create_dir_all(&step_dir)?;

        let output_path = step_dir.join("01.png");
        image
            .save(&output_path)
            .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;

        debug!(path = %output_path.display(), "saved debug image");
        Ok(())
    }
}

/// Shell around the detection core: holds the parameters for a run and,
/// optionally, dumps every intermediate image to disk.
pub struct Pipeline {
    params: Parameters,
    debug: Option<DebugConfig>,
}

impl Pipeline {
    /// Validate `params` up front so a bad configuration never reaches a stage.
    pub fn new(params: Parameters) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            debug: None,
        })
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.debug = Some(DebugConfig {
            output_dir,
            enabled: true,
        });

        Ok(self)
    }

    pub fn debug_dir(&self) -> Option<&Path> {
        self.debug.as_ref().map(|d| d.output_dir.as_path())
    }

    /// Run detection once on `input`.
    pub fn run(&self, input: &DynamicImage) -> Result<Detection> {
        let detection = detection::detect(input, &self.params)?;

        if let Some(debug_config) = &self.debug {
            let overlay = render::draw_boxes(&input.to_rgb8(), &detection.boxes, render::BOX_COLOR);
            let stages = [
                ("input", input.clone()),
                (
                    "threshold mask",
                    DynamicImage::ImageLuma8(detection.threshold_mask.clone()),
                ),
                ("source mask", DynamicImage::ImageLuma8(detection.source_mask.clone())),
                ("final mask", DynamicImage::ImageLuma8(detection.mask.clone())),
                (
                    "labels",
                    DynamicImage::ImageLuma8(render::label_visualization(&detection.labels)),
                ),
                ("overlay", DynamicImage::ImageRgb8(overlay)),
            ];
            for (index, (stage, image)) in stages.iter().enumerate() {
                debug_config.save(index, stage, image)?;
            }
        }

        Ok(detection)
    }
}
