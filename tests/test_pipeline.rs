mod common;

use common::*;
use image::{DynamicImage, Luma, Rgb};
use keytracker::detection::label;
use keytracker::{render, Pipeline};

#[test]
fn pipeline_rejects_invalid_parameters() {
    let params = Parameters {
        open_kernel: 2,
        ..Default::default()
    };
    assert!(Pipeline::new(params).is_err());
}

#[test]
fn pipeline_matches_direct_detection() -> anyhow::Result<()> {
    let image = DynamicImage::ImageRgb8(yellow_knob_image());
    let pipeline = Pipeline::new(round_params())?;

    let detection = pipeline.run(&image)?;
    assert_eq!(detection, keytracker::detect(&image, &round_params())?);
    assert!(pipeline.debug_dir().is_none());

    Ok(())
}

#[test]
fn debug_mode_saves_every_stage() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let debug_dir = dir.path().join("debug");

    let pipeline = Pipeline::new(round_params())?.with_debug(debug_dir.clone())?;
    let detection = pipeline.run(&DynamicImage::ImageRgb8(yellow_knob_image()))?;
    assert_eq!(detection.boxes.len(), 1);

    let stages = [
        "00_input",
        "01_threshold_mask",
        "02_source_mask",
        "03_final_mask",
        "04_labels",
        "05_overlay",
    ];
    for stage in stages {
        let path = debug_dir.join(stage).join("01.png");
        assert!(path.exists(), "missing {}", path.display());
    }

    let overlay = image::open(debug_dir.join("05_overlay").join("01.png"))?.to_rgb8();
    let bbox = detection.boxes[0];
    assert_eq!(*overlay.get_pixel(bbox.min_x, bbox.min_y), render::BOX_COLOR);

    Ok(())
}

#[test]
fn debug_dir_must_be_empty() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("leftover.txt"), "x")?;

    let result = Pipeline::new(Parameters::default())?.with_debug(dir.path().to_path_buf());
    assert!(result.is_err());

    Ok(())
}

#[test]
fn boxes_are_outlined_not_filled() {
    let image = solid_image(30, 30, Rgb([0, 0, 0]));
    let boxes = [BoundingBox::new(5, 5, 14, 19)];

    let canvas = render::draw_boxes(&image, &boxes, render::BOX_COLOR);

    assert_eq!(*canvas.get_pixel(5, 5), render::BOX_COLOR);
    assert_eq!(*canvas.get_pixel(14, 19), render::BOX_COLOR);
    assert_eq!(*canvas.get_pixel(10, 12), Rgb([0, 0, 0]));
    assert_eq!(*canvas.get_pixel(15, 20), Rgb([0, 0, 0]));
    assert_eq!(*image.get_pixel(5, 5), Rgb([0, 0, 0]));
}

#[test]
fn label_visualization_spreads_labels() {
    let mut mask = blank_mask(20, 10);
    mask.put_pixel(1, 1, Luma([255]));
    mask.put_pixel(10, 5, Luma([255]));
    let labels = label(&mask, Connectivity::Eight);

    let view = render::label_visualization(&labels);
    assert_eq!(view.get_pixel(0, 0)[0], 0);
    assert_eq!(view.get_pixel(1, 1)[0], 127);
    assert_eq!(view.get_pixel(10, 5)[0], 255);

    let empty = render::label_visualization(&label(&blank_mask(4, 4), Connectivity::Four));
    assert!(empty.pixels().all(|p| p[0] == 0));
}
