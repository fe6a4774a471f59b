mod common;

use common::*;
use image::DynamicImage;
use keytracker::detection::{classify, label, regions};
use keytracker::{detect, detect_in_mask};

#[test]
fn single_disk_is_one_accepted_round_key() {
    let mask = disk_mask(100, 100, 50, 50, 10);

    let labels = label(&mask, Connectivity::Eight);
    assert_eq!(labels.count(), 1);

    let found = regions(&labels);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].bbox, BoundingBox::new(40, 40, 60, 60));
    assert_eq!(found[0].radius(), 10);

    let verdict = classify::circularity(&labels, &found[0], 0.8);
    assert!(verdict.accepted);
    match verdict.score {
        Score::Iou(iou) => assert!(iou >= 0.95, "iou was {}", iou),
        other => panic!("unexpected score {:?}", other),
    }

    let detection = detect_in_mask(&mask, &round_params()).unwrap();
    assert_eq!(detection.boxes, vec![BoundingBox::new(40, 40, 60, 60)]);
}

#[test]
fn tall_bar_is_stripped_before_final_labeling() {
    let mut mask = blank_mask(100, 100);
    paint_rect(&mut mask, 20, 30, 5, 40);

    let labels = label(&mask, Connectivity::Eight);
    let found = regions(&labels);
    assert_eq!(found.len(), 1);

    let verdict = classify::aspect_ratio(&found[0], 2.0);
    assert!(!verdict.accepted);
    assert_eq!(verdict.score, Score::AspectRatio(8.0));

    let detection = detect_in_mask(&mask, &rect_params()).unwrap();
    assert!(detection.boxes.is_empty());
    assert_eq!(detection.labels.count(), 0);
    assert!(detection.mask.pixels().all(|p| p[0] == 0));
}

#[test]
fn square_key_survives_next_to_stripped_bar() {
    let mut mask = blank_mask(100, 100);
    paint_rect(&mut mask, 20, 30, 5, 40);
    paint_rect(&mut mask, 60, 60, 20, 20);

    let detection = detect_in_mask(&mask, &rect_params()).unwrap();

    // erode 5x5 then dilate 13x13 grows the 20px square by 4px per side
    assert_eq!(detection.labels.count(), 1);
    assert_eq!(detection.boxes, vec![BoundingBox::new(56, 56, 83, 83)]);
    assert_eq!(detection.source_mask, mask);
}

#[test]
fn two_disjoint_disks_are_two_accepted_keys() {
    let mut mask = blank_mask(100, 100);
    paint_disk(&mut mask, 20, 20, 8);
    paint_disk(&mut mask, 80, 80, 8);

    let labels = label(&mask, Connectivity::Eight);
    assert_eq!(labels.count(), 2);

    let detection = detect_in_mask(&mask, &round_params()).unwrap();
    assert_eq!(detection.boxes.len(), 2);
    assert_eq!(detection.boxes[0], BoundingBox::new(12, 12, 28, 28));
    assert_eq!(detection.boxes[1], BoundingBox::new(72, 72, 88, 88));
    assert!(!detection.boxes[0].overlaps(&detection.boxes[1]));
}

#[test]
fn bar_is_not_round() {
    let mut mask = blank_mask(100, 100);
    paint_rect(&mut mask, 10, 45, 60, 8);

    let detection = detect_in_mask(&mask, &round_params()).unwrap();
    assert_eq!(detection.labels.count(), 1);
    assert!(detection.boxes.is_empty());
}

#[test]
fn yellow_knob_is_found_in_color_image() {
    let image = DynamicImage::ImageRgb8(yellow_knob_image());

    let detection = detect(&image, &round_params()).unwrap();

    assert_eq!(detection.boxes.len(), 1);
    let bbox = detection.boxes[0];
    let (cx, cy) = bbox.center();
    assert!(cx.abs_diff(60) <= 2 && cy.abs_diff(60) <= 2, "center {:?}", (cx, cy));
    assert!(bbox.min_x <= 40 && bbox.max_x >= 80);
    assert!(bbox.min_y <= 40 && bbox.max_y >= 80);
}

#[test]
fn isolated_specks_are_removed_by_refinement() {
    let mut image = yellow_knob_image();
    paint_color_rect(&mut image, 12, 12, 3, 3, KEY_YELLOW);
    paint_color_rect(&mut image, 104, 14, 2, 2, KEY_YELLOW);

    let detection = detect(&DynamicImage::ImageRgb8(image), &round_params()).unwrap();

    assert_eq!(detection.labels.count(), 1);
    assert_eq!(detection.boxes.len(), 1);

    // the raw threshold still holds the specks that refinement removed
    assert_eq!(detection.threshold_mask.get_pixel(13, 13)[0], 255);
    assert_eq!(detection.threshold_mask.get_pixel(104, 14)[0], 255);
    assert_eq!(detection.source_mask.get_pixel(13, 13)[0], 0);
    assert_eq!(detection.source_mask.get_pixel(104, 14)[0], 0);
}

#[test]
fn off_color_keys_are_ignored() {
    let mut image = yellow_knob_image();
    paint_color_disk(&mut image, 20, 100, 12, KEY_BLUE);

    let detection = detect(&DynamicImage::ImageRgb8(image), &round_params()).unwrap();
    assert_eq!(detection.boxes.len(), 1);
}

#[test]
fn edge_preset_finds_key_interior() {
    let mut image = solid_image(120, 100, DARK_BACKGROUND);
    paint_color_rect(&mut image, 30, 35, 40, 30, LIGHT_KEY);

    let detection = detect(&DynamicImage::ImageRgb8(image), &Parameters::edge_preset()).unwrap();

    let inside = detection
        .boxes
        .iter()
        .filter(|b| b.min_x >= 30 && b.max_x <= 69 && b.min_y >= 35 && b.max_y <= 64)
        .count();
    assert_eq!(inside, 1, "boxes: {:?}", detection.boxes);
}
