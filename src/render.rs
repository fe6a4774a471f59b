use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::models::{BoundingBox, LabelMap};

pub const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Copy of `image` with a one-pixel outline around every box.
pub fn draw_boxes(image: &RgbImage, boxes: &[BoundingBox], color: Rgb<u8>) -> RgbImage {
    let mut canvas = image.clone();
    for bbox in boxes {
        let rect = Rect::at(bbox.min_x as i32, bbox.min_y as i32).of_size(bbox.width(), bbox.height());
        draw_hollow_rect_mut(&mut canvas, rect, color);
    }
    canvas
}

/// Labels stretched over 0..=255 so components are told apart by brightness.
pub fn label_visualization(labels: &LabelMap) -> GrayImage {
    let count = labels.count().max(1) as u64;
    GrayImage::from_fn(labels.width(), labels.height(), |x, y| {
        let value = labels.get(x, y) as u64 * 255 / count;
        Luma([value as u8])
    })
}
