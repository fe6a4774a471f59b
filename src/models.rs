use image::{GrayImage, ImageBuffer, Luma};
use serde::Serialize;

/// Binary mask: 0 is background, anything else is foreground.
/// Masks produced by this crate only ever contain 0 and [`FOREGROUND`].
pub type Mask = GrayImage;

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Axis-aligned bounding box with inclusive corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    pub fn new(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn top_left(&self) -> (u32, u32) {
        (self.min_x, self.min_y)
    }

    pub fn bottom_right(&self) -> (u32, u32) {
        (self.max_x, self.max_y)
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Integer midpoint of the two corners.
    pub fn center(&self) -> (u32, u32) {
        ((self.min_x + self.max_x) / 2, (self.min_y + self.max_y) / 2)
    }

    /// Height divided by width.
    pub fn aspect_ratio(&self) -> f32 {
        self.height() as f32 / self.width() as f32
    }

    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Grow the box so that it contains `(x, y)`.
    pub(crate) fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }
}

/// One connected component of a [`LabelMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub label: u32,
    pub bbox: BoundingBox,
    pub pixel_count: u32,
}

impl Region {
    pub fn width(&self) -> u32 {
        self.bbox.width()
    }

    pub fn height(&self) -> u32 {
        self.bbox.height()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.bbox.aspect_ratio()
    }

    pub fn center(&self) -> (u32, u32) {
        self.bbox.center()
    }

    /// Radius of the circle inscribed in the box height: distance from
    /// the center row to the top row.
    pub fn radius(&self) -> u32 {
        self.center().1.abs_diff(self.bbox.min_y)
    }
}

/// Per-pixel component labels. 0 is background; components are numbered
/// `1..=count` in the raster order of their first pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    labels: ImageBuffer<Luma<u32>, Vec<u32>>,
    count: u32,
}

impl LabelMap {
    pub(crate) fn new(labels: ImageBuffer<Luma<u32>, Vec<u32>>, count: u32) -> Self {
        Self { labels, count }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn width(&self) -> u32 {
        self.labels.width()
    }

    pub fn height(&self) -> u32 {
        self.labels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.labels.dimensions()
    }

    /// Label at `(x, y)`. Panics when out of bounds, like `ImageBuffer::get_pixel`.
    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.labels.get_pixel(x, y)[0]
    }

    pub fn as_image(&self) -> &ImageBuffer<Luma<u32>, Vec<u32>> {
        &self.labels
    }

    /// Iterate `(x, y, label)` in raster order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        self.labels.enumerate_pixels().map(|(x, y, p)| (x, y, p[0]))
    }
}

/// What a classifier measured for a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    AspectRatio(f32),
    Iou(f32),
}

impl Score {
    pub fn value(self) -> f32 {
        match self {
            Score::AspectRatio(v) | Score::Iou(v) => v,
        }
    }
}

/// Verdict of a geometric test for one region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: u32,
    pub accepted: bool,
    pub score: Score,
}
