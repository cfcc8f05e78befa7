use serde::Deserialize;
use std::fmt::{Display, Formatter};

/// Axis-aligned box in pixel space, `x1 < x2` and `y1 < y2` when well formed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "[i32; 4]")]
pub struct BBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl From<[i32; 4]> for BBox {
    fn from([x1, y1, x2, y2]: [i32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl Display for BBox {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.x1, self.y1, self.x2, self.y2)
    }
}

impl BBox {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    pub fn center_x(&self) -> f32 {
        (self.x1 + self.x2) as f32 / 2.0
    }

    pub fn is_well_formed(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }

    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        self.x1 >= 0
            && self.y1 >= 0
            && self.x2 as i64 <= frame_width as i64
            && self.y2 as i64 <= frame_height as i64
    }

    /// Whether the horizontal span reaches into the open band `(left, right)`.
    pub fn overlaps_span(&self, left: f32, right: f32) -> bool {
        self.x2 as f32 > left && (self.x1 as f32) < right
    }

    /// Intersection over union. Boxes that only touch, or do not meet at
    /// all, score 0.
    pub fn iou(&self, other: &BBox) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }

        let intersection = (x2 - x1) as i64 * (y2 - y1) as i64;
        let union = self.area() + other.area() - intersection;
        if union > 0 {
            intersection as f32 / union as f32
        } else {
            0.0
        }
    }
}
