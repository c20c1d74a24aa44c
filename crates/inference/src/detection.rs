/// Axis-aligned box; `(x, y)` is the center in every coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Corner form `(x_min, y_min, x_max, y_max)`
    pub fn corners(&self) -> (f32, f32, f32, f32) {
        cxcywh_to_xyxy(self.x, self.y, self.width, self.height)
    }

    /// Intersection over union; zero when either box has no area.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let area_a = self.area();
        if area_a <= 0.0 {
            return 0.0;
        }
        let area_b = other.area();
        if area_b <= 0.0 {
            return 0.0;
        }

        let (ax1, ay1, ax2, ay2) = self.corners();
        let (bx1, by1, bx2, by2) = other.corners();

        let min_x = ax1.max(bx1);
        let min_y = ay1.max(by1);
        let max_x = ax2.min(bx2);
        let max_y = ay2.min(by2);

        let intersection = (max_y - min_y).max(0.0) * (max_x - min_x).max(0.0);
        intersection / (area_a + area_b - intersection)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub label: String,
}

impl std::fmt::Display for Detection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}% at ({:.1}, {:.1}) {:.1}x{:.1}",
            self.label,
            (self.confidence * 100.0) as i32,
            self.bbox.x,
            self.bbox.y,
            self.bbox.width,
            self.bbox.height
        )
    }
}

/// Convert bounding box from center-width-height format to corner format
#[inline]
fn cxcywh_to_xyxy(cx: f32, cy: f32, w: f32, h: f32) -> (f32, f32, f32, f32) {
    let x1 = cx - w / 2.0;
    let y1 = cy - h / 2.0;
    let x2 = cx + w / 2.0;
    let y2 = cy + h / 2.0;
    (x1, y1, x2, y2)
}
