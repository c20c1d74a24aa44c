use crate::detection::BoundingBox;

/// Two-step affine map from the model input space to the screen.
///
/// The first step undoes the center-square crop and resize back into the
/// source frame, the second fills the screen with the frame preserving its
/// aspect ratio and overflowing the shorter screen axis equally on both sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenMapping {
    scale1: f32,
    shift1: (f32, f32),
    scale2: f32,
    shift2: (f32, f32),
}

impl ScreenMapping {
    /// All sizes are `(width, height)` in pixels.
    pub fn new(source: (u32, u32), processed: (u32, u32), screen: (u32, u32)) -> Self {
        let (sw, sh) = (source.0 as f32, source.1 as f32);
        let (pw, ph) = (processed.0 as f32, processed.1 as f32);
        let (scr_w, scr_h) = (screen.0 as f32, screen.1 as f32);

        let scale1 = (sw / pw).min(sh / ph);
        let shift1 = ((sw - pw * scale1) / 2.0, (sh - ph * scale1) / 2.0);

        let scale2 = (scr_w / sw).max(scr_h / sh);
        let shift2 = ((scr_w - sw * scale2) / 2.0, (scr_h - sh * scale2) / 2.0);

        Self {
            scale1,
            shift1,
            scale2,
            shift2,
        }
    }

    /// Overall size factor from model input pixels to screen pixels
    pub fn scale(&self) -> f32 {
        self.scale1 * self.scale2
    }

    pub fn to_screen(&self, bbox: &BoundingBox) -> BoundingBox {
        let x = bbox.x * self.scale1 + self.shift1.0;
        let y = bbox.y * self.scale1 + self.shift1.1;

        BoundingBox {
            x: x * self.scale2 + self.shift2.0,
            y: y * self.scale2 + self.shift2.1,
            width: bbox.width * self.scale(),
            height: bbox.height * self.scale(),
        }
    }

    pub fn to_processed(&self, bbox: &BoundingBox) -> BoundingBox {
        let x = (bbox.x - self.shift2.0) / self.scale2;
        let y = (bbox.y - self.shift2.1) / self.scale2;

        BoundingBox {
            x: (x - self.shift1.0) / self.scale1,
            y: (y - self.shift1.1) / self.scale1,
            width: bbox.width / self.scale(),
            height: bbox.height / self.scale(),
        }
    }
}

/// Map one box from model input space to screen space.
pub fn map_box(
    bbox: &BoundingBox,
    source: (u32, u32),
    processed: (u32, u32),
    screen: (u32, u32),
) -> BoundingBox {
    ScreenMapping::new(source, processed, screen).to_screen(bbox)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_when_all_spaces_match() {
        let bbox = BoundingBox::new(100.0, 50.0, 20.0, 10.0);
        let mapped = map_box(&bbox, (416, 416), (416, 416), (416, 416));
        assert_eq!(mapped, bbox);
    }

    #[test]
    fn test_center_of_model_input_maps_to_screen_center() {
        let bbox = BoundingBox::new(208.0, 208.0, 10.0, 10.0);
        let mapped = map_box(&bbox, (640, 480), (416, 416), (1920, 1080));
        assert_relative_eq!(mapped.x, 960.0, epsilon = 1e-3);
        assert_relative_eq!(mapped.y, 540.0, epsilon = 1e-3);
    }

    #[test]
    fn test_wide_source_undoes_the_crop() {
        let mapping = ScreenMapping::new((640, 480), (416, 416), (640, 480));
        // left edge of the model input is column 80 of the frame
        let mapped = mapping.to_screen(&BoundingBox::new(0.0, 0.0, 416.0, 416.0));
        assert_relative_eq!(mapped.x, 80.0, epsilon = 1e-3);
        assert_relative_eq!(mapped.y, 0.0, epsilon = 1e-3);
        assert_relative_eq!(mapped.width, 480.0, epsilon = 1e-3);
    }

    #[test]
    fn test_screen_fill_overflows_the_short_axis() {
        // 640x480 frame on a 1920x1080 screen: scale2 = max(3, 2.25) = 3
        let mapping = ScreenMapping::new((640, 480), (480, 480), (1920, 1080));
        let mapped = mapping.to_screen(&BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        assert_relative_eq!(mapped.x, 80.0 * 3.0, epsilon = 1e-3);
        // (1080 - 480 * 3) / 2 = -180
        assert_relative_eq!(mapped.y, -180.0, epsilon = 1e-3);
        assert_relative_eq!(mapping.scale(), 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_inverse_round_trips() {
        let mapping = ScreenMapping::new((1280, 720), (416, 416), (1170, 2532));
        for bbox in [
            BoundingBox::new(0.0, 0.0, 1.0, 1.0),
            BoundingBox::new(123.4, 301.2, 40.0, 12.5),
            BoundingBox::new(416.0, 416.0, 416.0, 416.0),
        ] {
            let back = mapping.to_processed(&mapping.to_screen(&bbox));
            assert_relative_eq!(back.x, bbox.x, epsilon = 1e-2);
            assert_relative_eq!(back.y, bbox.y, epsilon = 1e-2);
            assert_relative_eq!(back.width, bbox.width, epsilon = 1e-2);
            assert_relative_eq!(back.height, bbox.height, epsilon = 1e-2);
        }
    }
}
