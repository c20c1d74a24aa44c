use preprocess::RgbaFrame;
use std::path::Path;

/// Supplier of camera frames; `None` when no frame is available this cycle.
pub trait FrameSource {
    fn acquire_frame(&mut self) -> Option<RgbaFrame>;
}

impl<F> FrameSource for F
where
    F: FnMut() -> Option<RgbaFrame>,
{
    fn acquire_frame(&mut self) -> Option<RgbaFrame> {
        self()
    }
}

/// Serves the same still image on every request.
pub struct ImageFileSource {
    frame: RgbaFrame,
}

impl ImageFileSource {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open image {}: {}", path.display(), e))?
            .to_rgba8();

        let (width, height) = image.dimensions();
        let frame = RgbaFrame::new(width, height, image.into_raw())?;

        tracing::info!(width, height, path = %path.display(), "Loaded still image");
        Ok(Self { frame })
    }

    pub fn from_frame(frame: RgbaFrame) -> Self {
        Self { frame }
    }
}

impl FrameSource for ImageFileSource {
    fn acquire_frame(&mut self) -> Option<RgbaFrame> {
        Some(self.frame.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_source() {
        let mut remaining = 2;
        let mut source = || {
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            RgbaFrame::filled(4, 4, [0, 0, 0, 255]).ok()
        };

        assert!(source.acquire_frame().is_some());
        assert!(source.acquire_frame().is_some());
        assert!(source.acquire_frame().is_none());
    }

    #[test]
    fn test_image_file_source_repeats_frame() {
        let frame = RgbaFrame::filled(3, 2, [1, 2, 3, 255]).unwrap();
        let mut source = ImageFileSource::from_frame(frame.clone());
        assert_eq!(source.acquire_frame(), Some(frame.clone()));
        assert_eq!(source.acquire_frame(), Some(frame));
    }

    #[test]
    fn test_missing_image_is_an_error() {
        assert!(ImageFileSource::open("/nonexistent/frame.png").is_err());
    }
}
