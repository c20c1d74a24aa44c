use crate::config::DEFAULT_INPUT_SIZE;
use crate::frame::{RGBA_CHANNELS, RgbaFrame};
use crate::{CropWindow, Preprocess, PreprocessError, PreprocessResult};
use common::span;
use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
    images::{Image, ImageRef},
};
use ndarray::{Array, IxDyn};

pub struct CpuPreProcessor {
    side: u32,
    crop_buffer: Vec<u8>,
    crop_side: u32,
    scaled: Image<'static>,
    resizer: Resizer,
}

impl CpuPreProcessor {
    /// Fails when `input_size` is not square.
    pub fn new(input_size: (u32, u32)) -> Result<Self, PreprocessError> {
        let (width, height) = input_size;
        if width != height || width == 0 {
            return Err(PreprocessError::NonSquareTarget { width, height });
        }

        Ok(Self {
            side: width,
            crop_buffer: Vec::new(),
            crop_side: 0,
            scaled: Image::new(width, height, PixelType::U8x4),
            resizer: Resizer::new(),
        })
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    /// Crop and scale a frame; returns the scaled RGBA pixels (`side * side * 4` bytes).
    pub fn crop_and_scale(&mut self, frame: &RgbaFrame) -> Result<(&[u8], CropWindow), PreprocessError> {
        let _s = span!("crop_and_scale");

        let crop = self.crop_center_square(frame);

        let src = ImageRef::new(
            self.crop_side,
            self.crop_side,
            &self.crop_buffer,
            PixelType::U8x4,
        )?;

        self.resizer.resize(
            &src,
            &mut self.scaled,
            &ResizeOptions::new()
                .resize_alg(ResizeAlg::Convolution(FilterType::Bilinear))
                .use_alpha(false),
        )?;

        Ok((self.scaled.buffer(), crop))
    }

    /// Copy the maximal centered square of `frame` into the scratch buffer.
    fn crop_center_square(&mut self, frame: &RgbaFrame) -> CropWindow {
        let (width, height) = frame.size();
        let crop_width = width > height;
        let side = width.min(height);
        let x = if crop_width { (width - side) / 2 } else { 0 };
        let y = if crop_width { 0 } else { (height - side) / 2 };

        tracing::trace!(x, y, side, width, height, "Cropping center square");

        let row_bytes = side as usize * RGBA_CHANNELS;
        let stride = width as usize * RGBA_CHANNELS;
        let pixels = frame.pixels();

        self.crop_buffer.clear();
        self.crop_buffer.reserve(row_bytes * side as usize);
        for row in y..y + side {
            let start = row as usize * stride + x as usize * RGBA_CHANNELS;
            self.crop_buffer
                .extend_from_slice(&pixels[start..start + row_bytes]);
        }
        self.crop_side = side;

        CropWindow { x, y, side }
    }

    /// RGBA bytes -> NHWC `(1, side, side, 3)` in `[0, 1]`, alpha dropped.
    fn normalize(rgba: &[u8], side: u32) -> Result<Array<f32, IxDyn>, PreprocessError> {
        let _s = span!("normalize");

        let side = side as usize;
        let mut output = Vec::with_capacity(side * side * 3);
        for px in rgba.chunks_exact(RGBA_CHANNELS) {
            output.push(px[0] as f32 / 255.0);
            output.push(px[1] as f32 / 255.0);
            output.push(px[2] as f32 / 255.0);
        }

        Ok(Array::from_shape_vec(IxDyn(&[1, side, side, 3]), output)?)
    }
}

impl Default for CpuPreProcessor {
    fn default() -> Self {
        let (side, _) = DEFAULT_INPUT_SIZE;
        Self {
            side,
            crop_buffer: Vec::new(),
            crop_side: 0,
            scaled: Image::new(side, side, PixelType::U8x4),
            resizer: Resizer::new(),
        }
    }
}

impl Preprocess for CpuPreProcessor {
    fn preprocess(&mut self, frame: &RgbaFrame) -> Result<PreprocessResult, PreprocessError> {
        let _s = span!("preprocess_frame");

        tracing::trace!(
            width = frame.width(),
            height = frame.height(),
            side = self.side,
            "Preprocessing frame"
        );

        let side = self.side;
        let (scaled, crop) = self.crop_and_scale(frame)?;
        let tensor = Self::normalize(scaled, side)?;

        Ok(PreprocessResult {
            tensor,
            crop,
            source_size: frame.size(),
        })
    }

    fn input_size(&self) -> (u32, u32) {
        (self.side, self.side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Horizontal gradient: red channel = x, green = y
    fn gradient_frame(width: u32, height: u32) -> RgbaFrame {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 0, 255]);
            }
        }
        RgbaFrame::new(width, height, pixels).unwrap()
    }

    #[test]
    fn test_non_square_target_is_rejected() {
        let result = CpuPreProcessor::new((416, 320));
        assert!(matches!(
            result,
            Err(PreprocessError::NonSquareTarget {
                width: 416,
                height: 320
            })
        ));
    }

    #[test]
    fn test_output_is_always_side_by_side() {
        let sources = [(1, 1), (7, 3), (3, 7), (640, 480), (480, 640), (100, 100)];

        for side in [1u32, 2, 10, 416] {
            let mut preprocessor = CpuPreProcessor::new((side, side)).unwrap();
            for (width, height) in sources {
                let result = preprocessor
                    .preprocess(&gradient_frame(width, height))
                    .unwrap();
                assert_eq!(
                    result.tensor.shape(),
                    &[1, side as usize, side as usize, 3],
                    "side {} from {}x{}",
                    side,
                    width,
                    height
                );
            }
        }
    }

    #[test]
    fn test_wide_frame_crops_horizontally() {
        let mut preprocessor = CpuPreProcessor::new((10, 10)).unwrap();
        let result = preprocessor.preprocess(&gradient_frame(640, 480)).unwrap();

        assert_eq!(
            result.crop,
            CropWindow {
                x: 80,
                y: 0,
                side: 480
            }
        );
        assert_eq!(result.source_size, (640, 480));
    }

    #[test]
    fn test_tall_frame_crops_vertically_with_floor() {
        let mut preprocessor = CpuPreProcessor::new((2, 2)).unwrap();
        let result = preprocessor.preprocess(&gradient_frame(3, 8)).unwrap();

        // floor((8 - 3) / 2) = 2
        assert_eq!(result.crop, CropWindow { x: 0, y: 2, side: 3 });
    }

    #[test]
    fn test_crop_samples_the_center() {
        // 4x2 frame: left and right columns red 255, center columns red 0
        let mut pixels = Vec::new();
        for _ in 0..2 {
            for x in 0..4 {
                let red = if x == 0 || x == 3 { 255 } else { 0 };
                pixels.extend_from_slice(&[red, 0, 0, 255]);
            }
        }
        let frame = RgbaFrame::new(4, 2, pixels).unwrap();

        let mut preprocessor = CpuPreProcessor::new((2, 2)).unwrap();
        let result = preprocessor.preprocess(&frame).unwrap();

        // the 2x2 center crop contains no red at all
        assert!(result.tensor.iter().step_by(3).all(|r| *r == 0.0));
    }

    #[test]
    fn test_normalization_scales_to_unit_range() {
        let frame = RgbaFrame::filled(8, 8, [255, 128, 0, 255]).unwrap();
        let mut preprocessor = CpuPreProcessor::new((4, 4)).unwrap();
        let result = preprocessor.preprocess(&frame).unwrap();

        assert_relative_eq!(result.tensor[[0, 1, 2, 0]], 1.0, epsilon = 1e-2);
        assert_relative_eq!(result.tensor[[0, 1, 2, 1]], 128.0 / 255.0, epsilon = 1e-2);
        assert_relative_eq!(result.tensor[[0, 1, 2, 2]], 0.0, epsilon = 1e-2);
    }

    #[test]
    fn test_buffer_reuse_does_not_leak_previous_dimensions() {
        let mut preprocessor = CpuPreProcessor::new((10, 10)).unwrap();

        let large = preprocessor.preprocess(&gradient_frame(1920, 1080)).unwrap();
        assert_eq!(large.crop.side, 1080);

        let small_frame = RgbaFrame::filled(6, 4, [10, 20, 30, 255]).unwrap();
        let small = preprocessor.preprocess(&small_frame).unwrap();
        assert_eq!(small.crop, CropWindow { x: 1, y: 0, side: 4 });
        assert_eq!(small.tensor.shape(), &[1, 10, 10, 3]);
        assert!(
            small
                .tensor
                .iter()
                .step_by(3)
                .all(|r| (*r - 10.0 / 255.0).abs() < 1.5 / 255.0),
            "uniform frame must stay uniform after a larger previous frame"
        );
    }

    #[test]
    fn test_preprocess_trait() {
        let mut preprocessor = CpuPreProcessor::default();
        assert_eq!(preprocessor.input_size(), DEFAULT_INPUT_SIZE);

        let frame = RgbaFrame::filled(100, 100, [128, 128, 128, 255]).unwrap();
        let result = preprocessor.preprocess(&frame).unwrap();
        assert_eq!(result.tensor.shape(), &[1, 416, 416, 3]);
    }
}
