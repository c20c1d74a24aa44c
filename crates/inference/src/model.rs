//! Static description of the YOLOv4-tiny head: grid scales, anchor priors and labels.

use std::path::Path;

/// Number of box features preceding the class scores: tx, ty, tw, th, objectness
pub const BOX_INFO_FEATURE_COUNT: usize = 5;

/// Grid geometry of one output scale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridParams {
    pub rows: usize,
    pub cols: usize,
    pub stride_x: u32,
    pub stride_y: u32,
}

impl GridParams {
    /// 13x13 grid, stride 32
    pub const COARSE: GridParams = GridParams {
        rows: 13,
        cols: 13,
        stride_x: 32,
        stride_y: 32,
    };

    /// 26x26 grid, stride 16
    pub const FINE: GridParams = GridParams {
        rows: 26,
        cols: 26,
        stride_x: 16,
        stride_y: 16,
    };

    /// Square grid covering `input_side` pixels at `stride`
    pub const fn square(input_side: u32, stride: u32) -> GridParams {
        let cells = (input_side / stride) as usize;
        GridParams {
            rows: cells,
            cols: cells,
            stride_x: stride,
            stride_y: stride,
        }
    }
}

/// Pixel-space anchor priors, ordered `(width, height)`.
///
/// The fine scale uses pairs `0..boxes_per_cell`, the coarse scale the pairs after them.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorSet {
    pairs: Vec<(f32, f32)>,
}

impl AnchorSet {
    pub fn new(pairs: Vec<(f32, f32)>) -> Self {
        Self { pairs }
    }

    /// Anchors used when training on Stolpersteine
    pub fn stolperstein() -> Self {
        Self::new(vec![
            (10.0, 14.0),
            (23.0, 27.0),
            (37.0, 58.0),
            (81.0, 82.0),
            (135.0, 169.0),
            (344.0, 319.0),
        ])
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Index of the first anchor pair of a scale, selected by its horizontal stride.
    pub fn base_index(grid: &GridParams, boxes_per_cell: usize) -> Option<usize> {
        match grid.stride_x {
            16 => Some(0),
            32 => Some(boxes_per_cell),
            _ => None,
        }
    }

    pub fn pair(&self, index: usize) -> Option<(f32, f32)> {
        self.pairs.get(index).copied()
    }
}

impl Default for AnchorSet {
    fn default() -> Self {
        Self::stolperstein()
    }
}

/// Ordered class names of the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels(Vec<String>);

impl Labels {
    pub fn new(labels: Vec<String>) -> Self {
        Self(labels)
    }

    /// Label set of a single-class model shipped without a labels file
    pub fn single_object() -> Self {
        Self(vec!["object".to_string()])
    }

    /// One label per line; CR, LF and CRLF line endings, blank lines skipped.
    pub fn from_text(text: &str) -> Self {
        Self(
            text.split(['\r', '\n'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::single_object());
        };

        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read labels {}: {}", path.display(), e))?;
        let labels = Self::from_text(&text);
        if labels.is_empty() {
            anyhow::bail!("Labels file {} contains no labels", path.display());
        }

        tracing::info!(count = labels.len(), path = %path.display(), "Loaded labels");
        Ok(labels)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }
}

/// Everything the decoder needs to know about the network head
#[derive(Debug, Clone, PartialEq)]
pub struct YoloHead {
    pub input_side: u32,
    pub boxes_per_cell: usize,
    pub coarse: GridParams,
    pub fine: GridParams,
    pub anchors: AnchorSet,
    pub labels: Labels,
}

impl YoloHead {
    pub fn yolov4_tiny(labels: Labels) -> Self {
        Self {
            input_side: 416,
            boxes_per_cell: 3,
            coarse: GridParams::COARSE,
            fine: GridParams::FINE,
            anchors: AnchorSet::stolperstein(),
            labels,
        }
    }

    /// Same head on a different square input; both grids follow the input side.
    pub fn with_input_side(self, input_side: u32) -> Self {
        Self {
            input_side,
            coarse: GridParams::square(input_side, self.coarse.stride_x),
            fine: GridParams::square(input_side, self.fine.stride_x),
            ..self
        }
    }

    pub fn class_count(&self) -> usize {
        self.labels.len()
    }

    /// Channels occupied by one anchor slot
    pub fn slot_channels(&self) -> usize {
        BOX_INFO_FEATURE_COUNT + self.class_count()
    }
}
