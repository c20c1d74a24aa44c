use crate::detection::{BoundingBox, Detection};
use crate::model::{AnchorSet, BOX_INFO_FEATURE_COUNT, GridParams, YoloHead};
use ndarray::ArrayViewD;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum DecodeError {
    #[error("Unsupported grid scale with stride {stride_x}x{stride_y}")]
    UnsupportedGrid { stride_x: u32, stride_y: u32 },

    #[error("Output tensor shape {actual:?} does not match grid {rows}x{cols} with {channels} channels")]
    ShapeMismatch {
        actual: Vec<usize>,
        rows: usize,
        cols: usize,
        channels: usize,
    },

    #[error("Anchor pair {0} is not configured")]
    MissingAnchor(usize),

    #[error("Model has no labels")]
    NoLabels,
}

/// YOLO head decoding of one output scale.
pub struct TensorDecoder {
    head: YoloHead,
}

impl TensorDecoder {
    pub fn new(head: YoloHead) -> Self {
        Self { head }
    }

    pub fn head(&self) -> &YoloHead {
        &self.head
    }

    /// Decode a `(1, rows, cols, channels)` feature map into candidates scoring at
    /// least `score_threshold`, in cell order.
    ///
    /// The tensor is indexed `[0, cx, cy, ..]` with `cx` over rows and `cy` over
    /// columns; the box center x follows `cy` and center y follows `cx`.
    #[tracing::instrument(skip(self, output), fields(rows = grid.rows, cols = grid.cols))]
    pub fn decode(
        &self,
        output: &ArrayViewD<f32>,
        score_threshold: f32,
        grid: &GridParams,
    ) -> Result<Vec<Detection>, DecodeError> {
        let head = &self.head;
        let class_count = head.class_count();
        if class_count == 0 {
            return Err(DecodeError::NoLabels);
        }

        let anchor_base = AnchorSet::base_index(grid, head.boxes_per_cell).ok_or(
            DecodeError::UnsupportedGrid {
                stride_x: grid.stride_x,
                stride_y: grid.stride_y,
            },
        )?;
        let last_anchor = anchor_base + head.boxes_per_cell - 1;
        if head.anchors.pair(last_anchor).is_none() {
            return Err(DecodeError::MissingAnchor(last_anchor));
        }

        let slot_channels = head.slot_channels();
        let channels = head.boxes_per_cell * slot_channels;
        let shape = output.shape();
        if shape.len() != 4
            || shape[0] == 0
            || shape[1] != grid.rows
            || shape[2] != grid.cols
            || shape[3] < channels
        {
            return Err(DecodeError::ShapeMismatch {
                actual: shape.to_vec(),
                rows: grid.rows,
                cols: grid.cols,
                channels,
            });
        }

        let mut class_scores = vec![0.0f32; class_count];
        let mut detections = Vec::new();

        for cy in 0..grid.cols {
            for cx in 0..grid.rows {
                for slot in 0..head.boxes_per_cell {
                    let channel = slot * slot_channels;
                    let raw = |offset: usize| output[[0, cx, cy, channel + offset]];

                    // score = class prob * confidence <= confidence; NaN never passes
                    let confidence = sigmoid(raw(4));
                    if confidence.is_nan() || confidence < score_threshold {
                        continue;
                    }

                    for (c, score) in class_scores.iter_mut().enumerate() {
                        *score = raw(BOX_INFO_FEATURE_COUNT + c);
                    }
                    softmax(&mut class_scores);
                    let (best_class, best_prob) = top_result(&class_scores);

                    let score = best_prob * confidence;
                    if score.is_nan() || score < score_threshold {
                        continue;
                    }

                    let (anchor_w, anchor_h) = head
                        .anchors
                        .pair(anchor_base + slot)
                        .ok_or(DecodeError::MissingAnchor(anchor_base + slot))?;

                    let bbox = BoundingBox {
                        x: (cy as f32 + sigmoid(raw(0))) * grid.stride_x as f32,
                        y: (cx as f32 + sigmoid(raw(1))) * grid.stride_y as f32,
                        width: raw(2).exp() * anchor_w,
                        height: raw(3).exp() * anchor_h,
                    };

                    let label = head.labels.get(best_class).unwrap_or("object").to_string();
                    detections.push(Detection {
                        bbox,
                        confidence: score,
                        label,
                    });
                }
            }
        }

        tracing::trace!(candidates = detections.len(), "Decoded grid");
        Ok(detections)
    }
}

/// Sigmoid activation function
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// In-place numerically stable softmax
fn softmax(values: &mut [f32]) {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in values.iter_mut() {
        *v /= sum;
    }
}

/// Highest probability and its index; the first one wins ties.
fn top_result(probs: &[f32]) -> (usize, f32) {
    probs
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, p)| {
            if p > best.1 { (i, p) } else { best }
        })
}
