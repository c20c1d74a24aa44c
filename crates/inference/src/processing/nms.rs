use crate::detection::Detection;
use common::span;

/// Greedy non-maximum suppression.
///
/// Candidates are visited by descending confidence (stable for equal scores);
/// each accepted box deactivates every later box overlapping it by more than
/// `iou_threshold`. At most `limit` boxes are returned.
pub fn suppress(mut candidates: Vec<Detection>, limit: usize, iou_threshold: f32) -> Vec<Detection> {
    let _s = span!("suppress");

    if limit == 0 || candidates.is_empty() {
        return Vec::new();
    }

    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut active = vec![true; candidates.len()];
    let mut selected = Vec::with_capacity(limit.min(candidates.len()));

    for i in 0..candidates.len() {
        if !active[i] {
            continue;
        }

        selected.push(i);
        if selected.len() >= limit {
            break;
        }

        let accepted = candidates[i].bbox;
        for j in i + 1..candidates.len() {
            if active[j] && accepted.iou(&candidates[j].bbox) > iou_threshold {
                active[j] = false;
            }
        }
    }

    tracing::trace!(
        candidates = candidates.len(),
        kept = selected.len(),
        "Suppressed overlapping boxes"
    );

    let mut keep = vec![false; candidates.len()];
    for i in selected {
        keep[i] = true;
    }
    let mut index = 0;
    candidates.retain(|_| {
        let kept = keep[index];
        index += 1;
        kept
    });
    candidates
}
