// src/classifier.rs

use crate::history::MotionHistory;
use crate::types::{GestureKind, SwipeConfig};

/// Classify the current motion window into a swipe candidate.
///
/// Pure displacement/time heuristics over the first and last centroid in
/// the window. The front camera mirrors the image, so a leftward pixel
/// displacement (dx < 0) is the user's hand moving to their left.
pub fn classify(history: &MotionHistory, config: &SwipeConfig) -> Option<GestureKind> {
    if history.len() < config.min_samples {
        return None;
    }

    let first = history.first()?;
    let last = history.last()?;

    let dx = last.x - first.x;
    let dy = last.y - first.y;
    let dt = last.timestamp_ms - first.timestamp_ms;

    // instantaneous jumps are noise, not a hand
    if dt < config.min_duration_ms {
        return None;
    }

    if dx.abs() >= config.horizontal_threshold_px && dx.abs() > dy.abs() {
        return Some(if dx < 0.0 {
            GestureKind::SwipeLeft
        } else {
            GestureKind::SwipeRight
        });
    }

    if dy.abs() >= config.vertical_threshold_px && dy.abs() > dx.abs() {
        return Some(if dy > 0.0 {
            GestureKind::SwipeDown
        } else {
            GestureKind::SwipeUp
        });
    }

    None
}
