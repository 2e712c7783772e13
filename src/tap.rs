// src/tap.rs
//
// Parallel to the swipe machinery: a hand held still over one spot for
// long enough fires a synthetic click there. Independent of the swipe
// cooldown, gated by its own shorter one.

use crate::types::{MotionSample, TapConfig};
use tracing::info;

pub struct TapDetector {
    stability_radius_px: f32,
    required_stable_frames: u32,
    cooldown_ms: f64,
    reference: Option<MotionSample>,
    stable_frames: u32,
    last_tap_at: Option<f64>,
}

impl TapDetector {
    pub fn new(config: &TapConfig) -> Self {
        Self {
            stability_radius_px: config.stability_radius_px,
            required_stable_frames: config.required_stable_frames,
            cooldown_ms: config.cooldown_ms,
            reference: None,
            stable_frames: 0,
            last_tap_at: None,
        }
    }

    /// Feed the per-tick motion centroid. Returns tap coordinates in
    /// downsampled-frame space when the hold completes.
    ///
    /// The centroid is compared against an anchored reference point, so
    /// slow drift within the radius keeps counting while any jump past it
    /// re-anchors and starts over.
    pub fn observe(&mut self, sample: &MotionSample) -> Option<(f32, f32)> {
        let Some(reference) = self.reference else {
            self.reference = Some(*sample);
            self.stable_frames = 0;
            return None;
        };

        let dx = sample.x - reference.x;
        let dy = sample.y - reference.y;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance > self.stability_radius_px {
            self.reference = Some(*sample);
            self.stable_frames = 0;
            return None;
        }

        self.stable_frames += 1;
        if self.stable_frames < self.required_stable_frames {
            return None;
        }

        self.stable_frames = 0;

        if let Some(at) = self.last_tap_at {
            if sample.timestamp_ms - at < self.cooldown_ms {
                return None;
            }
        }

        self.last_tap_at = Some(sample.timestamp_ms);
        info!(
            "tap fired at ({:.1}, {:.1}) after stable hold",
            sample.x, sample.y
        );
        Some((sample.x, sample.y))
    }

    pub fn reset(&mut self) {
        self.reference = None;
        self.stable_frames = 0;
        self.last_tap_at = None;
    }

    pub fn last_tap_at(&self) -> Option<f64> {
        self.last_tap_at
    }
}
