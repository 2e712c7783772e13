// src/confirm.rs
//
// A swipe candidate must be re-classified identically for several
// consecutive ticks before it commits, and committed gestures start a
// refractory period during which classification is not even attempted.

use crate::types::{GestureKind, SwipeConfig};
use tracing::{debug, info};

pub struct ConfirmationGate {
    confirm_frames: u32,
    cooldown_ms: f64,
    pending: Option<GestureKind>,
    pending_count: u32,
    last_confirmed_at: Option<f64>,
}

impl ConfirmationGate {
    pub fn new(config: &SwipeConfig) -> Self {
        Self {
            confirm_frames: config.confirm_frames,
            cooldown_ms: config.cooldown_ms,
            pending: None,
            pending_count: 0,
            last_confirmed_at: None,
        }
    }

    /// Hard gate. While this is true the caller must skip classification
    /// entirely so the pending counter cannot advance during cooldown.
    pub fn in_cooldown(&self, now_ms: f64) -> bool {
        match self.last_confirmed_at {
            Some(at) => now_ms - at < self.cooldown_ms,
            None => false,
        }
    }

    /// Feed one classifier result. Returns the gesture on the tick its
    /// pending count reaches the confirmation threshold.
    pub fn observe(
        &mut self,
        candidate: Option<GestureKind>,
        now_ms: f64,
    ) -> Option<GestureKind> {
        let Some(candidate) = candidate else {
            self.reset_pending();
            return None;
        };

        if self.pending == Some(candidate) {
            self.pending_count += 1;
        } else {
            // no carry-over credit between different candidates
            if self.pending.is_some() {
                debug!(
                    "candidate switched {:?} -> {:?}, restarting count",
                    self.pending, candidate
                );
            }
            self.pending = Some(candidate);
            self.pending_count = 1;
        }

        if self.pending_count >= self.confirm_frames {
            info!(
                "✅ gesture confirmed: {} after {} agreeing frames",
                candidate.as_str(),
                self.pending_count
            );
            self.last_confirmed_at = Some(now_ms);
            self.reset_pending();
            return Some(candidate);
        }

        None
    }

    fn reset_pending(&mut self) {
        self.pending = None;
        self.pending_count = 0;
    }

    /// Full reset, cooldown included. Used on engine stop.
    pub fn reset(&mut self) {
        self.reset_pending();
        self.last_confirmed_at = None;
    }

    pub fn last_confirmed_at(&self) -> Option<f64> {
        self.last_confirmed_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> ConfirmationGate {
        ConfirmationGate::new(&SwipeConfig {
            horizontal_threshold_px: 70.0,
            vertical_threshold_px: 48.0,
            min_samples: 4,
            min_duration_ms: 80.0,
            confirm_frames: 3,
            cooldown_ms: 900.0,
        })
    }

    #[test]
    fn test_never_confirms_below_required_count() {
        let mut gate = gate();
        assert!(gate.observe(Some(GestureKind::SwipeLeft), 0.0).is_none());
        assert!(gate.observe(Some(GestureKind::SwipeLeft), 16.0).is_none());
        assert_eq!(
            gate.observe(Some(GestureKind::SwipeLeft), 33.0),
            Some(GestureKind::SwipeLeft)
        );
    }

    #[test]
    fn test_none_resets_pending() {
        let mut gate = gate();
        gate.observe(Some(GestureKind::SwipeLeft), 0.0);
        gate.observe(Some(GestureKind::SwipeLeft), 16.0);
        gate.observe(None, 33.0);
        // the streak starts over
        assert!(gate.observe(Some(GestureKind::SwipeLeft), 50.0).is_none());
        assert!(gate.observe(Some(GestureKind::SwipeLeft), 66.0).is_none());
        assert!(gate.observe(Some(GestureKind::SwipeLeft), 83.0).is_some());
    }

    #[test]
    fn test_candidate_switch_restarts_at_one() {
        let mut gate = gate();
        gate.observe(Some(GestureKind::SwipeLeft), 0.0);
        gate.observe(Some(GestureKind::SwipeLeft), 16.0);
        // switch; the new candidate gets count 1, not 3
        assert!(gate.observe(Some(GestureKind::SwipeUp), 33.0).is_none());
        assert!(gate.observe(Some(GestureKind::SwipeUp), 50.0).is_none());
        assert_eq!(
            gate.observe(Some(GestureKind::SwipeUp), 66.0),
            Some(GestureKind::SwipeUp)
        );
    }

    #[test]
    fn test_cooldown_spacing_between_confirmations() {
        let mut gate = gate();
        let mut confirmed_at = Vec::new();
        let mut t = 0.0;

        // feed agreeing classifications for 3 seconds of 60 Hz ticks,
        // honoring the hard gate the way the engine does
        for _ in 0..180 {
            if !gate.in_cooldown(t) {
                if let Some(_g) = gate.observe(Some(GestureKind::SwipeRight), t) {
                    confirmed_at.push(t);
                }
            }
            t += 16.0;
        }

        assert!(confirmed_at.len() >= 2);
        for pair in confirmed_at.windows(2) {
            assert!(
                pair[1] - pair[0] >= 900.0,
                "confirmations {} and {} violate cooldown",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_in_cooldown_immediately_after_confirm() {
        let mut gate = gate();
        gate.observe(Some(GestureKind::SwipeDown), 0.0);
        gate.observe(Some(GestureKind::SwipeDown), 16.0);
        gate.observe(Some(GestureKind::SwipeDown), 33.0);
        assert!(gate.in_cooldown(34.0));
        assert!(gate.in_cooldown(33.0 + 899.0));
        assert!(!gate.in_cooldown(33.0 + 900.0));
    }
}
