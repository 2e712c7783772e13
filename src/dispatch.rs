// src/dispatch.rs
//
// Maps confirmed gestures plus the current screen to concrete effects.
// Effects go through the HostActions seam so the engine never reaches
// into the hosting application's UI directly.

use crate::types::{DispatchConfig, GestureKind, Route};
use tracing::{debug, info};

/// Effects the hosting application executes on the engine's behalf.
pub trait HostActions {
    fn navigate(&mut self, route: Route);

    /// Scroll the designated container. Positive delta scrolls the
    /// viewport down (reveals content below).
    fn scroll_by(&mut self, delta_px: f32, smooth: bool);

    /// Activate the UI element under the viewport coordinate, as a user
    /// click would. Returns false when nothing is under the point.
    fn activate_at(&mut self, x: f32, y: f32) -> bool;
}

/// Horizontal neighbors per screen as `(left, right)`. Screens without a
/// neighbor in a direction are terminal there; swiping into the missing
/// direction is a no-op, not an error.
pub fn route_neighbors(route: Route) -> (Option<Route>, Option<Route>) {
    match route {
        Route::Home => (None, Some(Route::Reminders)),
        Route::Reminders => (Some(Route::Home), Some(Route::Documents)),
        Route::Documents => (Some(Route::Reminders), Some(Route::DocVault)),
        Route::DocVault => (Some(Route::Documents), Some(Route::Profile)),
        Route::Profile => (Some(Route::DocVault), None),
        Route::Scan => (None, None),
    }
}

pub struct ActionDispatcher {
    config: DispatchConfig,
}

impl ActionDispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self { config }
    }

    pub fn dispatch_swipe(
        &self,
        gesture: GestureKind,
        route: Route,
        host: &mut dyn HostActions,
    ) {
        match gesture {
            GestureKind::SwipeLeft | GestureKind::SwipeRight => {
                let (left, right) = route_neighbors(route);
                let target = if gesture == GestureKind::SwipeLeft {
                    left
                } else {
                    right
                };
                match target {
                    Some(target) => {
                        info!(
                            "{} on {} -> navigate {}",
                            gesture.as_str(),
                            route.as_path(),
                            target.as_path()
                        );
                        host.navigate(target);
                    }
                    None => {
                        debug!("{} on terminal route {}", gesture.as_str(), route.as_path());
                    }
                }
            }
            GestureKind::SwipeUp | GestureKind::SwipeDown => {
                // inverted from camera space: an upward hand motion
                // reveals content below, so the viewport scrolls down
                let delta = if gesture == GestureKind::SwipeUp {
                    self.config.scroll_step_px
                } else {
                    -self.config.scroll_step_px
                };
                info!(
                    "{} -> scroll {:+.0}px in #{}",
                    gesture.as_str(),
                    delta,
                    self.config.scroll_container_id
                );
                host.scroll_by(delta, self.config.smooth_scroll);
            }
            GestureKind::Tap => {
                debug!("tap reached swipe dispatch, ignoring");
            }
        }
    }

    /// Fire a synthetic click for a tap centroid given in
    /// downsampled-frame coordinates.
    pub fn dispatch_tap(
        &self,
        centroid_x: f32,
        centroid_y: f32,
        frame_width: usize,
        frame_height: usize,
        host: &mut dyn HostActions,
    ) {
        let (x, y) = self.map_tap_point(centroid_x, centroid_y, frame_width, frame_height);
        let hit = host.activate_at(x, y);
        info!(
            "tap -> activate at ({:.0}, {:.0}){}",
            x,
            y,
            if hit { "" } else { " (no element)" }
        );
    }

    /// The centroid lives in mirrored downsampled-frame space. Flip it
    /// horizontally and scale both axes to viewport dimensions.
    pub fn map_tap_point(
        &self,
        centroid_x: f32,
        centroid_y: f32,
        frame_width: usize,
        frame_height: usize,
    ) -> (f32, f32) {
        let x = (1.0 - centroid_x / frame_width as f32) * self.config.viewport_width;
        let y = (centroid_y / frame_height as f32) * self.config.viewport_height;
        (x, y)
    }
}
