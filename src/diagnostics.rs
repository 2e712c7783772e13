// src/diagnostics.rs
//
// Non-authoritative status surface for the host's debug overlay. The
// engine is single-threaded by contract, so plain counters suffice.

use crate::types::{GestureKind, Route};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineState {
    Stopped,
    Running,
    /// Stopped because the active screen owns the camera.
    Suspended,
    Failed,
}

impl EngineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Suspended => "suspended",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CameraState {
    Inactive,
    Active,
    Unavailable,
}

impl CameraState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Active => "active",
            Self::Unavailable => "unavailable",
        }
    }
}

/// Snapshot handed to the host for display. Debug-only, never consulted
/// by the pipeline itself.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub engine: EngineState,
    pub camera: CameraState,
    pub last_gesture: Option<GestureKind>,
    pub route: Route,
    pub frames_processed: u64,
    pub ticks_skipped: u64,
    pub gestures_confirmed: u64,
    pub taps_fired: u64,
}

pub struct Diagnostics {
    engine: EngineState,
    camera: CameraState,
    last_gesture: Option<GestureKind>,
    route: Route,
    frames_processed: u64,
    ticks_skipped: u64,
    gestures_confirmed: u64,
    taps_fired: u64,
}

impl Diagnostics {
    pub fn new(route: Route) -> Self {
        Self {
            engine: EngineState::Stopped,
            camera: CameraState::Inactive,
            last_gesture: None,
            route,
            frames_processed: 0,
            ticks_skipped: 0,
            gestures_confirmed: 0,
            taps_fired: 0,
        }
    }

    pub fn set_engine(&mut self, state: EngineState) {
        self.engine = state;
    }

    pub fn set_camera(&mut self, state: CameraState) {
        self.camera = state;
    }

    pub fn set_route(&mut self, route: Route) {
        self.route = route;
    }

    pub fn record_frame(&mut self) {
        self.frames_processed += 1;
    }

    pub fn record_skipped_tick(&mut self) {
        self.ticks_skipped += 1;
    }

    pub fn record_gesture(&mut self, gesture: GestureKind) {
        self.last_gesture = Some(gesture);
        self.gestures_confirmed += 1;
    }

    pub fn record_tap(&mut self) {
        self.last_gesture = Some(GestureKind::Tap);
        self.taps_fired += 1;
    }

    pub fn snapshot(&self) -> EngineStatus {
        EngineStatus {
            engine: self.engine,
            camera: self.camera,
            last_gesture: self.last_gesture,
            route: self.route,
            frames_processed: self.frames_processed,
            ticks_skipped: self.ticks_skipped,
            gestures_confirmed: self.gestures_confirmed,
            taps_fired: self.taps_fired,
        }
    }

    pub fn log_summary(&self) {
        info!(
            "session summary: {} frames, {} skipped ticks, {} gestures, {} taps",
            self.frames_processed, self.ticks_skipped, self.gestures_confirmed, self.taps_fired
        );
    }
}
