// src/types.rs

use serde::{Deserialize, Serialize};

/// A raw RGB frame pulled from the video source.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub timestamp_ms: f64,
}

/// Centroid of the pixels that moved between two consecutive frames,
/// in downsampled-buffer coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub x: f32,
    pub y: f32,
    pub timestamp_ms: f64,
}

/// Discrete commands the engine can emit.
///
/// Directions follow the mirrored front-camera convention: a leftward pixel
/// displacement is the user's hand moving to *their* left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureKind {
    SwipeLeft,
    SwipeRight,
    SwipeUp,
    SwipeDown,
    Tap,
}

impl GestureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SwipeLeft => "swipe_left",
            Self::SwipeRight => "swipe_right",
            Self::SwipeUp => "swipe_up",
            Self::SwipeDown => "swipe_down",
            Self::Tap => "tap",
        }
    }
}

/// Screens of the hosting application that gestures can navigate between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    Home,
    Reminders,
    Documents,
    DocVault,
    Profile,
    /// The capture screen needs the camera for itself. The engine is fully
    /// suspended while this route is active.
    Scan,
}

impl Route {
    /// Parse a router path. Trailing slashes and case are normalized.
    pub fn parse(path: &str) -> Option<Route> {
        let normalized = path.trim().trim_end_matches('/').to_ascii_lowercase();
        match normalized.as_str() {
            "" | "/home" => Some(Route::Home),
            "/reminders" => Some(Route::Reminders),
            "/documents" => Some(Route::Documents),
            "/docvault" => Some(Route::DocVault),
            "/profile" => Some(Route::Profile),
            "/scan" => Some(Route::Scan),
            _ => None,
        }
    }

    pub fn as_path(&self) -> &'static str {
        match self {
            Route::Home => "/home",
            Route::Reminders => "/reminders",
            Route::Documents => "/documents",
            Route::DocVault => "/docvault",
            Route::Profile => "/profile",
            Route::Scan => "/scan",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    pub camera: CameraConfig,
    pub sampler: SamplerConfig,
    pub motion: MotionConfig,
    pub swipe: SwipeConfig,
    pub tap: TapConfig,
    pub dispatch: DispatchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Persisted user toggle. When false the engine refuses to start.
    pub enabled: bool,
    /// Bounded wait for the source to produce its first decodable frame.
    pub startup_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    pub device_index: i32,
    pub capture_width: usize,
    pub capture_height: usize,
    pub target_fps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Fixed working-buffer resolution. Everything downstream runs at this
    /// size, which bounds per-tick cost regardless of the capture format.
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Scan every Nth row and column of the working buffer.
    pub sample_stride: usize,
    /// Minimum luminance delta for a sampled pixel to count as moving.
    pub luma_threshold: f32,
    /// Fewer moving sample pixels than this reports no motion at all.
    pub min_moving_pixels: usize,
    /// Rolling window of motion centroids kept for classification.
    pub history_window_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeConfig {
    pub horizontal_threshold_px: f32,
    pub vertical_threshold_px: f32,
    /// Classification needs at least this many centroids in the window.
    pub min_samples: usize,
    /// Displacements faster than this are treated as noise.
    pub min_duration_ms: f64,
    /// Consecutive agreeing classifications required before dispatch.
    pub confirm_frames: u32,
    /// Refractory period between two confirmed gestures.
    pub cooldown_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// Centroid may wander this far from its anchor and still count as held.
    pub stability_radius_px: f32,
    pub required_stable_frames: u32,
    pub cooldown_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Scroll distance per vertical swipe, in viewport pixels.
    pub scroll_step_px: f32,
    pub smooth_scroll: bool,
    /// Well-known id of the scrollable container. Hosts fall back to the
    /// document scroll root when the element is absent.
    pub scroll_container_id: String,
    pub viewport_width: f32,
    pub viewport_height: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                enabled: true,
                startup_timeout_ms: 4000,
            },
            camera: CameraConfig {
                device_index: 0,
                capture_width: 640,
                capture_height: 480,
                target_fps: 30,
            },
            sampler: SamplerConfig {
                width: 320,
                height: 240,
            },
            motion: MotionConfig {
                sample_stride: 4,
                luma_threshold: 28.0,
                min_moving_pixels: 12,
                history_window_ms: 450.0,
            },
            swipe: SwipeConfig {
                horizontal_threshold_px: 70.0,
                vertical_threshold_px: 48.0,
                min_samples: 4,
                min_duration_ms: 80.0,
                confirm_frames: 3,
                cooldown_ms: 900.0,
            },
            tap: TapConfig {
                stability_radius_px: 14.0,
                required_stable_frames: 10,
                cooldown_ms: 1200.0,
            },
            dispatch: DispatchConfig {
                scroll_step_px: 240.0,
                smooth_scroll: true,
                scroll_container_id: "main-scroll".to_string(),
                viewport_width: 390.0,
                viewport_height: 844.0,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}
