// src/engine.rs
//
// Engine lifecycle and the per-tick pipeline. One tick runs, in order:
// sample, motion detect, cooldown-gated classify and confirm, then tap
// detection on the same centroid. A tick either fully completes or is
// skipped. Stop is synchronous and idempotent and leaves no state behind.

use crate::camera::{CameraHandle, CameraManager, Consumer};
use crate::classifier;
use crate::confirm::ConfirmationGate;
use crate::diagnostics::{CameraState, Diagnostics, EngineState, EngineStatus};
use crate::dispatch::{ActionDispatcher, HostActions};
use crate::error::EngineError;
use crate::history::MotionHistory;
use crate::motion::MotionDetector;
use crate::sampler::FrameSampler;
use crate::tap::TapDetector;
use crate::types::{Config, Frame, Route};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Poll interval while waiting for the source to become decodable.
const READY_POLL_MS: u64 = 5;

pub struct GestureEngine {
    config: Config,
    camera: Rc<RefCell<CameraManager>>,
    handle: Option<CameraHandle>,
    sampler: FrameSampler,
    detector: MotionDetector,
    history: MotionHistory,
    gate: ConfirmationGate,
    tap: TapDetector,
    dispatcher: ActionDispatcher,
    route: Route,
    diagnostics: Diagnostics,
    running: bool,
    suspended_for_capture: bool,
}

impl GestureEngine {
    pub fn new(config: Config, camera: Rc<RefCell<CameraManager>>) -> Self {
        let sampler = FrameSampler::new(&config.sampler);
        let detector = MotionDetector::new(config.sampler.width, config.sampler.height, &config.motion);
        let history = MotionHistory::new(config.motion.history_window_ms);
        let gate = ConfirmationGate::new(&config.swipe);
        let tap = TapDetector::new(&config.tap);
        let dispatcher = ActionDispatcher::new(config.dispatch.clone());

        Self {
            config,
            camera,
            handle: None,
            sampler,
            detector,
            history,
            gate,
            tap,
            dispatcher,
            route: Route::Home,
            diagnostics: Diagnostics::new(Route::Home),
            running: false,
            suspended_for_capture: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn current_route(&self) -> Route {
        self.route
    }

    pub fn status(&self) -> EngineStatus {
        self.diagnostics.snapshot()
    }

    /// Acquire the camera and wait (bounded) for its first decodable
    /// frame. Any failure runs full teardown: no dangling stream, no
    /// partially primed buffers.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.running {
            return Ok(());
        }
        if !self.config.engine.enabled {
            debug!("start refused, engine disabled by user setting");
            return Err(EngineError::Disabled);
        }
        if self.route == Route::Scan {
            debug!("start refused, capture screen owns the camera");
            self.suspended_for_capture = true;
            self.diagnostics.set_engine(EngineState::Suspended);
            return Err(EngineError::CameraUnavailable(
                "capture screen owns the camera".to_string(),
            ));
        }

        let mut handle = match self.camera.borrow_mut().acquire(Consumer::GestureEngine) {
            Ok(handle) => handle,
            Err(e) => {
                warn!("camera acquisition failed: {}", e);
                self.diagnostics.set_engine(EngineState::Failed);
                self.diagnostics.set_camera(CameraState::Unavailable);
                return Err(e);
            }
        };

        match wait_for_first_frame(&mut handle, self.config.engine.startup_timeout_ms) {
            Ok(frame) => {
                // prime the working buffers so the first real tick diffs
                // against this frame instead of against black
                let sampled = self.sampler.sample(&frame);
                let _ = self.detector.detect(sampled, frame.timestamp_ms);
                self.handle = Some(handle);
            }
            Err(e) => {
                warn!("video source never became ready: {}", e);
                drop(handle);
                self.camera.borrow_mut().release(Consumer::GestureEngine);
                self.diagnostics.set_engine(EngineState::Failed);
                self.diagnostics.set_camera(CameraState::Unavailable);
                return Err(e);
            }
        }

        self.running = true;
        self.diagnostics.set_engine(EngineState::Running);
        self.diagnostics.set_camera(CameraState::Active);
        info!("✓ gesture engine running on {}", self.route.as_path());
        Ok(())
    }

    /// Synchronous, idempotent shutdown: no more ticks are processed, the
    /// camera is released, and every retained buffer is cleared so the
    /// next start is a clean slate.
    pub fn stop(&mut self) {
        if !self.running && self.handle.is_none() {
            return;
        }
        self.teardown();
        self.diagnostics.set_engine(EngineState::Stopped);
        self.diagnostics.log_summary();
        info!("gesture engine stopped");
    }

    fn teardown(&mut self) {
        if self.handle.take().is_some() {
            self.camera.borrow_mut().release(Consumer::GestureEngine);
        }
        self.history.clear();
        self.detector.reset();
        self.gate.reset();
        self.tap.reset();
        self.running = false;
        self.diagnostics.set_camera(CameraState::Inactive);
    }

    /// The hosting application's router reports every screen change here.
    ///
    /// The capture screen needs exclusive camera access, so entering it
    /// suspends the whole engine rather than merely muting dispatch;
    /// leaving it restarts the engine when the user toggle allows.
    pub fn on_route_change(&mut self, path: &str) {
        let Some(route) = Route::parse(path) else {
            warn!("unknown route {:?}, keeping {}", path, self.route.as_path());
            return;
        };

        self.route = route;
        self.diagnostics.set_route(route);

        if route == Route::Scan {
            if self.running {
                info!("entering capture screen, suspending gesture engine");
                self.stop();
            }
            self.suspended_for_capture = true;
            self.diagnostics.set_engine(EngineState::Suspended);
            return;
        }

        if self.suspended_for_capture {
            self.suspended_for_capture = false;
            if self.config.engine.enabled {
                if let Err(e) = self.start() {
                    warn!("engine restart after capture screen failed: {}", e);
                }
            }
        }
    }

    /// One cooperative pipeline pass. Call roughly once per display
    /// refresh; never blocks. Returns the processed frame for optional
    /// preview/overlay rendering, or `None` when the tick was skipped.
    pub fn tick(&mut self, host: &mut dyn HostActions) -> Option<Frame> {
        if !self.running {
            return None;
        }

        let stream_lost = self.handle.as_ref().map_or(true, |h| !h.is_active());
        if stream_lost {
            warn!("camera stream lost to another consumer, stopping engine");
            self.stop();
            return None;
        }

        let handle = self.handle.as_mut()?;
        let frame = match handle.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                self.diagnostics.record_skipped_tick();
                return None;
            }
            Err(e) => {
                // transient read failure: skip this tick, keep the loop alive
                warn!("frame read failed, skipping tick: {}", e);
                self.diagnostics.record_skipped_tick();
                return None;
            }
        };

        let timestamp_ms = frame.timestamp_ms;
        let sampled = self.sampler.sample(&frame);
        let motion = self.detector.detect(sampled, timestamp_ms);
        self.diagnostics.record_frame();

        if let Some(sample) = motion {
            self.history.push(sample);
        }

        // swipe path: the cooldown is a hard gate, classification is not
        // even attempted while it holds
        if !self.gate.in_cooldown(timestamp_ms) {
            let candidate = classifier::classify(&self.history, &self.config.swipe);
            if let Some(gesture) = self.gate.observe(candidate, timestamp_ms) {
                self.history.clear();
                self.diagnostics.record_gesture(gesture);
                self.dispatcher.dispatch_swipe(gesture, self.route, host);
            }
        }

        // tap path: same centroid, after the swipe check
        if let Some(sample) = motion {
            if let Some((x, y)) = self.tap.observe(&sample) {
                self.diagnostics.record_tap();
                self.dispatcher.dispatch_tap(
                    x,
                    y,
                    self.sampler.width(),
                    self.sampler.height(),
                    host,
                );
            }
        }

        Some(frame)
    }
}

/// Poll the fresh stream until it decodes a frame or the bounded wait
/// runs out. Read errors during warmup are treated as not-ready.
fn wait_for_first_frame(handle: &mut CameraHandle, timeout_ms: u64) -> Result<Frame, EngineError> {
    let timeout = Duration::from_millis(timeout_ms);
    let started = Instant::now();

    loop {
        match handle.read_frame() {
            Ok(Some(frame)) => return Ok(frame),
            Ok(None) => {}
            Err(e) => debug!("frame read failed during warmup: {}", e),
        }
        if started.elapsed() >= timeout {
            return Err(EngineError::VideoNotReady {
                waited_ms: timeout_ms,
            });
        }
        std::thread::sleep(Duration::from_millis(READY_POLL_MS));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::testing::ScriptedSource;
    use crate::camera::VideoSource;
    use crate::dispatch::HostActions;
    use crate::types::GestureKind;

    const W: usize = 320;
    const H: usize = 240;

    #[derive(Default)]
    struct RecordingHost {
        navigations: Vec<Route>,
        scrolls: Vec<(f32, bool)>,
        activations: Vec<(f32, f32)>,
    }

    impl HostActions for RecordingHost {
        fn navigate(&mut self, route: Route) {
            self.navigations.push(route);
        }

        fn scroll_by(&mut self, delta_px: f32, smooth: bool) {
            self.scrolls.push((delta_px, smooth));
        }

        fn activate_at(&mut self, x: f32, y: f32) -> bool {
            self.activations.push((x, y));
            true
        }
    }

    fn frame_with_block(x0: usize, y0: usize, size: usize, timestamp_ms: f64) -> Frame {
        let mut data = vec![0u8; W * H * 3];
        for y in y0..(y0 + size).min(H) {
            for x in x0..(x0 + size).min(W) {
                let i = (y * W + x) * 3;
                data[i] = 255;
                data[i + 1] = 255;
                data[i + 2] = 255;
            }
        }
        Frame {
            data,
            width: W,
            height: H,
            timestamp_ms,
        }
    }

    /// A hand sweeping to the user's right: the block advances 30 px per
    /// frame at 50 ms spacing.
    fn rightward_sweep() -> Vec<Frame> {
        (0..9)
            .map(|k| frame_with_block(20 + 30 * k, 100, 40, k as f64 * 50.0))
            .collect()
    }

    fn single_use_manager(frames: Vec<Frame>) -> Rc<RefCell<CameraManager>> {
        let mut frames = Some(frames);
        Rc::new(RefCell::new(CameraManager::new(Box::new(move || {
            let frames = frames.take().expect("factory used once");
            Ok(Box::new(ScriptedSource::new(frames, W, H)) as Box<dyn VideoSource>)
        }))))
    }

    /// Every acquire yields a fresh short static stream.
    fn reusable_manager() -> Rc<RefCell<CameraManager>> {
        Rc::new(RefCell::new(CameraManager::new(Box::new(|| {
            let frames = (0..5)
                .map(|k| frame_with_block(60, 60, 40, k as f64 * 50.0))
                .collect();
            Ok(Box::new(ScriptedSource::new(frames, W, H)) as Box<dyn VideoSource>)
        }))))
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.engine.startup_timeout_ms = 100;
        config
    }

    #[test]
    fn test_rightward_swipe_navigates_documents_to_docvault() {
        let camera = single_use_manager(rightward_sweep());
        let mut engine = GestureEngine::new(test_config(), camera);
        let mut host = RecordingHost::default();

        engine.on_route_change("/documents");
        engine.start().unwrap();
        assert!(engine.is_running());

        for _ in 0..8 {
            engine.tick(&mut host);
        }

        assert_eq!(host.navigations, vec![Route::DocVault]);
        assert!(host.scrolls.is_empty());
        assert!(host.activations.is_empty());
        let status = engine.status();
        assert_eq!(status.gestures_confirmed, 1);
        assert_eq!(status.last_gesture, Some(GestureKind::SwipeRight));
    }

    #[test]
    fn test_scan_route_suspends_engine_and_releases_camera() {
        let camera = reusable_manager();
        let mut engine = GestureEngine::new(test_config(), Rc::clone(&camera));

        engine.on_route_change("/documents");
        engine.start().unwrap();
        assert!(camera.borrow().is_active());

        engine.on_route_change("/scan");
        assert!(!engine.is_running());
        assert!(!camera.borrow().is_active());
        assert_eq!(engine.status().engine, EngineState::Suspended);

        // leaving the capture screen brings the engine back
        engine.on_route_change("/documents");
        assert!(engine.is_running());
        assert_eq!(engine.status().engine, EngineState::Running);
    }

    #[test]
    fn test_scan_route_suspends_even_when_toggle_enabled() {
        let camera = reusable_manager();
        let mut engine = GestureEngine::new(test_config(), Rc::clone(&camera));
        assert!(engine.config.engine.enabled);

        engine.on_route_change("/scan");
        assert!(engine.start().is_err());
        assert!(!engine.is_running());
        assert!(!camera.borrow().is_active());
    }

    #[test]
    fn test_disabled_toggle_refuses_start() {
        let camera = reusable_manager();
        let mut config = test_config();
        config.engine.enabled = false;
        let mut engine = GestureEngine::new(config, Rc::clone(&camera));

        assert!(matches!(engine.start(), Err(EngineError::Disabled)));
        assert!(!camera.borrow().is_active());
    }

    #[test]
    fn test_unavailable_camera_fails_start_cleanly() {
        let camera = Rc::new(RefCell::new(CameraManager::new(Box::new(|| {
            Err(EngineError::CameraUnavailable("permission denied".to_string()))
        }))));
        let mut engine = GestureEngine::new(test_config(), Rc::clone(&camera));

        assert!(matches!(
            engine.start(),
            Err(EngineError::CameraUnavailable(_))
        ));
        assert!(!engine.is_running());
        assert!(!camera.borrow().is_active());
        assert_eq!(engine.status().camera, CameraState::Unavailable);
        assert_eq!(engine.status().engine, EngineState::Failed);
    }

    #[test]
    fn test_source_that_never_decodes_times_out_and_tears_down() {
        let camera = Rc::new(RefCell::new(CameraManager::new(Box::new(|| {
            Ok(Box::new(ScriptedSource::empty(W, H)) as Box<dyn VideoSource>)
        }))));
        let mut engine = GestureEngine::new(test_config(), Rc::clone(&camera));

        assert!(matches!(
            engine.start(),
            Err(EngineError::VideoNotReady { .. })
        ));
        assert!(!engine.is_running());
        assert!(!camera.borrow().is_active());
    }

    #[test]
    fn test_stolen_stream_stops_engine_on_next_tick() {
        let camera = reusable_manager();
        let mut engine = GestureEngine::new(test_config(), Rc::clone(&camera));
        let mut host = RecordingHost::default();

        engine.start().unwrap();
        // the capture screen grabs the camera out from under the engine
        let _capture = camera
            .borrow_mut()
            .acquire(Consumer::CaptureScreen)
            .unwrap();

        engine.tick(&mut host);
        assert!(!engine.is_running());
        assert_eq!(camera.borrow().holder(), Some(Consumer::CaptureScreen));
    }

    /// Decodes one frame for warmup, then every read throws.
    struct FlakySource {
        calls: u32,
    }

    impl VideoSource for FlakySource {
        fn is_ready(&self) -> bool {
            true
        }

        fn read_frame(&mut self) -> anyhow::Result<Option<Frame>> {
            self.calls += 1;
            if self.calls == 1 {
                Ok(Some(frame_with_block(60, 60, 40, 0.0)))
            } else {
                Err(anyhow::anyhow!("decoder hiccup"))
            }
        }

        fn width(&self) -> usize {
            W
        }

        fn height(&self) -> usize {
            H
        }
    }

    #[test]
    fn test_transient_read_errors_skip_ticks_but_keep_running() {
        let camera = Rc::new(RefCell::new(CameraManager::new(Box::new(|| {
            Ok(Box::new(FlakySource { calls: 0 }) as Box<dyn VideoSource>)
        }))));
        let mut engine = GestureEngine::new(test_config(), camera);
        let mut host = RecordingHost::default();

        engine.start().unwrap();
        for _ in 0..5 {
            assert!(engine.tick(&mut host).is_none());
        }
        assert!(engine.is_running());
        assert_eq!(engine.status().ticks_skipped, 5);
        assert_eq!(engine.status().frames_processed, 0);
    }

    #[test]
    fn test_stop_is_idempotent_and_clears_state() {
        let camera = reusable_manager();
        let mut engine = GestureEngine::new(test_config(), Rc::clone(&camera));
        let mut host = RecordingHost::default();

        engine.start().unwrap();
        engine.tick(&mut host);
        engine.stop();
        engine.stop();

        assert!(!engine.is_running());
        assert!(!camera.borrow().is_active());
        assert_eq!(engine.status().engine, EngineState::Stopped);

        // a fresh start works from a clean slate
        engine.start().unwrap();
        assert!(engine.is_running());
    }

    #[test]
    fn test_exhausted_source_skips_ticks_without_stopping() {
        let camera = single_use_manager(rightward_sweep());
        let mut engine = GestureEngine::new(test_config(), camera);
        let mut host = RecordingHost::default();

        engine.start().unwrap();
        for _ in 0..20 {
            engine.tick(&mut host);
        }
        // 8 frames remained after priming; the rest of the ticks skipped
        let status = engine.status();
        assert_eq!(status.frames_processed, 8);
        assert_eq!(status.ticks_skipped, 12);
        assert!(engine.is_running());
    }
}
