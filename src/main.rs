// src/main.rs

use anyhow::Result;
use gesture_nav::{CameraManager, Config, GestureEngine, HostActions, Route};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Demo host: logs every effect instead of driving a real UI, and hands
/// navigations back to the router loop below.
struct LoggingHost {
    pending_route: Option<Route>,
}

impl HostActions for LoggingHost {
    fn navigate(&mut self, route: Route) {
        info!("[host] navigate -> {}", route.as_path());
        self.pending_route = Some(route);
    }

    fn scroll_by(&mut self, delta_px: f32, smooth: bool) {
        info!(
            "[host] scroll {:+.0}px ({})",
            delta_px,
            if smooth { "smooth" } else { "instant" }
        );
    }

    fn activate_at(&mut self, x: f32, y: f32) -> bool {
        info!("[host] click at ({:.0}, {:.0})", x, y);
        true
    }
}

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "gesture-nav.yaml".to_string());
    let config = if Path::new(&config_path).exists() {
        Config::load(&config_path)?
    } else {
        Config::default()
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .init();

    info!("🖐 Air-Gesture Navigation Engine");
    info!(
        "✓ Configuration ready: {}x{} working buffer, confirm={}, cooldown={}ms",
        config.sampler.width,
        config.sampler.height,
        config.swipe.confirm_frames,
        config.swipe.cooldown_ms
    );

    let frame_interval = Duration::from_secs_f64(1.0 / config.camera.target_fps.max(1) as f64);
    let camera = Rc::new(RefCell::new(CameraManager::with_device(
        config.camera.clone(),
    )));
    let mut engine = GestureEngine::new(config.clone(), camera);

    engine.on_route_change("/documents");
    engine.start()?;

    // optional annotated recording of the session
    let mut writer: Option<opencv::videoio::VideoWriter> = None;
    let record_path = std::env::var("GESTURE_NAV_RECORD").ok();

    let mut host = LoggingHost {
        pending_route: None,
    };
    let mut frames: u64 = 0;

    loop {
        let tick_started = Instant::now();

        if let Some(frame) = engine.tick(&mut host) {
            frames += 1;

            if let Some(path) = &record_path {
                use opencv::videoio::{VideoWriter, VideoWriterTrait};

                let annotated = gesture_nav::overlay::draw_status(&frame, &engine.status())?;
                if writer.is_none() {
                    let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
                    info!("recording annotated session to {}", path);
                    writer = Some(VideoWriter::new(
                        path,
                        fourcc,
                        config.camera.target_fps as f64,
                        opencv::core::Size::new(frame.width as i32, frame.height as i32),
                        true,
                    )?);
                }
                if let Some(writer) = writer.as_mut() {
                    VideoWriterTrait::write(writer, &annotated)?;
                }
            }

            if frames % 300 == 0 {
                info!("status: {}", serde_json::to_string(&engine.status())?);
            }
        }

        if let Some(route) = host.pending_route.take() {
            engine.on_route_change(route.as_path());
        }

        if !engine.is_running() {
            warn!("engine stopped, exiting");
            break;
        }

        // pace the loop to the display-refresh contract without ever
        // blocking inside a tick
        let elapsed = tick_started.elapsed();
        if elapsed < frame_interval {
            std::thread::sleep(frame_interval - elapsed);
        }
    }

    engine.stop();
    info!("final status: {}", serde_json::to_string(&engine.status())?);
    Ok(())
}
