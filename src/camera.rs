// src/camera.rs
//
// Exclusive ownership of the physical camera. At most one consumer holds
// the stream at any moment; acquiring on behalf of a new consumer tears
// down the previous one first.

use crate::error::EngineError;
use crate::types::Frame;
use anyhow::Result;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Anything that can hand out decodable RGB frames.
pub trait VideoSource {
    /// True once the source can produce at least one decodable frame.
    fn is_ready(&self) -> bool;

    /// Pull the next frame. `Ok(None)` means no frame is available right
    /// now (source warming up, or stream already torn down).
    fn read_frame(&mut self) -> Result<Option<Frame>>;

    fn width(&self) -> usize;
    fn height(&self) -> usize;
}

/// The parties allowed to hold the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumer {
    GestureEngine,
    CaptureScreen,
}

type SourceSlot = Rc<RefCell<Option<Box<dyn VideoSource>>>>;

/// Opens a fresh stream on demand. Injected so tests can script sources.
pub type SourceFactory = Box<dyn FnMut() -> Result<Box<dyn VideoSource>, EngineError>>;

/// Handle granted to the current consumer.
///
/// The manager keeps a line to the underlying source, so a forced release
/// leaves this handle alive but inert: reads return `Ok(None)` and
/// `is_active` turns false.
pub struct CameraHandle {
    consumer: Consumer,
    slot: SourceSlot,
}

impl CameraHandle {
    pub fn consumer(&self) -> Consumer {
        self.consumer
    }

    /// False once the stream has been released out from under us.
    pub fn is_active(&self) -> bool {
        self.slot.borrow().is_some()
    }

    pub fn is_ready(&self) -> bool {
        match self.slot.borrow().as_ref() {
            Some(source) => source.is_ready(),
            None => false,
        }
    }

    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        match self.slot.borrow_mut().as_mut() {
            Some(source) => source.read_frame(),
            None => Ok(None),
        }
    }
}

pub struct CameraManager {
    factory: SourceFactory,
    active: Option<(Consumer, SourceSlot)>,
}

impl CameraManager {
    pub fn new(factory: SourceFactory) -> Self {
        Self {
            factory,
            active: None,
        }
    }

    /// Manager backed by the physical device described in the config.
    #[cfg(feature = "camera")]
    pub fn with_device(config: crate::types::CameraConfig) -> Self {
        Self::new(Box::new(move || {
            let capture = capture::CameraCapture::open(&config)?;
            Ok(Box::new(capture) as Box<dyn VideoSource>)
        }))
    }

    /// Grant the camera to `consumer`, force-releasing whoever held it.
    pub fn acquire(&mut self, consumer: Consumer) -> Result<CameraHandle, EngineError> {
        if let Some((holder, _)) = &self.active {
            warn!(
                "camera requested by {:?} while held by {:?}, forcing release",
                consumer, holder
            );
        }
        self.force_release_all();

        let source = (self.factory)()?;
        let slot: SourceSlot = Rc::new(RefCell::new(Some(source)));
        self.active = Some((consumer, Rc::clone(&slot)));
        info!("camera acquired by {:?}", consumer);
        Ok(CameraHandle { consumer, slot })
    }

    /// Release the camera if `consumer` is the current holder. A release
    /// from a consumer that does not hold the stream is a no-op.
    pub fn release(&mut self, consumer: Consumer) {
        match &self.active {
            Some((holder, _)) if *holder == consumer => self.force_release_all(),
            Some((holder, _)) => {
                debug!(
                    "release from {:?} ignored, camera held by {:?}",
                    consumer, holder
                );
            }
            None => {}
        }
    }

    /// Safety net: tear down whatever stream is live. Idempotent, and a
    /// no-op when no camera is active. Dropping the source closes the
    /// device, which turns the hardware indicator off.
    pub fn force_release_all(&mut self) {
        if let Some((holder, slot)) = self.active.take() {
            slot.borrow_mut().take();
            info!("camera released (was held by {:?})", holder);
        }
    }

    pub fn holder(&self) -> Option<Consumer> {
        self.active.as_ref().map(|(holder, _)| *holder)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

#[cfg(feature = "camera")]
pub mod capture {
    //! OpenCV-backed webcam stream.

    use super::VideoSource;
    use crate::error::EngineError;
    use crate::types::{CameraConfig, Frame};
    use anyhow::Result;
    use opencv::{
        core::Mat,
        imgproc,
        prelude::*,
        videoio::{self, VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst},
    };
    use std::time::Instant;
    use tracing::info;

    pub struct CameraCapture {
        cap: VideoCapture,
        width: usize,
        height: usize,
        opened_at: Instant,
        decoded_any: bool,
    }

    impl CameraCapture {
        pub fn open(config: &CameraConfig) -> Result<Self, EngineError> {
            let mut cap = VideoCapture::new(config.device_index, videoio::CAP_ANY)
                .map_err(|e| EngineError::CameraUnavailable(e.to_string()))?;

            let opened = cap
                .is_opened()
                .map_err(|e| EngineError::CameraUnavailable(e.to_string()))?;
            if !opened {
                return Err(EngineError::CameraUnavailable(format!(
                    "device {} could not be opened",
                    config.device_index
                )));
            }

            let _ = cap.set(videoio::CAP_PROP_FRAME_WIDTH, config.capture_width as f64);
            let _ = cap.set(videoio::CAP_PROP_FRAME_HEIGHT, config.capture_height as f64);
            let _ = cap.set(videoio::CAP_PROP_FPS, config.target_fps as f64);

            let width = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_WIDTH)
                .map_err(|e| EngineError::CameraUnavailable(e.to_string()))? as usize;
            let height = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_HEIGHT)
                .map_err(|e| EngineError::CameraUnavailable(e.to_string()))? as usize;

            info!(
                "camera device {} open: {}x{} @ {} fps requested",
                config.device_index, width, height, config.target_fps
            );

            Ok(Self {
                cap,
                width,
                height,
                opened_at: Instant::now(),
                decoded_any: false,
            })
        }
    }

    impl VideoSource for CameraCapture {
        fn is_ready(&self) -> bool {
            self.decoded_any
        }

        fn read_frame(&mut self) -> Result<Option<Frame>> {
            let mut mat = Mat::default();
            if !VideoCaptureTrait::read(&mut self.cap, &mut mat)? || mat.empty() {
                return Ok(None);
            }

            let mut rgb = Mat::default();
            imgproc::cvt_color(&mat, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

            self.decoded_any = true;
            let timestamp_ms = self.opened_at.elapsed().as_secs_f64() * 1000.0;

            Ok(Some(Frame {
                data: rgb.data_bytes()?.to_vec(),
                width: mat.cols() as usize,
                height: mat.rows() as usize,
                timestamp_ms,
            }))
        }

        fn width(&self) -> usize {
            self.width
        }

        fn height(&self) -> usize {
            self.height
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted sources shared by the unit and end-to-end tests.

    use super::VideoSource;
    use crate::types::Frame;
    use anyhow::Result;
    use std::collections::VecDeque;

    pub struct ScriptedSource {
        pub frames: VecDeque<Frame>,
        pub width: usize,
        pub height: usize,
    }

    impl ScriptedSource {
        pub fn new(frames: Vec<Frame>, width: usize, height: usize) -> Self {
            Self {
                frames: frames.into(),
                width,
                height,
            }
        }

        /// A source that never becomes ready.
        pub fn empty(width: usize, height: usize) -> Self {
            Self::new(Vec::new(), width, height)
        }
    }

    impl VideoSource for ScriptedSource {
        fn is_ready(&self) -> bool {
            !self.frames.is_empty()
        }

        fn read_frame(&mut self) -> Result<Option<Frame>> {
            Ok(self.frames.pop_front())
        }

        fn width(&self) -> usize {
            self.width
        }

        fn height(&self) -> usize {
            self.height
        }
    }
}
