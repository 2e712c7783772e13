// src/overlay.rs
//
// Debug-only status overlay drawn onto the camera frame. Nothing in the
// pipeline reads it back.

use crate::diagnostics::EngineStatus;
use crate::types::Frame;
use anyhow::Result;
use opencv::{core, imgproc, prelude::*};

/// Render the diagnostic state onto a copy of the frame, returned as a
/// BGR `Mat` ready for a video writer or preview surface.
pub fn draw_status(frame: &Frame, status: &EngineStatus) -> Result<Mat> {
    let mat = Mat::from_slice(&frame.data)?;
    let mat = mat.reshape(3, frame.height as i32)?;

    let mut output = Mat::default();
    imgproc::cvt_color(&mat, &mut output, imgproc::COLOR_RGB2BGR, 0)?;

    // dark banner for legibility
    imgproc::rectangle(
        &mut output,
        core::Rect::new(5, 5, 420, 58),
        core::Scalar::new(40.0, 40.0, 40.0, 0.0),
        -1,
        imgproc::LINE_8,
        0,
    )?;

    let state_color = match status.engine {
        crate::diagnostics::EngineState::Running => core::Scalar::new(0.0, 255.0, 0.0, 0.0),
        crate::diagnostics::EngineState::Suspended => core::Scalar::new(0.0, 255.0, 255.0, 0.0),
        crate::diagnostics::EngineState::Failed => core::Scalar::new(0.0, 0.0, 255.0, 0.0),
        crate::diagnostics::EngineState::Stopped => core::Scalar::new(200.0, 200.0, 200.0, 0.0),
    };

    let headline = format!(
        "engine: {} | camera: {}",
        status.engine.as_str(),
        status.camera.as_str()
    );
    imgproc::put_text(
        &mut output,
        &headline,
        core::Point::new(15, 28),
        imgproc::FONT_HERSHEY_SIMPLEX,
        0.55,
        state_color,
        1,
        imgproc::LINE_8,
        false,
    )?;

    let detail = format!(
        "route: {} | last gesture: {}",
        status.route.as_path(),
        status
            .last_gesture
            .map(|g| g.as_str())
            .unwrap_or("none")
    );
    imgproc::put_text(
        &mut output,
        &detail,
        core::Point::new(15, 52),
        imgproc::FONT_HERSHEY_SIMPLEX,
        0.55,
        core::Scalar::new(255.0, 255.0, 255.0, 0.0),
        1,
        imgproc::LINE_8,
        false,
    )?;

    Ok(output)
}
