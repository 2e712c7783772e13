// src/sampler.rs

use crate::types::{Frame, SamplerConfig};

/// Downsamples raw capture frames into a fixed low-resolution RGB working
/// buffer so the per-tick pixel scan stays bounded.
pub struct FrameSampler {
    width: usize,
    height: usize,
    buf: Vec<u8>,
}

impl FrameSampler {
    pub fn new(config: &SamplerConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            buf: vec![0u8; config.width * config.height * 3],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bilinear resize of the frame into the internal working buffer.
    /// The returned slice is valid until the next call.
    pub fn sample(&mut self, frame: &Frame) -> &[u8] {
        let src = &frame.data;
        let (src_w, src_h) = (frame.width, frame.height);
        let (dst_w, dst_h) = (self.width, self.height);

        let x_ratio = src_w as f32 / dst_w as f32;
        let y_ratio = src_h as f32 / dst_h as f32;

        for dy in 0..dst_h {
            for dx in 0..dst_w {
                let sx = dx as f32 * x_ratio;
                let sy = dy as f32 * y_ratio;

                let sx0 = sx.floor() as usize;
                let sy0 = sy.floor() as usize;
                let sx1 = (sx0 + 1).min(src_w - 1);
                let sy1 = (sy0 + 1).min(src_h - 1);

                let fx = sx - sx0 as f32;
                let fy = sy - sy0 as f32;

                for c in 0..3 {
                    let p00 = src[(sy0 * src_w + sx0) * 3 + c] as f32;
                    let p10 = src[(sy0 * src_w + sx1) * 3 + c] as f32;
                    let p01 = src[(sy1 * src_w + sx0) * 3 + c] as f32;
                    let p11 = src[(sy1 * src_w + sx1) * 3 + c] as f32;

                    let val = p00 * (1.0 - fx) * (1.0 - fy)
                        + p10 * fx * (1.0 - fy)
                        + p01 * (1.0 - fx) * fy
                        + p11 * fx * fy;

                    self.buf[(dy * dst_w + dx) * 3 + c] = val.round() as u8;
                }
            }
        }

        &self.buf
    }
}
