// src/config.rs

use crate::error::EngineError;
use crate::types::Config;
use anyhow::Result;
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make the pipeline degenerate.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.sampler.width == 0 || self.sampler.height == 0 {
            return Err(EngineError::Config(
                "sampler resolution must be nonzero".to_string(),
            ));
        }
        if self.motion.sample_stride == 0 {
            return Err(EngineError::Config(
                "motion.sample_stride must be at least 1".to_string(),
            ));
        }
        if self.motion.history_window_ms <= 0.0 {
            return Err(EngineError::Config(
                "motion.history_window_ms must be positive".to_string(),
            ));
        }
        if self.swipe.min_samples < 2 {
            return Err(EngineError::Config(
                "swipe.min_samples must be at least 2".to_string(),
            ));
        }
        if self.swipe.confirm_frames == 0 {
            return Err(EngineError::Config(
                "swipe.confirm_frames must be at least 1".to_string(),
            ));
        }
        if self.swipe.horizontal_threshold_px <= 0.0 || self.swipe.vertical_threshold_px <= 0.0 {
            return Err(EngineError::Config(
                "swipe displacement thresholds must be positive".to_string(),
            ));
        }
        if self.tap.required_stable_frames == 0 {
            return Err(EngineError::Config(
                "tap.required_stable_frames must be at least 1".to_string(),
            ));
        }
        if self.dispatch.viewport_width <= 0.0 || self.dispatch.viewport_height <= 0.0 {
            return Err(EngineError::Config(
                "dispatch viewport dimensions must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
