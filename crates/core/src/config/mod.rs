use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{MetronomeError, Result, TempoRange};

/// Slowest tempo a configuration may allow.
pub const MIN_TEMPO_BPM: f64 = 1.0;

/// Top-level configuration structure for the metronome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetronomeConfig {
    pub tempo: TempoRange,
    pub stage: StageConfig,
    /// Frame cadence for hosts without a display-driven frame callback.
    pub frame_interval_ms: u64,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            tempo: TempoRange::default(),
            stage: StageConfig::default(),
            frame_interval_ms: 16,
        }
    }
}

impl MetronomeConfig {
    /// Reads and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let tempo = &self.tempo;
        if !(tempo.min_bpm >= MIN_TEMPO_BPM && tempo.min_bpm.is_finite()) {
            return Err(MetronomeError::InvalidConfig(format!(
                "minimum tempo must be at least {MIN_TEMPO_BPM} bpm, got {}",
                tempo.min_bpm
            )));
        }
        if !(tempo.min_bpm <= tempo.default_bpm && tempo.default_bpm <= tempo.max_bpm) {
            return Err(MetronomeError::InvalidConfig(format!(
                "default tempo {} outside {}..={}",
                tempo.default_bpm, tempo.min_bpm, tempo.max_bpm
            )));
        }
        if !(tempo.step_bpm > 0.0 && tempo.max_bpm.is_finite()) {
            return Err(MetronomeError::InvalidConfig(
                "tempo step must be positive and bounds finite".to_string(),
            ));
        }
        if !(self.stage.inset_px >= 0.0 && self.stage.inset_px.is_finite()) {
            return Err(MetronomeError::InvalidConfig(format!(
                "stage inset must be a non-negative length, got {}",
                self.stage.inset_px
            )));
        }
        if self.frame_interval_ms == 0 {
            return Err(MetronomeError::InvalidConfig(
                "frame interval must be at least 1 ms".to_string(),
            ));
        }
        Ok(())
    }
}

/// Stage geometry shared by all front ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Margin kept free at both ends of the stage.
    pub inset_px: f64,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self { inset_px: 20.0 }
    }
}
