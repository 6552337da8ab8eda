use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

const MS_PER_MINUTE: f64 = 60_000.0;
const SECONDS_PER_MINUTE: f64 = 60.0;

/// Tempo expressed in beats per minute.
///
/// Values are expected to be positive; the tempo control that produces them
/// enforces its own bounds (see [`TempoRange`]).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tempo(f64);

impl Tempo {
    pub const fn from_bpm(bpm: f64) -> Self {
        Self(bpm)
    }

    pub fn bpm(self) -> f64 {
        self.0
    }

    /// Milliseconds between two beat pulses.
    pub fn interval_ms(self) -> f64 {
        MS_PER_MINUTE / self.0
    }

    /// Period of the beat pulse. Saturates for tempos too slow to represent.
    pub fn beat_interval(self) -> Duration {
        Duration::try_from_secs_f64(self.interval_ms() / 1000.0).unwrap_or(Duration::MAX)
    }

    /// Position units travelled per second. One sweep across the track takes
    /// exactly one beat, so this is the beat rate itself.
    pub fn traversal_rate(self) -> f64 {
        self.0 / SECONDS_PER_MINUTE
    }

    /// Text shown in the tempo label.
    pub fn label(self) -> String {
        format!("{}", self.0.round() as i64)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self(60.0)
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bpm", self.label())
    }
}

/// Bounds of the tempo control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoRange {
    pub min_bpm: f64,
    pub max_bpm: f64,
    pub step_bpm: f64,
    pub default_bpm: f64,
}

impl Default for TempoRange {
    fn default() -> Self {
        Self {
            min_bpm: 30.0,
            max_bpm: 240.0,
            step_bpm: 1.0,
            default_bpm: 60.0,
        }
    }
}

impl TempoRange {
    pub fn default_tempo(&self) -> Tempo {
        Tempo(self.default_bpm)
    }

    /// Snaps a raw control value onto the range grid, the way a range input
    /// does before reporting its value.
    pub fn snap(&self, bpm: f64) -> Tempo {
        if !bpm.is_finite() {
            return self.default_tempo();
        }

        let clamped = bpm.clamp(self.min_bpm, self.max_bpm);
        if self.step_bpm <= 0.0 {
            return Tempo(clamped);
        }

        let steps = ((clamped - self.min_bpm) / self.step_bpm).round();
        let snapped = self.min_bpm + steps * self.step_bpm;
        Tempo(if snapped > self.max_bpm {
            snapped - self.step_bpm
        } else {
            snapped
        })
    }

    /// Moves `tempo` by a whole number of steps, staying inside the range.
    pub fn nudge(&self, tempo: Tempo, steps: i32) -> Tempo {
        self.snap(tempo.bpm() + f64::from(steps) * self.step_bpm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_is_a_minute_divided_by_tempo() {
        for bpm in [30.0, 60.0, 90.0, 120.0, 144.0, 240.0] {
            let tempo = Tempo::from_bpm(bpm);
            assert!((tempo.interval_ms() - 60_000.0 / bpm).abs() < 1e-9);
        }
        assert_eq!(Tempo::from_bpm(60.0).beat_interval(), Duration::from_secs(1));
        assert_eq!(
            Tempo::from_bpm(120.0).beat_interval(),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn vanishing_tempo_saturates_interval() {
        assert_eq!(Tempo::from_bpm(1e-18).beat_interval(), Duration::MAX);
        assert_eq!(Tempo::from_bpm(0.0).beat_interval(), Duration::MAX);
    }

    #[test]
    fn one_sweep_per_beat() {
        assert_eq!(Tempo::from_bpm(60.0).traversal_rate(), 1.0);
        assert_eq!(Tempo::from_bpm(150.0).traversal_rate(), 2.5);
    }

    #[test]
    fn snaps_to_range_grid() {
        let range = TempoRange {
            min_bpm: 40.0,
            max_bpm: 200.0,
            step_bpm: 4.0,
            default_bpm: 60.0,
        };

        assert_eq!(range.snap(10.0).bpm(), 40.0);
        assert_eq!(range.snap(500.0).bpm(), 200.0);
        assert_eq!(range.snap(61.0).bpm(), 60.0);
        assert_eq!(range.snap(63.0).bpm(), 64.0);
        assert_eq!(range.snap(f64::NAN).bpm(), 60.0);
        assert_eq!(range.nudge(Tempo::from_bpm(196.0), 3).bpm(), 200.0);
    }

    #[test]
    fn label_is_whole_bpm() {
        assert_eq!(Tempo::from_bpm(72.0).label(), "72");
        assert_eq!(format!("{}", Tempo::from_bpm(120.0)), "120 bpm");
    }
}
