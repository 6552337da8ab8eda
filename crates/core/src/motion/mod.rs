use serde::{Deserialize, Serialize};

use crate::Tempo;

/// Which way the indicator is currently travelling along the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards position 1 (left to right).
    #[default]
    Forward,
    /// Towards position 0.
    Backward,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }
}

/// Normalised position of the indicator plus the bookkeeping needed to
/// integrate it over frame timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    position: f64,
    direction: Direction,
    #[serde(skip)]
    last_frame_ms: Option<f64>,
}

impl Motion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position in `[0, 1]`.
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn last_frame_ms(&self) -> Option<f64> {
        self.last_frame_ms
    }

    /// Forgets the previous frame so the next one contributes no elapsed time.
    pub fn reset_clock(&mut self) {
        self.last_frame_ms = None;
    }

    /// Integrates up to the frame at `timestamp_ms` (a monotonic millisecond
    /// clock such as `requestAnimationFrame`'s) and returns the new position.
    pub fn step(&mut self, timestamp_ms: f64, tempo: Tempo) -> f64 {
        let last = self.last_frame_ms.unwrap_or(timestamp_ms);
        self.last_frame_ms = Some(timestamp_ms);

        let dt = ((timestamp_ms - last) / 1000.0).max(0.0);
        self.advance(tempo.traversal_rate() * dt);
        self.position
    }

    /// Moves `distance` position units in the current direction, bouncing
    /// off the track ends.
    pub fn advance(&mut self, distance: f64) {
        let next = self.position + self.direction.sign() * distance;

        if next >= 1.0 {
            self.position = 1.0;
            self.direction = Direction::Backward;
        } else if next <= 0.0 {
            self.position = 0.0;
            self.direction = Direction::Forward;
        } else {
            self.position = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIXTY: Tempo = Tempo::from_bpm(60.0);

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn first_frame_contributes_no_time() {
        let mut motion = Motion::new();
        assert_eq!(motion.step(123_456.0, SIXTY), 0.0);
        assert_eq!(motion.direction(), Direction::Forward);
        assert_eq!(motion.last_frame_ms(), Some(123_456.0));
    }

    #[test]
    fn half_and_full_sweep_at_sixty_bpm() {
        let mut motion = Motion::new();
        motion.step(1000.0, SIXTY);

        assert!(approx(motion.step(1500.0, SIXTY), 0.5));
        assert_eq!(motion.direction(), Direction::Forward);

        assert_eq!(motion.step(2000.0, SIXTY), 1.0);
        assert_eq!(motion.direction(), Direction::Backward);

        assert!(approx(motion.step(2250.0, SIXTY), 0.75));
        assert_eq!(motion.direction(), Direction::Backward);
    }

    #[test]
    fn overshoot_clamps_and_flips() {
        let mut motion = Motion::new();
        motion.advance(0.9);
        motion.advance(0.5);
        assert_eq!(motion.position(), 1.0);
        assert_eq!(motion.direction(), Direction::Backward);

        motion.advance(3.0);
        assert_eq!(motion.position(), 0.0);
        assert_eq!(motion.direction(), Direction::Forward);
    }

    #[test]
    fn matches_clamped_integration_formula() {
        let tempos = [30.0, 60.0, 97.0, 180.0, 240.0];
        let deltas = [0.0, 0.004, 0.016, 0.033, 0.25, 0.7];

        for bpm in tempos {
            let tempo = Tempo::from_bpm(bpm);
            let mut motion = Motion::new();
            let mut clock = 0.0;
            motion.step(clock, tempo);

            for _ in 0..40 {
                for dt in deltas {
                    let p = motion.position();
                    let d = motion.direction();
                    let previous = clock;
                    clock += dt * 1000.0;
                    let elapsed = (clock - previous) / 1000.0;
                    let unclamped = p + d.sign() * (tempo.traversal_rate() * elapsed);

                    let next = motion.step(clock, tempo);

                    assert!(approx(next, unclamped.clamp(0.0, 1.0)), "{bpm} {dt}");
                    assert!((0.0..=1.0).contains(&next));
                    if unclamped >= 1.0 {
                        assert_eq!(motion.direction(), Direction::Backward);
                    } else if unclamped <= 0.0 {
                        assert_eq!(motion.direction(), Direction::Forward);
                    } else {
                        assert_eq!(motion.direction(), d);
                    }
                }
            }
        }
    }

    #[test]
    fn clock_going_backwards_does_not_move() {
        let mut motion = Motion::new();
        motion.step(500.0, SIXTY);
        motion.step(700.0, SIXTY);
        let before = motion.position();

        assert_eq!(motion.step(100.0, SIXTY), before);
    }

    #[test]
    fn reset_clock_drops_elapsed_time() {
        let mut motion = Motion::new();
        motion.step(0.0, SIXTY);
        motion.step(250.0, SIXTY);
        motion.reset_clock();

        assert!(approx(motion.step(9_000.0, SIXTY), 0.25));
    }
}
