use std::time::Duration;

use metronome_core::{
    Direction, Flow, Metronome, MetronomeConfig, MetronomeError, RecordingCue, Result, Surface,
    TaskQueue,
};
use serde::{Deserialize, Serialize};

/// A tempo change applied at a point in simulated time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoChange {
    pub at_seconds: f64,
    pub bpm: f64,
}

/// Parses `SECONDS=BPM`, e.g. `2.5=120`.
pub fn parse_tempo_change(raw: &str) -> std::result::Result<TempoChange, String> {
    let (at, bpm) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SECONDS=BPM, got `{raw}`"))?;
    let at_seconds = at
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("bad time `{at}`: {err}"))?;
    let bpm = bpm
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("bad tempo `{bpm}`: {err}"))?;
    if at_seconds < 0.0 {
        return Err("tempo changes cannot happen before the start".to_string());
    }
    Ok(TempoChange { at_seconds, bpm })
}

#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub tempo_bpm: f64,
    pub seconds: f64,
    pub fps: u32,
    pub stage_width: f64,
    pub indicator_width: f64,
    pub changes: Vec<TempoChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceFrame {
    pub time_ms: f64,
    pub tempo_bpm: f64,
    pub position: f64,
    pub direction: Direction,
    pub offset: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    pub frames: Vec<TraceFrame>,
    pub beats_ms: Vec<f64>,
}

/// Fixed-size surface remembering the last offset.
#[derive(Debug, Clone)]
struct VirtualStage {
    width: f64,
    indicator: f64,
    offset: f64,
}

impl Surface for VirtualStage {
    fn stage_width(&self) -> f64 {
        self.width
    }

    fn indicator_width(&self) -> f64 {
        self.indicator
    }

    fn place_indicator(&mut self, x: f64) {
        self.offset = x;
    }
}

/// Runs the metronome against a synthetic clock: frames at a fixed rate,
/// pulses at their exact deadlines.
pub fn simulate(config: &MetronomeConfig, plan: &SimulationPlan) -> Result<Trace> {
    if plan.fps == 0 {
        return Err(MetronomeError::msg("frame rate must be at least 1"));
    }
    if !(plan.seconds >= 0.0 && plan.seconds.is_finite()) {
        return Err(MetronomeError::msg("duration must be a non-negative number"));
    }

    let stage = VirtualStage {
        width: plan.stage_width,
        indicator: plan.indicator_width,
        offset: 0.0,
    };
    let mut metronome = Metronome::new(config, TaskQueue::new(), RecordingCue::new(), stage);
    metronome.set_tempo(plan.tempo_bpm);

    let mut changes = plan.changes.clone();
    changes.sort_by(|a, b| a.at_seconds.total_cmp(&b.at_seconds));
    let mut changes = changes.into_iter().peekable();

    let frame_ms = 1000.0 / f64::from(plan.fps);
    let end_ms = plan.seconds * 1000.0;
    let mut trace = Trace::default();

    metronome.start();
    let mut frame = 0u64;
    loop {
        let now_ms = frame as f64 * frame_ms;
        if now_ms > end_ms {
            break;
        }
        let now = from_millis(now_ms);

        while let Some(change) = changes.next_if(|change| change.at_seconds * 1000.0 <= now_ms) {
            let at = from_millis(change.at_seconds * 1000.0);
            fire_pulses_until(&mut metronome, &mut trace.beats_ms, at);
            metronome.sync_clock(at);
            metronome.set_tempo(change.bpm);
        }
        fire_pulses_until(&mut metronome, &mut trace.beats_ms, now);

        if metronome.step(now_ms) == Flow::Halt {
            break;
        }
        trace.frames.push(TraceFrame {
            time_ms: now_ms,
            tempo_bpm: metronome.tempo().bpm(),
            position: metronome.position(),
            direction: metronome.direction(),
            offset: metronome.surface().offset,
        });
        frame += 1;
    }

    metronome.stop();
    tracing::info!(
        frames = trace.frames.len(),
        beats = trace.beats_ms.len(),
        "simulation finished"
    );
    Ok(trace)
}

/// Nanosecond-rounded duration, so decimal inputs like 0.3 s land exactly.
fn from_millis(ms: f64) -> Duration {
    Duration::from_nanos((ms * 1e6).round() as u64)
}

/// Fires every pulse due at or before `until`, each at its own deadline.
fn fire_pulses_until(
    metronome: &mut Metronome<TaskQueue, RecordingCue, VirtualStage>,
    beats_ms: &mut Vec<f64>,
    until: Duration,
) {
    while let Some(due) = metronome.next_pulse_due().filter(|due| *due <= until) {
        metronome.run_due_pulses(due);
        beats_ms.push(due.as_nanos() as f64 / 1e6);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(tempo_bpm: f64, seconds: f64) -> SimulationPlan {
        SimulationPlan {
            tempo_bpm,
            seconds,
            fps: 4,
            stage_width: 300.0,
            indicator_width: 20.0,
            changes: Vec::new(),
        }
    }

    #[test]
    fn beats_land_on_the_interval() {
        let trace = simulate(&MetronomeConfig::default(), &plan(60.0, 3.0)).unwrap();
        assert_eq!(trace.beats_ms, vec![1000.0, 2000.0, 3000.0]);
    }

    #[test]
    fn frames_follow_the_sweep() {
        let trace = simulate(&MetronomeConfig::default(), &plan(60.0, 1.0)).unwrap();
        let positions: Vec<f64> = trace.frames.iter().map(|f| f.position).collect();
        assert_eq!(positions, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(trace.frames[2].offset, 140.0);
        assert_eq!(trace.frames[4].direction, Direction::Backward);
    }

    #[test]
    fn tempo_change_takes_effect_at_once() {
        let mut plan = plan(60.0, 2.0);
        plan.changes.push(TempoChange {
            at_seconds: 0.25,
            bpm: 120.0,
        });

        let trace = simulate(&MetronomeConfig::default(), &plan).unwrap();
        assert_eq!(trace.beats_ms, vec![750.0, 1250.0, 1750.0]);
    }

    #[test]
    fn tempo_change_between_frames_counts_from_its_own_time() {
        let mut plan = plan(60.0, 2.0);
        plan.changes.push(TempoChange {
            at_seconds: 0.3,
            bpm: 120.0,
        });

        let trace = simulate(&MetronomeConfig::default(), &plan).unwrap();
        assert_eq!(trace.beats_ms, vec![800.0, 1300.0, 1800.0]);
    }

    #[test]
    fn pulses_due_before_a_change_still_fire() {
        let mut plan = plan(120.0, 1.0);
        plan.changes.push(TempoChange {
            at_seconds: 0.6,
            bpm: 60.0,
        });

        let trace = simulate(&MetronomeConfig::default(), &plan).unwrap();
        assert_eq!(trace.beats_ms, vec![500.0]);
    }

    #[test]
    fn parses_tempo_changes() {
        assert_eq!(
            parse_tempo_change("2.5=120").unwrap(),
            TempoChange {
                at_seconds: 2.5,
                bpm: 120.0
            }
        );
        assert!(parse_tempo_change("120").is_err());
        assert!(parse_tempo_change("-1=90").is_err());
    }

    #[test]
    fn rejects_zero_fps() {
        let mut plan = plan(60.0, 1.0);
        plan.fps = 0;
        assert!(simulate(&MetronomeConfig::default(), &plan).is_err());
    }
}
