use std::time::Duration;

use crate::{BeatCue, Tempo};

/// Host facility that fires a callback repeatedly at a fixed period.
///
/// The first firing happens one period after [`PulseTimer::every`] returns,
/// matching `setInterval`. Handles are opaque to the scheduler; cancelling a
/// handle that already stopped must be harmless.
pub trait PulseTimer {
    type Handle: std::fmt::Debug;

    fn every(&mut self, period: Duration) -> Self::Handle;

    fn cancel(&mut self, handle: Self::Handle);
}

/// Keeps the heartbeat cue in step with the tempo.
///
/// Owns the timer and the cue so that a pulse can never outlive the cue it
/// replays. The host timer only decides *when*; it calls back into
/// [`BeatScheduler::pulse`] which does the rewinding and playing.
#[derive(Debug)]
pub struct BeatScheduler<T: PulseTimer, C> {
    timer: T,
    cue: C,
    handle: Option<T::Handle>,
    interval: Option<Duration>,
    pulses: u64,
}

impl<T: PulseTimer, C: BeatCue> BeatScheduler<T, C> {
    pub fn new(timer: T, cue: C) -> Self {
        Self {
            timer,
            cue,
            handle: None,
            interval: None,
            pulses: 0,
        }
    }

    /// Replaces any running pulse with one at the tempo's interval. A cue
    /// still sounding from the old pulse is cut off.
    pub fn start_beats(&mut self, tempo: Tempo) {
        self.stop_beats();

        let interval = tempo.beat_interval();
        self.handle = Some(self.timer.every(interval));
        self.interval = Some(interval);
        tracing::debug!(interval_ms = tempo.interval_ms(), "beat pulse scheduled");
    }

    /// Cancels the pulse (if any) and silences the cue.
    pub fn stop_beats(&mut self) {
        self.cancel_pulse();
        self.cue.pause();
        self.cue.rewind();
    }

    /// Replays the cue from time zero. Invoked by the host on every tick of
    /// the pulse timer.
    pub fn pulse(&mut self) {
        self.pulses += 1;
        self.cue.rewind();
        if let Err(err) = self.cue.play() {
            tracing::debug!(%err, pulse = self.pulses, "beat cue did not play");
        } else {
            tracing::trace!(pulse = self.pulses, "beat");
        }
    }

    pub fn is_pulsing(&self) -> bool {
        self.handle.is_some()
    }

    /// Period of the active pulse.
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Pulses fired since creation.
    pub fn pulses(&self) -> u64 {
        self.pulses
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn cue(&self) -> &C {
        &self.cue
    }

    fn cancel_pulse(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.timer.cancel(handle);
        }
        self.interval = None;
    }
}
