use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    BeatCue, BeatScheduler, Direction, MetronomeConfig, Motion, OverflowMenu, PulseTimer, Renderer,
    Surface, TaskQueue, Tempo, TempoRange,
};

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The metronome was stopped and is now running. The driver must request
    /// the first frame.
    Started,
    AlreadyRunning,
}

/// Result of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    AlreadyStopped,
}

/// Whether the frame driver should schedule another frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt,
}

/// Serializable view of the metronome at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub running: bool,
    pub tempo_bpm: f64,
    pub position: f64,
    pub direction: Direction,
}

/// Owns all metronome state and wires user actions to the beat scheduler,
/// the motion integrator and the renderer.
///
/// Front ends supply three host capabilities: a [`PulseTimer`] for the beat,
/// a [`BeatCue`] to sound it and a [`Surface`] to draw on. The frame loop
/// stays with the front end: it calls [`Metronome::step`] with each frame
/// timestamp and keeps requesting frames while the answer is
/// [`Flow::Continue`].
#[derive(Debug)]
pub struct Metronome<T: PulseTimer, C, S> {
    running: bool,
    tempo: Tempo,
    range: TempoRange,
    motion: Motion,
    beats: BeatScheduler<T, C>,
    renderer: Renderer,
    surface: S,
    menu: OverflowMenu,
}

impl<T, C, S> Metronome<T, C, S>
where
    T: PulseTimer,
    C: BeatCue,
    S: Surface,
{
    /// Builds a stopped metronome at the configured default tempo and draws
    /// the indicator at its resting position.
    pub fn new(config: &MetronomeConfig, timer: T, cue: C, surface: S) -> Self {
        let mut metronome = Self {
            running: false,
            tempo: config.tempo.default_tempo(),
            range: config.tempo,
            motion: Motion::new(),
            beats: BeatScheduler::new(timer, cue),
            renderer: Renderer::new(config.stage.inset_px),
            surface,
            menu: OverflowMenu::new(),
        };
        metronome.render();
        metronome
    }

    pub fn start(&mut self) -> StartOutcome {
        if self.running {
            return StartOutcome::AlreadyRunning;
        }

        self.running = true;
        self.motion.reset_clock();
        self.beats.start_beats(self.tempo);
        tracing::debug!(tempo = %self.tempo, "metronome started");
        StartOutcome::Started
    }

    pub fn stop(&mut self) -> StopOutcome {
        if !self.running {
            return StopOutcome::AlreadyStopped;
        }

        self.running = false;
        self.beats.stop_beats();
        tracing::debug!(position = self.motion.position(), "metronome stopped");
        StopOutcome::Stopped
    }

    /// Start/stop button action. Returns `true` when the driver must request
    /// the first frame.
    pub fn toggle(&mut self) -> bool {
        if self.running {
            self.stop();
            false
        } else {
            self.start() == StartOutcome::Started
        }
    }

    /// Applies a tempo from the tempo control. A running pulse is replaced at
    /// once so the new interval takes effect without waiting for the old one.
    pub fn set_tempo(&mut self, bpm: f64) -> Tempo {
        self.tempo = self.range.snap(bpm);
        if self.running {
            self.beats.start_beats(self.tempo);
        }
        tracing::debug!(tempo = %self.tempo, running = self.running, "tempo changed");
        self.tempo
    }

    /// Moves the tempo by whole control steps.
    pub fn nudge_tempo(&mut self, steps: i32) -> Tempo {
        let next = self.range.nudge(self.tempo, steps);
        self.set_tempo(next.bpm())
    }

    /// One frame of the animation loop.
    pub fn step(&mut self, timestamp_ms: f64) -> Flow {
        if !self.running {
            return Flow::Halt;
        }

        let position = self.motion.step(timestamp_ms, self.tempo);
        self.renderer.render(&mut self.surface, position);

        if self.running {
            Flow::Continue
        } else {
            Flow::Halt
        }
    }

    /// Host timer callback for the beat pulse.
    pub fn on_pulse(&mut self) {
        self.beats.pulse();
    }

    /// Redraws the indicator at the current position, e.g. after a resize.
    pub fn render(&mut self) -> f64 {
        self.renderer
            .render(&mut self.surface, self.motion.position())
    }

    pub fn toggle_menu(&mut self) -> bool {
        self.menu.toggle()
    }

    /// Page click handler for closing the menu. Returns whether it closed.
    pub fn dismiss_menu(&mut self, inside_menu: bool, on_trigger: bool) -> bool {
        self.menu.dismiss(inside_menu, on_trigger)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn tempo_range(&self) -> &TempoRange {
        &self.range
    }

    pub fn tempo_label(&self) -> String {
        self.tempo.label()
    }

    /// Text for the start/stop button.
    pub fn button_label(&self) -> &'static str {
        if self.running {
            "Stop"
        } else {
            "Start"
        }
    }

    pub fn position(&self) -> f64 {
        self.motion.position()
    }

    pub fn direction(&self) -> Direction {
        self.motion.direction()
    }

    pub fn beats(&self) -> &BeatScheduler<T, C> {
        &self.beats
    }

    pub fn menu(&self) -> &OverflowMenu {
        &self.menu
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            running: self.running,
            tempo_bpm: self.tempo.bpm(),
            position: self.motion.position(),
            direction: self.motion.direction(),
        }
    }
}

impl<C, S> Metronome<TaskQueue, C, S>
where
    C: BeatCue,
    S: Surface,
{
    /// Advances the pulse clock to `now` and fires every pulse that became
    /// due. Returns the number of pulses fired.
    pub fn run_due_pulses(&mut self, now: Duration) -> usize {
        self.beats.timer_mut().set_now(now);

        let mut fired = 0;
        while self.beats.timer_mut().pop_due().is_some() {
            self.beats.pulse();
            fired += 1;
        }
        fired
    }

    /// Moves the pulse clock without firing anything. Drivers call this
    /// before applying user input so rescheduling counts from the right time.
    pub fn sync_clock(&mut self, now: Duration) {
        self.beats.timer_mut().set_now(now);
    }

    pub fn next_pulse_due(&self) -> Option<Duration> {
        self.beats.timer().next_due()
    }
}
