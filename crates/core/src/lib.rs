//! Core library for the Heartbeat Metronome.
//!
//! A dot sweeps across a stage once per beat while a heartbeat cue sounds on
//! every beat. This crate holds everything that does not depend on a host:
//! tempo arithmetic, the beat scheduler, the motion integrator, the renderer
//! and the controller tying them together. Hosts (the browser, the terminal)
//! plug in through three small traits: [`PulseTimer`], [`BeatCue`] and
//! [`Surface`].

pub mod audio;
pub mod beat;
pub mod config;
pub mod controller;
pub mod error;
pub mod menu;
pub mod motion;
pub mod render;
pub mod tempo;
pub mod timeline;

pub use audio::{BeatCue, CueAction, RecordingCue, SilentCue};
pub use beat::{BeatScheduler, PulseTimer};
pub use config::{MetronomeConfig, StageConfig};
pub use controller::{Flow, Metronome, Snapshot, StartOutcome, StopOutcome};
pub use error::{MetronomeError, Result};
pub use menu::{OverflowMenu, HIDDEN_CLASS};
pub use motion::{Direction, Motion};
pub use render::{Renderer, StageLayout, Surface};
pub use tempo::{Tempo, TempoRange};
pub use timeline::{TaskId, TaskQueue};
