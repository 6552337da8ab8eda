use crate::Result;

/// Audible cue replayed on every beat pulse.
///
/// Implementations wrap whatever the host offers for short sound playback: an
/// `<audio>` element in the browser, an output sink on the desktop.
pub trait BeatCue {
    /// Moves the playhead back to the start of the cue.
    fn rewind(&mut self);

    /// Starts playback from the current playhead. Hosts may refuse (autoplay
    /// policies, missing devices); callers decide whether that matters.
    fn play(&mut self) -> Result<()>;

    /// Stops any playback in progress without rewinding.
    fn pause(&mut self);
}

impl<C: BeatCue + ?Sized> BeatCue for Box<C> {
    fn rewind(&mut self) {
        (**self).rewind();
    }

    fn play(&mut self) -> Result<()> {
        (**self).play()
    }

    fn pause(&mut self) {
        (**self).pause();
    }
}

/// Cue that never makes a sound. Used when audio is muted or unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentCue;

impl BeatCue for SilentCue {
    fn rewind(&mut self) {}

    fn play(&mut self) -> Result<()> {
        Ok(())
    }

    fn pause(&mut self) {}
}

/// What a [`RecordingCue`] was asked to do, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueAction {
    Rewind,
    Play,
    Pause,
}

/// Cue that remembers every call. Handy for headless drivers and tests that
/// need to observe when the heartbeat would have sounded.
#[derive(Debug, Default, Clone)]
pub struct RecordingCue {
    actions: Vec<CueAction>,
    reject_playback: bool,
}

impl RecordingCue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cue whose `play` always fails, like a browser blocking autoplay.
    pub fn rejecting() -> Self {
        Self {
            actions: Vec::new(),
            reject_playback: true,
        }
    }

    pub fn actions(&self) -> &[CueAction] {
        &self.actions
    }

    pub fn plays(&self) -> usize {
        self.actions
            .iter()
            .filter(|action| **action == CueAction::Play)
            .count()
    }
}

impl BeatCue for RecordingCue {
    fn rewind(&mut self) {
        self.actions.push(CueAction::Rewind);
    }

    fn play(&mut self) -> Result<()> {
        self.actions.push(CueAction::Play);
        if self.reject_playback {
            Err(crate::MetronomeError::Playback(
                "playback rejected by host".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn pause(&mut self) {
        self.actions.push(CueAction::Pause);
    }
}
