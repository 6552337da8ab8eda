use std::{f32::consts::TAU, time::Duration};

use metronome_core::{BeatCue, MetronomeError, Result};
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

const SAMPLE_RATE: u32 = 44_100;
const CUE_MS: u64 = 420;
const VOLUME: f32 = 0.8;

/// Heartbeat cue played through the default output device.
pub struct SpeakerCue {
    _stream: OutputStream,
    _handle: OutputStreamHandle,
    sink: Sink,
}

impl SpeakerCue {
    pub fn open() -> Result<Self> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|err| MetronomeError::Playback(err.to_string()))?;
        let sink = Sink::try_new(&handle).map_err(|err| MetronomeError::Playback(err.to_string()))?;
        sink.set_volume(VOLUME);
        sink.pause();

        Ok(Self {
            _stream: stream,
            _handle: handle,
            sink,
        })
    }
}

impl BeatCue for SpeakerCue {
    fn rewind(&mut self) {
        // Dropping the queued source is the only way to restart it.
        self.sink.clear();
    }

    fn play(&mut self) -> Result<()> {
        self.sink.append(Heartbeat::new());
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }
}

impl std::fmt::Debug for SpeakerCue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeakerCue")
            .field("queued", &self.sink.len())
            .finish()
    }
}

/// Synthesised "lub-dub": two decaying low thumps.
#[derive(Debug, Clone)]
pub struct Heartbeat {
    frame: u32,
}

impl Heartbeat {
    pub fn new() -> Self {
        Self { frame: 0 }
    }

    fn total_frames() -> u32 {
        (SAMPLE_RATE as u64 * CUE_MS / 1000) as u32
    }

    fn sample_at(t: f32) -> f32 {
        thump(t, 0.0, 58.0, 1.0) + thump(t, 0.17, 72.0, 0.7)
    }
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new()
    }
}

fn thump(t: f32, onset: f32, freq: f32, gain: f32) -> f32 {
    let local = t - onset;
    if local < 0.0 {
        return 0.0;
    }
    let attack = (local / 0.004).min(1.0);
    let decay = (-local * 28.0).exp();
    (TAU * freq * local).sin() * attack * decay * gain
}

impl Iterator for Heartbeat {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.frame >= Self::total_frames() {
            return None;
        }
        let t = self.frame as f32 / SAMPLE_RATE as f32;
        self.frame += 1;
        Some(Self::sample_at(t))
    }
}

impl Source for Heartbeat {
    fn current_frame_len(&self) -> Option<usize> {
        Some(Self::total_frames().saturating_sub(self.frame) as usize)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_millis(CUE_MS))
    }
}
