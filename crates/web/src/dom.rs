//! DOM-backed [`Surface`] and [`BeatCue`].

use js_sys::Promise;
use metronome_core::{BeatCue, MetronomeError, Result, Surface, TempoRange};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsValue;
use web_sys::{HtmlAudioElement, HtmlElement, HtmlInputElement};

/// CSS transform for an indicator at horizontal offset `x`, vertically
/// centred on the stage.
pub fn indicator_transform(x: f64) -> String {
    format!("translate({x}px, -50%)")
}

/// The stage container and the dot moving inside it.
#[derive(Debug, Clone)]
pub struct DomStage {
    stage: HtmlElement,
    dot: HtmlElement,
}

impl DomStage {
    pub fn new(stage: HtmlElement, dot: HtmlElement) -> Self {
        Self { stage, dot }
    }
}

impl Surface for DomStage {
    fn stage_width(&self) -> f64 {
        f64::from(self.stage.client_width())
    }

    fn indicator_width(&self) -> f64 {
        f64::from(self.dot.client_width())
    }

    fn place_indicator(&mut self, x: f64) {
        let _ = self
            .dot
            .style()
            .set_property("transform", &indicator_transform(x));
    }
}

/// Heartbeat cue backed by an `<audio>` element.
pub struct MediaCue {
    audio: HtmlAudioElement,
    // Attached to every `play()` promise so autoplay refusals stay quiet.
    ignore_rejection: Closure<dyn FnMut(JsValue)>,
}

impl MediaCue {
    pub fn new(audio: HtmlAudioElement) -> Self {
        Self {
            audio,
            ignore_rejection: Closure::new(|_: JsValue| {}),
        }
    }
}

impl BeatCue for MediaCue {
    fn rewind(&mut self) {
        self.audio.set_current_time(0.0);
    }

    fn play(&mut self) -> Result<()> {
        let promise: Promise = self
            .audio
            .play()
            .map_err(|err| MetronomeError::Playback(format!("{err:?}")))?;
        let _ = promise.catch(&self.ignore_rejection);
        Ok(())
    }

    fn pause(&mut self) {
        let _ = self.audio.pause();
    }
}

impl std::fmt::Debug for MediaCue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaCue")
            .field("src", &self.audio.src())
            .finish()
    }
}

/// Reads the tempo bounds declared on the range input. Attributes that are
/// missing or unparsable keep their defaults.
pub fn tempo_range_of(input: &HtmlInputElement) -> TempoRange {
    tempo_range_from_attrs(&input.min(), &input.max(), &input.step(), &input.value())
}

pub fn tempo_range_from_attrs(min: &str, max: &str, step: &str, value: &str) -> TempoRange {
    let defaults = TempoRange::default();
    let parse = |raw: &str, fallback: f64| {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(fallback)
    };

    let min_bpm = parse(min, defaults.min_bpm);
    let max_bpm = parse(max, defaults.max_bpm).max(min_bpm);
    let step_bpm = parse(step, defaults.step_bpm);
    let default_bpm = parse(value, defaults.default_bpm).clamp(min_bpm, max_bpm);

    TempoRange {
        min_bpm,
        max_bpm,
        step_bpm,
        default_bpm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_keeps_vertical_centering() {
        assert_eq!(indicator_transform(140.0), "translate(140px, -50%)");
        assert_eq!(indicator_transform(20.5), "translate(20.5px, -50%)");
    }

    #[test]
    fn reads_range_attributes() {
        let range = tempo_range_from_attrs("40", "208", "2", "72");
        assert_eq!(range.min_bpm, 40.0);
        assert_eq!(range.max_bpm, 208.0);
        assert_eq!(range.step_bpm, 2.0);
        assert_eq!(range.default_tempo().bpm(), 72.0);
    }

    #[test]
    fn missing_attributes_fall_back() {
        let range = tempo_range_from_attrs("", "", "any", "");
        assert_eq!(range, TempoRange::default());

        let range = tempo_range_from_attrs("100", "80", "1", "10");
        assert_eq!(range.max_bpm, 100.0);
        assert_eq!(range.default_bpm, 100.0);
    }
}
