//! `setInterval` beat pulses and the `requestAnimationFrame` frame loop.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    time::Duration,
};

use metronome_core::{Flow, PulseTimer};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

// Global bindings instead of `web_sys::Window` methods, so no Window lookup
// (and no unwrapping) happens per frame or per pulse.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "setInterval")]
    fn set_interval(callback: &JsValue, timeout_ms: f64) -> i32;

    #[wasm_bindgen(js_name = "clearInterval")]
    fn clear_interval(id: i32);
}

/// [`PulseTimer`] backed by `setInterval`. Every tick invokes the same JS
/// closure, which forwards to the metronome.
pub struct IntervalTimer {
    on_pulse: Closure<dyn FnMut()>,
}

impl IntervalTimer {
    pub fn new(on_pulse: Closure<dyn FnMut()>) -> Self {
        Self { on_pulse }
    }
}

impl PulseTimer for IntervalTimer {
    type Handle = i32;

    fn every(&mut self, period: Duration) -> i32 {
        set_interval(self.on_pulse.as_ref(), period.as_secs_f64() * 1000.0)
    }

    fn cancel(&mut self, handle: i32) {
        clear_interval(handle);
    }
}

impl std::fmt::Debug for IntervalTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntervalTimer").finish_non_exhaustive()
    }
}

type FrameClosure = Closure<dyn FnMut(f64)>;

struct FrameInner {
    /// Registered with `requestAnimationFrame`; refers to itself through the
    /// `Rc`, so it lives as long as the page.
    closure: RefCell<Option<FrameClosure>>,
    /// A callback is queued with the browser.
    pending: Cell<bool>,
}

/// `requestAnimationFrame` driver.
///
/// The per-frame callback reports a [`Flow`]; the loop re-arms only on
/// [`Flow::Continue`]. At most one callback is queued at a time, so a quick
/// stop/start cannot fork a second loop.
#[derive(Clone)]
pub struct FrameLoop {
    inner: Rc<FrameInner>,
}

impl FrameLoop {
    pub fn new(mut on_frame: impl FnMut(f64) -> Flow + 'static) -> Self {
        let inner = Rc::new(FrameInner {
            closure: RefCell::new(None),
            pending: Cell::new(false),
        });

        let weak = Rc::downgrade(&inner);
        let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.pending.set(false);

            if on_frame(timestamp_ms) == Flow::Continue {
                FrameLoop::arm(&inner);
            }
        }) as Box<dyn FnMut(f64)>);
        *inner.closure.borrow_mut() = Some(closure);

        Self { inner }
    }

    /// Queues the next frame unless one is already queued.
    pub fn request(&self) {
        Self::arm(&self.inner);
    }

    fn arm(inner: &FrameInner) {
        if inner.pending.get() {
            return;
        }
        if let Some(closure) = inner.closure.borrow().as_ref() {
            request_animation_frame(closure.as_ref());
            inner.pending.set(true);
        }
    }
}

impl std::fmt::Debug for FrameLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameLoop")
            .field("pending", &self.inner.pending.get())
            .finish()
    }
}
