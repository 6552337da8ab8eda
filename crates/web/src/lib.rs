//! Browser front end for the Heartbeat Metronome.
//!
//! Binds [`metronome_core::Metronome`] to the page: the stage and dot, the
//! start/stop button, the overflow menu, the tempo slider and label, and the
//! heartbeat `<audio>` element. Beat pulses run on `setInterval`, motion on
//! `requestAnimationFrame`.
//!
//! Build with `wasm-pack build --target web crates/web` and load the module
//! from a page that provides the elements listed in [`ElementIds`].

// This crate only runs in the browser; suppress dead-code warnings when
// checking on a native host target.
#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use metronome_core::{Metronome, MetronomeConfig, HIDDEN_CLASS};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Event, HtmlAudioElement, HtmlElement, HtmlInputElement, Node};

pub mod dom;
pub mod timers;

use dom::{DomStage, MediaCue};
use timers::{FrameLoop, IntervalTimer};

type WebMetronome = Metronome<IntervalTimer, MediaCue, DomStage>;

/// `id` attributes of the elements the page must provide.
#[derive(Debug, Clone, Copy)]
pub struct ElementIds {
    pub stage: &'static str,
    pub dot: &'static str,
    pub start_stop: &'static str,
    pub menu_button: &'static str,
    pub menu: &'static str,
    pub speed_range: &'static str,
    pub speed_label: &'static str,
    pub heartbeat: &'static str,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            stage: "stage",
            dot: "dot",
            start_stop: "startStop",
            menu_button: "menuBtn",
            menu: "menu",
            speed_range: "speedRange",
            speed_label: "speedLabel",
            heartbeat: "heartbeat",
        }
    }
}

/// Everything the event handlers touch.
struct Page {
    metronome: WebMetronome,
    start_stop: HtmlElement,
    menu_button: HtmlElement,
    menu: HtmlElement,
    speed_range: HtmlInputElement,
    speed_label: HtmlElement,
}

impl Page {
    fn show_running_state(&self) {
        self.start_stop
            .set_text_content(Some(self.metronome.button_label()));
    }

    fn show_tempo(&self) {
        self.speed_label
            .set_text_content(Some(&self.metronome.tempo_label()));
    }

    fn show_menu(&self) {
        let open = self.metronome.menu().is_open();
        let _ = self
            .menu
            .class_list()
            .toggle_with_force(HIDDEN_CLASS, !open);
        let _ = self
            .menu
            .set_attribute("aria-hidden", self.metronome.menu().aria_hidden());
    }
}

/// Entry point, run by `wasm_bindgen(start)` once the module loads.
#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    mount(&document, ElementIds::default())
}

/// Wires the metronome into `document`.
pub fn mount(document: &Document, ids: ElementIds) -> Result<(), JsValue> {
    let stage: HtmlElement = element(document, ids.stage)?;
    let dot: HtmlElement = element(document, ids.dot)?;
    let start_stop: HtmlElement = element(document, ids.start_stop)?;
    let menu_button: HtmlElement = element(document, ids.menu_button)?;
    let menu: HtmlElement = element(document, ids.menu)?;
    let speed_range: HtmlInputElement = element(document, ids.speed_range)?;
    let speed_label: HtmlElement = element(document, ids.speed_label)?;
    let heartbeat: HtmlAudioElement = element(document, ids.heartbeat)?;

    let config = MetronomeConfig {
        tempo: dom::tempo_range_of(&speed_range),
        ..Default::default()
    };

    let page = Rc::new_cyclic(|weak: &Weak<RefCell<Page>>| {
        let weak = weak.clone();
        let on_pulse = Closure::<dyn FnMut()>::new(move || {
            if let Some(page) = weak.upgrade() {
                page.borrow_mut().metronome.on_pulse();
            }
        });

        let metronome = Metronome::new(
            &config,
            IntervalTimer::new(on_pulse),
            MediaCue::new(heartbeat),
            DomStage::new(stage, dot),
        );
        RefCell::new(Page {
            metronome,
            start_stop,
            menu_button,
            menu,
            speed_range,
            speed_label,
        })
    });

    let frames = {
        let page = Rc::clone(&page);
        FrameLoop::new(move |timestamp_ms| page.borrow_mut().metronome.step(timestamp_ms))
    };

    {
        let page = page.borrow();
        page.show_tempo();
        page.show_running_state();
        page.show_menu();
    }

    let target = page.borrow().start_stop.clone();
    listen(&target, "click", {
        let page = Rc::clone(&page);
        let frames = frames.clone();
        move |_| {
            let mut page = page.borrow_mut();
            if page.metronome.toggle() {
                frames.request();
            }
            page.show_running_state();
        }
    })?;

    let target = page.borrow().menu_button.clone();
    listen(&target, "click", {
        let page = Rc::clone(&page);
        move |_| {
            let mut page = page.borrow_mut();
            page.metronome.toggle_menu();
            page.show_menu();
        }
    })?;

    listen(document, "click", {
        let page = Rc::clone(&page);
        move |event: Event| {
            let Some(node) = event.target().and_then(|t| t.dyn_into::<Node>().ok()) else {
                return;
            };
            let mut page = page.borrow_mut();
            let inside_menu = page.menu.contains(Some(&node));
            let on_trigger = page.menu_button.contains(Some(&node));
            if page.metronome.dismiss_menu(inside_menu, on_trigger) {
                page.show_menu();
            }
        }
    })?;

    let target = page.borrow().speed_range.clone();
    listen(&target, "input", {
        let page = Rc::clone(&page);
        move |_| {
            let mut page = page.borrow_mut();
            let raw = page.speed_range.value();
            match raw.trim().parse::<f64>() {
                Ok(bpm) => {
                    page.metronome.set_tempo(bpm);
                    page.show_tempo();
                }
                Err(err) => tracing::debug!(%err, raw = %raw, "ignoring tempo input"),
            }
        }
    })?;

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    listen(&window, "resize", {
        let page = Rc::clone(&page);
        move |_| {
            page.borrow_mut().metronome.render();
        }
    })?;

    Ok(())
}

fn element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing element #{id}")))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("element #{id} has an unexpected type")))
}

/// Registers a page-lifetime event listener.
fn listen(
    target: &web_sys::EventTarget,
    event: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    // Listeners stay registered until the page unloads.
    closure.forget();
    Ok(())
}
