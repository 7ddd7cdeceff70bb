use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::prelude::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlCanvasElement, MouseEvent, TouchEvent};

use crate::app;
use crate::state::State;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Down,
    Move,
    Up,
}

/// The unified pointer representation used internally regardless of input
/// source. Coordinates are surface-local CSS pixels, floored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ScratchEvent {
    pub phase: Phase,
    pub x: i32,
    pub y: i32,
}

pub fn local_point(client_x: f64, client_y: f64, origin_x: f64, origin_y: f64) -> (i32, i32) {
    (
        (client_x - origin_x).floor() as i32,
        (client_y - origin_y).floor() as i32,
    )
}

/// Retained listener closures. Unlike fire-and-forget `forget()` handlers,
/// these are kept so `destroy()` can unhook every source.
pub struct Listeners {
    canvas: HtmlCanvasElement,
    document: Document,
    mouse_down: Closure<dyn FnMut(MouseEvent)>,
    mouse_move: Closure<dyn FnMut(MouseEvent)>,
    mouse_up: Closure<dyn FnMut(MouseEvent)>,
    touch_start: Closure<dyn FnMut(TouchEvent)>,
    touch_move: Closure<dyn FnMut(TouchEvent)>,
    touch_end: Closure<dyn FnMut(TouchEvent)>,
    touch_cancel: Closure<dyn FnMut(TouchEvent)>,
}

/// Hook up mouse and touch sources. Mouse up is observed on the document so
/// a stroke ends even when the pointer is released outside the surface.
/// Touch events feed the same canonical path, built directly from the first
/// changed touch point; no synthetic mouse events are dispatched.
pub fn attach(
    document: &Document,
    canvas: &HtmlCanvasElement,
    state: &Rc<RefCell<State>>,
) -> Result<Listeners, JsValue> {
    let mouse_down = {
        let state = Rc::clone(state);
        Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            app::pointer_down(
                &state,
                f64::from(event.client_x()),
                f64::from(event.client_y()),
            );
        })
    };
    let mouse_move = {
        let state = Rc::clone(state);
        Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            app::pointer_move(
                &state,
                f64::from(event.client_x()),
                f64::from(event.client_y()),
            );
        })
    };
    let mouse_up = {
        let state = Rc::clone(state);
        Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            app::pointer_up(
                &state,
                f64::from(event.client_x()),
                f64::from(event.client_y()),
            );
        })
    };

    let touch_start = {
        let state = Rc::clone(state);
        Closure::<dyn FnMut(TouchEvent)>::new(move |event: TouchEvent| {
            let Some((x, y)) = first_touch_point(&event) else {
                return;
            };
            event.prevent_default();
            app::pointer_down(&state, x, y);
        })
    };
    let touch_move = {
        let state = Rc::clone(state);
        Closure::<dyn FnMut(TouchEvent)>::new(move |event: TouchEvent| {
            let Some((x, y)) = first_touch_point(&event) else {
                return;
            };
            event.prevent_default();
            app::pointer_move(&state, x, y);
        })
    };
    let touch_end = {
        let state = Rc::clone(state);
        Closure::<dyn FnMut(TouchEvent)>::new(move |event: TouchEvent| {
            let Some((x, y)) = first_touch_point(&event) else {
                return;
            };
            app::pointer_up(&state, x, y);
        })
    };
    let touch_cancel = {
        let state = Rc::clone(state);
        Closure::<dyn FnMut(TouchEvent)>::new(move |event: TouchEvent| {
            let Some((x, y)) = first_touch_point(&event) else {
                return;
            };
            app::pointer_up(&state, x, y);
        })
    };

    canvas.add_event_listener_with_callback("mousedown", mouse_down.as_ref().unchecked_ref())?;
    canvas.add_event_listener_with_callback("mousemove", mouse_move.as_ref().unchecked_ref())?;
    document.add_event_listener_with_callback("mouseup", mouse_up.as_ref().unchecked_ref())?;
    canvas.add_event_listener_with_callback("touchstart", touch_start.as_ref().unchecked_ref())?;
    canvas.add_event_listener_with_callback("touchmove", touch_move.as_ref().unchecked_ref())?;
    canvas.add_event_listener_with_callback("touchend", touch_end.as_ref().unchecked_ref())?;
    canvas
        .add_event_listener_with_callback("touchcancel", touch_cancel.as_ref().unchecked_ref())?;

    Ok(Listeners {
        canvas: canvas.clone(),
        document: document.clone(),
        mouse_down,
        mouse_move,
        mouse_up,
        touch_start,
        touch_move,
        touch_end,
        touch_cancel,
    })
}

fn first_touch_point(event: &TouchEvent) -> Option<(f64, f64)> {
    let touch = event.changed_touches().get(0)?;
    Some((f64::from(touch.client_x()), f64::from(touch.client_y())))
}

impl Listeners {
    pub fn detach(&self) {
        let _ = self.canvas.remove_event_listener_with_callback(
            "mousedown",
            self.mouse_down.as_ref().unchecked_ref(),
        );
        let _ = self.canvas.remove_event_listener_with_callback(
            "mousemove",
            self.mouse_move.as_ref().unchecked_ref(),
        );
        let _ = self
            .document
            .remove_event_listener_with_callback("mouseup", self.mouse_up.as_ref().unchecked_ref());
        let _ = self.canvas.remove_event_listener_with_callback(
            "touchstart",
            self.touch_start.as_ref().unchecked_ref(),
        );
        let _ = self.canvas.remove_event_listener_with_callback(
            "touchmove",
            self.touch_move.as_ref().unchecked_ref(),
        );
        let _ = self.canvas.remove_event_listener_with_callback(
            "touchend",
            self.touch_end.as_ref().unchecked_ref(),
        );
        let _ = self.canvas.remove_event_listener_with_callback(
            "touchcancel",
            self.touch_cancel.as_ref().unchecked_ref(),
        );
    }
}
