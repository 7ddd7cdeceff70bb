use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Function;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

use crate::dom;
use crate::input::{self, Listeners, Phase, ScratchEvent};
use crate::options::{self, Callbacks, Options};
use crate::reveal;
use crate::state::{State, StrokePhase};
use crate::stroke;
use crate::surface;

struct Pad {
    state: Rc<RefCell<State>>,
    listeners: Listeners,
}

/// A scratch-off surface attached to a container element.
///
/// The container gets two stacked layers: a background image element and the
/// erasable canvas. Dragging across the canvas erases the opaque coat and
/// reveals whatever the background layer shows.
#[wasm_bindgen]
pub struct ScratchPad {
    inner: Option<Pad>,
}

#[wasm_bindgen]
impl ScratchPad {
    /// Attach a scratch pad inside `container` and start listening for
    /// pointer and touch input. The container must be laid out (attached and
    /// sized) since its rendered size determines the surface dimensions.
    ///
    /// Recognized option keys can also be supplied as `data-<key>`
    /// attributes on the container; attributes win over the options object.
    #[wasm_bindgen(constructor)]
    pub fn new(container: HtmlElement, options: &JsValue) -> Result<ScratchPad, JsValue> {
        console_error_panic_hook::set_once();

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("Missing document"))?;

        let Some((canvas, ctx)) = surface::create_surface(&document) else {
            dom::render_unsupported(&container);
            return Ok(ScratchPad { inner: None });
        };

        let mut merged = Options::default();
        options::merge_js(&mut merged, options);
        options::merge_attributes(&mut merged, &container);
        let callbacks = Callbacks::from_js(options);

        dom::prepare_container(&container, &merged.cursor);
        dom::style_overlay(&canvas);
        let backdrop = dom::create_backdrop(&document)?;
        container.append_child(&backdrop)?;
        container.append_child(&canvas)?;

        let debug = dom::debug_enabled(&window);
        let state = Rc::new(RefCell::new(State {
            container,
            canvas: canvas.clone(),
            ctx,
            backdrop,
            options: merged,
            callbacks,
            width: 0.0,
            height: 0.0,
            pixels: 0.0,
            enabled: true,
            stroke: StrokePhase::Idle,
            debug,
        }));

        let listeners = input::attach(&document, &canvas, &state)?;
        surface::reset(&state);

        Ok(ScratchPad {
            inner: Some(Pad { state, listeners }),
        })
    }

    /// Resize to the container's current layout box and repaint both layers.
    pub fn reset(&self) {
        if let Some(pad) = &self.inner {
            surface::reset(&pad.state);
        }
    }

    /// Wipe the coat to fully transparent without repainting or resizing.
    pub fn clear(&self) {
        if let Some(pad) = &self.inner {
            surface::clear(&pad.state.borrow());
        }
    }

    /// Gate new strokes. Checked at Down only; an active stroke always runs
    /// to completion.
    pub fn enable(&self, enabled: bool) {
        if let Some(pad) = &self.inner {
            pad.state.borrow_mut().enabled = enabled;
        }
    }

    /// Fraction of the surface currently erased, 0 to 100.
    pub fn percent(&self) -> f64 {
        match &self.inner {
            Some(pad) => reveal::percent(&pad.state.borrow()),
            None => 0.0,
        }
    }

    /// Re-apply a single option. `fg`/`bg` changes trigger a repaint,
    /// `cursor` restyles the container, callback keys swap the handler.
    #[wasm_bindgen(js_name = setOption)]
    pub fn set_option(&self, key: &str, value: &JsValue) {
        let Some(pad) = &self.inner else {
            return;
        };
        match key {
            "scratchDown" => {
                pad.state.borrow_mut().callbacks.on_down = value.dyn_ref::<Function>().cloned();
            }
            "scratchMove" => {
                pad.state.borrow_mut().callbacks.on_move = value.dyn_ref::<Function>().cloned();
            }
            "scratchUp" => {
                pad.state.borrow_mut().callbacks.on_up = value.dyn_ref::<Function>().cloned();
            }
            _ => {
                let applied = {
                    let mut s = pad.state.borrow_mut();
                    match options::text_form(value) {
                        Some(raw) => options::apply(&mut s.options, key, &raw),
                        None => false,
                    }
                };
                if !applied {
                    return;
                }
                match key {
                    "fg" | "bg" => surface::reset(&pad.state),
                    "cursor" => {
                        let s = pad.state.borrow();
                        dom::set_cursor(&s.container, &s.options.cursor);
                    }
                    _ => {}
                }
            }
        }
    }

    /// Detach every listener and remove the created layers from the
    /// container. Every operation afterwards is a no-op.
    pub fn destroy(&mut self) {
        let Some(pad) = self.inner.take() else {
            return;
        };
        pad.listeners.detach();
        let s = pad.state.borrow();
        s.canvas.remove();
        s.backdrop.remove();
    }
}

impl ScratchPad {
    #[cfg(test)]
    pub(crate) fn state_for_tests(&self) -> Option<Rc<RefCell<State>>> {
        self.inner.as_ref().map(|pad| Rc::clone(&pad.state))
    }
}

/// Down: gate on enabled, capture the bounding-box origin for the stroke,
/// erase the initial dot.
pub(crate) fn pointer_down(state: &Rc<RefCell<State>>, client_x: f64, client_y: f64) {
    let mut s = state.borrow_mut();
    if !s.enabled || s.stroke_active() {
        return;
    }
    let rect = s.canvas.get_bounding_client_rect();
    let (origin_x, origin_y) = (rect.left(), rect.top());
    s.stroke = StrokePhase::Active { origin_x, origin_y };
    let (x, y) = input::local_point(client_x, client_y, origin_x, origin_y);
    stroke::begin(&s.ctx, &s.options, x, y);
    let percent = s.options.realtime.then(|| reveal::percent(&s));
    let callback = s.callbacks.on_down.clone();
    drop(s);
    invoke(
        callback,
        ScratchEvent {
            phase: Phase::Down,
            x,
            y,
        },
        percent,
    );
}

pub(crate) fn pointer_move(state: &Rc<RefCell<State>>, client_x: f64, client_y: f64) {
    let mut s = state.borrow_mut();
    let StrokePhase::Active { origin_x, origin_y } = s.stroke else {
        return;
    };
    let (x, y) = input::local_point(client_x, client_y, origin_x, origin_y);
    stroke::extend(&s.ctx, x, y);
    let percent = s.options.realtime.then(|| reveal::percent(&s));
    let callback = s.callbacks.on_move.clone();
    drop(s);
    invoke(
        callback,
        ScratchEvent {
            phase: Phase::Move,
            x,
            y,
        },
        percent,
    );
}

/// Up always reports the percentage: the final state of a stroke is the one
/// consumers key decisions off, realtime or not.
pub(crate) fn pointer_up(state: &Rc<RefCell<State>>, client_x: f64, client_y: f64) {
    let mut s = state.borrow_mut();
    let StrokePhase::Active { origin_x, origin_y } = s.stroke else {
        return;
    };
    stroke::finish(&s.ctx);
    s.stroke = StrokePhase::Idle;
    let (x, y) = input::local_point(client_x, client_y, origin_x, origin_y);
    let percent = Some(reveal::percent(&s));
    let callback = s.callbacks.on_up.clone();
    drop(s);
    invoke(
        callback,
        ScratchEvent {
            phase: Phase::Up,
            x,
            y,
        },
        percent,
    );
}

/// Invoke a user callback with the canonical event and, when available, the
/// percentage. Runs with the state borrow released, so a callback may call
/// back into the public API.
fn invoke(callback: Option<Function>, event: ScratchEvent, percent: Option<f64>) {
    let Some(callback) = callback else {
        return;
    };
    let event = serde_wasm_bindgen::to_value(&event).unwrap_or(JsValue::NULL);
    let percent = percent.map_or(JsValue::UNDEFINED, JsValue::from_f64);
    let _ = callback.call2(&JsValue::NULL, &event, &percent);
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use js_sys::{Object, Reflect};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn mount_container(width: u32, height: u32) -> HtmlElement {
        let document = web_sys::window()
            .expect("window")
            .document()
            .expect("document");
        let container = document
            .create_element("div")
            .expect("create div")
            .dyn_into::<HtmlElement>()
            .expect("div is an HtmlElement");
        let style = container.style();
        style
            .set_property("width", &format!("{width}px"))
            .expect("set width");
        style
            .set_property("height", &format!("{height}px"))
            .expect("set height");
        document
            .body()
            .expect("body")
            .append_child(&container)
            .expect("append container");
        container
    }

    fn size_option(size: f64) -> JsValue {
        let object = Object::new();
        Reflect::set(&object, &"size".into(), &JsValue::from_f64(size)).expect("set size");
        object.into()
    }

    fn canvas_origin(state: &Rc<RefCell<State>>) -> (f64, f64) {
        let rect = state.borrow().canvas.get_bounding_client_rect();
        (rect.left(), rect.top())
    }

    #[wasm_bindgen_test]
    fn construct_starts_fully_covered() {
        let container = mount_container(200, 100);
        let pad =
            ScratchPad::new(container.clone(), &Object::new().into()).expect("construct pad");
        assert_eq!(pad.percent(), 0.0);
        container.remove();
    }

    #[wasm_bindgen_test]
    fn clear_reveals_everything() {
        let container = mount_container(200, 100);
        let pad =
            ScratchPad::new(container.clone(), &Object::new().into()).expect("construct pad");
        pad.clear();
        assert_eq!(pad.percent(), 100.0);
        container.remove();
    }

    #[wasm_bindgen_test]
    fn dot_erases_a_brush_sized_circle() {
        let container = mount_container(200, 100);
        let pad = ScratchPad::new(container.clone(), &size_option(30.0)).expect("construct pad");
        let state = pad.state_for_tests().expect("supported");
        let (left, top) = canvas_origin(&state);

        pointer_down(&state, left + 100.0, top + 50.0);
        pointer_up(&state, left + 100.0, top + 50.0);

        let (width, height) = {
            let s = state.borrow();
            (s.width, s.height)
        };
        let expected = std::f64::consts::PI * 15.0 * 15.0 / (width * height) * 100.0;
        let percent = pad.percent();
        assert!(
            (percent - expected).abs() < 1.0,
            "expected about {expected:.2}%, got {percent:.2}%"
        );
        container.remove();
    }

    #[wasm_bindgen_test]
    fn horizontal_stroke_matches_area_estimate() {
        let container = mount_container(200, 100);
        let pad = ScratchPad::new(container.clone(), &size_option(30.0)).expect("construct pad");
        let state = pad.state_for_tests().expect("supported");
        assert_eq!(pad.percent(), 0.0);
        let (left, top) = canvas_origin(&state);

        pointer_down(&state, left + 10.0, top + 50.0);
        pointer_move(&state, left + 190.0, top + 50.0);
        pointer_up(&state, left + 190.0, top + 50.0);

        // 180x30 band plus round caps over 20000 logical pixels, minus
        // anti-aliased edges that keep partial alpha.
        let percent = pad.percent();
        assert!(
            (26.0..=33.0).contains(&percent),
            "expected roughly 29%, got {percent:.2}%"
        );
        container.remove();
    }

    #[wasm_bindgen_test]
    fn erasure_is_monotonic_across_strokes() {
        let container = mount_container(200, 100);
        let pad = ScratchPad::new(container.clone(), &size_option(20.0)).expect("construct pad");
        let state = pad.state_for_tests().expect("supported");
        let (left, top) = canvas_origin(&state);

        let mut last = pad.percent();
        for row in [20.0, 50.0, 80.0, 50.0] {
            pointer_down(&state, left + 20.0, top + row);
            pointer_move(&state, left + 180.0, top + row);
            pointer_up(&state, left + 180.0, top + row);
            let now = pad.percent();
            assert!(
                now >= last,
                "percentage dropped from {last:.2} to {now:.2}"
            );
            last = now;
        }
        container.remove();
    }

    #[wasm_bindgen_test]
    fn down_while_disabled_is_ignored() {
        let container = mount_container(200, 100);
        let object = Object::new();
        let calls = Rc::new(RefCell::new(0u32));
        let calls_cb = Rc::clone(&calls);
        let on_down = Closure::<dyn FnMut(JsValue, JsValue)>::new(move |_: JsValue, _: JsValue| {
            *calls_cb.borrow_mut() += 1;
        });
        Reflect::set(&object, &"scratchDown".into(), on_down.as_ref()).expect("set callback");

        let pad = ScratchPad::new(container.clone(), &object.into()).expect("construct pad");
        let state = pad.state_for_tests().expect("supported");
        let (left, top) = canvas_origin(&state);

        pad.enable(false);
        pointer_down(&state, left + 100.0, top + 50.0);
        pointer_move(&state, left + 150.0, top + 50.0);
        pointer_up(&state, left + 150.0, top + 50.0);

        assert_eq!(pad.percent(), 0.0);
        assert_eq!(*calls.borrow(), 0);
        assert!(!state.borrow().stroke_active());
        container.remove();
    }

    #[wasm_bindgen_test]
    fn disabling_mid_stroke_finishes_the_stroke() {
        let container = mount_container(200, 100);
        let pad = ScratchPad::new(container.clone(), &size_option(30.0)).expect("construct pad");
        let state = pad.state_for_tests().expect("supported");
        let (left, top) = canvas_origin(&state);

        pointer_down(&state, left + 20.0, top + 50.0);
        let after_down = pad.percent();
        pad.enable(false);
        pointer_move(&state, left + 180.0, top + 50.0);
        pointer_up(&state, left + 180.0, top + 50.0);

        assert!(
            pad.percent() > after_down * 2.0,
            "move after disable should keep erasing"
        );
        container.remove();
    }

    #[wasm_bindgen_test]
    fn realtime_off_reports_percentage_only_on_up() {
        let container = mount_container(200, 100);
        let object = Object::new();
        Reflect::set(&object, &"realtime".into(), &JsValue::FALSE).expect("set realtime");

        let move_args = Rc::new(RefCell::new(Vec::<JsValue>::new()));
        let move_args_cb = Rc::clone(&move_args);
        let on_move =
            Closure::<dyn FnMut(JsValue, JsValue)>::new(move |_: JsValue, percent: JsValue| {
                move_args_cb.borrow_mut().push(percent);
            });
        Reflect::set(&object, &"scratchMove".into(), on_move.as_ref()).expect("set move");

        let up_args = Rc::new(RefCell::new(Vec::<JsValue>::new()));
        let up_args_cb = Rc::clone(&up_args);
        let on_up =
            Closure::<dyn FnMut(JsValue, JsValue)>::new(move |_: JsValue, percent: JsValue| {
                up_args_cb.borrow_mut().push(percent);
            });
        Reflect::set(&object, &"scratchUp".into(), on_up.as_ref()).expect("set up");

        let pad = ScratchPad::new(container.clone(), &object.into()).expect("construct pad");
        let state = pad.state_for_tests().expect("supported");
        let (left, top) = canvas_origin(&state);

        pointer_down(&state, left + 20.0, top + 50.0);
        pointer_move(&state, left + 80.0, top + 50.0);
        pointer_move(&state, left + 140.0, top + 50.0);
        pointer_up(&state, left + 140.0, top + 50.0);

        let moves = move_args.borrow();
        assert_eq!(moves.len(), 2);
        assert!(moves.iter().all(|value| value.is_undefined()));
        let ups = up_args.borrow();
        assert_eq!(ups.len(), 1);
        assert!(ups[0].as_f64().is_some_and(|value| value > 0.0));
        container.remove();
    }

    #[wasm_bindgen_test]
    fn attributes_override_constructor_options() {
        let container = mount_container(200, 100);
        container
            .set_attribute("data-size", "50")
            .expect("set attribute");
        let pad = ScratchPad::new(container.clone(), &size_option(10.0)).expect("construct pad");
        let state = pad.state_for_tests().expect("supported");
        assert_eq!(state.borrow().options.size, 50.0);
        container.remove();
    }

    #[wasm_bindgen_test]
    fn destroy_removes_the_layers_and_goes_quiet() {
        let container = mount_container(200, 100);
        let mut pad =
            ScratchPad::new(container.clone(), &Object::new().into()).expect("construct pad");
        assert_eq!(container.child_element_count(), 2);
        pad.destroy();
        assert_eq!(container.child_element_count(), 0);
        assert_eq!(pad.percent(), 0.0);
        pad.clear();
        pad.enable(true);
        container.remove();
    }
}
