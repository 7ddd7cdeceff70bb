use js_sys::{Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::Element;

pub const DEFAULT_COAT: &str = "#ccc";

#[derive(Clone, Debug, PartialEq)]
pub struct Options {
    /// Brush diameter in logical pixels.
    pub size: f64,
    /// Brush stroke identity. Irrelevant under destructive compositing but
    /// always applied to the context.
    pub color: String,
    /// Foreground coat: hex color or image URL.
    pub fg: String,
    /// Background layer: hex color or image URL.
    pub bg: Option<String>,
    /// Report the percentage on Down/Move as well, not only on Up.
    pub realtime: bool,
    pub cursor: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            size: 30.0,
            color: "#000".to_string(),
            fg: DEFAULT_COAT.to_string(),
            bg: None,
            realtime: true,
            cursor: "crosshair".to_string(),
        }
    }
}

/// User callback handles, one per stroke phase. Held separately from
/// `Options` because they are JS functions, not values with a text form.
#[derive(Default)]
pub struct Callbacks {
    pub on_down: Option<Function>,
    pub on_move: Option<Function>,
    pub on_up: Option<Function>,
}

impl Callbacks {
    pub fn from_js(value: &JsValue) -> Self {
        Self {
            on_down: function_prop(value, "scratchDown"),
            on_move: function_prop(value, "scratchMove"),
            on_up: function_prop(value, "scratchUp"),
        }
    }
}

fn function_prop(value: &JsValue, key: &str) -> Option<Function> {
    Reflect::get(value, &JsValue::from_str(key))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

type Setter = fn(&mut Options, &str);

/// Static option table: key -> handler. Both the attribute reads and the JS
/// object merge resolve through this table.
const OPTION_SETTERS: &[(&str, Setter)] = &[
    ("size", set_size),
    ("color", set_color),
    ("fg", set_fg),
    ("bg", set_bg),
    ("realtime", set_realtime),
    ("cursor", set_cursor),
];

fn set_size(options: &mut Options, raw: &str) {
    if let Ok(size) = raw.trim().parse::<f64>() {
        options.size = sanitize_size(size);
    }
}

fn set_color(options: &mut Options, raw: &str) {
    if !raw.is_empty() {
        options.color = raw.to_string();
    }
}

fn set_fg(options: &mut Options, raw: &str) {
    if !raw.is_empty() {
        options.fg = raw.to_string();
    }
}

fn set_bg(options: &mut Options, raw: &str) {
    options.bg = if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    };
}

fn set_realtime(options: &mut Options, raw: &str) {
    match raw.trim() {
        "true" | "1" => options.realtime = true,
        "false" | "0" => options.realtime = false,
        _ => {}
    }
}

fn set_cursor(options: &mut Options, raw: &str) {
    if !raw.is_empty() {
        options.cursor = raw.to_string();
    }
}

pub fn sanitize_size(size: f64) -> f64 {
    let size = if size.is_finite() { size } else { 30.0 };
    size.max(1.0)
}

/// Apply one option by key. Returns whether the key was recognized.
pub fn apply(options: &mut Options, key: &str, raw: &str) -> bool {
    for (name, setter) in OPTION_SETTERS {
        if *name == key {
            setter(options, raw);
            return true;
        }
    }
    false
}

/// Merge a constructor-supplied JS object. Unknown keys are ignored.
pub fn merge_js(options: &mut Options, value: &JsValue) {
    if !value.is_object() {
        return;
    }
    for (key, setter) in OPTION_SETTERS {
        let Ok(prop) = Reflect::get(value, &JsValue::from_str(key)) else {
            continue;
        };
        if let Some(raw) = text_form(&prop) {
            setter(options, &raw);
        }
    }
}

/// Merge `data-<option>` attributes on the container. Attributes win over
/// constructor values, so this runs after `merge_js`.
pub fn merge_attributes(options: &mut Options, container: &Element) {
    for (key, setter) in OPTION_SETTERS {
        if let Some(raw) = container.get_attribute(&format!("data-{key}")) {
            setter(options, &raw);
        }
    }
}

pub fn text_form(value: &JsValue) -> Option<String> {
    if let Some(text) = value.as_string() {
        return Some(text);
    }
    if let Some(number) = value.as_f64() {
        return Some(number.to_string());
    }
    value.as_bool().map(|flag| flag.to_string())
}

pub fn is_hex(value: &str) -> bool {
    value.starts_with('#')
}
