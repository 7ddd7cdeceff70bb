use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlElement, HtmlImageElement, Window};

pub fn debug_enabled(window: &Window) -> bool {
    let search = window.location().search().ok().unwrap_or_default();
    search.contains("debug=1") || search.contains("debug=true")
}

/// Device pixel ratio with a fallback of 1 for hosts that report a
/// non-finite or non-positive value.
pub fn device_pixel_ratio(window: &Window) -> f64 {
    let dpr = window.device_pixel_ratio();
    if dpr.is_finite() && dpr > 0.0 {
        dpr
    } else {
        1.0
    }
}

pub fn render_unsupported(container: &HtmlElement) {
    container.set_text_content(Some("Canvas is not supported in this browser."));
}

/// The container anchors the absolutely positioned layers, so it must be at
/// least `relative`.
pub fn prepare_container(container: &HtmlElement, cursor: &str) {
    let style = container.style();
    let _ = style.set_property("position", "relative");
    let _ = style.set_property("cursor", cursor);
}

pub fn set_cursor(container: &HtmlElement, cursor: &str) {
    let _ = container.style().set_property("cursor", cursor);
}

/// Stretch a layer element edge to edge over the container.
pub fn style_overlay(element: &HtmlElement) {
    let style = element.style();
    let _ = style.set_property("position", "absolute");
    let _ = style.set_property("width", "100%");
    let _ = style.set_property("height", "100%");
}

pub fn create_backdrop(document: &Document) -> Result<HtmlImageElement, JsValue> {
    let image = document
        .create_element("img")?
        .dyn_into::<HtmlImageElement>()?;
    image.set_cross_origin(Some(""));
    style_overlay(&image);
    hide_backdrop(&image);
    Ok(image)
}

pub fn show_backdrop(image: &HtmlImageElement) {
    let _ = image.style().set_property("display", "block");
}

pub fn hide_backdrop(image: &HtmlImageElement) {
    let _ = image.style().set_property("display", "none");
}
