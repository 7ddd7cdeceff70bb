use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Promise;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlImageElement};

use crate::dom;
use crate::options::{is_hex, DEFAULT_COAT};
use crate::state::State;

/// Allocate the canvas and its 2D context. `None` means the host has no
/// raster capability and the widget must degrade to the text fallback.
pub fn create_surface(document: &Document) -> Option<(HtmlCanvasElement, CanvasRenderingContext2d)> {
    let canvas = document
        .create_element("canvas")
        .ok()?
        .dyn_into::<HtmlCanvasElement>()
        .ok()?;
    let ctx = canvas
        .get_context("2d")
        .ok()
        .flatten()?
        .dyn_into::<CanvasRenderingContext2d>()
        .ok()?;
    Some((canvas, ctx))
}

/// Recompute dimensions from the container's current layout size and repaint
/// both layers. Must run after the container is attached and sized.
///
/// Safe to call repeatedly: the backing store is sized to css × dpr and the
/// transform is set absolutely (not accumulated), so logical drawing stays in
/// CSS-pixel units across resets.
pub fn reset(state: &Rc<RefCell<State>>) {
    let pending_coat = {
        let mut s = state.borrow_mut();
        let Some(window) = web_sys::window() else {
            return;
        };
        let width = f64::from(s.container.offset_width()).ceil();
        let height = f64::from(s.container.offset_height()).ceil();
        let dpr = dom::device_pixel_ratio(&window);

        s.canvas.set_width((width * dpr) as u32);
        s.canvas.set_height((height * dpr) as u32);
        let _ = s.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
        s.width = width;
        s.height = height;
        s.pixels = f64::from(s.canvas.width()) * f64::from(s.canvas.height());

        if s.debug {
            web_sys::console::log_1(
                &format!("Scratch surface reset to {width}x{height} (dpr {dpr})").into(),
            );
        }

        // Keep the backdrop hidden until the coat is opaque again, so the
        // covered content never flashes through.
        dom::hide_backdrop(&s.backdrop);
        paint_background(&s);

        if is_hex(&s.options.fg) {
            paint_flat(&s.ctx, &s.options.fg, width, height);
            dom::show_backdrop(&s.backdrop);
            None
        } else {
            Some(s.options.fg.clone())
        }
    };

    // Image coats resolve asynchronously. Two resets in flight race their
    // continuations and the later paint wins; both are valid coats.
    if let Some(url) = pending_coat {
        let state = Rc::clone(state);
        spawn_local(async move {
            let loaded = load_image(&url).await;
            let s = state.borrow();
            match loaded {
                Ok(image) => {
                    let _ = s.ctx.set_global_composite_operation("source-over");
                    let _ = s.ctx.draw_image_with_html_image_element_and_dw_and_dh(
                        &image, 0.0, 0.0, s.width, s.height,
                    );
                }
                Err(_) => {
                    web_sys::console::warn_1(
                        &format!("Coat image failed to load, using fallback fill: {url}").into(),
                    );
                    paint_flat(&s.ctx, DEFAULT_COAT, s.width, s.height);
                }
            }
            dom::show_backdrop(&s.backdrop);
        });
    }
}

/// Wipe the raster back to fully transparent without touching dimensions or
/// reloading images. Restarts the scratch progress without the repaint cost
/// (and flash) of `reset`.
pub fn clear(state: &State) {
    state.ctx.clear_rect(0.0, 0.0, state.width, state.height);
}

fn paint_background(state: &State) {
    let Some(bg) = &state.options.bg else {
        return;
    };
    let style = state.container.style();
    if is_hex(bg) {
        let _ = style.set_property("background-color", bg);
    } else {
        let _ = style.remove_property("background-color");
        state.backdrop.set_src(bg);
    }
}

fn paint_flat(ctx: &CanvasRenderingContext2d, color: &str, width: f64, height: f64) {
    // A stroke may have left destination-out armed on the context.
    let _ = ctx.set_global_composite_operation("source-over");
    ctx.set_fill_style_str(color);
    ctx.fill_rect(0.0, 0.0, width, height);
}

/// Load an image URL as a two-outcome future: the element's load event
/// resolves, its error event rejects. Cross-origin is requested so painting
/// the coat does not taint the canvas for `get_image_data`.
pub async fn load_image(url: &str) -> Result<HtmlImageElement, JsValue> {
    let image = HtmlImageElement::new()?;
    image.set_cross_origin(Some(""));
    let settled = Promise::new(&mut |resolve, reject| {
        image.set_onload(Some(&resolve));
        image.set_onerror(Some(&reject));
    });
    image.set_src(url);
    JsFuture::from(settled).await?;
    Ok(image)
}
