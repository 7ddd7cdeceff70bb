use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, HtmlImageElement};

use crate::options::{Callbacks, Options};

/// Stroke lifecycle. `Active` caches the canvas bounding-box origin captured
/// at Down so Move/Up resolve against the same offset for the whole stroke.
#[derive(Clone, Copy)]
pub enum StrokePhase {
    Idle,
    Active { origin_x: f64, origin_y: f64 },
}

pub struct State {
    pub container: HtmlElement,
    pub canvas: HtmlCanvasElement,
    pub ctx: CanvasRenderingContext2d,
    pub backdrop: HtmlImageElement,
    pub options: Options,
    pub callbacks: Callbacks,
    /// Logical (CSS pixel) surface size, as of the last reset.
    pub width: f64,
    pub height: f64,
    /// Device-pixel count of the backing store; denominator for the reveal
    /// percentage. Always equals `canvas.width * canvas.height`.
    pub pixels: f64,
    pub enabled: bool,
    pub stroke: StrokePhase,
    pub debug: bool,
}

impl State {
    pub fn stroke_active(&self) -> bool {
        matches!(self.stroke, StrokePhase::Active { .. })
    }
}
