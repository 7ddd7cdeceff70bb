use web_sys::CanvasRenderingContext2d;

use crate::options::Options;

/// Arm the context for erasure and erase the Down point. `destination-out`
/// removes destination pixels instead of drawing over them, so everything a
/// stroke touches drops to alpha 0. The filled circle covers the
/// zero-movement click; the fresh path anchors the drag that may follow.
pub fn begin(ctx: &CanvasRenderingContext2d, options: &Options, x: i32, y: i32) {
    let _ = ctx.set_global_composite_operation("destination-out");
    ctx.set_line_join("round");
    ctx.set_line_cap("round");
    ctx.set_stroke_style_str(&options.color);
    ctx.set_line_width(options.size);

    let x = f64::from(x);
    let y = f64::from(y);
    ctx.begin_path();
    let _ = ctx.arc(x, y, options.size / 2.0, 0.0, std::f64::consts::PI * 2.0);
    ctx.close_path();
    ctx.fill();

    ctx.begin_path();
    ctx.move_to(x, y);
}

/// Extend the current path and stroke it. The primary erasure action.
pub fn extend(ctx: &CanvasRenderingContext2d, x: i32, y: i32) {
    ctx.line_to(f64::from(x), f64::from(y));
    ctx.stroke();
}

/// Close the path. No further raster mutation until the next Down.
pub fn finish(ctx: &CanvasRenderingContext2d) {
    ctx.close_path();
}
