use crate::state::State;

/// Count pixels whose RGBA bytes are exactly (0, 0, 0, 0). Anti-aliased
/// stroke edges keep partial alpha and are not counted as erased.
pub fn count_erased(data: &[u8]) -> usize {
    data.chunks_exact(4)
        .filter(|px| px[0] == 0 && px[1] == 0 && px[2] == 0 && px[3] == 0)
        .count()
}

pub fn percent_from(hits: usize, pixels: f64) -> f64 {
    if pixels <= 0.0 {
        return 0.0;
    }
    hits as f64 / pixels * 100.0
}

/// Fraction of the backing store currently erased, in [0, 100].
///
/// Reads the whole pixel buffer, so the cost is O(surface area) per call.
/// `realtime` mode pays it on every Move; otherwise only Up does.
pub fn percent(state: &State) -> f64 {
    let width = state.canvas.width();
    let height = state.canvas.height();
    if width == 0 || height == 0 {
        return 0.0;
    }
    let Ok(image_data) =
        state
            .ctx
            .get_image_data(0.0, 0.0, f64::from(width), f64::from(height))
    else {
        return 0.0;
    };
    let data = image_data.data();
    percent_from(count_erased(&data), state.pixels)
}
