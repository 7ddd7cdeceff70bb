mod app;
mod dom;
mod input;
mod options;
mod reveal;
mod state;
mod stroke;
mod surface;

pub use app::ScratchPad;
pub use input::{Phase, ScratchEvent};
pub use options::Options;
