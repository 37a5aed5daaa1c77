//! Grid rendering: directory listing in, ordered tile events out.

pub mod model;
pub mod renderer;

pub use model::GridModel;
pub use renderer::{GridRenderer, RenderPass};
