//! Rendering boundary
//!
//! The core does not draw. A host renderer receives a `DrawList` built from
//! the simulation each frame and must treat it as read-only.

pub mod scene;

pub use scene::{DrawList, Sprite};

/// Host-side drawing backend (canvas, GPU, terminal, ...)
pub trait Renderer {
    fn draw(&mut self, frame: &DrawList);
}
