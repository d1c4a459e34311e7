//! WebGPU rendering module
//!
//! Pieces, boundaries and effects are tessellated on the CPU into one triangle
//! list per frame; HUD text lives in the page.

pub mod effects;
pub mod pipeline;
pub mod scene;
pub mod shapes;
pub mod vertex;

pub use effects::{Effects, RingEffect};
pub use pipeline::RenderState;
pub use vertex::Vertex;
