//! Frame rendering: the rendering environment capability, its worker-thread handle, the built-in
//! Lottie scene environment and the SVG rasterizer.

/// Rendering environment capability and the bounded-wait handle that hosts it.
pub mod environment;
pub(crate) mod lottie;
/// SVG still to RGBA8 rasterization.
pub mod raster;
/// Built-in environment that evaluates a Lottie subset into SVG.
pub mod scene;

pub use environment::{RenderEnvironment, RenderHandle};
pub use raster::{FrameRasterizer, RasterOptions};
pub use scene::SceneEnvironment;
