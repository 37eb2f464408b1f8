//! lottiegif converts Lottie vector animations into looping, transparency-preserving GIFs.
//!
//! A conversion is one linear pass:
//!
//! - Resolve the timeline (frame count, frame rate, canvas) from the animation document
//! - Rasterize every frame through a [`RenderEnvironment`] into straight RGBA8
//! - Stage the frames in a run-scoped [`FrameStore`]
//! - Quantize and stream them, in order, into a [`FrameSink`] such as [`GifSink`]
//!
//! [`Converter`] drives all of it and guarantees cleanup on every exit path.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Palette quantization and GIF sinks.
pub mod encode;
/// Rendering environments and the frame rasterizer.
pub mod render;
/// Conversion orchestration.
pub mod session;
/// Run-scoped frame staging.
pub mod stage;
/// Timeline resolution.
pub mod timeline;

pub use crate::foundation::core::{Canvas, FrameIndex, FrameRGBA, Rgba8};
pub use crate::foundation::error::{ConvertError, ConvertResult};

pub use crate::encode::{
    EncodedStream, FrameSink, GifSink, GifSinkOpts, GifStreamEncoder, InMemorySink,
    QuantizeOptions, SinkConfig,
};
pub use crate::render::{
    FrameRasterizer, RasterOptions, RenderEnvironment, RenderHandle, SceneEnvironment,
};
pub use crate::session::{
    CancelToken, ConversionReport, ConvertOptions, Converter, EnvironmentFactory, NoProgress,
    PipelineFailure, PipelineState, ProgressObserver, TracingProgress,
};
pub use crate::stage::{FrameStore, StagedFrame};
pub use crate::timeline::{Animation, AnimationDescriptor, load_animation, resolve};
