//! Palette Encoder: quantize frames to indexed color and stream them into an animated GIF.
//!
//! Sinks consume frames in ascending index order.

/// GIF stream encoder and the atomic file sink built on it.
pub mod gif;
/// Per-frame palette selection and pixel-to-index mapping.
pub mod palette;
/// Generic frame sink trait and sink configuration.
pub mod sink;

pub use self::gif::{GifSink, GifSinkOpts, GifStreamEncoder};
pub use palette::{IndexedFrame, QuantizeOptions, TRANSPARENT_INDEX, quantize};
pub use sink::{EncodedStream, FrameSink, InMemorySink, SinkConfig, delay_centis};
