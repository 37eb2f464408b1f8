use std::path::PathBuf;

use crate::foundation::core::{Canvas, FrameRGBA};
use crate::foundation::error::{ConvertError, ConvertResult};

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SinkConfig {
    /// Declared stream size; every pushed frame must match it.
    pub canvas: Canvas,
    /// Frames per second.
    pub fps: f64,
}

impl SinkConfig {
    /// Reject an empty canvas or a non-positive frame rate.
    pub fn validate(&self) -> ConvertResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(ConvertError::encode_failure(
                "stream width/height must be non-zero",
            ));
        }
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(ConvertError::encode_failure(format!(
                "fps must be positive, got {}",
                self.fps
            )));
        }
        Ok(())
    }

    /// `round(1000 / fps)` milliseconds.
    pub fn frame_delay_ms(&self) -> u32 {
        (1000.0 / self.fps).round() as u32
    }
}

/// Summary of a finished encoded stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedStream {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Frames written.
    pub frame_count: u64,
    /// Nominal per-frame delay, `round(1000 / fps)`.
    pub delay_ms: u32,
    /// Delay as stored in the container (GIF counts in 1/100 s).
    pub delay_cs: u16,
    /// 0 loops forever.
    pub loop_count: u16,
    /// Destination file, for file-backed sinks.
    pub path: Option<PathBuf>,
}

/// Sink contract for consuming rasterized frames in order.
pub trait FrameSink: Send {
    /// Reject a stream this sink can never write, before any frame is rendered.
    fn preflight(&self, cfg: &SinkConfig) -> ConvertResult<()> {
        cfg.validate()
    }
    /// Called once before any frame is pushed.
    fn begin(&mut self, cfg: SinkConfig) -> ConvertResult<()>;
    /// Push the next frame; indices must be strictly increasing.
    fn push_frame(&mut self, frame: &FrameRGBA) -> ConvertResult<()>;
    /// Flush and close the destination. After success the output is complete and valid.
    fn end(&mut self) -> ConvertResult<EncodedStream>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<FrameRGBA>,
}

impl InMemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Frames in push order.
    pub fn frames(&self) -> &[FrameRGBA] {
        &self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ConvertResult<()> {
        cfg.validate()?;
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, frame: &FrameRGBA) -> ConvertResult<()> {
        let Some(cfg) = self.cfg else {
            return Err(ConvertError::encode_failure("push_frame before begin"));
        };
        if frame.canvas() != cfg.canvas {
            return Err(ConvertError::encode_failure(format!(
                "frame {} is {}x{}, stream is {}x{}",
                frame.index, frame.width, frame.height, cfg.canvas.width, cfg.canvas.height
            )));
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn end(&mut self) -> ConvertResult<EncodedStream> {
        let Some(cfg) = self.cfg else {
            return Err(ConvertError::encode_failure("end before begin"));
        };
        let delay_ms = cfg.frame_delay_ms();
        Ok(EncodedStream {
            width: cfg.canvas.width,
            height: cfg.canvas.height,
            frame_count: self.frames.len() as u64,
            delay_ms,
            delay_cs: delay_centis(delay_ms),
            loop_count: 0,
            path: None,
        })
    }
}

/// Milliseconds to GIF centiseconds, rounded, never zero.
pub fn delay_centis(delay_ms: u32) -> u16 {
    (delay_ms.saturating_add(5) / 10).clamp(1, u32::from(u16::MAX)) as u16
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
