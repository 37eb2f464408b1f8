use std::path::Path;
use std::sync::Arc;

use serde::Deserialize as _;

use crate::foundation::core::{Canvas, FrameIndex};
use crate::foundation::error::{ConvertError, ConvertResult};

/// Canvas width/height used when the document omits them (or sets them to zero).
pub const DEFAULT_CANVAS_SIZE: u32 = 512;
/// Frame rate used when the document omits it (or sets it to zero).
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// Immutable timing and geometry of one animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationDescriptor {
    /// Output canvas size in pixels.
    pub canvas: Canvas,
    /// First animation frame (Lottie `ip`).
    pub in_point: f64,
    /// Animation frame where playback stops (Lottie `op`), `>= in_point`.
    pub out_point: f64,
    /// Frames per second (Lottie `fr`).
    pub frame_rate: f64,
    /// `round(out_point - in_point)`.
    pub total_frames: u64,
}

impl AnimationDescriptor {
    /// Canvas width.
    pub fn width(&self) -> u32 {
        self.canvas.width
    }

    /// Canvas height.
    pub fn height(&self) -> u32 {
        self.canvas.height
    }

    /// Nominal per-frame delay, `round(1000 / fps)` milliseconds.
    pub fn frame_delay_ms(&self) -> u32 {
        (1000.0 / self.frame_rate).round() as u32
    }

    /// Animation-time frame number that output frame `index` shows.
    ///
    /// Seeks are relative to the in-point, one animation frame per output frame.
    pub fn source_frame(&self, index: FrameIndex) -> f64 {
        self.in_point + index.0 as f64
    }

    /// True for `0..total_frames`.
    pub fn contains(&self, index: FrameIndex) -> bool {
        index.0 < self.total_frames
    }

    /// Every output frame index in order.
    pub fn frames(&self) -> impl Iterator<Item = FrameIndex> + use<> {
        (0..self.total_frames).map(FrameIndex)
    }
}

/// A loaded animation: its descriptor plus the full document for the rendering environment.
#[derive(Clone, Debug)]
pub struct Animation {
    /// Resolved timeline.
    pub descriptor: AnimationDescriptor,
    /// Full Lottie document.
    pub document: Arc<serde_json::Value>,
}

impl Animation {
    /// Resolve the timeline of an already parsed document.
    pub fn from_document(document: serde_json::Value) -> ConvertResult<Self> {
        let descriptor = resolve(&document)?;
        Ok(Self {
            descriptor,
            document: Arc::new(document),
        })
    }
}

#[derive(Debug, serde::Deserialize)]
struct TimelineHeader {
    #[serde(default)]
    w: Option<f64>,
    #[serde(default)]
    h: Option<f64>,
    #[serde(default)]
    ip: Option<f64>,
    #[serde(default)]
    op: Option<f64>,
    #[serde(default)]
    fr: Option<f64>,
}

/// Derive an [`AnimationDescriptor`] from an already-parsed animation document.
#[tracing::instrument(skip(document))]
pub fn resolve(document: &serde_json::Value) -> ConvertResult<AnimationDescriptor> {
    if !document.is_object() {
        return Err(ConvertError::missing_source(
            "animation document must be a JSON object",
        ));
    }
    let header = TimelineHeader::deserialize(document)
        .map_err(|e| ConvertError::invalid_timeline(format!("timeline header: {e}")))?;

    let width = dimension("w", header.w)?;
    let height = dimension("h", header.h)?;
    let canvas = Canvas::new(width, height)?;

    let frame_rate = match header.fr {
        None => DEFAULT_FRAME_RATE,
        Some(fr) if fr == 0.0 => DEFAULT_FRAME_RATE,
        Some(fr) if fr.is_finite() && fr > 0.0 => fr,
        Some(fr) => {
            return Err(ConvertError::invalid_timeline(format!(
                "frame rate must be positive, got {fr}"
            )));
        }
    };

    let in_point = header.ip.unwrap_or(0.0);
    let out_point = header
        .op
        .ok_or_else(|| ConvertError::invalid_timeline("out-point 'op' is missing"))?;
    if !in_point.is_finite() || !out_point.is_finite() {
        return Err(ConvertError::invalid_timeline(
            "in-point/out-point must be finite",
        ));
    }
    if out_point < in_point {
        return Err(ConvertError::invalid_timeline(format!(
            "out-point {out_point} is before in-point {in_point}"
        )));
    }

    let total = (out_point - in_point).round();
    if total < 0.0 || total > u64::MAX as f64 {
        return Err(ConvertError::invalid_timeline(format!(
            "frame count {total} is out of range"
        )));
    }

    let descriptor = AnimationDescriptor {
        canvas,
        in_point,
        out_point,
        frame_rate,
        total_frames: total as u64,
    };
    tracing::debug!(?descriptor, "timeline resolved");
    Ok(descriptor)
}

fn dimension(name: &str, value: Option<f64>) -> ConvertResult<u32> {
    match value {
        None => Ok(DEFAULT_CANVAS_SIZE),
        Some(v) if v == 0.0 => Ok(DEFAULT_CANVAS_SIZE),
        Some(v) if v.is_finite() && v > 0.0 && v.round() <= f64::from(u32::MAX) => {
            Ok((v.round() as u32).max(1))
        }
        Some(v) => Err(ConvertError::invalid_timeline(format!(
            "'{name}' must be a positive pixel size, got {v}"
        ))),
    }
}

/// Read and parse the animation document at `path`, then resolve its timeline.
///
/// Any failure to locate, read or parse the file is [`ConvertError::MissingSource`].
#[tracing::instrument]
pub fn load_animation(path: &Path) -> ConvertResult<Animation> {
    if !path.is_file() {
        return Err(ConvertError::missing_source(format!(
            "animation file '{}' not found",
            path.display()
        )));
    }
    let bytes = std::fs::read(path).map_err(|e| {
        ConvertError::missing_source(format!("read '{}': {e}", path.display()))
    })?;
    let document: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| {
        ConvertError::missing_source(format!("parse '{}': {e}", path.display()))
    })?;
    Animation::from_document(document)
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/descriptor.rs"]
mod tests;
