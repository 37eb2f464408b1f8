use std::path::PathBuf;
use std::time::Duration;

use crate::encode::palette::{DEFAULT_ALPHA_THRESHOLD, DEFAULT_QUALITY, QuantizeOptions};
use crate::foundation::core::Rgba8;
use crate::foundation::error::{ConvertError, ConvertResult};
use crate::render::RasterOptions;

/// Per-frame render wait used unless configured otherwise.
pub const DEFAULT_RENDER_TIMEOUT_MS: u64 = 10_000;

/// Settings for one conversion run.
///
/// Deserializes from partial JSON; omitted fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// NeuQuant sample factor, `1..=30`.
    pub quality: u8,
    /// Alpha at or below this value becomes the transparent index.
    pub alpha_threshold: u8,
    /// Keep transparency. When off, frames are flattened over `background`.
    pub transparency: bool,
    /// Flattening background when `transparency` is off.
    pub background: Rgba8,
    /// Upper bound on one seek/extract round trip, in milliseconds.
    pub render_timeout_ms: u64,
    /// Load system fonts for `<text>` in stills.
    pub load_system_fonts: bool,
    /// Parent directory for the run's staging area. Defaults to the system temp dir.
    pub staging_root: Option<PathBuf>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            transparency: true,
            background: Rgba8::WHITE,
            render_timeout_ms: DEFAULT_RENDER_TIMEOUT_MS,
            load_system_fonts: false,
            staging_root: None,
        }
    }
}

impl ConvertOptions {
    /// Reject a zero timeout or an out-of-range quality.
    pub fn validate(&self) -> ConvertResult<()> {
        if self.render_timeout_ms == 0 {
            return Err(ConvertError::Other(anyhow::anyhow!(
                "render_timeout_ms must be non-zero"
            )));
        }
        self.quantize().validate()
    }

    /// Per-call render wait.
    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    /// Palette settings.
    pub fn quantize(&self) -> QuantizeOptions {
        QuantizeOptions {
            quality: self.quality,
            alpha_threshold: self.alpha_threshold,
            transparency: self.transparency,
            background: self.background,
        }
    }

    /// Rasterizer settings.
    pub fn raster(&self) -> RasterOptions {
        RasterOptions {
            load_system_fonts: self.load_system_fonts,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/options.rs"]
mod tests;
