use std::collections::HashMap;

use crate::foundation::core::{FrameRGBA, Rgba8};
use crate::foundation::error::{ConvertError, ConvertResult};
use crate::foundation::math::flatten_over;

/// Palette index reserved for fully transparent pixels.
pub const TRANSPARENT_INDEX: u8 = 0;

/// Sample factor used by the classic GIF encoders (1 = best, 30 = fastest).
pub const DEFAULT_QUALITY: u8 = 10;
/// Lowest accepted sample factor.
pub const MIN_QUALITY: u8 = 1;
/// Highest accepted sample factor.
pub const MAX_QUALITY: u8 = 30;

/// Alpha at or below this value is treated as transparent.
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 127;

/// How RGBA frames are reduced to indexed color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct QuantizeOptions {
    /// NeuQuant sample factor, `1..=30`. Higher samples fewer pixels: faster, more banding.
    pub quality: u8,
    /// Pixels with alpha `<=` this map to [`TRANSPARENT_INDEX`].
    pub alpha_threshold: u8,
    /// Reserve a transparent index. When off, every pixel is flattened over `background`.
    pub transparency: bool,
    /// Background for flattening when `transparency` is off.
    pub background: Rgba8,
}

impl Default for QuantizeOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            transparency: true,
            background: Rgba8::WHITE,
        }
    }
}

impl QuantizeOptions {
    /// Reject a sample factor outside `1..=30`.
    pub fn validate(&self) -> ConvertResult<()> {
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&self.quality) {
            return Err(ConvertError::encode_failure(format!(
                "quality must be in {MIN_QUALITY}..={MAX_QUALITY}, got {}",
                self.quality
            )));
        }
        Ok(())
    }

    /// Palette entries available for visible colors.
    pub fn color_budget(&self) -> usize {
        if self.transparency { 255 } else { 256 }
    }
}

/// One frame in indexed form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedFrame {
    /// RGB triplets; entry `n` is `palette[3n..3n + 3]`.
    pub palette: Vec<u8>,
    /// One palette index per pixel, row-major.
    pub indices: Vec<u8>,
    /// Index of the transparent entry, if any.
    pub transparent: Option<u8>,
}

impl IndexedFrame {
    /// Number of palette entries.
    pub fn palette_len(&self) -> usize {
        self.palette.len() / 3
    }
}

/// Quantize `frame` to at most 256 palette entries.
///
/// Frames with few enough distinct colors get an exact palette in first-seen order; the rest
/// go through NeuQuant with `opts.quality` as the sample factor.
pub fn quantize(frame: &FrameRGBA, opts: &QuantizeOptions) -> IndexedFrame {
    let bg = [opts.background.r, opts.background.g, opts.background.b];
    let offset: usize = if opts.transparency { 1 } else { 0 };

    // `None` marks a pixel as transparent.
    let colors: Vec<Option<[u8; 3]>> = frame
        .pixels()
        .map(|p| {
            if opts.transparency {
                (p[3] > opts.alpha_threshold).then_some([p[0], p[1], p[2]])
            } else {
                Some(flatten_over([p[0], p[1], p[2], p[3]], bg))
            }
        })
        .collect();

    let mut palette: Vec<u8> = Vec::with_capacity(256 * 3);
    if opts.transparency {
        palette.extend_from_slice(&[0, 0, 0]);
    }

    let lookup = match exact_palette(&colors, opts.color_budget()) {
        Some(unique) => {
            let mut lookup = HashMap::with_capacity(unique.len());
            for (i, c) in unique.iter().enumerate() {
                palette.extend_from_slice(c);
                lookup.insert(*c, (i + offset) as u8);
            }
            lookup
        }
        None => neuquant_lookup(&colors, opts, offset, &mut palette),
    };

    let indices = colors
        .iter()
        .map(|c| {
            c.and_then(|rgb| lookup.get(&rgb).copied())
                .unwrap_or(TRANSPARENT_INDEX)
        })
        .collect();

    IndexedFrame {
        palette,
        indices,
        transparent: opts.transparency.then_some(TRANSPARENT_INDEX),
    }
}

fn exact_palette(colors: &[Option<[u8; 3]>], budget: usize) -> Option<Vec<[u8; 3]>> {
    let mut seen = HashMap::new();
    let mut unique = Vec::new();
    for rgb in colors.iter().flatten() {
        if seen.insert(*rgb, ()).is_none() {
            if unique.len() == budget {
                return None;
            }
            unique.push(*rgb);
        }
    }
    Some(unique)
}

fn neuquant_lookup(
    colors: &[Option<[u8; 3]>],
    opts: &QuantizeOptions,
    offset: usize,
    palette: &mut Vec<u8>,
) -> HashMap<[u8; 3], u8> {
    let mut samples = Vec::with_capacity(colors.len() * 4);
    for rgb in colors.iter().flatten() {
        samples.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
    }

    let budget = opts.color_budget();
    let quality = i32::from(opts.quality.clamp(MIN_QUALITY, MAX_QUALITY));
    let nq = color_quant::NeuQuant::new(quality, budget, &samples);
    palette.extend_from_slice(&nq.color_map_rgb());

    let mut lookup = HashMap::new();
    for rgb in colors.iter().flatten() {
        lookup
            .entry(*rgb)
            .or_insert_with(|| (nq.index_of(&[rgb[0], rgb[1], rgb[2], 255]) + offset) as u8);
    }
    lookup
}

#[cfg(test)]
#[path = "../../tests/unit/encode/palette.rs"]
mod tests;
