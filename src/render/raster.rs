use resvg::tiny_skia;

use crate::foundation::core::{Canvas, FrameIndex, FrameRGBA};
use crate::foundation::error::{ConvertError, ConvertResult};
use crate::render::environment::RenderHandle;
use crate::timeline::AnimationDescriptor;

/// Rasterizer settings.
#[derive(Clone, Debug, Default)]
pub struct RasterOptions {
    /// Load system fonts so `<text>` in extracted stills can be shaped.
    pub load_system_fonts: bool,
}

/// Turns SVG stills into fixed-size straight-alpha RGBA8 frames.
///
/// Owns one raster canvas that is reused for every frame and cleared before each draw, so a
/// frame never shows content from the frame before it. Not shareable across threads.
pub struct FrameRasterizer {
    canvas: Canvas,
    pixmap: tiny_skia::Pixmap,
    options: usvg::Options<'static>,
}

impl FrameRasterizer {
    /// Allocate the raster canvas.
    pub fn new(canvas: Canvas, opts: &RasterOptions) -> ConvertResult<Self> {
        let pixmap = tiny_skia::Pixmap::new(canvas.width, canvas.height).ok_or_else(|| {
            ConvertError::rasterize(format!(
                "failed to allocate {}x{} raster canvas",
                canvas.width, canvas.height
            ))
        })?;

        let mut options = usvg::Options::default();
        if opts.load_system_fonts {
            options.fontdb_mut().load_system_fonts();
            tracing::debug!(faces = options.fontdb.len(), "system fonts loaded");
        }

        Ok(Self {
            canvas,
            pixmap,
            options,
        })
    }

    /// Output size.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Render output frame `index`: seek the environment, extract its still and rasterize it.
    #[tracing::instrument(skip(self, descriptor, handle), fields(frame = index.0))]
    pub fn rasterize(
        &mut self,
        descriptor: &AnimationDescriptor,
        index: FrameIndex,
        handle: &mut RenderHandle,
    ) -> ConvertResult<FrameRGBA> {
        if !descriptor.contains(index) {
            return Err(ConvertError::rasterize(format!(
                "frame {index} is outside 0..{}",
                descriptor.total_frames
            )));
        }
        if descriptor.canvas != self.canvas {
            return Err(ConvertError::rasterize(format!(
                "descriptor canvas {}x{} does not match raster canvas {}x{}",
                descriptor.canvas.width,
                descriptor.canvas.height,
                self.canvas.width,
                self.canvas.height
            )));
        }

        let svg = handle.still_at(descriptor.source_frame(index))?;
        self.rasterize_svg(index, &svg)
    }

    /// Decode SVG markup and draw it stretched to the full canvas.
    pub fn rasterize_svg(&mut self, index: FrameIndex, svg: &str) -> ConvertResult<FrameRGBA> {
        let tree = usvg::Tree::from_str(svg, &self.options)
            .map_err(|e| ConvertError::rasterize(format!("frame {index}: {e}")))?;

        let size = tree.size();
        if !(size.width() > 0.0 && size.height() > 0.0) {
            return Err(ConvertError::rasterize(format!(
                "frame {index}: still has an empty size"
            )));
        }
        let sx = self.canvas.width as f32 / size.width();
        let sy = self.canvas.height as f32 / size.height();

        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
        resvg::render(
            &tree,
            tiny_skia::Transform::from_scale(sx, sy),
            &mut self.pixmap.as_mut(),
        );

        let mut data = Vec::with_capacity(self.canvas.byte_len());
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        FrameRGBA::new(index, self.canvas.width, self.canvas.height, data)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
