use std::borrow::Cow;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::encode::palette::{QuantizeOptions, quantize};
use crate::encode::sink::{EncodedStream, FrameSink, SinkConfig, delay_centis};
use crate::foundation::core::{Canvas, FrameIndex, FrameRGBA};
use crate::foundation::error::{ConvertError, ConvertResult};

/// Streaming animated-GIF writer over any [`Write`].
///
/// The header and the infinite-loop extension are written on construction; each frame carries
/// its own local palette and is disposed to background before the next one is drawn.
pub struct GifStreamEncoder<W: Write> {
    encoder: gif::Encoder<W>,
    canvas: Canvas,
    quantize: QuantizeOptions,
    delay_ms: u32,
    delay_cs: u16,
    frames: u64,
    last: Option<FrameIndex>,
}

impl<W: Write> GifStreamEncoder<W> {
    /// Write the GIF header and loop extension to `writer`.
    pub fn new(writer: W, cfg: SinkConfig, quantize: QuantizeOptions) -> ConvertResult<Self> {
        let (width, height) = check_stream(&cfg, &quantize)?;

        let mut encoder = gif::Encoder::new(writer, width, height, &[]).map_err(map_gif_err)?;
        encoder
            .set_repeat(gif::Repeat::Infinite)
            .map_err(map_gif_err)?;

        let delay_ms = cfg.frame_delay_ms();
        Ok(Self {
            encoder,
            canvas: cfg.canvas,
            quantize,
            delay_ms,
            delay_cs: delay_centis(delay_ms),
            frames: 0,
            last: None,
        })
    }

    /// Frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    /// Quantize `frame` and append it to the stream.
    pub fn push_frame(&mut self, frame: &FrameRGBA) -> ConvertResult<()> {
        if frame.canvas() != self.canvas {
            return Err(ConvertError::encode_failure(format!(
                "frame {} is {}x{}, stream is {}x{}",
                frame.index, frame.width, frame.height, self.canvas.width, self.canvas.height
            )));
        }
        if self.last.is_some_and(|last| frame.index <= last) {
            return Err(ConvertError::encode_failure(format!(
                "frame {} pushed out of order",
                frame.index
            )));
        }

        let indexed = quantize(frame, &self.quantize);
        let gif_frame = gif::Frame {
            // Dimensions were range-checked in `new`.
            width: self.canvas.width as u16,
            height: self.canvas.height as u16,
            delay: self.delay_cs,
            dispose: gif::DisposalMethod::Background,
            transparent: indexed.transparent,
            palette: Some(indexed.palette),
            buffer: Cow::Owned(indexed.indices),
            ..gif::Frame::default()
        };
        self.encoder.write_frame(&gif_frame).map_err(map_gif_err)?;

        self.last = Some(frame.index);
        self.frames += 1;
        tracing::trace!(frame = %frame.index, "gif frame written");
        Ok(())
    }

    /// Write the trailer and hand back the writer.
    pub fn finish(self) -> ConvertResult<(W, EncodedStream)> {
        let summary = EncodedStream {
            width: self.canvas.width,
            height: self.canvas.height,
            frame_count: self.frames,
            delay_ms: self.delay_ms,
            delay_cs: self.delay_cs,
            loop_count: 0,
            path: None,
        };
        let writer = self
            .encoder
            .into_inner()
            .map_err(|e| ConvertError::sink_write(format!("write gif trailer: {e}")))?;
        Ok((writer, summary))
    }
}

/// Validate a stream up front; returns the GIF logical screen size.
fn check_stream(cfg: &SinkConfig, quantize: &QuantizeOptions) -> ConvertResult<(u16, u16)> {
    cfg.validate()?;
    quantize.validate()?;
    Ok((gif_dimension(cfg.canvas.width)?, gif_dimension(cfg.canvas.height)?))
}

fn gif_dimension(v: u32) -> ConvertResult<u16> {
    u16::try_from(v)
        .map_err(|_| ConvertError::encode_failure(format!("gif dimension {v} exceeds 65535")))
}

fn map_gif_err(err: gif::EncodingError) -> ConvertError {
    match err {
        gif::EncodingError::Io(e) => ConvertError::sink_write(e.to_string()),
        other => ConvertError::encode_failure(other.to_string()),
    }
}

/// Options for the file-backed GIF sink.
#[derive(Clone, Debug)]
pub struct GifSinkOpts {
    /// Destination GIF path.
    pub out_path: PathBuf,
    /// Palette settings for every frame.
    pub quantize: QuantizeOptions,
}

/// File-backed GIF sink that never leaves a partial file at `out_path`.
///
/// Bytes go to a temporary file in the destination directory, which is renamed over
/// `out_path` only by a successful [`FrameSink::end`]. Dropping the sink earlier deletes it.
pub struct GifSink {
    opts: GifSinkOpts,
    stream: Option<GifStreamEncoder<BufWriter<NamedTempFile>>>,
}

impl GifSink {
    /// Create an idle sink; nothing touches disk until `begin`.
    pub fn new(opts: GifSinkOpts) -> Self {
        Self { opts, stream: None }
    }

    /// Destination path.
    pub fn out_path(&self) -> &Path {
        &self.opts.out_path
    }

    /// Drop any partially written temporary file.
    pub fn abort(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!(out = %self.opts.out_path.display(), "discarded partial gif");
        }
    }

    fn target_dir(&self) -> PathBuf {
        match self.opts.out_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl FrameSink for GifSink {
    fn preflight(&self, cfg: &SinkConfig) -> ConvertResult<()> {
        check_stream(cfg, &self.opts.quantize).map(|_| ())
    }

    fn begin(&mut self, cfg: SinkConfig) -> ConvertResult<()> {
        if self.stream.is_some() {
            return Err(ConvertError::encode_failure("gif sink already started"));
        }
        let dir = self.target_dir();
        std::fs::create_dir_all(&dir).map_err(|e| {
            ConvertError::sink_write(format!("create output dir '{}': {e}", dir.display()))
        })?;
        let tmp = tempfile::Builder::new()
            .prefix(".lottiegif-")
            .suffix(".gif.part")
            .tempfile_in(&dir)
            .map_err(|e| {
                ConvertError::sink_write(format!("create temp file in '{}': {e}", dir.display()))
            })?;
        tracing::debug!(tmp = %tmp.path().display(), "gif sink started");
        self.stream = Some(GifStreamEncoder::new(
            BufWriter::new(tmp),
            cfg,
            self.opts.quantize,
        )?);
        Ok(())
    }

    fn push_frame(&mut self, frame: &FrameRGBA) -> ConvertResult<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(ConvertError::encode_failure("push_frame before begin"));
        };
        stream.push_frame(frame)
    }

    fn end(&mut self) -> ConvertResult<EncodedStream> {
        let Some(stream) = self.stream.take() else {
            return Err(ConvertError::encode_failure("end before begin"));
        };
        let (buf, mut summary) = stream.finish()?;
        let tmp = buf
            .into_inner()
            .map_err(|e| ConvertError::sink_write(format!("flush gif: {}", e.error())))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| ConvertError::sink_write(format!("sync gif: {e}")))?;
        let out = &self.opts.out_path;
        tmp.persist(out).map_err(|e| {
            ConvertError::sink_write(format!("persist '{}': {}", out.display(), e.error))
        })?;

        tracing::info!(
            out = %out.display(),
            frames = summary.frame_count,
            delay_cs = summary.delay_cs,
            "gif written"
        );
        summary.path = Some(out.clone());
        Ok(summary)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;
