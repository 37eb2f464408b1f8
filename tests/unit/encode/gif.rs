use super::*;
use crate::encode::palette::TRANSPARENT_INDEX;
use std::io;

fn cfg(width: u32, height: u32, fps: f64) -> SinkConfig {
    SinkConfig {
        canvas: Canvas { width, height },
        fps,
    }
}

/// Left half transparent, right half opaque red.
fn half_frame(index: u64) -> FrameRGBA {
    let data = [[0, 0, 0, 0], [255, 0, 0, 255], [0, 0, 0, 0], [255, 0, 0, 255]]
        .iter()
        .flatten()
        .copied()
        .collect();
    FrameRGBA::new(FrameIndex(index), 2, 2, data).unwrap()
}

struct Decoded {
    repeat: gif::Repeat,
    frames: Vec<(u16, Option<u8>, Vec<u8>)>,
}

fn decode(bytes: &[u8]) -> Decoded {
    let mut opts = gif::DecodeOptions::new();
    opts.set_color_output(gif::ColorOutput::Indexed);
    let mut dec = opts.read_info(io::Cursor::new(bytes)).unwrap();
    let mut frames = Vec::new();
    while let Some(f) = dec.read_next_frame().unwrap() {
        frames.push((f.delay, f.transparent, f.buffer.to_vec()));
    }
    Decoded {
        repeat: dec.repeat(),
        frames,
    }
}

#[test]
fn ten_frames_at_ten_fps_loop_forever_with_transparency() {
    let mut enc =
        GifStreamEncoder::new(Vec::new(), cfg(2, 2, 10.0), QuantizeOptions::default()).unwrap();
    for i in 0..10 {
        enc.push_frame(&half_frame(i)).unwrap();
    }
    let (bytes, summary) = enc.finish().unwrap();

    assert_eq!(summary.frame_count, 10);
    assert_eq!(summary.delay_ms, 100);
    assert_eq!(summary.delay_cs, 10);
    assert_eq!(summary.loop_count, 0);

    let decoded = decode(&bytes);
    assert_eq!(decoded.repeat, gif::Repeat::Infinite);
    assert_eq!(decoded.frames.len(), 10);
    for (delay, transparent, indices) in &decoded.frames {
        assert_eq!(*delay, 10);
        assert_eq!(*transparent, Some(TRANSPARENT_INDEX));
        assert_eq!(indices[0], TRANSPARENT_INDEX);
        assert_eq!(indices[2], TRANSPARENT_INDEX);
        assert_ne!(indices[1], TRANSPARENT_INDEX);
    }
}

#[test]
fn zero_frames_still_produce_a_valid_stream() {
    let enc =
        GifStreamEncoder::new(Vec::new(), cfg(4, 4, 30.0), QuantizeOptions::default()).unwrap();
    let (bytes, summary) = enc.finish().unwrap();
    assert_eq!(summary.frame_count, 0);
    assert!(bytes.starts_with(b"GIF89a"));
    assert!(decode(&bytes).frames.is_empty());
}

#[test]
fn mismatched_and_out_of_order_frames_are_rejected() {
    let mut enc =
        GifStreamEncoder::new(Vec::new(), cfg(2, 2, 10.0), QuantizeOptions::default()).unwrap();
    let wrong = FrameRGBA::new(FrameIndex(0), 1, 1, vec![0; 4]).unwrap();
    assert_eq!(enc.push_frame(&wrong).unwrap_err().kind(), "EncodeFailure");

    enc.push_frame(&half_frame(3)).unwrap();
    assert_eq!(
        enc.push_frame(&half_frame(3)).unwrap_err().kind(),
        "EncodeFailure"
    );
    assert_eq!(enc.frames_written(), 1);
}

#[test]
fn oversized_canvas_is_an_encode_failure() {
    let err = match GifStreamEncoder::new(
        Vec::new(),
        cfg(70_000, 2, 10.0),
        QuantizeOptions::default(),
    ) {
        Ok(_) => panic!("expected failure"),
        Err(e) => e,
    };
    assert_eq!(err.kind(), "EncodeFailure");
}

struct BrokenWriter;

impl io::Write for BrokenWriter {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::other("disk full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::other("disk full"))
    }
}

#[test]
fn writer_errors_surface_as_sink_write_errors() {
    let res = GifStreamEncoder::new(BrokenWriter, cfg(2, 2, 10.0), QuantizeOptions::default())
        .and_then(|mut enc| {
            enc.push_frame(&half_frame(0))?;
            enc.finish().map(|_| ())
        });
    assert_eq!(res.unwrap_err().kind(), "SinkWriteError");
}

fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn gif_sink_persists_atomically_on_end() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.gif");
    let mut sink = GifSink::new(GifSinkOpts {
        out_path: out.clone(),
        quantize: QuantizeOptions::default(),
    });

    sink.begin(cfg(2, 2, 10.0)).unwrap();
    sink.push_frame(&half_frame(0)).unwrap();
    assert!(!out.exists());

    let summary = sink.end().unwrap();
    assert_eq!(summary.path.as_deref(), Some(out.as_path()));
    assert_eq!(dir_entries(dir.path()), vec!["out.gif".to_string()]);
    assert_eq!(decode(&std::fs::read(&out).unwrap()).frames.len(), 1);
}

#[test]
fn dropped_gif_sink_leaves_nothing_behind() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.gif");
    {
        let mut sink = GifSink::new(GifSinkOpts {
            out_path: out.clone(),
            quantize: QuantizeOptions::default(),
        });
        sink.begin(cfg(2, 2, 10.0)).unwrap();
        sink.push_frame(&half_frame(0)).unwrap();
    }
    assert!(dir_entries(dir.path()).is_empty());
}

#[test]
fn gif_sink_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("out.gif");
    let mut sink = GifSink::new(GifSinkOpts {
        out_path: out.clone(),
        quantize: QuantizeOptions::default(),
    });
    sink.begin(cfg(2, 2, 10.0)).unwrap();
    sink.end().unwrap();
    assert!(out.is_file());
}

#[test]
fn gif_sink_under_a_regular_file_fails_to_begin() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"x").unwrap();
    let mut sink = GifSink::new(GifSinkOpts {
        out_path: blocker.join("out.gif"),
        quantize: QuantizeOptions::default(),
    });
    assert_eq!(
        sink.begin(cfg(2, 2, 10.0)).unwrap_err().kind(),
        "SinkWriteError"
    );
}

#[test]
fn gif_sink_preflight_rejects_oversized_canvas_without_touching_disk() {
    let dir = tempfile::tempdir().unwrap();
    let sink = GifSink::new(GifSinkOpts {
        out_path: dir.path().join("wide.gif"),
        quantize: QuantizeOptions::default(),
    });
    assert_eq!(
        sink.preflight(&cfg(70_000, 2, 10.0)).unwrap_err().kind(),
        "EncodeFailure"
    );
    assert!(sink.preflight(&cfg(65_535, 2, 10.0)).is_ok());
    assert!(dir_entries(dir.path()).is_empty());
}
