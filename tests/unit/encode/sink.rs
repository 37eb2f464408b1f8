use super::*;
use crate::foundation::core::FrameIndex;

fn cfg(fps: f64) -> SinkConfig {
    SinkConfig {
        canvas: Canvas {
            width: 2,
            height: 2,
        },
        fps,
    }
}

#[test]
fn delay_is_rounded_from_fps() {
    assert_eq!(cfg(10.0).frame_delay_ms(), 100);
    assert_eq!(cfg(30.0).frame_delay_ms(), 33);
    assert_eq!(cfg(60.0).frame_delay_ms(), 17);
}

#[test]
fn centiseconds_round_and_never_reach_zero() {
    assert_eq!(delay_centis(100), 10);
    assert_eq!(delay_centis(33), 3);
    assert_eq!(delay_centis(17), 2);
    assert_eq!(delay_centis(4), 1);
    assert_eq!(delay_centis(0), 1);
    assert_eq!(delay_centis(u32::MAX), u16::MAX);
}

#[test]
fn vanishing_fps_clamps_to_the_slowest_delay() {
    let cfg = cfg(1e-7);
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.frame_delay_ms(), u32::MAX);
    assert_eq!(delay_centis(cfg.frame_delay_ms()), u16::MAX);
}

#[test]
fn config_rejects_non_positive_fps() {
    for fps in [0.0, -5.0, f64::NAN, f64::INFINITY] {
        assert_eq!(cfg(fps).validate().unwrap_err().kind(), "EncodeFailure");
    }
}

#[test]
fn in_memory_sink_captures_frames_and_summary() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg(10.0)).unwrap();
    for i in 0..3 {
        let f = FrameRGBA::new(FrameIndex(i), 2, 2, vec![0; 16]).unwrap();
        sink.push_frame(&f).unwrap();
    }
    let summary = sink.end().unwrap();

    assert_eq!(sink.frames().len(), 3);
    assert_eq!(summary.frame_count, 3);
    assert_eq!(summary.delay_ms, 100);
    assert_eq!(summary.loop_count, 0);
    assert_eq!(summary.path, None);
}

#[test]
fn in_memory_sink_requires_begin_and_matching_size() {
    let mut sink = InMemorySink::new();
    let f = FrameRGBA::new(FrameIndex(0), 1, 1, vec![0; 4]).unwrap();
    assert!(sink.push_frame(&f).is_err());

    sink.begin(cfg(10.0)).unwrap();
    assert_eq!(sink.push_frame(&f).unwrap_err().kind(), "EncodeFailure");
}
