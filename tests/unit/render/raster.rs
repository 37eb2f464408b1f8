use std::time::Duration;

use serde_json::json;

use super::*;
use crate::render::scene::SceneEnvironment;
use crate::timeline::Animation;

const HALF_RED: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4">
    <rect x="0" y="0" width="2" height="4" fill="#ff0000"/>
</svg>"##;

const EMPTY: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"></svg>"#;

fn px(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [frame.data[i], frame.data[i + 1], frame.data[i + 2], frame.data[i + 3]]
}

fn rasterizer(w: u32, h: u32) -> FrameRasterizer {
    FrameRasterizer::new(Canvas::new(w, h).unwrap(), &RasterOptions::default()).unwrap()
}

#[test]
fn svg_is_rasterized_with_straight_alpha() {
    let mut r = rasterizer(4, 4);
    let frame = r.rasterize_svg(FrameIndex(0), HALF_RED).unwrap();
    assert_eq!(frame.data.len(), 4 * 4 * 4);
    assert_eq!(px(&frame, 0, 0), [255, 0, 0, 255]);
    assert_eq!(px(&frame, 3, 3), [0, 0, 0, 0]);
}

#[test]
fn still_is_scaled_to_canvas() {
    let mut r = rasterizer(8, 8);
    let frame = r.rasterize_svg(FrameIndex(0), HALF_RED).unwrap();
    assert_eq!(px(&frame, 3, 7), [255, 0, 0, 255]);
    assert_eq!(px(&frame, 4, 0)[3], 0);
}

#[test]
fn canvas_is_cleared_between_frames() {
    let mut r = rasterizer(4, 4);
    r.rasterize_svg(FrameIndex(0), HALF_RED).unwrap();
    let frame = r.rasterize_svg(FrameIndex(1), EMPTY).unwrap();
    assert!(frame.pixels().all(|p| p[3] == 0));
}

#[test]
fn malformed_markup_is_rasterize_failure() {
    let mut r = rasterizer(4, 4);
    let err = r.rasterize_svg(FrameIndex(0), "<svg").unwrap_err();
    assert!(matches!(err, ConvertError::RasterizeFailure(_)));
    let err = r.rasterize_svg(FrameIndex(0), "not markup at all").unwrap_err();
    assert!(matches!(err, ConvertError::RasterizeFailure(_)));
}

fn bouncing_dot() -> Animation {
    Animation::from_document(json!({
        "w": 32, "h": 32, "ip": 0, "op": 4, "fr": 4,
        "layers": [{
            "ty": 4,
            "ks": {"p": {"a": 1, "k": [{"t": 0, "s": [4, 16]}, {"t": 3, "s": [28, 16]}]}},
            "shapes": [
                {"ty": "el", "p": {"a": 0, "k": [0, 0]}, "s": {"a": 0, "k": [6, 6]}},
                {"ty": "fl", "c": {"a": 0, "k": [0, 0, 1, 1]}}
            ]
        }]
    }))
    .unwrap()
}

#[test]
fn reseeking_the_same_frame_is_pixel_identical() {
    let animation = bouncing_dot();
    let d = animation.descriptor;
    let mut handle =
        RenderHandle::spawn_loaded(SceneEnvironment::new(), &animation, Duration::from_secs(5))
            .unwrap();
    let mut r = FrameRasterizer::new(d.canvas, &RasterOptions::default()).unwrap();

    let a = r.rasterize(&d, FrameIndex(1), &mut handle).unwrap();
    let b = r.rasterize(&d, FrameIndex(3), &mut handle).unwrap();
    let again = r.rasterize(&d, FrameIndex(1), &mut handle).unwrap();

    assert_eq!(a.data, again.data);
    assert_ne!(a.data, b.data);
    assert_eq!(px(&b, 28, 16), [0, 0, 255, 255]);
    assert_eq!(px(&b, 4, 16)[3], 0);
}

#[test]
fn out_of_range_index_is_rejected() {
    let animation = bouncing_dot();
    let d = animation.descriptor;
    let mut handle =
        RenderHandle::spawn_loaded(SceneEnvironment::new(), &animation, Duration::from_secs(5))
            .unwrap();
    let mut r = FrameRasterizer::new(d.canvas, &RasterOptions::default()).unwrap();
    let err = r.rasterize(&d, FrameIndex(4), &mut handle).unwrap_err();
    assert!(matches!(err, ConvertError::RasterizeFailure(_)));
}
