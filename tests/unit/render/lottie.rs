use serde_json::json;

use super::*;

fn prop(v: serde_json::Value) -> Property {
    serde_json::from_value(v).unwrap()
}

#[test]
fn static_property_samples_constant() {
    let p = prop(json!({"a": 0, "k": [10, 20]}));
    assert_eq!(p.numbers_at(0.0), vec![10.0, 20.0]);
    assert_eq!(p.numbers_at(99.0), vec![10.0, 20.0]);

    let p = prop(json!({"a": 0, "k": 45}));
    assert_eq!(p.scalar_at(3.0, 0.0), 45.0);
}

#[test]
fn keyframes_interpolate_linearly_and_clamp_outside() {
    let p = prop(json!({"a": 1, "k": [
        {"t": 0, "s": [0, 0]},
        {"t": 10, "s": [100, 50]}
    ]}));
    assert_eq!(p.numbers_at(-5.0), vec![0.0, 0.0]);
    assert_eq!(p.numbers_at(5.0), vec![50.0, 25.0]);
    assert_eq!(p.numbers_at(10.0), vec![100.0, 50.0]);
    assert_eq!(p.numbers_at(20.0), vec![100.0, 50.0]);
}

#[test]
fn hold_keyframes_do_not_interpolate() {
    let p = prop(json!({"a": 1, "k": [
        {"t": 0, "s": [0], "h": 1},
        {"t": 10, "s": [100]}
    ]}));
    assert_eq!(p.scalar_at(9.9, -1.0), 0.0);
    assert_eq!(p.scalar_at(10.0, -1.0), 100.0);
}

#[test]
fn legacy_end_values_are_used() {
    let p = prop(json!({"a": 1, "k": [
        {"t": 0, "s": [0], "e": [40]},
        {"t": 4}
    ]}));
    assert_eq!(p.scalar_at(2.0, -1.0), 20.0);
    assert_eq!(p.scalar_at(8.0, -1.0), 40.0);
}

#[test]
fn transform_composes_translate_rotate_scale_anchor() {
    let tr: TransformProps = serde_json::from_value(json!({
        "a": {"a": 0, "k": [5, 5]},
        "p": {"a": 0, "k": [50, 50]},
        "s": {"a": 0, "k": [200, 200]},
        "r": {"a": 0, "k": 0},
        "o": {"a": 0, "k": 50}
    }))
    .unwrap();
    let m = tr.affine_at(0.0);
    // Anchor (5,5) lands on position (50,50); scale doubles distances from it.
    let p = m * kurbo::Point::new(5.0, 5.0);
    assert!((p.x - 50.0).abs() < 1e-9 && (p.y - 50.0).abs() < 1e-9);
    let q = m * kurbo::Point::new(6.0, 5.0);
    assert!((q.x - 52.0).abs() < 1e-9);
    assert_eq!(tr.opacity_at(0.0), 0.5);
}

#[test]
fn split_position_is_supported() {
    let tr: TransformProps = serde_json::from_value(json!({
        "p": {"s": true, "x": {"a": 0, "k": 7}, "y": {"a": 0, "k": 9}}
    }))
    .unwrap();
    assert_eq!(tr.affine_at(0.0).translation(), kurbo::Vec2::new(7.0, 9.0));
}

#[test]
fn bezier_path_builds_closed_curve_and_interpolates() {
    let p = prop(json!({"a": 1, "k": [
        {"t": 0, "s": [{"c": true, "i": [[0,0],[0,0],[0,0]], "o": [[0,0],[0,0],[0,0]], "v": [[0,0],[10,0],[10,10]]}]},
        {"t": 10, "s": [{"c": true, "i": [[0,0],[0,0],[0,0]], "o": [[0,0],[0,0],[0,0]], "v": [[0,0],[20,0],[20,20]]}]}
    ]}));
    let mid = p.bezier_at(5.0).unwrap();
    assert_eq!(mid.v[1], vec![15.0, 0.0]);

    let path = mid.to_bez_path();
    let svg = path.to_svg();
    assert!(svg.starts_with('M'));
    assert!(svg.ends_with('Z'));
}

#[test]
fn document_counts_unsupported_features() {
    let doc: LottieDocument = serde_json::from_value(json!({
        "layers": [
            {"ty": 4, "shapes": [{"ty": "rc"}, {"ty": "tm"}, {"ty": "gr", "it": [{"ty": "gf"}]}]},
            {"ty": 2},
            {"ty": 3}
        ]
    }))
    .unwrap();
    assert_eq!(doc.unsupported_count(), 3);
    assert_eq!(doc.layers[1].kind(), LayerKind::Unsupported(2));
}

#[test]
fn layer_visibility_respects_in_and_out_points() {
    let layer: Layer = serde_json::from_value(json!({"ty": 4, "ip": 2, "op": 5})).unwrap();
    assert!(!layer.visible_at(1.0));
    assert!(layer.visible_at(2.0));
    assert!(layer.visible_at(4.9));
    assert!(!layer.visible_at(5.0));
}
