use super::*;
use crate::foundation::core::FrameIndex;

fn frame_from(pixels: &[[u8; 4]], width: u32) -> FrameRGBA {
    let height = pixels.len() as u32 / width;
    let data = pixels.iter().flatten().copied().collect();
    FrameRGBA::new(FrameIndex(0), width, height, data).unwrap()
}

#[test]
fn alpha_at_or_below_threshold_maps_to_reserved_index() {
    let f = frame_from(
        &[[10, 20, 30, 0], [10, 20, 30, 127], [10, 20, 30, 128], [200, 0, 0, 255]],
        2,
    );
    let out = quantize(&f, &QuantizeOptions::default());

    assert_eq!(out.transparent, Some(TRANSPARENT_INDEX));
    assert_eq!(out.indices[0], TRANSPARENT_INDEX);
    assert_eq!(out.indices[1], TRANSPARENT_INDEX);
    assert_ne!(out.indices[2], TRANSPARENT_INDEX);
    assert_ne!(out.indices[3], TRANSPARENT_INDEX);
}

#[test]
fn few_colors_get_an_exact_palette_after_the_reserved_slot() {
    let f = frame_from(
        &[[255, 0, 0, 255], [0, 255, 0, 255], [255, 0, 0, 255], [0, 0, 255, 255]],
        2,
    );
    let out = quantize(&f, &QuantizeOptions::default());

    assert_eq!(out.palette_len(), 4);
    assert_eq!(out.indices, vec![1, 2, 1, 3]);
    assert_eq!(&out.palette[3..6], &[255, 0, 0]);
    assert_eq!(&out.palette[6..9], &[0, 255, 0]);
    assert_eq!(&out.palette[9..12], &[0, 0, 255]);
}

#[test]
fn semi_transparent_pixels_keep_their_straight_color() {
    let f = frame_from(&[[40, 80, 120, 200]], 1);
    let out = quantize(&f, &QuantizeOptions::default());
    let idx = usize::from(out.indices[0]);
    assert_eq!(&out.palette[idx * 3..idx * 3 + 3], &[40, 80, 120]);
}

#[test]
fn opaque_mode_flattens_over_background_without_transparent_index() {
    let opts = QuantizeOptions {
        transparency: false,
        background: Rgba8::WHITE,
        ..QuantizeOptions::default()
    };
    let f = frame_from(&[[255, 0, 0, 0], [255, 0, 0, 255]], 2);
    let out = quantize(&f, &opts);

    assert_eq!(out.transparent, None);
    assert_eq!(out.palette_len(), 2);
    assert_eq!(&out.palette[0..3], &[255, 255, 255]);
    assert_eq!(&out.palette[3..6], &[255, 0, 0]);
    assert_eq!(out.indices, vec![0, 1]);
}

#[test]
fn fully_transparent_frame_has_only_the_reserved_entry() {
    let f = frame_from(&[[0, 0, 0, 0]; 6], 3);
    let out = quantize(&f, &QuantizeOptions::default());
    assert_eq!(out.palette_len(), 1);
    assert!(out.indices.iter().all(|&i| i == TRANSPARENT_INDEX));
}

#[test]
fn many_colors_fall_back_to_neuquant_and_never_use_the_reserved_index() {
    let pixels: Vec<[u8; 4]> = (0u32..4096)
        .map(|i| [(i % 256) as u8, (i / 256 * 16) as u8, 7, 255])
        .collect();
    let f = frame_from(&pixels, 64);
    let out = quantize(&f, &QuantizeOptions::default());

    assert_eq!(out.palette_len(), 256);
    assert_eq!(out.indices.len(), 4096);
    assert!(out.indices.iter().all(|&i| i != TRANSPARENT_INDEX));
}

#[test]
fn quality_outside_neuquant_range_is_rejected() {
    for quality in [0u8, 31] {
        let opts = QuantizeOptions {
            quality,
            ..QuantizeOptions::default()
        };
        let err = opts.validate().unwrap_err();
        assert_eq!(err.kind(), "EncodeFailure");
    }
    assert!(QuantizeOptions::default().validate().is_ok());
}
