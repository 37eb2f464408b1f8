use super::*;

#[test]
fn mul_div255_rounds_to_nearest() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(255, 128), 128);
    assert_eq!(mul_div255_u16(0, 200), 0);
}

#[test]
fn unit_to_u8_clamps() {
    assert_eq!(unit_to_u8(-1.0), 0);
    assert_eq!(unit_to_u8(0.5), 128);
    assert_eq!(unit_to_u8(2.0), 255);
}

#[test]
fn flatten_straight_over_black_produces_expected_rgb() {
    // Straight red @ 50% alpha => rgb becomes 128,0,0 over black.
    assert_eq!(flatten_over([255, 0, 0, 128], [0, 0, 0]), [128, 0, 0]);
}

#[test]
fn flatten_alpha_0_returns_bg_and_alpha_255_is_identity() {
    assert_eq!(flatten_over([9, 9, 9, 0], [10, 20, 30]), [10, 20, 30]);
    assert_eq!(flatten_over([1, 2, 3, 255], [10, 20, 30]), [1, 2, 3]);
}
