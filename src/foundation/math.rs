pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn unit_to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Composite a straight-alpha pixel over an opaque background.
pub(crate) fn flatten_over(px: [u8; 4], bg: [u8; 3]) -> [u8; 3] {
    let a = u16::from(px[3]);
    if a == 255 {
        return [px[0], px[1], px[2]];
    }
    let inv = 255 - a;
    let mix = |c: u8, b: u8| -> u8 {
        (mul_div255_u16(u16::from(c), a) + mul_div255_u16(u16::from(b), inv)).min(255) as u8
    };
    [mix(px[0], bg[0]), mix(px[1], bg[1]), mix(px[2], bg[2])]
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
