//! Hex color conversion.

/// Split a `0xRRGGBB` value into normalized sRGB components.
#[must_use]
pub fn hex_to_srgb(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
    [channel(16), channel(8), channel(0)]
}

/// sRGB transfer function inverse for one channel.
#[must_use]
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// `0xRRGGBB` to linear RGB, as used for shading and clear colors.
#[must_use]
pub fn srgb_hex_to_linear(hex: u32) -> [f32; 3] {
    hex_to_srgb(hex).map(srgb_to_linear)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_channels_split() {
        assert_eq!(hex_to_srgb(0xff0000), [1.0, 0.0, 0.0]);
        assert_eq!(hex_to_srgb(0x00ff00), [0.0, 1.0, 0.0]);
        assert_eq!(hex_to_srgb(0x0000ff), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn black_and_white_are_fixed_points() {
        assert_eq!(srgb_hex_to_linear(0x000000), [0.0; 3]);
        let white = srgb_hex_to_linear(0xffffff);
        assert!(white.iter().all(|c| (c - 1.0).abs() < 1e-6));
    }

    #[test]
    fn ground_grey_is_darker_in_linear() {
        let [r, g, b] = srgb_hex_to_linear(0xcbcbcb);
        assert!((r - 0.597).abs() < 1e-3);
        assert_eq!(r, g);
        assert_eq!(g, b);
    }
}
