//! Packed `0xRRGGBB` colours.

use ratatui::style::Color;

/// Water behind the fish.
pub const TANK_BACKGROUND: u32 = 0x0b1d2a;

pub fn channels(color: u32) -> [u8; 3] {
    [(color >> 16) as u8, (color >> 8) as u8, color as u8]
}

/// CSS-style `rgba(r, g, b, a)` string.
pub fn rgba(color: u32, alpha: f64) -> String {
    let [r, g, b] = channels(color);
    format!("rgba({r}, {g}, {b}, {alpha})")
}

/// Terminal colour for `color` drawn at `alpha` over `background`.
pub fn blend(color: u32, alpha: f64, background: u32) -> Color {
    let alpha = alpha.clamp(0.0, 1.0);
    let fg = channels(color);
    let bg = channels(background);
    let mix = |i: usize| (fg[i] as f64 * alpha + bg[i] as f64 * (1.0 - alpha)).round() as u8;
    Color::Rgb(mix(0), mix(1), mix(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_channels() {
        assert_eq!(channels(0x01befe), [0x01, 0xbe, 0xfe]);
        // bits above 24 are ignored
        assert_eq!(channels(0xff_123456), [0x12, 0x34, 0x56]);
    }

    #[test]
    fn formats_rgba() {
        assert_eq!(rgba(0xff7d00, 1.0), "rgba(255, 125, 0, 1)");
        assert_eq!(rgba(0x000000, 0.5), "rgba(0, 0, 0, 0.5)");
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0xff0000, 1.0, 0x0000ff), Color::Rgb(255, 0, 0));
        assert_eq!(blend(0xff0000, 0.0, 0x0000ff), Color::Rgb(0, 0, 255));
        assert_eq!(blend(0xffffff, 0.5, 0x000000), Color::Rgb(128, 128, 128));
    }
}
