/// Color helpers and the display palette
///
/// Colors are RGB565 `u16` values, the native format of the GC9A01 panel.

/// Convert RGB888 to RGB565
pub const fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | ((b as u16 & 0xF8) >> 3)
}

/// Split RGB565 into its raw 5/6/5-bit channels
pub fn rgb565_channels(color: u16) -> (u8, u8, u8) {
    (
        ((color >> 11) & 0x1F) as u8,
        ((color >> 5) & 0x3F) as u8,
        (color & 0x1F) as u8,
    )
}

pub const BLACK: u16 = rgb565(0, 0, 0);
pub const WHITE: u16 = rgb565(255, 255, 255);
pub const GREEN: u16 = rgb565(0, 255, 0);
pub const YELLOW: u16 = rgb565(255, 255, 0);
pub const RED: u16 = rgb565(255, 0, 0);
pub const BLUE: u16 = rgb565(100, 150, 255);
pub const GRAY: u16 = rgb565(128, 128, 128);

pub const BACKGROUND: u16 = BLACK;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_colors() {
        assert_eq!(BLACK, 0x0000);
        assert_eq!(WHITE, 0xFFFF);
        assert_eq!(RED, 0xF800);
        assert_eq!(GREEN, 0x07E0);
        assert_eq!(YELLOW, 0xFFE0);
    }

    #[test]
    fn test_accent_blue_packing() {
        // 100,150,255 -> 0b01100 / 0b100101 / 0b11111
        assert_eq!(rgb565_channels(BLUE), (0b01100, 0b100101, 0b11111));
    }

    // Ensure color packing is correct
    #[test]
    fn test_rgb565_bit_packing() {
        let color = rgb565(0b11111000, 0b11111100, 0b11111000);

        assert_eq!((color >> 11) & 0x1F, 0b11111);  // Red: 5 bits
        assert_eq!((color >> 5) & 0x3F, 0b111111);  // Green: 6 bits
        assert_eq!(color & 0x1F, 0b11111);          // Blue: 5 bits
    }
}
