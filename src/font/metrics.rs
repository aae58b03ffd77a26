//! Advance widths for the standard PDF fonts we ship metrics for.
//!
//! Values come from the Adobe Font Metrics files and are expressed in units of
//! 1/1000 em. Only the printable ASCII range is tabulated; other WinAnsi bytes
//! fall back to the font's average width.

/// Metrics for one standard font face.
#[derive(Debug)]
pub struct StandardFontMetrics {
    /// Widths for bytes 0x20..=0x7E.
    widths: [u16; 95],
    /// Used for WinAnsi bytes outside the tabulated range.
    default_width: u16,
    pub ascender: i16,
    pub descender: i16,
}

impl StandardFontMetrics {
    /// Advance width of one encoded byte, in 1/1000 em.
    pub fn byte_width(&self, b: u8) -> u16 {
        match b {
            0x20..=0x7E => self.widths[(b - 0x20) as usize],
            _ => self.default_width,
        }
    }

    /// Width of an already-encoded byte string in points.
    pub fn measure_bytes(&self, bytes: &[u8], font_size: f64) -> f64 {
        let units: u32 = bytes.iter().map(|&b| self.byte_width(b) as u32).sum();
        units as f64 * font_size / 1000.0
    }

    /// Distance from the top of the line box to the baseline, in points.
    pub fn ascent(&self, font_size: f64) -> f64 {
        self.ascender as f64 * font_size / 1000.0
    }
}

pub static HELVETICA: StandardFontMetrics = StandardFontMetrics {
    widths: [
        // space ! " # $ % & ' ( ) * + , - . /
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0-9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // : ; < = > ? @
        278, 278, 584, 584, 584, 556, 1015,
        // A-Z
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [ \ ] ^ _ `
        278, 278, 278, 469, 556, 333,
        // a-z
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
        // { | } ~
        334, 260, 334, 584,
    ],
    default_width: 556,
    ascender: 718,
    descender: -207,
};

pub static HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
    widths: [
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        333, 333, 584, 584, 584, 611, 975,
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        333, 278, 333, 584, 556, 333,
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
        389, 280, 389, 584,
    ],
    default_width: 611,
    ascender: 718,
    descender: -207,
};

/// Courier is monospaced: every glyph is 600 units wide.
pub static COURIER: StandardFontMetrics = StandardFontMetrics {
    widths: [600; 95],
    default_width: 600,
    ascender: 629,
    descender: -157,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_width() {
        assert_eq!(HELVETICA.byte_width(b' '), 278);
        assert!((HELVETICA.measure_bytes(b" ", 12.0) - 3.336).abs() < 0.001);
    }

    #[test]
    fn test_bold_is_wider_for_lowercase() {
        assert!(HELVETICA_BOLD.byte_width(b'b') > HELVETICA.byte_width(b'b'));
    }

    #[test]
    fn test_courier_monospaced() {
        let a = COURIER.measure_bytes(b"iiii", 10.0);
        let b = COURIER.measure_bytes(b"WWWW", 10.0);
        assert!((a - b).abs() < f64::EPSILON);
        assert!((a - 24.0).abs() < 0.001);
    }

    #[test]
    fn test_untabulated_byte_uses_default() {
        assert_eq!(HELVETICA.byte_width(0xE9), 556);
    }
}
