//! Color parsing and conversion between hex, RGB and HSL notations.

use once_cell::sync::Lazy;
use regex::Regex;

static HEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid regex"));

static RGB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^rgb\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*\)$").expect("valid regex")
});

static HSL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^hsl\(\s*(\d{1,3})\s*,\s*(\d{1,3})%?\s*,\s*(\d{1,3})%?\s*\)$")
        .expect("valid regex")
});

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Parse `#rgb`, `#rrggbb`, `rgb(r, g, b)` or `hsl(h, s%, l%)`.
    ///
    /// Channels outside 0-255, saturation or lightness outside 0-100, and
    /// hue outside 0-360 are rejected.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        Self::parse_hex(input)
            .or_else(|| Self::parse_rgb(input))
            .or_else(|| Self::parse_hsl(input))
    }

    fn parse_hex(input: &str) -> Option<Self> {
        let digits = HEX_RE.captures(input)?.get(1)?.as_str();
        let expanded: String = if digits.len() == 3 {
            digits.chars().flat_map(|c| [c, c]).collect()
        } else {
            digits.to_string()
        };

        Some(Self {
            r: u8::from_str_radix(&expanded[0..2], 16).ok()?,
            g: u8::from_str_radix(&expanded[2..4], 16).ok()?,
            b: u8::from_str_radix(&expanded[4..6], 16).ok()?,
        })
    }

    fn parse_rgb(input: &str) -> Option<Self> {
        let caps = RGB_RE.captures(input)?;
        let channel = |i: usize| caps.get(i)?.as_str().parse::<u8>().ok();
        Some(Self {
            r: channel(1)?,
            g: channel(2)?,
            b: channel(3)?,
        })
    }

    fn parse_hsl(input: &str) -> Option<Self> {
        let caps = HSL_RE.captures(input)?;
        let value = |i: usize| caps.get(i)?.as_str().parse::<u16>().ok();
        let (h, s, l) = (value(1)?, value(2)?, value(3)?);
        if h > 360 || s > 100 || l > 100 {
            return None;
        }
        Some(Self::from_hsl(h as f64, s as f64 / 100.0, l as f64 / 100.0))
    }

    fn from_hsl(h: f64, s: f64, l: f64) -> Self {
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let h_prime = (h % 360.0) / 60.0;
        let x = c * (1.0 - (h_prime % 2.0 - 1.0).abs());
        let (r1, g1, b1) = match h_prime as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;

        Self {
            r: channel(r1),
            g: channel(g1),
            b: channel(b1),
        }
    }

    /// Hue in degrees, saturation and lightness in percent, all rounded.
    pub fn to_hsl(self) -> (u16, u8, u8) {
        let r = self.r as f64 / 255.0;
        let g = self.g as f64 / 255.0;
        let b = self.b as f64 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;
        let l = (max + min) / 2.0;

        if delta == 0.0 {
            return (0, 0, (l * 100.0).round() as u8);
        }

        let s = delta / (1.0 - (2.0 * l - 1.0).abs());
        let h = if max == r {
            60.0 * (((g - b) / delta).rem_euclid(6.0))
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };

        (
            (h.round() as u16) % 360,
            (s * 100.0).round() as u8,
            (l * 100.0).round() as u8,
        )
    }

    /// `#RRGGBB`, uppercase.
    pub fn hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn rgb_string(self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }

    pub fn hsl_string(self) -> String {
        let (h, s, l) = self.to_hsl();
        format!("hsl({}, {}%, {}%)", h, s, l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        let red = Color::parse("#ff0000").unwrap();
        assert_eq!(red, Color { r: 255, g: 0, b: 0 });
        assert_eq!(red.hex(), "#FF0000");
        assert_eq!(red.rgb_string(), "rgb(255, 0, 0)");
        assert_eq!(red.hsl_string(), "hsl(0, 100%, 50%)");

        assert_eq!(Color::parse("#0f8").unwrap().hex(), "#00FF88");
        assert!(Color::parse("ff0000").is_none());
        assert!(Color::parse("#ff00").is_none());
        assert!(Color::parse("#gg0000").is_none());
    }

    #[test]
    fn test_parse_rgb() {
        let color = Color::parse("RGB(18, 52, 86)").unwrap();
        assert_eq!(color.hex(), "#123456");
        assert!(Color::parse("rgb(256, 0, 0)").is_none());
        assert!(Color::parse("rgb(1, 2)").is_none());
    }

    #[test]
    fn test_parse_hsl() {
        let green = Color::parse("hsl(120, 100%, 50%)").unwrap();
        assert_eq!(green.hex(), "#00FF00");
        assert_eq!(Color::parse("hsl(0, 0, 100)").unwrap().hex(), "#FFFFFF");
        assert!(Color::parse("hsl(361, 50%, 50%)").is_none());
        assert!(Color::parse("hsl(10, 101%, 50%)").is_none());
    }

    #[test]
    fn test_hsl_of_grays_and_blues() {
        assert_eq!(Color { r: 128, g: 128, b: 128 }.to_hsl(), (0, 0, 50));
        assert_eq!(Color { r: 0, g: 0, b: 255 }.to_hsl(), (240, 100, 50));
        assert_eq!(Color { r: 255, g: 0, b: 255 }.hsl_string(), "hsl(300, 100%, 50%)");
    }
}
