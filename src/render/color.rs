use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MAX_ELEVATION_DEG: f64 = 90.0;

#[derive(Debug, Error, PartialEq)]
pub enum ColorError {
    #[error("elevation is not a finite number: {0}")]
    NonFinite(f64),
    #[error("invalid color '{0}', expected #rrggbb")]
    InvalidHex(String),
}

/// 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Relative luminance (Rec. 709 weights on the raw channels), 0 to 255.
    pub fn luminance(&self) -> f64 {
        0.2126 * self.r as f64 + 0.7152 * self.g as f64 + 0.0722 * self.b as f64
    }

    /// Text color readable on top of `self`.
    pub fn foreground(&self) -> Rgb {
        if self.luminance() >= 140.0 {
            Rgb::BLACK
        } else {
            Rgb::WHITE
        }
    }

    /// True when no channel of `self` is above the matching channel of `other`.
    pub fn is_dimmer_or_equal(&self, other: &Rgb) -> bool {
        self.r <= other.r && self.g <= other.g && self.b <= other.b
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorError::InvalidHex(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Elevation anchors: `low` at the horizon, `high` at zenith.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ColorScale {
    #[serde(default = "default_low")]
    pub low: Rgb,
    #[serde(default = "default_high")]
    pub high: Rgb,
}

fn default_low() -> Rgb {
    Rgb::new(0x10, 0x20, 0x40)
}

fn default_high() -> Rgb {
    Rgb::new(0xf0, 0xe0, 0xa0)
}

impl Default for ColorScale {
    fn default() -> Self {
        Self {
            low: default_low(),
            high: default_high(),
        }
    }
}

impl ColorScale {
    pub fn map(&self, elevation_deg: f64) -> Result<Rgb, ColorError> {
        map_color(elevation_deg, self.low, self.high)
    }
}

/// Linear interpolation from `low` to `high` by `elevation / 90`.
///
/// Elevation is clamped to [0, 90]. With every channel of `high` at or above
/// the one in `low`, the result never gets darker as elevation increases.
pub fn map_color(elevation_deg: f64, low: Rgb, high: Rgb) -> Result<Rgb, ColorError> {
    if !elevation_deg.is_finite() {
        return Err(ColorError::NonFinite(elevation_deg));
    }
    let t = elevation_deg.clamp(0.0, MAX_ELEVATION_DEG) / MAX_ELEVATION_DEG;
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    Ok(Rgb::new(
        lerp(low.r, high.r),
        lerp(low.g, high.g),
        lerp(low.b, high.b),
    ))
}
