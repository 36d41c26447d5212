//! Color palettes for normalized intensities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Maps an intensity in `[0, 1]` to an RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Palette {
    /// Black to white
    #[default]
    Gray,
    /// Black through red and yellow to white
    Hot,
    /// Full hue wheel; both ends map to red, which suits phase
    Cyclic,
}

impl Palette {
    /// Color for `intensity`, which must lie in `[0, 1]`.
    pub fn color(self, intensity: f64) -> [u8; 3] {
        match self {
            Palette::Gray => {
                let v = quantize(intensity);
                [v, v, v]
            }
            Palette::Hot => {
                let t = intensity * 3.0;
                [quantize(t), quantize(t - 1.0), quantize(t - 2.0)]
            }
            Palette::Cyclic => hue(intensity * 6.0),
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Palette::Gray => "gray",
            Palette::Hot => "hot",
            Palette::Cyclic => "cyclic",
        })
    }
}

impl FromStr for Palette {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gray" | "grey" => Ok(Palette::Gray),
            "hot" => Ok(Palette::Hot),
            "cyclic" | "hue" => Ok(Palette::Cyclic),
            other => Err(format!(
                "unknown palette '{}' (expected gray, hot or cyclic)",
                other
            )),
        }
    }
}

/// Quantize an intensity to a byte, clamping to `[0, 1]` first.
#[inline]
pub fn quantize(intensity: f64) -> u8 {
    (intensity.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Fully saturated color at `sector` (0..=6) around the hue wheel.
fn hue(sector: f64) -> [u8; 3] {
    let sector = sector.clamp(0.0, 6.0);
    let x = quantize(1.0 - (sector % 2.0 - 1.0).abs());
    match sector as u32 {
        0 => [255, x, 0],
        1 => [x, 255, 0],
        2 => [0, 255, x],
        3 => [0, x, 255],
        4 => [x, 0, 255],
        _ => [255, 0, x],
    }
}
