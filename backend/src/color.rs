//! Color classification
//!
//! Maps an HSB sample onto a small closed palette of named colors.

use crate::config::{HUE_WEIGHT, MIN_BRIGHTNESS, MIN_SATURATION};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Primary color of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum NamedColor {
    Pink,
    Blue,
    Green,
    Brown,
    White,
}

impl NamedColor {
    pub fn as_str(self) -> &'static str {
        match self {
            NamedColor::Pink => "pink",
            NamedColor::Blue => "blue",
            NamedColor::Green => "green",
            NamedColor::Brown => "brown",
            NamedColor::White => "white",
        }
    }
}

impl fmt::Display for NamedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamedColor {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pink" => Ok(NamedColor::Pink),
            "blue" => Ok(NamedColor::Blue),
            "green" => Ok(NamedColor::Green),
            "brown" => Ok(NamedColor::Brown),
            "white" => Ok(NamedColor::White),
            other => Err(format!("Unknown color '{}'", other)),
        }
    }
}

/// Hue (0-360), saturation (0-100) and brightness (0-100)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HsbSample {
    pub hue: f32,
    pub saturation: f32,
    pub brightness: f32,
}

/// Reference coordinates, in tie-break order
const PALETTE: [(NamedColor, HsbSample); 4] = [
    (NamedColor::Pink, HsbSample { hue: 300.0, saturation: 70.0, brightness: 80.0 }),
    (NamedColor::Blue, HsbSample { hue: 210.0, saturation: 88.0, brightness: 55.0 }),
    (NamedColor::Green, HsbSample { hue: 120.0, saturation: 75.0, brightness: 55.0 }),
    (NamedColor::Brown, HsbSample { hue: 25.0, saturation: 50.0, brightness: 40.0 }),
];

/// Classify a sample as the nearest palette color.
///
/// Low-chroma or dark samples short-circuit to white. Otherwise the hue
/// difference wraps around the color wheel and is weighted before squaring.
/// On equal distance the earlier palette entry wins.
pub fn classify(sample: HsbSample) -> NamedColor {
    if sample.saturation < MIN_SATURATION || sample.brightness < MIN_BRIGHTNESS {
        return NamedColor::White;
    }

    let mut closest = PALETTE[0].0;
    let mut min_distance = f32::MAX;

    for (color, reference) in PALETTE.iter() {
        let distance = distance(sample, *reference);
        if distance < min_distance {
            min_distance = distance;
            closest = *color;
        }
    }

    closest
}

fn distance(a: HsbSample, b: HsbSample) -> f32 {
    let raw_hue = (a.hue - b.hue).abs();
    let hue = raw_hue.min(360.0 - raw_hue);
    let saturation = a.saturation - b.saturation;
    let brightness = a.brightness - b.brightness;

    (HUE_WEIGHT * hue * hue + saturation * saturation + brightness * brightness).sqrt()
}
