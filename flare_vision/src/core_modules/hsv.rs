// THEORY (HSV):
// Flame pixels are defined by *hue* (red through yellow) at high *saturation*
// and *value*. Thresholding raw RGB channels would make the fire band drift with
// every change of exposure; HSV separates "which color" from "how bright" and
// keeps the band stable.
//
// Scale convention: the 8-bit HSV layout used by OpenCV and by the tuned
// thresholds this engine ships with.
//   • H in 0..=179 (degrees halved so a full turn fits a byte)
//   • S in 0..=255 (chroma / value, scaled)
//   • V in 0..=255 (max channel)
// Rounding is half-up, which keeps converted values bit-compatible with
// thresholds tuned against OpenCV captures.

use crate::error::AnalyzerError;
use serde::{Deserialize, Serialize};

/// Largest hue value on the halved-degree scale.
pub const MAX_HUE: u8 = 179;

/// One pixel on the 8-bit HSV scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct HsvPixel {
    pub hue: u8,
    pub saturation: u8,
    pub value: u8,
}

impl HsvPixel {
    pub const fn new(hue: u8, saturation: u8, value: u8) -> Self {
        Self {
            hue,
            saturation,
            value,
        }
    }

    /// Converts 8-bit RGB samples.
    pub fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        let (red, green, blue) = (red as i32, green as i32, blue as i32);
        let maximum_channel = red.max(green.max(blue));
        let minimum_channel = red.min(green.min(blue));
        let chroma = maximum_channel - minimum_channel;

        let saturation = if maximum_channel == 0 {
            0
        } else {
            round_half_up(chroma as f32 * 255.0 / maximum_channel as f32)
        };

        if chroma == 0 {
            return Self::new(0, saturation as u8, maximum_channel as u8);
        }

        let (base_difference, sector_offset) = if maximum_channel == red {
            (green - blue, 0)
        } else if maximum_channel == green {
            (blue - red, 2 * chroma)
        } else {
            (red - green, 4 * chroma)
        };

        // 60 degrees per sector, halved.
        let mut hue = round_half_up((base_difference + sector_offset) as f32 * 30.0 / chroma as f32);
        if hue < 0 {
            hue += 180;
        }

        Self::new(hue as u8, saturation as u8, maximum_channel as u8)
    }

    /// Converts 8-bit BGR samples, the order OpenCV captures arrive in.
    pub fn from_bgr(blue: u8, green: u8, red: u8) -> Self {
        Self::from_rgb(red, green, blue)
    }

    pub fn as_array(&self) -> [u8; 3] {
        [self.hue, self.saturation, self.value]
    }
}

impl From<[u8; 3]> for HsvPixel {
    fn from(components: [u8; 3]) -> Self {
        Self::new(components[0], components[1], components[2])
    }
}

fn round_half_up(value: f32) -> i32 {
    (value + 0.5).floor() as i32
}

/// An inclusive, component-wise HSV band. Constructed only through `new`,
/// which guarantees `lower <= upper` on every component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    lower: HsvPixel,
    upper: HsvPixel,
}

impl HsvRange {
    pub fn new(lower: HsvPixel, upper: HsvPixel) -> Result<Self, AnalyzerError> {
        if lower.hue > MAX_HUE || upper.hue > MAX_HUE {
            return Err(AnalyzerError::Configuration(format!(
                "hue bounds must be within 0..={MAX_HUE}, got {} and {}",
                lower.hue, upper.hue
            )));
        }
        let components = [
            ("hue", lower.hue, upper.hue),
            ("saturation", lower.saturation, upper.saturation),
            ("value", lower.value, upper.value),
        ];
        for (name, low, high) in components {
            if low > high {
                return Err(AnalyzerError::Configuration(format!(
                    "lower {name} bound {low} exceeds upper bound {high}"
                )));
            }
        }
        Ok(Self { lower, upper })
    }

    pub fn lower(&self) -> HsvPixel {
        self.lower
    }

    pub fn upper(&self) -> HsvPixel {
        self.upper
    }

    #[inline]
    pub fn contains(&self, pixel: HsvPixel) -> bool {
        (self.lower.hue..=self.upper.hue).contains(&pixel.hue)
            && (self.lower.saturation..=self.upper.saturation).contains(&pixel.saturation)
            && (self.lower.value..=self.upper.value).contains(&pixel.value)
    }
}
