// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Light classifiers: average-color temperature and brightness-band coverage

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::luma;
use crate::config::AnalysisConfig;
use crate::{PlantPalError, Result};

/// Coarse hue balance of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTemperature {
    Warm,
    Cool,
    Neutral,
}

impl fmt::Display for ColorTemperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColorTemperature::Warm => "warm",
            ColorTemperature::Cool => "cool",
            ColorTemperature::Neutral => "neutral",
        })
    }
}

/// Overall light level derived from band coverage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightLevel {
    High,
    Medium,
    Low,
}

impl fmt::Display for LightLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LightLevel::High => "High",
            LightLevel::Medium => "Medium",
            LightLevel::Low => "Low",
        })
    }
}

/// How the medium band is bounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandMode {
    /// high: gray > high, medium: medium < gray <= high, low: the rest.
    /// Percentages always sum to 100.
    #[default]
    Disjoint,
    /// medium is an independent `gray > medium` threshold, so it also
    /// counts every high pixel. Low is the complement of high and medium.
    Overlapping,
}

impl FromStr for BandMode {
    type Err = PlantPalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "disjoint" => Ok(BandMode::Disjoint),
            "overlapping" => Ok(BandMode::Overlapping),
            other => Err(PlantPalError::Validation(format!(
                "unknown band mode '{}' (expected disjoint or overlapping)",
                other
            ))),
        }
    }
}

/// Mean channel values and the temperature they map to
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorReading {
    pub temperature: ColorTemperature,
    pub mean_red: f64,
    pub mean_green: f64,
    pub mean_blue: f64,
}

/// Brightness-band coverage in percent of all pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BrightnessReport {
    pub level: LightLevel,
    pub high_percent: f64,
    pub medium_percent: f64,
    pub low_percent: f64,
}

/// Thresholds for both classifiers
#[derive(Debug, Clone, PartialEq)]
pub struct LightClassifier {
    /// Channel difference (0-255 scale) needed to call an image warm or cool
    pub temperature_threshold: f64,
    /// Gray level above which a pixel is "high"
    pub high_threshold: u8,
    /// Gray level above which a pixel is at least "medium"
    pub medium_threshold: u8,
    /// Band share (percent) a level must exceed to win
    pub majority_percent: f64,
    pub band_mode: BandMode,
}

impl Default for LightClassifier {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

fn ensure_not_empty(img: &RgbImage) -> Result<u64> {
    let total = img.width() as u64 * img.height() as u64;
    if total == 0 {
        return Err(PlantPalError::InvalidImage("image has no pixels".to_string()));
    }
    Ok(total)
}

impl LightClassifier {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            temperature_threshold: config.temperature_threshold,
            high_threshold: config.high_threshold,
            medium_threshold: config.medium_threshold,
            majority_percent: config.majority_percent,
            band_mode: config.band_mode,
        }
    }

    pub fn with_band_mode(mut self, band_mode: BandMode) -> Self {
        self.band_mode = band_mode;
        self
    }

    /// Classify by mean red against mean blue. Green is reported but not used.
    pub fn color_temperature(&self, img: &RgbImage) -> Result<ColorReading> {
        let total = ensure_not_empty(img)?;

        let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
        for pixel in img.pixels() {
            r += pixel.0[0] as u64;
            g += pixel.0[1] as u64;
            b += pixel.0[2] as u64;
        }

        let mean_red = r as f64 / total as f64;
        let mean_green = g as f64 / total as f64;
        let mean_blue = b as f64 / total as f64;

        let temperature = if mean_blue > mean_red + self.temperature_threshold {
            ColorTemperature::Cool
        } else if mean_red > mean_blue + self.temperature_threshold {
            ColorTemperature::Warm
        } else {
            ColorTemperature::Neutral
        };

        debug!(
            "Mean RGB ({:.1}, {:.1}, {:.1}) -> {}",
            mean_red, mean_green, mean_blue, temperature
        );

        Ok(ColorReading {
            temperature,
            mean_red,
            mean_green,
            mean_blue,
        })
    }

    /// Band coverage and the resulting light level.
    ///
    /// High wins over Medium; when neither band holds a majority the result
    /// is Low, even if the low band is not the largest.
    pub fn brightness(&self, img: &RgbImage) -> Result<BrightnessReport> {
        let total = ensure_not_empty(img)?;

        let (mut high, mut medium, mut low) = (0u64, 0u64, 0u64);
        for pixel in img.pixels() {
            let [r, g, b] = pixel.0;
            let gray = luma(r, g, b);
            if gray > self.high_threshold {
                high += 1;
                if self.band_mode == BandMode::Overlapping {
                    medium += 1;
                }
            } else if gray > self.medium_threshold {
                medium += 1;
            } else {
                low += 1;
            }
        }

        let percent = |count: u64| count as f64 * 100.0 / total as f64;
        let high_percent = percent(high);
        let medium_percent = percent(medium);
        let low_percent = percent(low);

        let level = if high_percent > self.majority_percent {
            LightLevel::High
        } else if medium_percent > self.majority_percent {
            LightLevel::Medium
        } else {
            LightLevel::Low
        };

        debug!(
            "Brightness bands high={:.1}% medium={:.1}% low={:.1}% -> {}",
            high_percent, medium_percent, low_percent, level
        );

        Ok(BrightnessReport {
            level,
            high_percent,
            medium_percent,
            low_percent,
        })
    }
}

/// Color temperature with the default 15-unit threshold
pub fn classify_color_temperature(img: &RgbImage) -> Result<ColorReading> {
    LightClassifier::default().color_temperature(img)
}

/// Brightness bands with the default 180/100 thresholds
pub fn classify_brightness(img: &RgbImage, band_mode: BandMode) -> Result<BrightnessReport> {
    LightClassifier::default()
        .with_band_mode(band_mode)
        .brightness(img)
}
