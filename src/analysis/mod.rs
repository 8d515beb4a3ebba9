// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Light and placement analysis over a single in-memory RGB image
//!
//! Every analysis here is a pure, synchronous pass over a borrowed
//! [`RgbImage`]. Nothing is cached between calls.

pub mod annotate;
pub mod light;
pub mod zones;

use base64::{engine::general_purpose, Engine as _};
use image::{GrayImage, Luma, RgbImage};
use serde::Serialize;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

use crate::Result;

pub use light::{
    classify_brightness, classify_color_temperature, BandMode, BrightnessReport, ColorReading,
    ColorTemperature, LightClassifier, LightLevel,
};
pub use zones::{analyze_zones, suggest_placement_zone, Column, Row, ZoneAnalysis, ZoneLabel, ZoneScore};

/// Longest side sent to the vision model
const MODEL_MAX_SIDE: u32 = 1024;

/// BT.601 luma in 14-bit fixed point, rounded.
///
/// Weights sum to 2^14 so pure white maps to 255 exactly.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    ((r as u32 * R + g as u32 * G + b as u32 * B + (1 << 13)) >> 14) as u8
}

/// Convert an RGB image to grayscale with [`luma`]
pub fn to_gray(img: &RgbImage) -> GrayImage {
    let (width, height) = img.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let [r, g, b] = img.get_pixel(x, y).0;
        Luma([luma(r, g, b)])
    })
}

/// Decode an image file into RGB
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let img = image::open(path)?;
    debug!("Loaded {:?} ({}x{})", path, img.width(), img.height());
    Ok(img.to_rgb8())
}

/// Decode an in-memory image (upload, blob) into RGB
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage> {
    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgb8())
}

/// Encode an image as PNG bytes
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)?;
    Ok(buffer)
}

/// Resize large images and re-encode as JPEG for faster inference
fn prepare_for_model(bytes: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes)?;

    let img = if img.width() > MODEL_MAX_SIDE || img.height() > MODEL_MAX_SIDE {
        img.resize(MODEL_MAX_SIDE, MODEL_MAX_SIDE, image::imageops::FilterType::Triangle)
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = img.to_rgb8();
    let mut buffer = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Jpeg)?;

    Ok(buffer)
}

/// Base64 payload for the vision model, falling back to the raw bytes
pub fn encode_for_model(bytes: &[u8]) -> String {
    match prepare_for_model(bytes) {
        Ok(data) => general_purpose::STANDARD.encode(data),
        Err(e) => {
            warn!("Could not re-encode image for the model ({}), sending original bytes", e);
            general_purpose::STANDARD.encode(bytes)
        }
    }
}

/// All three light analyses over one image
#[derive(Debug, Clone, Serialize)]
pub struct LightAnalysis {
    /// Brightest cell of the 3x3 grid
    pub zone: ZoneLabel,
    /// Per-cell mean brightness, row-major
    pub zone_scores: Vec<ZoneScore>,
    /// Average-color temperature
    pub temperature: ColorReading,
    /// Brightness band coverage
    pub brightness: BrightnessReport,
}

impl LightAnalysis {
    pub fn run(img: &RgbImage, classifier: &LightClassifier) -> Result<Self> {
        let zones = analyze_zones(img)?;
        let temperature = classifier.color_temperature(img)?;
        let brightness = classifier.brightness(img)?;

        debug!(
            "Light analysis: zone={} temperature={} level={}",
            zones.best(),
            temperature.temperature,
            brightness.level
        );

        Ok(Self {
            zone: zones.best(),
            zone_scores: zones.scores().to_vec(),
            temperature,
            brightness,
        })
    }
}
