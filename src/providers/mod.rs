// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! External collaborators: location, weather, and vision-model inference
//!
//! The advisor flows only see these traits, so tests can hand in fakes.

pub mod geo;
pub mod weather;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Result;

pub use geo::{FixedLocation, IpInfoLocator};
pub use weather::OpenMeteoClient;

/// Latitude/longitude in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Today's forecast figures used in prompts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyWeather {
    /// Daily maximum air temperature, °C
    pub max_temp_c: f64,
    /// Daily minimum air temperature, °C
    pub min_temp_c: Option<f64>,
    /// Sunshine duration, minutes
    pub sunshine_minutes: f64,
}

/// Where the user is
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn locate(&self) -> Result<Coordinates>;
}

/// Daily forecast for a location
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn daily(&self, at: Coordinates) -> Result<DailyWeather>;
}

/// A vision-capable language model
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Name shown in logs and status output
    fn name(&self) -> &str;

    /// Answer `prompt` about a base64-encoded image
    async fn describe(&self, image_base64: &str, prompt: &str) -> Result<String>;
}
