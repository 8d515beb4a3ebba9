// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Open-Meteo daily forecast client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{Coordinates, DailyWeather, WeatherProvider};
use crate::config::WeatherConfig;
use crate::{PlantPalError, Result};

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    error: bool,
    reason: Option<String>,
    daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    /// Seconds of sunshine per day
    #[serde(default)]
    sunshine_duration: Vec<Option<f64>>,
}

/// Pick today's values out of a forecast body
pub fn parse_forecast(body: ForecastResponse) -> Result<DailyWeather> {
    if body.error {
        return Err(PlantPalError::Weather(
            body.reason.unwrap_or_else(|| "service reported an error".to_string()),
        ));
    }

    let daily = body
        .daily
        .ok_or_else(|| PlantPalError::Weather("response has no daily block".to_string()))?;

    let first = |values: &[Option<f64>]| values.first().copied().flatten();

    let max_temp_c = first(&daily.temperature_2m_max)
        .ok_or_else(|| PlantPalError::Weather("no maximum temperature for today".to_string()))?;
    let sunshine_seconds = first(&daily.sunshine_duration)
        .ok_or_else(|| PlantPalError::Weather("no sunshine duration for today".to_string()))?;

    Ok(DailyWeather {
        max_temp_c,
        min_temp_c: first(&daily.temperature_2m_min),
        sunshine_minutes: sunshine_seconds / 60.0,
    })
}

/// Client for the Open-Meteo forecast API
pub struct OpenMeteoClient {
    client: Client,
    url: String,
}

impl OpenMeteoClient {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn daily(&self, at: Coordinates) -> Result<DailyWeather> {
        debug!("Fetching forecast for {}", at);

        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("latitude", at.latitude.to_string()),
                ("longitude", at.longitude.to_string()),
                ("daily", "temperature_2m_max,temperature_2m_min,sunshine_duration".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?;

        // Open-Meteo reports bad requests as {"error": true, "reason": ...}
        // with a 400 status, so parse the body either way
        let status = response.status();
        let body: ForecastResponse = response.json().await.map_err(|e| {
            PlantPalError::Weather(format!("unreadable response (status {}): {}", status, e))
        })?;

        parse_forecast(body)
    }
}
