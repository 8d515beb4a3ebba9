// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Recommendation flows that combine local analysis with the vision model
//!
//! Each flow takes everything it needs as arguments (image bytes, user
//! answers, collaborators) and returns a plain value. Nothing is kept
//! between calls.

pub mod health;

use serde::Serialize;
use tracing::info;

use crate::analysis::{decode_image, encode_for_model, LightAnalysis, LightClassifier};
use crate::config::{render_template, AppConfig};
use crate::providers::{Coordinates, DailyWeather, Geolocator, VisionModel, WeatherProvider};
use crate::{PlantPalError, Result};

pub use health::{
    add_progress_photo, assess_health, parse_health_response, save_reminder, HealthAssessment,
    ReminderSettings,
};

/// Accepted indoor room temperature range, °C
pub const ROOM_TEMP_RANGE: std::ops::RangeInclusive<i32> = -50..=50;
/// Room temperature assumed when the user gives none
pub const DEFAULT_ROOM_TEMP_C: i32 = 22;

/// How the indoor temperature is known
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoomClimate {
    /// The user has AC and reports the room temperature
    AirConditioned { room_temp_c: i32 },
    /// No AC: today's outdoor weather stands in
    Unconditioned,
}

/// Everything the indoor recommender asks the user
#[derive(Debug, Clone)]
pub struct IndoorRequest {
    /// Encoded image as uploaded (JPEG, PNG, ...)
    pub image: Vec<u8>,
    pub climate: RoomClimate,
    pub has_pet: bool,
}

/// Temperature information that went into a prompt
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Conditions {
    Room { temp_c: i32 },
    Outdoor { location: Coordinates, weather: DailyWeather },
}

/// Indoor recommender output
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub analysis: LightAnalysis,
    pub conditions: Conditions,
    pub prompt: String,
    pub response: String,
}

/// Outdoor advisor output
#[derive(Debug, Clone, Serialize)]
pub struct OutdoorAdvice {
    pub location: Coordinates,
    pub weather: DailyWeather,
    pub prompt: String,
    pub response: String,
}

fn yes_no(value: bool) -> String {
    let answer = if value { "Yes" } else { "No" };
    answer.to_string()
}

fn weather_values(weather: &DailyWeather) -> [(&'static str, String); 2] {
    [
        ("max_temp", format!("{}", weather.max_temp_c)),
        ("sunshine", format!("{:.0}", weather.sunshine_minutes)),
    ]
}

/// Build the indoor prompt for an analysis and known conditions
pub fn indoor_prompt(
    config: &AppConfig,
    analysis: &LightAnalysis,
    conditions: &Conditions,
    has_pet: bool,
) -> String {
    let mut values = vec![
        ("light", analysis.temperature.temperature.to_string()),
        ("zone", analysis.zone.to_string()),
        ("pet", yes_no(has_pet)),
    ];

    let template = match conditions {
        Conditions::Room { temp_c } => {
            values.push(("room_temp", temp_c.to_string()));
            &config.prompts.indoor
        }
        Conditions::Outdoor { weather, .. } => {
            values.extend(weather_values(weather));
            &config.prompts.indoor_weather
        }
    };

    render_template(template, &values)
}

/// Build the outdoor prompt for today's weather
pub fn outdoor_prompt(config: &AppConfig, weather: &DailyWeather) -> String {
    render_template(&config.prompts.outdoor, &weather_values(weather))
}

async fn lookup_weather(
    geolocator: &dyn Geolocator,
    weather: &dyn WeatherProvider,
) -> Result<(Coordinates, DailyWeather)> {
    let location = geolocator.locate().await?;
    let forecast = weather.daily(location).await?;
    info!(
        "Weather at {}: max {}°C, {:.0} min sunshine",
        location, forecast.max_temp_c, forecast.sunshine_minutes
    );
    Ok((location, forecast))
}

/// Analyze an indoor photo and ask the model for three suitable plants
pub async fn recommend_indoor(
    request: &IndoorRequest,
    model: &dyn VisionModel,
    geolocator: &dyn Geolocator,
    weather: &dyn WeatherProvider,
    config: &AppConfig,
) -> Result<Recommendation> {
    if let RoomClimate::AirConditioned { room_temp_c } = request.climate {
        if !ROOM_TEMP_RANGE.contains(&room_temp_c) {
            return Err(PlantPalError::Validation(format!(
                "room temperature {}°C is outside {}..={}",
                room_temp_c,
                ROOM_TEMP_RANGE.start(),
                ROOM_TEMP_RANGE.end()
            )));
        }
    }

    let img = decode_image(&request.image)?;
    let analysis = LightAnalysis::run(&img, &LightClassifier::from_config(&config.analysis))?;
    info!(
        "Indoor analysis: zone {}, {} light, level {}",
        analysis.zone, analysis.temperature.temperature, analysis.brightness.level
    );

    let conditions = match request.climate {
        RoomClimate::AirConditioned { room_temp_c } => Conditions::Room { temp_c: room_temp_c },
        RoomClimate::Unconditioned => {
            let (location, weather) = lookup_weather(geolocator, weather).await?;
            Conditions::Outdoor { location, weather }
        }
    };

    let prompt = indoor_prompt(config, &analysis, &conditions, request.has_pet);
    info!("Asking {} for indoor recommendations", model.name());
    let response = model.describe(&encode_for_model(&request.image), &prompt).await?;

    Ok(Recommendation {
        analysis,
        conditions,
        prompt,
        response,
    })
}

/// Ask the model what grows safely in an outdoor space given today's weather
pub async fn advise_outdoor(
    image: &[u8],
    model: &dyn VisionModel,
    geolocator: &dyn Geolocator,
    weather: &dyn WeatherProvider,
    config: &AppConfig,
) -> Result<OutdoorAdvice> {
    // Reject unreadable uploads before spending a network round trip
    decode_image(image)?;

    let (location, forecast) = lookup_weather(geolocator, weather).await?;
    let prompt = outdoor_prompt(config, &forecast);

    info!("Asking {} for outdoor advice", model.name());
    let response = model.describe(&encode_for_model(image), &prompt).await?;

    Ok(OutdoorAdvice {
        location,
        weather: forecast,
        prompt,
        response,
    })
}
