// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for PlantPal

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analysis::BandMode;
use crate::providers::Coordinates;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// AI engine configuration
    pub ai_engine: EngineConfig,

    /// Prompt templates
    #[serde(default)]
    pub prompts: PromptConfig,

    /// Image analysis thresholds
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// IP geolocation lookup
    #[serde(default)]
    pub location: LocationConfig,

    /// Weather forecast lookup
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Watering reminder limits
    #[serde(default)]
    pub reminders: ReminderConfig,

    /// Web UI settings
    #[serde(default)]
    pub web: WebConfig,

    /// Database settings
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    pub url: String,
    pub models: ModelConfig,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModelConfig {
    pub vision: String,
}

/// Prompt templates. Placeholders are written `{name}`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PromptConfig {
    /// Indoor prompt when the room temperature is known (AC present).
    /// Placeholders: light, room_temp, zone, pet
    #[serde(default = "default_indoor_prompt")]
    pub indoor: String,
    /// Indoor prompt using outdoor weather instead.
    /// Placeholders: light, max_temp, sunshine, zone, pet
    #[serde(default = "default_indoor_weather_prompt")]
    pub indoor_weather: String,
    /// Placeholders: max_temp, sunshine
    #[serde(default = "default_outdoor_prompt")]
    pub outdoor: String,
    #[serde(default = "default_health_prompt")]
    pub health: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub band_mode: BandMode,
    #[serde(default = "default_temperature_threshold")]
    pub temperature_threshold: f64,
    #[serde(default = "default_high_threshold")]
    pub high_threshold: u8,
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: u8,
    #[serde(default = "default_majority_percent")]
    pub majority_percent: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LocationConfig {
    #[serde(default = "default_location_url")]
    pub url: String,
    /// Used when the lookup answers without a `loc` field
    #[serde(default = "default_fallback_location")]
    pub fallback: Coordinates,
    /// Skip the lookup entirely and use these coordinates
    #[serde(default)]
    pub fixed: Option<Coordinates>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_url")]
    pub url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReminderConfig {
    #[serde(default = "default_interval_days")]
    pub default_interval_days: u32,
    #[serde(default = "default_min_interval")]
    pub min_interval_days: u32,
    #[serde(default = "default_max_interval")]
    pub max_interval_days: u32,
    #[serde(default = "default_amount_ml")]
    pub default_amount_ml: u32,
    #[serde(default = "default_min_amount")]
    pub min_amount_ml: u32,
    #[serde(default = "default_max_amount")]
    pub max_amount_ml: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

// Default value functions
fn default_timeout() -> u64 { 120 }
fn default_retries() -> u32 { 2 }
fn default_temperature_threshold() -> f64 { 15.0 }
fn default_high_threshold() -> u8 { 180 }
fn default_medium_threshold() -> u8 { 100 }
fn default_majority_percent() -> f64 { 50.0 }
fn default_location_url() -> String { "https://ipinfo.io/json".to_string() }
fn default_fallback_location() -> Coordinates { Coordinates::new(13.0827, 80.2707) }
fn default_weather_url() -> String { "https://api.open-meteo.com/v1/forecast".to_string() }
fn default_interval_days() -> u32 { 7 }
fn default_min_interval() -> u32 { 1 }
fn default_max_interval() -> u32 { 30 }
fn default_amount_ml() -> u32 { 500 }
fn default_min_amount() -> u32 { 250 }
fn default_max_amount() -> u32 { 10_000 }
fn default_web_host() -> String { "127.0.0.1".to_string() }
fn default_web_port() -> u16 { 8080 }
fn default_db_path() -> String { "plantpal.db".to_string() }

fn default_indoor_prompt() -> String {
    "Analyze this indoor image and infer:\n\
     1. Suggested light level: {light}\n\
     2. Room size: medium\n\
     3. Room temperature: {room_temp}°C\n\
     4. Optimal placement zone for the plant pot: {zone} (Please place the plant in this zone for best results.)\n\
     5. Does the user own a pet? {pet}. (Make sure the plants you suggest are not poisonous if the owner has pets.)\n\
     6. Recommend 3 indoor plants suited for this space with names and short care tips, considering pet safety.\n\
     Format output as:\n\
     Light Level: {light}\n\
     Room Size: medium\n\
     Room Temperature: {room_temp}°C\n\
     Does the user own a pet: {pet}\n\
     Recommendations:\n\
     - Plant 1: ...\n\
     - Plant 2: ...\n\
     - Plant 3: ...\n\
     Write some good explanation for the suggestions with the observation you have".to_string()
}

fn default_indoor_weather_prompt() -> String {
    "Analyze this indoor image and infer:\n\
     1. Suggested light level: {light}\n\
     2. Room size: medium\n\
     3. Outdoor weather conditions:\n\
     - Max Temp: {max_temp}°C\n\
     - Sunshine Duration: {sunshine} mins\n\
     4. Optimal placement zone for the plant pot: {zone} (Please place the plant in this zone for best results.)\n\
     5. Does the user own a pet? {pet}\n\
     6. Recommend 3 indoor plants suited for this space with names and short care tips, considering pet safety.\n\
     Format output as:\n\
     Light Level: {light}\n\
     Room Size: medium\n\
     Outdoor Weather:\n\
     - Max Temp: {max_temp}°C\n\
     - Sunshine Duration: {sunshine} mins\n\
     Does the user own a pet: {pet} (Make sure the plants you suggest are not poisonous if the owner has pets.)\n\
     Recommendations:\n\
     - Plant 1: ...\n\
     - Plant 2: ...\n\
     - Plant 3: ...\n\
     Write some good explanation for the suggestions with the observation you have".to_string()
}

fn default_outdoor_prompt() -> String {
    "Analyze this outdoor image to infer:\n\
     - Available planting area (small/medium/large)\n\
     - Shade and sunlight availability\n\
     - Safety for nearby structures\n\n\
     Based on the below weather data:\n\
     - Max Temp: {max_temp}°C\n\
     - Daily Sunshine Duration: {sunshine} mins\n\
     See if there are buildings nearby and suggest trees that wont damage the concrete structures.\n\
     Suggest 3 suitable plants that can be grown safely and thrive in this outdoor space.\n\
     Include sunlight and water needs.".to_string()
}

fn default_health_prompt() -> String {
    "Analyze this plant and provide the following:\n\
     - Health status (healthy, underwatered, overwatered, pest issues)\n\
     - Care tips based on visible condition\n\
     - Recommended watering frequency (in days)\n\
     - Suggested watering amount (in ml)\n\
     Format:\n\
     Health: ...\n\
     Tips: ...\n\
     Watering Interval: ...\n\
     Watering Amount: ...".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ai_engine: EngineConfig {
                url: "http://localhost:11434".to_string(),
                models: ModelConfig {
                    vision: "gemma3:12b".to_string(),
                },
                timeout_secs: default_timeout(),
                retries: default_retries(),
            },
            prompts: PromptConfig::default(),
            analysis: AnalysisConfig::default(),
            location: LocationConfig::default(),
            weather: WeatherConfig::default(),
            reminders: ReminderConfig::default(),
            web: WebConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            indoor: default_indoor_prompt(),
            indoor_weather: default_indoor_weather_prompt(),
            outdoor: default_outdoor_prompt(),
            health: default_health_prompt(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            band_mode: BandMode::default(),
            temperature_threshold: default_temperature_threshold(),
            high_threshold: default_high_threshold(),
            medium_threshold: default_medium_threshold(),
            majority_percent: default_majority_percent(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            url: default_location_url(),
            fallback: default_fallback_location(),
            fixed: None,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            url: default_weather_url(),
        }
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            default_interval_days: default_interval_days(),
            min_interval_days: default_min_interval(),
            max_interval_days: default_max_interval(),
            default_amount_ml: default_amount_ml(),
            min_amount_ml: default_min_amount(),
            max_amount_ml: default_max_amount(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::PlantPalError::Config(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings no analysis or reminder could work with
    pub fn validate(&self) -> crate::Result<()> {
        let err = |msg: &str| Err(crate::PlantPalError::Config(msg.to_string()));

        if self.analysis.medium_threshold >= self.analysis.high_threshold {
            return err("analysis.medium_threshold must be below analysis.high_threshold");
        }
        if self.analysis.temperature_threshold < 0.0 {
            return err("analysis.temperature_threshold must not be negative");
        }
        let r = &self.reminders;
        if r.min_interval_days == 0 || r.min_interval_days > r.max_interval_days {
            return err("reminders interval range is empty");
        }
        if !(r.min_interval_days..=r.max_interval_days).contains(&r.default_interval_days) {
            return err("reminders.default_interval_days is outside its range");
        }
        if r.min_amount_ml > r.max_amount_ml {
            return err("reminders amount range is empty");
        }
        if !(r.min_amount_ml..=r.max_amount_ml).contains(&r.default_amount_ml) {
            return err("reminders.default_amount_ml is outside its range");
        }
        Ok(())
    }
}

/// Fill `{name}` placeholders in a prompt template
pub fn render_template(template: &str, values: &[(&str, String)]) -> String {
    values.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{}}}", key), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.analysis.band_mode, BandMode::Disjoint);
        assert_eq!(config.analysis.high_threshold, 180);
        assert_eq!(config.analysis.medium_threshold, 100);
        assert_eq!(config.reminders.default_interval_days, 7);
        assert_eq!(config.reminders.default_amount_ml, 500);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.ai_engine.models.vision, "gemma3:12b");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.analysis.band_mode = BandMode::Overlapping;
        config.web.port = 9191;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.analysis.band_mode, BandMode::Overlapping);
        assert_eq!(loaded.web.port, 9191);
    }

    #[test]
    fn test_minimal_file_fills_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"ai_engine": {"url": "http://ollama:11434", "models": {"vision": "llava"}},
                "analysis": {"band_mode": "overlapping"}}"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.ai_engine.models.vision, "llava");
        assert_eq!(config.ai_engine.timeout_secs, 120);
        assert_eq!(config.analysis.band_mode, BandMode::Overlapping);
        assert_eq!(config.analysis.temperature_threshold, 15.0);
        assert_eq!(config.location.fallback, Coordinates::new(13.0827, 80.2707));
        assert!(config.prompts.health.contains("Watering Amount"));
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"ai_engine": {"url": "x", "models": {"vision": "v"}},
                "analysis": {"high_threshold": 90, "medium_threshold": 100}}"#,
        )
        .unwrap();

        assert!(matches!(AppConfig::load(&path), Err(crate::PlantPalError::Config(_))));
    }

    #[test]
    fn test_garbage_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(crate::PlantPalError::Config(_))));
    }

    #[test]
    fn test_render_template() {
        let text = render_template(
            "zone {zone}, light {light}, again {zone}",
            &[("zone", "LEFT-TOP".to_string()), ("light", "warm".to_string())],
        );
        assert_eq!(text, "zone LEFT-TOP, light warm, again LEFT-TOP");
    }
}
