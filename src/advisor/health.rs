// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Plant health check and watering reminders

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::info;

use crate::analysis::{decode_image, encode_for_model};
use crate::config::{AppConfig, ReminderConfig};
use crate::db::{Database, NewPlant};
use crate::providers::VisionModel;
use crate::{PlantPalError, Result};

/// Model verdict on a plant photo
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthAssessment {
    /// Full model answer
    pub response: String,
    /// Short status stored with the plant
    pub health_status: String,
    pub suggested_interval_days: Option<u32>,
    pub suggested_amount_ml: Option<u32>,
}

/// Strip list bullets and markdown emphasis around a line
fn clean_line(line: &str) -> &str {
    line.trim()
        .trim_start_matches(['-', '*', '#'])
        .trim()
        .trim_matches('*')
        .trim()
}

/// Value after `key:` when the line starts with it (case-insensitive)
fn field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let line = clean_line(line);
    let (name, value) = line.split_once(':')?;
    if name.trim().trim_matches('*').eq_ignore_ascii_case(key) {
        Some(value.trim().trim_matches('*').trim())
    } else {
        None
    }
}

/// First run of ASCII digits in `text`
fn first_number(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..].chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Pull the status line and watering suggestions out of a model answer.
///
/// The status is the `Health:` value when the model followed the format,
/// otherwise the first non-empty line.
pub fn parse_health_response(response: &str) -> HealthAssessment {
    let lines: Vec<&str> = response.lines().collect();

    let health_status = lines
        .iter()
        .find_map(|l| field(l, "health"))
        .filter(|v| !v.is_empty())
        .or_else(|| lines.iter().map(|l| clean_line(l)).find(|l| !l.is_empty()))
        .unwrap_or_default()
        .to_string();

    let suggested_interval_days = lines
        .iter()
        .find_map(|l| field(l, "watering interval"))
        .and_then(first_number);
    let suggested_amount_ml = lines
        .iter()
        .find_map(|l| field(l, "watering amount"))
        .and_then(first_number);

    HealthAssessment {
        response: response.to_string(),
        health_status,
        suggested_interval_days,
        suggested_amount_ml,
    }
}

/// Ask the model about a plant photo
pub async fn assess_health(
    image: &[u8],
    model: &dyn VisionModel,
    config: &AppConfig,
) -> Result<HealthAssessment> {
    decode_image(image)?;

    info!("Asking {} for a health check", model.name());
    let response = model.describe(&encode_for_model(image), &config.prompts.health).await?;
    let assessment = parse_health_response(&response);
    info!("Health status: {}", assessment.health_status);

    Ok(assessment)
}

/// Watering schedule chosen by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReminderSettings {
    pub interval_days: u32,
    pub amount_ml: u32,
}

impl ReminderSettings {
    /// Settings within the configured ranges
    pub fn new(interval_days: u32, amount_ml: u32, limits: &ReminderConfig) -> Result<Self> {
        if !(limits.min_interval_days..=limits.max_interval_days).contains(&interval_days) {
            return Err(PlantPalError::Validation(format!(
                "watering interval {} days is outside {}..={}",
                interval_days, limits.min_interval_days, limits.max_interval_days
            )));
        }
        if !(limits.min_amount_ml..=limits.max_amount_ml).contains(&amount_ml) {
            return Err(PlantPalError::Validation(format!(
                "watering amount {} ml is outside {}..={}",
                amount_ml, limits.min_amount_ml, limits.max_amount_ml
            )));
        }
        Ok(Self { interval_days, amount_ml })
    }

    pub fn defaults(limits: &ReminderConfig) -> Self {
        Self {
            interval_days: limits.default_interval_days,
            amount_ml: limits.default_amount_ml,
        }
    }

    /// Start from the model's suggestion, clamped into range, else the defaults
    pub fn suggested(assessment: &HealthAssessment, limits: &ReminderConfig) -> Self {
        Self {
            interval_days: assessment
                .suggested_interval_days
                .map(|d| d.clamp(limits.min_interval_days, limits.max_interval_days))
                .unwrap_or(limits.default_interval_days),
            amount_ml: assessment
                .suggested_amount_ml
                .map(|ml| ml.clamp(limits.min_amount_ml, limits.max_amount_ml))
                .unwrap_or(limits.default_amount_ml),
        }
    }

    /// Date of the next watering counted from `today`
    pub fn next_watering(&self, today: NaiveDate) -> Result<NaiveDate> {
        today
            .checked_add_days(Days::new(self.interval_days as u64))
            .ok_or_else(|| PlantPalError::Validation("watering date out of range".to_string()))
    }
}

/// Store the plant with its schedule and first photo. Returns the plant id.
pub fn save_reminder(
    db: &Database,
    name: &str,
    assessment: &HealthAssessment,
    settings: ReminderSettings,
    image: &[u8],
    now: NaiveDateTime,
) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PlantPalError::Validation("plant name must not be empty".to_string()));
    }
    decode_image(image)?;

    let plant = NewPlant {
        name: name.to_string(),
        health_status: assessment.health_status.clone(),
        watering_interval_days: settings.interval_days,
        watering_amount_ml: settings.amount_ml,
        next_watering: settings.next_watering(now.date())?,
    };

    let id = db.insert_plant_with_image(&plant, image, now)?;
    info!("Saved reminder for '{}' (id {}), next watering {}", name, id, plant.next_watering);

    Ok(id)
}

/// Attach a new photo (e.g. after watering) to a stored plant
pub fn add_progress_photo(db: &Database, plant_id: i64, image: &[u8], now: NaiveDateTime) -> Result<i64> {
    decode_image(image)?;
    db.insert_image(plant_id, image, now)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMATTED: &str = "Health: Underwatered\n\
                             Tips: Water more deeply and mist the leaves.\n\
                             Watering Interval: every 3-4 days\n\
                             Watering Amount: about 250 ml";

    #[test]
    fn test_parse_formatted_response() {
        let assessment = parse_health_response(FORMATTED);
        assert_eq!(assessment.health_status, "Underwatered");
        assert_eq!(assessment.suggested_interval_days, Some(3));
        assert_eq!(assessment.suggested_amount_ml, Some(250));
        assert_eq!(assessment.response, FORMATTED);
    }

    #[test]
    fn test_parse_markdown_response() {
        let text = "Here is my analysis.\n\n**Health:** Healthy\n- **Watering Interval:** 7 days\n* Watering Amount: 1000ml";
        let assessment = parse_health_response(text);
        assert_eq!(assessment.health_status, "Healthy");
        assert_eq!(assessment.suggested_interval_days, Some(7));
        assert_eq!(assessment.suggested_amount_ml, Some(1000));
    }

    #[test]
    fn test_parse_unformatted_falls_back_to_first_line() {
        let assessment = parse_health_response("\n  The plant looks overwatered.\nRoots may rot.");
        assert_eq!(assessment.health_status, "The plant looks overwatered.");
        assert_eq!(assessment.suggested_interval_days, None);
        assert_eq!(assessment.suggested_amount_ml, None);
    }

    #[test]
    fn test_parse_empty_response() {
        assert_eq!(parse_health_response("").health_status, "");
    }

    #[test]
    fn test_reminder_ranges() {
        let limits = ReminderConfig::default();
        assert!(ReminderSettings::new(7, 500, &limits).is_ok());
        assert!(ReminderSettings::new(1, 250, &limits).is_ok());
        assert!(ReminderSettings::new(30, 10_000, &limits).is_ok());
        assert!(matches!(ReminderSettings::new(0, 500, &limits), Err(PlantPalError::Validation(_))));
        assert!(ReminderSettings::new(31, 500, &limits).is_err());
        assert!(ReminderSettings::new(7, 249, &limits).is_err());
        assert!(ReminderSettings::new(7, 10_001, &limits).is_err());
    }

    #[test]
    fn test_suggested_settings_clamped() {
        let limits = ReminderConfig::default();
        let mut assessment = parse_health_response(FORMATTED);
        assessment.suggested_amount_ml = Some(100);
        let settings = ReminderSettings::suggested(&assessment, &limits);
        assert_eq!(settings, ReminderSettings { interval_days: 3, amount_ml: 250 });

        let none = parse_health_response("fine");
        assert_eq!(ReminderSettings::suggested(&none, &limits), ReminderSettings::defaults(&limits));
    }

    #[test]
    fn test_next_watering() {
        let settings = ReminderSettings { interval_days: 7, amount_ml: 500 };
        let today = NaiveDate::from_ymd_opt(2026, 12, 28).unwrap();
        assert_eq!(settings.next_watering(today).unwrap(), NaiveDate::from_ymd_opt(2027, 1, 4).unwrap());
    }

    #[test]
    fn test_save_reminder_requires_name() {
        let db = Database::in_memory().unwrap();
        let now = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let assessment = parse_health_response(FORMATTED);
        let settings = ReminderSettings::defaults(&ReminderConfig::default());
        assert!(save_reminder(&db, "   ", &assessment, settings, b"img", now).is_err());
        assert_eq!(db.get_stats().unwrap().plant_count, 0);
    }

    #[test]
    fn test_save_reminder_rejects_non_image() {
        let db = Database::in_memory().unwrap();
        let now = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let assessment = parse_health_response(FORMATTED);
        let settings = ReminderSettings::defaults(&ReminderConfig::default());

        let err = save_reminder(&db, "Fern", &assessment, settings, b"not an image", now).unwrap_err();
        assert!(matches!(err, PlantPalError::Image(_)));

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.plant_count, 0);
        assert_eq!(stats.image_count, 0);
    }

    #[test]
    fn test_save_reminder_stores_plant_and_photo() {
        let db = Database::in_memory().unwrap();
        let now = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let assessment = parse_health_response(FORMATTED);
        let settings = ReminderSettings { interval_days: 3, amount_ml: 250 };
        let photo = crate::analysis::encode_png(&image::RgbImage::new(4, 4)).unwrap();

        let id = save_reminder(&db, "Fern", &assessment, settings, &photo, now).unwrap();

        let plant = db.get_plant(id).unwrap().unwrap();
        assert_eq!(plant.health_status, "Underwatered");
        assert_eq!(plant.next_watering, NaiveDate::from_ymd_opt(2026, 10, 22).unwrap());
        assert_eq!(db.latest_image(id).unwrap().unwrap().image_data, photo);
    }

    #[test]
    fn test_progress_photo_must_be_image() {
        let db = Database::in_memory().unwrap();
        let now = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap().and_hms_opt(8, 0, 0).unwrap();
        assert!(add_progress_photo(&db, 1, b"not an image", now).is_err());
    }
}
