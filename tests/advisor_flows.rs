// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! End-to-end advisor flows against in-process collaborators

use async_trait::async_trait;
use chrono::NaiveDate;
use image::{Rgb, RgbImage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use plantpal::advisor::{
    add_progress_photo, advise_outdoor, assess_health, recommend_indoor, save_reminder, Conditions,
    IndoorRequest, ReminderSettings, RoomClimate,
};
use plantpal::analysis::{encode_png, ColorTemperature, Column, Row, ZoneLabel};
use plantpal::db::Database;
use plantpal::providers::{Coordinates, DailyWeather, Geolocator, VisionModel, WeatherProvider};
use plantpal::{AppConfig, PlantPalError, Result};

struct ScriptedModel {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn describe(&self, image_base64: &str, prompt: &str) -> Result<String> {
        assert!(!image_base64.is_empty());
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

#[derive(Default)]
struct CountingLocator {
    calls: AtomicUsize,
}

#[async_trait]
impl Geolocator for CountingLocator {
    async fn locate(&self) -> Result<Coordinates> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Coordinates::new(48.8566, 2.3522))
    }
}

struct StubWeather {
    result: std::result::Result<DailyWeather, String>,
    calls: AtomicUsize,
}

impl StubWeather {
    fn sunny() -> Self {
        Self {
            result: Ok(DailyWeather {
                max_temp_c: 31.5,
                min_temp_c: Some(19.0),
                sunshine_minutes: 612.0,
            }),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            result: Err("service unavailable".to_string()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl WeatherProvider for StubWeather {
    async fn daily(&self, at: Coordinates) -> Result<DailyWeather> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(at, Coordinates::new(48.8566, 2.3522));
        self.result.clone().map_err(PlantPalError::Weather)
    }
}

/// Warm room photo whose brightest cell is CENTER-BOT
fn room_photo() -> Vec<u8> {
    let img = RgbImage::from_fn(30, 30, |x, y| {
        if (10..20).contains(&x) && y >= 20 {
            Rgb([255, 255, 255])
        } else {
            Rgb([200, 120, 60])
        }
    });
    encode_png(&img).unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

#[tokio::test]
async fn indoor_with_ac_skips_weather() {
    let config = AppConfig::default();
    let model = ScriptedModel::new("1. Snake plant\n2. ZZ plant\n3. Pothos");
    let locator = CountingLocator::default();
    let weather = StubWeather::sunny();

    let request = IndoorRequest {
        image: room_photo(),
        climate: RoomClimate::AirConditioned { room_temp_c: 24 },
        has_pet: true,
    };

    let rec = recommend_indoor(&request, &model, &locator, &weather, &config).await.unwrap();

    assert_eq!(rec.analysis.zone, ZoneLabel::new(Column::Center, Row::Bot));
    assert_eq!(rec.analysis.temperature.temperature, ColorTemperature::Warm);
    assert!(matches!(rec.conditions, Conditions::Room { temp_c: 24 }));
    assert_eq!(rec.response, "1. Snake plant\n2. ZZ plant\n3. Pothos");

    assert_eq!(locator.calls.load(Ordering::SeqCst), 0);
    assert_eq!(weather.calls.load(Ordering::SeqCst), 0);

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0], rec.prompt);
    assert!(rec.prompt.contains("Suggested light level: warm"));
    assert!(rec.prompt.contains("Room temperature: 24°C"));
    assert!(rec.prompt.contains("CENTER-BOT"));
    assert!(rec.prompt.contains("Does the user own a pet? Yes"));
    assert!(!rec.prompt.contains('{'));
}

#[tokio::test]
async fn indoor_without_ac_uses_outdoor_weather() {
    let config = AppConfig::default();
    let model = ScriptedModel::new("ok");
    let locator = CountingLocator::default();
    let weather = StubWeather::sunny();

    let request = IndoorRequest {
        image: room_photo(),
        climate: RoomClimate::Unconditioned,
        has_pet: false,
    };

    let rec = recommend_indoor(&request, &model, &locator, &weather, &config).await.unwrap();

    assert_eq!(locator.calls.load(Ordering::SeqCst), 1);
    assert_eq!(weather.calls.load(Ordering::SeqCst), 1);
    match rec.conditions {
        Conditions::Outdoor { location, weather } => {
            assert_eq!(location, Coordinates::new(48.8566, 2.3522));
            assert_eq!(weather.max_temp_c, 31.5);
        }
        other => panic!("expected outdoor conditions, got {:?}", other),
    }
    assert!(rec.prompt.contains("Max Temp: 31.5°C"));
    assert!(rec.prompt.contains("Sunshine Duration: 612 mins"));
    assert!(rec.prompt.contains("Does the user own a pet? No"));
    assert!(!rec.prompt.contains("Room temperature"));
}

#[tokio::test]
async fn indoor_rejects_room_temp_out_of_range() {
    let config = AppConfig::default();
    let model = ScriptedModel::new("unused");

    let request = IndoorRequest {
        image: room_photo(),
        climate: RoomClimate::AirConditioned { room_temp_c: 51 },
        has_pet: false,
    };

    let err = recommend_indoor(&request, &model, &CountingLocator::default(), &StubWeather::sunny(), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, PlantPalError::Validation(_)));
    assert!(model.prompts().is_empty());
}

#[tokio::test]
async fn indoor_rejects_undecodable_upload() {
    let config = AppConfig::default();
    let model = ScriptedModel::new("unused");

    let request = IndoorRequest {
        image: b"definitely not a picture".to_vec(),
        climate: RoomClimate::AirConditioned { room_temp_c: 20 },
        has_pet: false,
    };

    let err = recommend_indoor(&request, &model, &CountingLocator::default(), &StubWeather::sunny(), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, PlantPalError::Image(_)));
    assert!(model.prompts().is_empty());
}

#[tokio::test]
async fn indoor_weather_failure_propagates() {
    let config = AppConfig::default();
    let model = ScriptedModel::new("unused");

    let request = IndoorRequest {
        image: room_photo(),
        climate: RoomClimate::Unconditioned,
        has_pet: false,
    };

    let err = recommend_indoor(&request, &model, &CountingLocator::default(), &StubWeather::failing(), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, PlantPalError::Weather(_)));
    assert!(model.prompts().is_empty());
}

#[test]
fn outdoor_advice_uses_todays_weather() {
    let config = AppConfig::default();
    let model = ScriptedModel::new("Plant a neem tree away from the wall.");
    let locator = CountingLocator::default();
    let weather = StubWeather::sunny();

    let advice = tokio_test::block_on(advise_outdoor(&room_photo(), &model, &locator, &weather, &config)).unwrap();

    assert_eq!(advice.location, Coordinates::new(48.8566, 2.3522));
    assert_eq!(advice.weather.sunshine_minutes, 612.0);
    assert!(advice.prompt.contains("Max Temp: 31.5°C"));
    assert!(advice.prompt.contains("Daily Sunshine Duration: 612 mins"));
    assert_eq!(advice.response, "Plant a neem tree away from the wall.");
    assert_eq!(model.prompts(), vec![advice.prompt.clone()]);
}

#[tokio::test]
async fn health_check_to_reminder_to_progress_photo() {
    let config = AppConfig::default();
    let db = Database::in_memory().unwrap();
    let model = ScriptedModel::new(
        "Health: Overwatered\nTips: Let the soil dry out.\nWatering Interval: 10 days\nWatering Amount: 300 ml",
    );
    let photo = room_photo();

    let assessment = assess_health(&photo, &model, &config).await.unwrap();
    assert_eq!(assessment.health_status, "Overwatered");
    assert_eq!(model.prompts(), vec![config.prompts.health.clone()]);

    let settings = ReminderSettings::suggested(&assessment, &config.reminders);
    assert_eq!(settings, ReminderSettings { interval_days: 10, amount_ml: 300 });

    let now = today().and_hms_opt(9, 30, 0).unwrap();
    let id = save_reminder(&db, "  Peace lily ", &assessment, settings, &photo, now).unwrap();

    let plant = db.get_plant(id).unwrap().unwrap();
    assert_eq!(plant.name, "Peace lily");
    assert_eq!(plant.health_status, "Overwatered");
    assert_eq!(plant.next_watering, NaiveDate::from_ymd_opt(2026, 10, 29).unwrap());
    assert_eq!(db.images_for_plant(id).unwrap().len(), 1);

    assert!(db.plants_due(today()).unwrap().is_empty());
    assert_eq!(db.plants_due(NaiveDate::from_ymd_opt(2026, 10, 29).unwrap()).unwrap().len(), 1);

    let later = NaiveDate::from_ymd_opt(2026, 10, 29).unwrap().and_hms_opt(18, 0, 0).unwrap();
    add_progress_photo(&db, id, &photo, later).unwrap();
    let images = db.images_for_plant(id).unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].date, later);
}

#[tokio::test]
async fn progress_photo_for_missing_plant() {
    let db = Database::in_memory().unwrap();
    let now = today().and_hms_opt(9, 0, 0).unwrap();
    let err = add_progress_photo(&db, 5, &room_photo(), now).unwrap_err();
    assert!(matches!(err, PlantPalError::NotFound(_)));
}
