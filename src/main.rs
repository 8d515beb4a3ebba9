// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! PlantPal: Smart Plant Companion
//!
//! Light and placement analysis of room photos, plant recommendations and
//! health checks from a local vision model, and watering reminders.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use plantpal::advisor::{
    add_progress_photo, advise_outdoor, assess_health, recommend_indoor, save_reminder,
    IndoorRequest, ReminderSettings, RoomClimate, DEFAULT_ROOM_TEMP_C,
};
use plantpal::analysis::{analyze_zones, load_image, BandMode, LightClassifier};
use plantpal::config::AppConfig;
use plantpal::db::Database;
use plantpal::ollama::{model_matches, OllamaClient, OllamaVision};
use plantpal::providers::{geo, OpenMeteoClient};
use plantpal::{PlantPalError, Result};

/// PlantPal CLI - light analysis, plant advice and watering reminders
#[derive(Parser, Debug)]
#[command(name = "plantpal")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "0.1.0")]
#[command(about = "Find the right plant for the right spot", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find the brightest cell of a 3x3 grid over the image
    Zones {
        /// Room photo
        image: PathBuf,

        /// Write the annotated grid to this file
        #[arg(short, long)]
        annotate: Option<PathBuf>,
    },

    /// Classify color temperature and brightness
    Light {
        /// Room photo
        image: PathBuf,

        /// Brightness band mode (overrides config)
        #[arg(short, long, value_parser = ["disjoint", "overlapping"])]
        mode: Option<String>,
    },

    /// Recommend indoor plants for a room photo
    Indoor {
        /// Room photo
        image: PathBuf,

        /// The room is air conditioned
        #[arg(long)]
        ac: bool,

        /// Room temperature in °C (with --ac)
        #[arg(long, requires = "ac", allow_negative_numbers = true)]
        room_temp: Option<i32>,

        /// A pet shares the room
        #[arg(long)]
        pet: bool,
    },

    /// Advise on plants for an outdoor space using today's weather
    Outdoor {
        /// Photo of the outdoor space
        image: PathBuf,
    },

    /// Check a plant's health and optionally save a watering reminder
    Health {
        /// Plant photo
        image: PathBuf,

        /// Plant name for the reminder
        #[arg(short, long)]
        name: Option<String>,

        /// Store the plant with a watering schedule
        #[arg(long, requires = "name")]
        save: bool,

        /// Watering interval in days (default: model suggestion)
        #[arg(long)]
        interval: Option<u32>,

        /// Watering amount in ml (default: model suggestion)
        #[arg(long)]
        amount: Option<u32>,
    },

    /// Stored plants and watering schedule
    Plants {
        #[command(subcommand)]
        action: PlantCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show AI engine and database status
    Status {
        /// Check specific model availability
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Initialize a new PlantPal directory
    Init {
        /// Directory to initialize (default: current)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Force overwrite existing configuration
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum PlantCommands {
    /// List all stored plants
    List,

    /// Show one plant and its photo history
    Show {
        id: i64,
    },

    /// Plants that need water
    Due {
        /// Reference date, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Attach a progress photo to a plant
    AddImage {
        id: i64,
        image: PathBuf,
    },

    /// Mark a plant watered today
    Watered {
        id: i64,
    },

    /// Export plants to JSON
    Export {
        /// Output file
        output: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load(&cli.config)?;
    let json = cli.format == "json";

    match cli.command {
        Commands::Zones { image, annotate } => run_zones(&image, annotate.as_deref(), json),
        Commands::Light { image, mode } => run_light(&config, &image, mode.as_deref(), json),
        Commands::Indoor { image, ac, room_temp, pet } => {
            run_indoor(&config, &image, ac, room_temp, pet, json).await
        }
        Commands::Outdoor { image } => run_outdoor(&config, &image, json).await,
        Commands::Health { image, name, save, interval, amount } => {
            run_health(&config, &image, name, save, interval, amount, json).await
        }
        Commands::Plants { action } => run_plants_command(&config, action, json),
        Commands::Config { action } => run_config_command(config, action, &cli.config),
        Commands::Status { model } => run_status(config, model).await,
        Commands::Init { dir, force } => run_init(dir, force),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run the placement zone analysis
fn run_zones(image: &Path, annotate: Option<&Path>, json: bool) -> Result<()> {
    let img = load_image(image)?;
    let zones = analyze_zones(&img)?;

    if let Some(out) = annotate {
        zones.annotate(&img).save(out)?;
        info!("Annotated grid written to {:?}", out);
    }

    if json {
        return print_json(&serde_json::json!({
            "zone": zones.best(),
            "scores": zones.scores(),
        }));
    }

    println!("Suggested placement zone: {}", zones.best());
    for (i, score) in zones.scores().iter().enumerate() {
        let marker = if i == zones.best_index() { "→" } else { " " };
        println!("  {} {:<12} {:>6.1}", marker, score.label.to_string(), score.brightness);
    }
    Ok(())
}

/// Run both light classifiers
fn run_light(config: &AppConfig, image: &Path, mode: Option<&str>, json: bool) -> Result<()> {
    let img = load_image(image)?;

    let mut classifier = LightClassifier::from_config(&config.analysis);
    if let Some(mode) = mode {
        classifier = classifier.with_band_mode(mode.parse::<BandMode>()?);
    }

    let color = classifier.color_temperature(&img)?;
    let brightness = classifier.brightness(&img)?;

    if json {
        return print_json(&serde_json::json!({
            "temperature": color,
            "brightness": brightness,
        }));
    }

    println!("Color temperature: {}", color.temperature);
    println!(
        "  mean R/G/B: {:.1} / {:.1} / {:.1}",
        color.mean_red, color.mean_green, color.mean_blue
    );
    println!("Light level: {}", brightness.level);
    println!("  high:   {:>5.1}%", brightness.high_percent);
    println!("  medium: {:>5.1}%", brightness.medium_percent);
    println!("  low:    {:>5.1}%", brightness.low_percent);
    Ok(())
}

/// Ask the model for indoor plants suited to the room
async fn run_indoor(
    config: &AppConfig,
    image: &Path,
    ac: bool,
    room_temp: Option<i32>,
    has_pet: bool,
    json: bool,
) -> Result<()> {
    let climate = if ac {
        let room_temp_c = room_temp.unwrap_or_else(|| {
            warn!("No room temperature given, assuming {}°C", DEFAULT_ROOM_TEMP_C);
            DEFAULT_ROOM_TEMP_C
        });
        RoomClimate::AirConditioned { room_temp_c }
    } else {
        RoomClimate::Unconditioned
    };

    let request = IndoorRequest {
        image: std::fs::read(image)?,
        climate,
        has_pet,
    };

    let model = OllamaVision::from_config(&config.ai_engine)?;
    let geolocator = geo::from_config(&config.location)?;
    let weather = OpenMeteoClient::new(&config.weather)?;

    let rec = recommend_indoor(&request, &model, geolocator.as_ref(), &weather, config).await?;

    if json {
        return print_json(&rec);
    }

    println!("Placement zone: {}", rec.analysis.zone);
    println!("Light: {} / {}", rec.analysis.temperature.temperature, rec.analysis.brightness.level);
    println!("\n{}", rec.response.trim());
    Ok(())
}

/// Ask the model what suits an outdoor space today
async fn run_outdoor(config: &AppConfig, image: &Path, json: bool) -> Result<()> {
    let bytes = std::fs::read(image)?;

    let model = OllamaVision::from_config(&config.ai_engine)?;
    let geolocator = geo::from_config(&config.location)?;
    let weather = OpenMeteoClient::new(&config.weather)?;

    let advice = advise_outdoor(&bytes, &model, geolocator.as_ref(), &weather, config).await?;

    if json {
        return print_json(&advice);
    }

    println!("Location: {}", advice.location);
    println!(
        "Today: max {}°C, {:.0} min sunshine",
        advice.weather.max_temp_c, advice.weather.sunshine_minutes
    );
    println!("\n{}", advice.response.trim());
    Ok(())
}

/// Health check, then an optional reminder
async fn run_health(
    config: &AppConfig,
    image: &Path,
    name: Option<String>,
    save: bool,
    interval: Option<u32>,
    amount: Option<u32>,
    json: bool,
) -> Result<()> {
    let bytes = std::fs::read(image)?;
    let model = OllamaVision::from_config(&config.ai_engine)?;
    let assessment = assess_health(&bytes, &model, config).await?;

    let suggested = ReminderSettings::suggested(&assessment, &config.reminders);
    let settings = ReminderSettings::new(
        interval.unwrap_or(suggested.interval_days),
        amount.unwrap_or(suggested.amount_ml),
        &config.reminders,
    )?;

    let saved = match (save, name) {
        (true, Some(name)) => {
            let db = Database::open(&config.database.path)?;
            let now = Local::now().naive_local();
            let id = save_reminder(&db, &name, &assessment, settings, &bytes, now)?;
            let next = settings.next_watering(now.date())?;
            Some((id, next))
        }
        _ => None,
    };

    if json {
        return print_json(&serde_json::json!({
            "assessment": assessment,
            "reminder": settings,
            "saved": saved.map(|(id, next)| serde_json::json!({ "id": id, "next_watering": next })),
        }));
    }

    println!("Health: {}", assessment.health_status);
    println!("\n{}\n", assessment.response.trim());
    println!(
        "Watering: every {} days, {} ml",
        settings.interval_days, settings.amount_ml
    );
    match saved {
        Some((id, next)) => println!("Saved as plant #{}; next watering {}", id, next),
        None => println!("Not saved (use --save --name <NAME>)"),
    }
    Ok(())
}

/// Plant store commands
fn run_plants_command(config: &AppConfig, action: PlantCommands, json: bool) -> Result<()> {
    let db = Database::open(&config.database.path)?;
    let today = Local::now().date_naive();

    match action {
        PlantCommands::List => {
            let plants = db.list_plants()?;
            if json {
                return print_json(&plants);
            }
            if plants.is_empty() {
                println!("No plants stored");
            }
            for p in &plants {
                println!(
                    "#{:<4} {:<20} {:<16} every {:>2} days  {:>5} ml  next {}",
                    p.id, p.name, p.health_status, p.watering_interval_days, p.watering_amount_ml, p.next_watering
                );
            }
        }
        PlantCommands::Show { id } => {
            let plant = db
                .get_plant(id)?
                .ok_or_else(|| PlantPalError::NotFound(format!("plant {}", id)))?;
            let images = db.images_for_plant(id)?;

            if json {
                let photos: Vec<_> = images
                    .iter()
                    .map(|i| serde_json::json!({ "id": i.id, "date": i.date, "bytes": i.image_data.len() }))
                    .collect();
                return print_json(&serde_json::json!({ "plant": plant, "images": photos }));
            }

            println!("#{} {}", plant.id, plant.name);
            println!("  Health:        {}", plant.health_status);
            println!("  Watering:      every {} days, {} ml", plant.watering_interval_days, plant.watering_amount_ml);
            println!("  Next watering: {}", plant.next_watering);
            println!("  Added:         {}", plant.upload_date.format("%Y-%m-%d %H:%M"));
            println!("  Photos:        {}", images.len());
            for image in &images {
                println!("    {} ({} bytes)", image.date.format("%Y-%m-%d %H:%M"), image.image_data.len());
            }
        }
        PlantCommands::Due { date } => {
            let date = date.unwrap_or(today);
            let due = db.plants_due(date)?;
            if json {
                return print_json(&due);
            }
            if due.is_empty() {
                println!("Nothing to water on {}", date);
            }
            for p in &due {
                println!("#{:<4} {:<20} {} ml (due {})", p.id, p.name, p.watering_amount_ml, p.next_watering);
            }
        }
        PlantCommands::AddImage { id, image } => {
            let bytes = std::fs::read(&image)?;
            let image_id = add_progress_photo(&db, id, &bytes, Local::now().naive_local())?;
            println!("Added photo #{} to plant #{}", image_id, id);
        }
        PlantCommands::Watered { id } => {
            let next = db.record_watering(id, today)?;
            println!("Plant #{} watered; next watering {}", id, next);
        }
        PlantCommands::Export { output } => {
            let plants = db.list_plants()?;
            let json = serde_json::to_string_pretty(&plants)?;
            std::fs::write(&output, json)?;
            println!("Exported {} plants to {:?}", plants.len(), output);
        }
    }

    Ok(())
}

/// Configuration commands
fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => print_json(&config)?,
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            // load() already validated
            println!("Configuration at {:?} is valid", config_path);
            println!("  Vision model: {}", config.ai_engine.models.vision);
            println!("  Band mode:    {:?}", config.analysis.band_mode);
            println!("  Database:     {}", config.database.path);
        }
    }

    Ok(())
}

/// Run status check
async fn run_status(config: AppConfig, model: Option<String>) -> Result<()> {
    let client = OllamaClient::new(&config.ai_engine.url, Duration::from_secs(config.ai_engine.timeout_secs))?;
    let wanted = model.unwrap_or_else(|| config.ai_engine.models.vision.clone());

    println!("PlantPal v0.1.0 Status");
    println!("======================");

    match client.health_check().await {
        Ok(()) => println!("Ollama: Running ({})", client.base_url()),
        Err(e) => println!("Ollama: Error - {}", e),
    }

    match client.list_models().await {
        Ok(models) => {
            println!("\nAvailable models:");
            for m in &models {
                let marker = if model_matches(m, &wanted) { "→" } else { " " };
                println!("  {} {}", marker, m);
            }
        }
        Err(e) => println!("  Error listing models: {}", e),
    }

    if let Ok(false) = client.model_available(&wanted).await {
        println!("\nModel '{}' is not installed. Try: ollama pull {}", wanted, wanted);
    }

    match Database::open(&config.database.path) {
        Ok(db) => {
            let stats = db.get_stats()?;
            let due = db.plants_due(Local::now().date_naive())?;
            println!("\nDatabase ({}):", config.database.path);
            println!("  Plants: {}", stats.plant_count);
            println!("  Photos: {}", stats.image_count);
            println!("  Due today: {}", due.len());
        }
        Err(e) => println!("\nDatabase: Error - {}", e),
    }

    Ok(())
}

/// Initialize a new PlantPal directory
fn run_init(dir: Option<PathBuf>, force: bool) -> Result<()> {
    let target = dir.unwrap_or_else(|| PathBuf::from("."));
    let config_path = target.join("config.json");

    if config_path.exists() && !force {
        return Err(PlantPalError::Config(
            "config.json already exists. Use --force to overwrite".to_string(),
        ));
    }

    std::fs::create_dir_all(&target)?;

    let mut config = AppConfig::default();
    config.database.path = target.join("plantpal.db").to_string_lossy().to_string();
    config.save(&config_path)?;
    Database::open(&config.database.path)?;

    println!("PlantPal initialized in {:?}", target);
    println!("\nCreated:");
    println!("  - config.json");
    println!("  - plantpal.db");
    println!("\nNext steps:");
    println!("  1. Start Ollama and pull the model: ollama pull {}", config.ai_engine.models.vision);
    println!("  2. Analyze a room: plantpal indoor room.jpg");

    Ok(())
}
