// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! PlantPal Web Dashboard
//!
//! Standalone web server for the plant schedule and the analysis API.

use chrono::{Local, NaiveDate};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};

use plantpal::config::AppConfig;
use plantpal::db::Database;
use plantpal::Result;

#[derive(Parser, Debug)]
#[command(name = "plantpal-web")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "0.1.0")]
#[command(about = "PlantPal dashboard: watering schedule and photo analysis API")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Plant database (overrides config)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Open the dashboard in a browser
    #[arg(long)]
    open: bool,
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(db) = &self.database {
            config.database.path = db.to_string_lossy().to_string();
        }
        if let Some(host) = &self.host {
            config.web.host = host.clone();
        }
        if let Some(port) = self.port {
            config.web.port = port;
        }
    }
}

/// Address a local browser can reach; wildcard binds map to localhost
fn dashboard_url(host: &str, port: u16) -> String {
    let host = match host {
        "0.0.0.0" | "::" | "[::]" => "localhost",
        other => other,
    };
    format!("http://{}:{}/", host, port)
}

/// One-line summary of the schedule, logged at startup
fn schedule_summary(db: &Database, today: NaiveDate) -> Result<String> {
    let stats = db.get_stats()?;
    let due = db.plants_due(today)?;
    Ok(format!(
        "{} plants, {} photos, {} due by {}",
        stats.plant_count,
        stats.image_count,
        due.len(),
        today
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut config = AppConfig::load(&args.config)?;
    args.apply(&mut config);

    let db = Database::open(&config.database.path)?;
    match schedule_summary(&db, Local::now().date_naive()) {
        Ok(summary) => info!("{}: {}", config.database.path, summary),
        Err(e) => warn!("Could not read schedule from {}: {}", config.database.path, e),
    }

    if args.open {
        let url = dashboard_url(&config.web.host, config.web.port);
        if let Err(e) = open_browser(&url) {
            error!("Failed to open browser: {}", e);
        }
    }

    plantpal::web::start_server(config, db).await
}

fn open_browser(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "linux")]
    std::process::Command::new("xdg-open").arg(url).spawn()?;
    #[cfg(target_os = "macos")]
    std::process::Command::new("open").arg(url).spawn()?;
    #[cfg(target_os = "windows")]
    std::process::Command::new("cmd").args(["/c", "start", url]).spawn()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantpal::db::NewPlant;

    #[test]
    fn test_overrides_applied() {
        let args = Args::try_parse_from([
            "plantpal-web", "--database", "/tmp/garden.db", "-H", "0.0.0.0", "-p", "9000",
        ])
        .unwrap();
        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.database.path, "/tmp/garden.db");
        assert_eq!(config.web.host, "0.0.0.0");
        assert_eq!(config.web.port, 9000);
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let args = Args::try_parse_from(["plantpal-web"]).unwrap();
        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config.database.path, "plantpal.db");
        assert_eq!(config.web.port, 8080);
    }

    #[test]
    fn test_dashboard_url() {
        assert_eq!(dashboard_url("0.0.0.0", 8080), "http://localhost:8080/");
        assert_eq!(dashboard_url("::", 8080), "http://localhost:8080/");
        assert_eq!(dashboard_url("192.168.1.20", 3000), "http://192.168.1.20:3000/");
    }

    #[test]
    fn test_schedule_summary() {
        let db = Database::in_memory().unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let now = today.and_hms_opt(9, 0, 0).unwrap();
        for next in [today, today.succ_opt().unwrap()] {
            db.insert_plant(
                &NewPlant {
                    name: "Pothos".to_string(),
                    health_status: "Healthy".to_string(),
                    watering_interval_days: 7,
                    watering_amount_ml: 300,
                    next_watering: next,
                },
                now,
            )
            .unwrap();
        }

        assert_eq!(
            schedule_summary(&db, today).unwrap(),
            "2 plants, 0 photos, 1 due by 2026-10-19"
        );
    }
}
