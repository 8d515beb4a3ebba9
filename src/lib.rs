// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! PlantPal: Smart Plant Companion
//!
//! Local light and placement analysis of room photos, plant recommendations
//! and health checks from a local vision model, and watering reminders.

pub mod advisor;
pub mod analysis;
pub mod config;
pub mod db;
pub mod error;
pub mod ollama;
pub mod providers;
pub mod web;

pub use config::AppConfig;
pub use error::{PlantPalError, Result};
