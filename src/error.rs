// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for PlantPal

use thiserror::Error;

/// Result type alias for PlantPal operations
pub type Result<T> = std::result::Result<T, PlantPalError>;

/// PlantPal error types
#[derive(Error, Debug)]
pub enum PlantPalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Ollama not available: {0}")]
    OllamaUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Image too small, empty, or otherwise unusable for grid analysis
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Weather lookup failed: {0}")]
    Weather(String),

    #[error("Location lookup failed: {0}")]
    Geolocation(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
