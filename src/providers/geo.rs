// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! IP-based geolocation

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{Coordinates, Geolocator};
use crate::config::LocationConfig;
use crate::{PlantPalError, Result};

#[derive(Deserialize)]
struct IpInfoResponse {
    loc: Option<String>,
}

/// Parse an ipinfo-style `"lat,lon"` string
pub fn parse_loc(loc: &str) -> Result<Coordinates> {
    let (lat, lon) = loc
        .split_once(',')
        .ok_or_else(|| PlantPalError::Geolocation(format!("malformed location '{}'", loc)))?;

    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|e| PlantPalError::Geolocation(format!("bad coordinate '{}': {}", s, e)))
    };

    Ok(Coordinates::new(parse(lat)?, parse(lon)?))
}

/// Looks up the caller's public IP location
pub struct IpInfoLocator {
    client: Client,
    url: String,
    fallback: Coordinates,
}

impl IpInfoLocator {
    pub fn new(config: &LocationConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
            fallback: config.fallback,
        })
    }
}

#[async_trait]
impl Geolocator for IpInfoLocator {
    async fn locate(&self) -> Result<Coordinates> {
        debug!("Looking up location via {}", self.url);

        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(PlantPalError::Geolocation(format!(
                "{} returned status {}",
                self.url,
                response.status()
            )));
        }

        let info: IpInfoResponse = response.json().await?;
        match info.loc {
            Some(loc) => parse_loc(&loc),
            None => {
                warn!("No location in response, using fallback {}", self.fallback);
                Ok(self.fallback)
            }
        }
    }
}

/// Always answers the same coordinates
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl Geolocator for FixedLocation {
    async fn locate(&self) -> Result<Coordinates> {
        Ok(self.0)
    }
}

/// Fixed coordinates from config when set, otherwise the IP lookup
pub fn from_config(config: &LocationConfig) -> Result<Box<dyn Geolocator>> {
    match config.fixed {
        Some(coords) => Ok(Box::new(FixedLocation(coords))),
        None => Ok(Box::new(IpInfoLocator::new(config)?)),
    }
}
