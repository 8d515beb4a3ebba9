// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Plant store: watering schedules and progress photos

use chrono::{Days, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::{PlantPalError, Result};

/// Database manager for PlantPal (thread-safe wrapper)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

/// A plant about to be stored
#[derive(Debug, Clone)]
pub struct NewPlant {
    pub name: String,
    pub health_status: String,
    pub watering_interval_days: u32,
    pub watering_amount_ml: u32,
    pub next_watering: NaiveDate,
}

/// A stored plant with its watering schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantRecord {
    pub id: i64,
    pub name: String,
    pub health_status: String,
    pub watering_interval_days: u32,
    pub watering_amount_ml: u32,
    pub next_watering: NaiveDate,
    pub upload_date: NaiveDateTime,
}

/// A stored progress photo
#[derive(Debug, Clone, PartialEq)]
pub struct PlantImage {
    pub id: i64,
    pub plant_id: i64,
    pub image_data: Vec<u8>,
    pub date: NaiveDateTime,
}

/// Database statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbStats {
    pub plant_count: i64,
    pub image_count: i64,
}

fn plant_from_row(row: &Row<'_>) -> rusqlite::Result<PlantRecord> {
    Ok(PlantRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        health_status: row.get(2)?,
        watering_interval_days: row.get(3)?,
        watering_amount_ml: row.get(4)?,
        next_watering: row.get(5)?,
        upload_date: row.get(6)?,
    })
}

const PLANT_COLUMNS: &str =
    "id, name, health_status, watering_interval, watering_amount, next_watering, upload_date";

impl Database {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.initialize()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.initialize()?;
        Ok(db)
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PlantPalError::Config("Database lock poisoned".to_string()))
    }

    /// Initialize database schema
    fn initialize(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS plants (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                health_status TEXT NOT NULL DEFAULT '',
                watering_interval INTEGER NOT NULL,
                watering_amount INTEGER NOT NULL,
                next_watering TEXT NOT NULL,
                upload_date TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS plant_images (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                plant_id INTEGER NOT NULL REFERENCES plants(id) ON DELETE CASCADE,
                image_data BLOB NOT NULL,
                date TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_plants_next_watering ON plants(next_watering);
            CREATE INDEX IF NOT EXISTS idx_images_plant ON plant_images(plant_id, date);
        "#)?;
        Ok(())
    }

    /// Insert a plant and return its id
    pub fn insert_plant(&self, plant: &NewPlant, upload_date: NaiveDateTime) -> Result<i64> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"INSERT INTO plants (name, health_status, watering_interval, watering_amount, next_watering, upload_date)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                plant.name,
                plant.health_status,
                plant.watering_interval_days,
                plant.watering_amount_ml,
                plant.next_watering,
                upload_date,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Insert a plant together with its first photo in one transaction.
    /// Returns the plant id.
    pub fn insert_plant_with_image(
        &self,
        plant: &NewPlant,
        image_data: &[u8],
        upload_date: NaiveDateTime,
    ) -> Result<i64> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"INSERT INTO plants (name, health_status, watering_interval, watering_amount, next_watering, upload_date)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                plant.name,
                plant.health_status,
                plant.watering_interval_days,
                plant.watering_amount_ml,
                plant.next_watering,
                upload_date,
            ],
        )?;
        let plant_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO plant_images (plant_id, image_data, date) VALUES (?1, ?2, ?3)",
            params![plant_id, image_data, upload_date],
        )?;

        tx.commit()?;
        Ok(plant_id)
    }

    /// Store a photo for an existing plant and return the image id
    pub fn insert_image(&self, plant_id: i64, image_data: &[u8], date: NaiveDateTime) -> Result<i64> {
        let conn = self.lock_conn()?;

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM plants WHERE id = ?1)",
            params![plant_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(PlantPalError::NotFound(format!("plant {}", plant_id)));
        }

        conn.execute(
            "INSERT INTO plant_images (plant_id, image_data, date) VALUES (?1, ?2, ?3)",
            params![plant_id, image_data, date],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get a plant by id
    pub fn get_plant(&self, id: i64) -> Result<Option<PlantRecord>> {
        let conn = self.lock_conn()?;
        let plant = conn
            .query_row(
                &format!("SELECT {} FROM plants WHERE id = ?1", PLANT_COLUMNS),
                params![id],
                plant_from_row,
            )
            .optional()?;
        Ok(plant)
    }

    /// All plants, oldest first
    pub fn list_plants(&self) -> Result<Vec<PlantRecord>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM plants ORDER BY id", PLANT_COLUMNS))?;
        let plants = stmt
            .query_map([], plant_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(plants)
    }

    /// Plants whose next watering is on or before `date`, most overdue first
    pub fn plants_due(&self, date: NaiveDate) -> Result<Vec<PlantRecord>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM plants WHERE next_watering <= ?1 ORDER BY next_watering, id",
            PLANT_COLUMNS
        ))?;
        let plants = stmt
            .query_map(params![date], plant_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(plants)
    }

    /// Photos of a plant, newest first
    pub fn images_for_plant(&self, plant_id: i64) -> Result<Vec<PlantImage>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT id, plant_id, image_data, date FROM plant_images
               WHERE plant_id = ?1 ORDER BY date DESC, id DESC"#,
        )?;
        let images = stmt
            .query_map(params![plant_id], |row| {
                Ok(PlantImage {
                    id: row.get(0)?,
                    plant_id: row.get(1)?,
                    image_data: row.get(2)?,
                    date: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(images)
    }

    /// Most recent photo of a plant
    pub fn latest_image(&self, plant_id: i64) -> Result<Option<PlantImage>> {
        Ok(self.images_for_plant(plant_id)?.into_iter().next())
    }

    /// Mark a plant watered on `date`; the next watering moves one interval on
    pub fn record_watering(&self, plant_id: i64, date: NaiveDate) -> Result<NaiveDate> {
        let plant = self
            .get_plant(plant_id)?
            .ok_or_else(|| PlantPalError::NotFound(format!("plant {}", plant_id)))?;

        let next = date
            .checked_add_days(Days::new(plant.watering_interval_days as u64))
            .ok_or_else(|| PlantPalError::Validation("watering date out of range".to_string()))?;

        let conn = self.lock_conn()?;
        conn.execute(
            "UPDATE plants SET next_watering = ?1 WHERE id = ?2",
            params![next, plant_id],
        )?;
        Ok(next)
    }

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DbStats> {
        let conn = self.lock_conn()?;
        let plant_count: i64 = conn.query_row("SELECT COUNT(*) FROM plants", [], |row| row.get(0))?;
        let image_count: i64 = conn.query_row("SELECT COUNT(*) FROM plant_images", [], |row| row.get(0))?;
        Ok(DbStats { plant_count, image_count })
    }
}
