// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! 3x3 placement-zone analysis
//!
//! The image is cut into nine equal cells (integer division, remainder rows
//! and columns at the bottom/right edge are ignored) and the cell with the
//! highest mean gray level is suggested as the spot for the plant pot.

use image::{GrayImage, RgbImage};
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::debug;

use super::{annotate, to_gray};
use crate::{PlantPalError, Result};

/// Cells per side of the placement grid
pub const GRID_SIZE: u32 = 3;

/// Horizontal position of a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Left,
    Center,
    Right,
}

impl Column {
    pub const ALL: [Column; 3] = [Column::Left, Column::Center, Column::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Left => "LEFT",
            Column::Center => "CENTER",
            Column::Right => "RIGHT",
        }
    }
}

/// Vertical position of a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Row {
    Top,
    Mid,
    Bot,
}

impl Row {
    pub const ALL: [Row; 3] = [Row::Top, Row::Mid, Row::Bot];

    pub fn as_str(&self) -> &'static str {
        match self {
            Row::Top => "TOP",
            Row::Mid => "MID",
            Row::Bot => "BOT",
        }
    }
}

/// Label of a grid cell, rendered as `COLUMN-ROW` (e.g. `CENTER-TOP`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZoneLabel {
    pub column: Column,
    pub row: Row,
}

impl ZoneLabel {
    pub fn new(column: Column, row: Row) -> Self {
        Self { column, row }
    }

    /// All nine labels in row-major scan order
    pub fn all() -> impl Iterator<Item = ZoneLabel> {
        Row::ALL
            .into_iter()
            .flat_map(|row| Column::ALL.into_iter().map(move |column| ZoneLabel { column, row }))
    }
}

impl fmt::Display for ZoneLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.column.as_str(), self.row.as_str())
    }
}

impl Serialize for ZoneLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Pixel rectangle covered by one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellBounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Mean gray level of one cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoneScore {
    pub label: ZoneLabel,
    pub bounds: CellBounds,
    pub brightness: f64,
}

/// Result of a placement-zone scan
#[derive(Debug, Clone)]
pub struct ZoneAnalysis {
    scores: Vec<ZoneScore>,
    best_index: usize,
}

impl ZoneAnalysis {
    /// Label of the brightest cell
    pub fn best(&self) -> ZoneLabel {
        self.scores[self.best_index].label
    }

    /// Score of the brightest cell
    pub fn best_score(&self) -> &ZoneScore {
        &self.scores[self.best_index]
    }

    /// Position of the brightest cell in scan order
    pub fn best_index(&self) -> usize {
        self.best_index
    }

    /// All nine scores, row-major
    pub fn scores(&self) -> &[ZoneScore] {
        &self.scores
    }

    /// Draw the grid onto a fresh copy of `img`
    pub fn annotate(&self, img: &RgbImage) -> RgbImage {
        annotate::draw_zone_grid(img, self)
    }
}

fn mean_brightness(gray: &GrayImage, bounds: CellBounds) -> f64 {
    let mut sum = 0u64;
    for y in bounds.y..bounds.y + bounds.height {
        for x in bounds.x..bounds.x + bounds.width {
            sum += gray.get_pixel(x, y).0[0] as u64;
        }
    }
    sum as f64 / (bounds.width as u64 * bounds.height as u64) as f64
}

/// Score every cell of the 3x3 grid and pick the brightest.
///
/// Ties go to the first cell in row-major order.
pub fn analyze_zones(img: &RgbImage) -> Result<ZoneAnalysis> {
    let (width, height) = img.dimensions();
    if width < GRID_SIZE || height < GRID_SIZE {
        return Err(PlantPalError::InvalidImage(format!(
            "{}x{} image is smaller than the {}x{} placement grid",
            width, height, GRID_SIZE, GRID_SIZE
        )));
    }

    let cell_width = width / GRID_SIZE;
    let cell_height = height / GRID_SIZE;
    let gray = to_gray(img);

    let scores: Vec<ZoneScore> = ZoneLabel::all()
        .enumerate()
        .map(|(idx, label)| {
            let col = idx as u32 % GRID_SIZE;
            let row = idx as u32 / GRID_SIZE;
            let bounds = CellBounds {
                x: col * cell_width,
                y: row * cell_height,
                width: cell_width,
                height: cell_height,
            };
            ZoneScore {
                label,
                bounds,
                brightness: mean_brightness(&gray, bounds),
            }
        })
        .collect();

    let best_index = scores
        .iter()
        .enumerate()
        .fold(0, |best, (idx, score)| {
            if score.brightness > scores[best].brightness {
                idx
            } else {
                best
            }
        });

    debug!(
        "Placement zone {} (mean {:.1})",
        scores[best_index].label, scores[best_index].brightness
    );

    Ok(ZoneAnalysis { scores, best_index })
}

/// Suggested placement zone plus the annotated visualization
pub fn suggest_placement_zone(img: &RgbImage) -> Result<(ZoneLabel, RgbImage)> {
    let analysis = analyze_zones(img)?;
    let annotated = analysis.annotate(img);
    Ok((analysis.best(), annotated))
}
