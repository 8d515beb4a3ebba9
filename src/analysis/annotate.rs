// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Grid overlay for placement-zone results

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use super::zones::{CellBounds, ZoneAnalysis};

/// Outline and label color of the suggested cell
pub const BEST_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
/// Outline and label color of every other cell
pub const CELL_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const LABEL_OFFSET: i32 = 5;
const LABEL_SCALE: u32 = 2;

/// 3x5 bitmap glyphs, one row per entry, high bit on the left.
/// Only the characters used in zone labels are defined.
fn glyph(c: char) -> Option<[u8; 5]> {
    let rows = match c {
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        _ => return None,
    };
    Some(rows)
}

/// Draw `text` with its top-left corner at (x, y). Pixels past the image
/// edge are clipped by imageproc. A zero scale draws at scale 1.
fn draw_label(img: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>, scale: u32) {
    let scale = scale.max(1);
    let advance = (4 * scale) as i32;

    for (i, c) in text.chars().enumerate() {
        let Some(rows) = glyph(c) else { continue };
        let origin_x = x + i as i32 * advance;

        for (row, bits) in rows.iter().enumerate() {
            for col in 0..3 {
                if bits & (0b100 >> col) != 0 {
                    let px = origin_x + (col * scale) as i32;
                    let py = y + (row as u32 * scale) as i32;
                    draw_filled_rect_mut(img, Rect::at(px, py).of_size(scale, scale), color);
                }
            }
        }
    }
}

/// 2px outline hugging the cell edges, corners inclusive
fn outline_cell(img: &mut RgbImage, bounds: CellBounds, color: Rgb<u8>) {
    let x = bounds.x as i32;
    let y = bounds.y as i32;
    draw_hollow_rect_mut(img, Rect::at(x, y).of_size(bounds.width + 1, bounds.height + 1), color);
    if bounds.width > 2 && bounds.height > 2 {
        draw_hollow_rect_mut(
            img,
            Rect::at(x + 1, y + 1).of_size(bounds.width - 1, bounds.height - 1),
            color,
        );
    }
}

/// Copy `img` and draw every cell outline and label on it. The suggested cell
/// is drawn last so shared edges keep its color.
pub fn draw_zone_grid(img: &RgbImage, analysis: &ZoneAnalysis) -> RgbImage {
    let mut canvas = img.clone();
    let best = analysis.best_index();

    let order = (0..analysis.scores().len())
        .filter(|&idx| idx != best)
        .chain(std::iter::once(best));

    for idx in order {
        let score = &analysis.scores()[idx];
        let color = if idx == best { BEST_COLOR } else { CELL_COLOR };
        outline_cell(&mut canvas, score.bounds, color);
        draw_label(
            &mut canvas,
            score.bounds.x as i32 + LABEL_OFFSET,
            score.bounds.y as i32 + LABEL_OFFSET,
            &score.label.to_string(),
            color,
            LABEL_SCALE,
        );
    }

    canvas
}
