// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use arbitrary::Arbitrary;
use image::RgbImage;
use libfuzzer_sys::fuzz_target;

use plantpal::analysis::{analyze_zones, BandMode, LightClassifier};

#[derive(Arbitrary, Debug)]
struct Input {
    width: u8,
    height: u8,
    overlapping: bool,
    pixels: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let (width, height) = (input.width as u32 % 64, input.height as u32 % 64);
    let needed = (width * height * 3) as usize;
    if input.pixels.len() < needed {
        return;
    }
    let Some(img) = RgbImage::from_raw(width, height, input.pixels[..needed].to_vec()) else {
        return;
    };

    let mode = if input.overlapping { BandMode::Overlapping } else { BandMode::Disjoint };
    let classifier = LightClassifier::default().with_band_mode(mode);

    if let Ok(report) = classifier.brightness(&img) {
        let sum = report.high_percent + report.medium_percent + report.low_percent;
        if mode == BandMode::Disjoint {
            assert!((sum - 100.0).abs() < 1e-6);
        }
    }
    let _ = classifier.color_temperature(&img);

    match analyze_zones(&img) {
        Ok(zones) => {
            assert_eq!(zones.scores().len(), 9);
            let best = zones.best_score().brightness;
            assert!(zones.scores().iter().all(|s| s.brightness <= best));
            assert_eq!(zones.annotate(&img).dimensions(), img.dimensions());
        }
        Err(_) => assert!(width < 3 || height < 3),
    }
});
