//! Market density tiers.

use adintel_core::{BrandDensity, CompetitionLevel};

/// Brands with at least `threshold` qualifying ads.
#[must_use]
pub fn qualifying_brands(densities: &[BrandDensity], threshold: usize) -> usize {
    densities
        .iter()
        .filter(|d| d.qualifying_ads >= threshold)
        .count()
}

/// None qualifying is a blue ocean, one or two is thin, three or more is
/// normal.
#[must_use]
pub fn classify_competition(densities: &[BrandDensity], threshold: usize) -> CompetitionLevel {
    match qualifying_brands(densities, threshold) {
        0 => CompetitionLevel::BlueOcean,
        1 | 2 => CompetitionLevel::Thin,
        _ => CompetitionLevel::Normal,
    }
}
