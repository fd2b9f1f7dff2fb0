//! Population density of census areas, its legend statistics, and the
//! densest-areas export.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sitescore_geometry::{Feature, FeatureCollection, area_km2};
use sitescore_geometry_models::fields;

use crate::LayerError;

/// Quantiles used for the legend class breaks.
pub const BREAK_QUANTILES: [f64; 5] = [0.10, 0.30, 0.50, 0.70, 0.90];

/// Legend fill colors, lightest (lowest density) first.
pub const DENSITY_COLORS: [&str; 6] = [
    "#edf8fb", "#b2e2e2", "#66c2a4", "#2ca25f", "#006d2c", "#00441b",
];

/// People per square kilometre for one census area.
///
/// Missing population counts as zero; zero or missing area yields zero.
#[must_use]
pub fn population_density(feature: &Feature) -> f64 {
    let population = feature.number(fields::POPULATION).unwrap_or(0.0);
    let km2 = area_km2(feature);
    if km2 > 0.0 {
        let density = population / km2;
        if density.is_finite() { density } else { 0.0 }
    } else {
        0.0
    }
}

/// Writes [`fields::DENSITY`] on every feature of a canonicalized census
/// layer.
#[must_use]
pub fn annotate_density(mut collection: FeatureCollection) -> FeatureCollection {
    for feature in &mut collection.features {
        let density = population_density(feature);
        feature
            .properties
            .insert(fields::DENSITY.to_string(), serde_json::Value::from(density));
    }
    collection
}

/// Distribution of census densities, for normalization and the legend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DensityStats {
    /// Lowest density.
    pub min: f64,
    /// Median density.
    pub median: f64,
    /// Highest density.
    pub max: f64,
    /// Class breaks at [`BREAK_QUANTILES`].
    pub breaks: [f64; 5],
    /// Number of areas the statistics cover.
    pub count: usize,
}

impl DensityStats {
    /// Computes statistics over the finite values of `densities`.
    ///
    /// Quantile `p` is the sorted value at index `floor((n - 1) * p)`.
    /// Returns `None` when there is no finite value.
    #[must_use]
    pub fn from_values(densities: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut values: Vec<f64> = densities.into_iter().filter(|d| d.is_finite()).collect();
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);

        let quantile = |p: f64| {
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                clippy::cast_precision_loss
            )]
            let i = ((values.len() - 1) as f64 * p).floor() as usize;
            values[i.min(values.len() - 1)]
        };

        Some(Self {
            min: values[0],
            median: quantile(0.5),
            max: values[values.len() - 1],
            breaks: BREAK_QUANTILES.map(quantile),
            count: values.len(),
        })
    }

    /// Computes statistics from the [`fields::DENSITY`] attribute of an
    /// annotated census layer.
    #[must_use]
    pub fn from_collection(collection: &FeatureCollection) -> Option<Self> {
        Self::from_values(collection.iter().filter_map(|f| f.number(fields::DENSITY)))
    }

    /// Returns `true` if densities span a non-empty range, so they can be
    /// normalized.
    #[must_use]
    pub fn has_range(&self) -> bool {
        self.max > self.min
    }

    /// Legend class (0 to 5) of a density value.
    #[must_use]
    pub fn class_of(&self, density: f64) -> usize {
        self.breaks
            .iter()
            .position(|b| density <= *b)
            .unwrap_or(self.breaks.len())
    }

    /// Legend fill color of a density value.
    #[must_use]
    pub fn color_of(&self, density: f64) -> &'static str {
        DENSITY_COLORS[self.class_of(density)]
    }
}

/// Census attribute holding the enumeration-area id.
const AREA_ID: &str = "EA_ID";

/// Census attribute holding the enumeration-area name.
const AREA_NAME: &str = "EA_NAME";

/// One census area in the densest-areas export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityRow {
    /// 1-based rank, densest first.
    pub rank: usize,
    /// People per km².
    pub density: f64,
    /// Population count, zero when missing.
    pub population: f64,
    /// Area in km² used for the density.
    pub area_km2: f64,
    /// Precomputed area attribute in m², if present.
    pub area_m2: Option<f64>,
    /// Enumeration-area id.
    pub ea_id: Option<String>,
    /// Enumeration-area name.
    pub ea_name: Option<String>,
}

/// The `k` densest areas of a canonicalized census layer, densest first.
///
/// Areas with zero or unknown area have density zero and sort last. Ties
/// keep layer order.
#[must_use]
pub fn top_density_areas(census: &FeatureCollection, k: usize) -> Vec<DensityRow> {
    let mut rows: Vec<DensityRow> = census
        .iter()
        .map(|f| DensityRow {
            rank: 0,
            density: population_density(f),
            population: f.number(fields::POPULATION).unwrap_or(0.0),
            area_km2: area_km2(f),
            area_m2: f.number(fields::AREA_M2),
            ea_id: f.property(AREA_ID).and_then(attribute_text),
            ea_name: f.property(AREA_NAME).and_then(attribute_text),
        })
        .collect();
    rows.sort_by(|a, b| b.density.total_cmp(&a.density));
    rows.truncate(k);

    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i + 1;
    }
    rows
}

fn attribute_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Writes the densest-areas table behind a `# Conditions` metadata header.
///
/// # Errors
///
/// Returns [`LayerError::Io`] or [`LayerError::Csv`] if writing fails.
pub fn write_density_csv<W: Write>(
    rows: &[DensityRow],
    when: DateTime<Utc>,
    mut writer: W,
) -> Result<(), LayerError> {
    writeln!(writer, "# Conditions")?;
    writeln!(writer, "# dataset, municipal census enumeration areas")?;
    writeln!(
        writer,
        "# metric, population density (people/km²) = population / (area_m² / 1e6)"
    )?;
    writeln!(writer, "# date_generated, {}", when.to_rfc3339())?;

    let mut csv_writer = csv::Writer::from_writer(&mut writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;

    log::info!("Exported {} census areas by density", rows.len());
    Ok(())
}
