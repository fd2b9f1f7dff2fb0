//! Flat CSV export of a snapshot's candidates.
//!
//! The table is preceded by `# key, value` metadata lines recording when
//! and how the run was scored. [`read_csv`] skips them.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use sitescore_mcda_models::{Candidate, Snapshot};

use crate::ExportError;
use crate::display::round_to;

const TITLE: &str = "Site suitability: top candidates";

/// One exported candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    /// 1-based rank.
    pub rank: usize,
    /// Cell center latitude.
    pub lat: f64,
    /// Cell center longitude.
    pub lon: f64,
    /// Final score.
    pub score: f64,
    /// Wi-Fi component.
    pub s_wifi: f64,
    /// Amenity component.
    pub s_amenity: f64,
    /// Road component.
    pub s_road: f64,
    /// Land-use component.
    pub s_land_use: f64,
    /// Building density component.
    pub s_building: f64,
    /// Population density component.
    pub s_population: f64,
    /// Industrial emitter component.
    pub s_industrial: f64,
    /// Distance to the nearest Wi-Fi point, km.
    pub d_wifi_km: f64,
    /// Distance to the nearest amenity, km.
    pub d_amenity_km: f64,
    /// Distance to the nearest road, km.
    pub d_road_km: f64,
    /// Distance to the nearest industrial emitter, km.
    pub d_industry_km: f64,
    /// Buildings within the building radius.
    pub building_count: usize,
    /// Land-use bucket label.
    pub land_use_label: String,
    /// Land-use sub-score.
    pub land_use_score: f64,
    /// People per km², empty outside census coverage.
    pub population_density: Option<f64>,
}

impl ExportRow {
    /// Flattens a candidate, rounding scores and distances to 3 decimals
    /// and coordinates to 6.
    #[must_use]
    pub fn from_candidate(candidate: &Candidate) -> Self {
        let c = &candidate.components;
        let raw = &candidate.raw;

        Self {
            rank: candidate.rank,
            lat: round_to(candidate.center.lat, 6),
            lon: round_to(candidate.center.lon, 6),
            score: round_to(candidate.score, 3),
            s_wifi: round_to(c.wifi, 3),
            s_amenity: round_to(c.amenity, 3),
            s_road: round_to(c.road, 3),
            s_land_use: round_to(c.land_use, 3),
            s_building: round_to(c.building, 3),
            s_population: round_to(c.population, 3),
            s_industrial: round_to(c.industrial, 3),
            d_wifi_km: round_to(raw.wifi_km, 3),
            d_amenity_km: round_to(raw.amenity_km, 3),
            d_road_km: round_to(raw.road_km, 3),
            d_industry_km: round_to(raw.industry_km, 3),
            building_count: raw.building_count,
            land_use_label: raw.land_use_label.clone(),
            land_use_score: round_to(raw.land_use_score, 3),
            population_density: raw
                .population_density
                .filter(|d| d.is_finite())
                .map(|d| round_to(d, 3)),
        }
    }
}

/// Writes the metadata header and one row per candidate.
///
/// # Errors
///
/// * [`ExportError::NoResults`] if the snapshot has no candidates
/// * [`ExportError::Io`] or [`ExportError::Csv`] if writing fails
pub fn write_csv<W: Write>(snapshot: &Snapshot, mut writer: W) -> Result<(), ExportError> {
    if snapshot.candidates.is_empty() {
        return Err(ExportError::NoResults);
    }

    let p = &snapshot.parameters;
    let w = p.weights_normalized.weights();
    writeln!(writer, "# {TITLE}")?;
    writeln!(writer, "# generated_at, {}", snapshot.when.to_rfc3339())?;
    writeln!(writer, "# mode, {}", p.mode)?;
    writeln!(writer, "# roadsPreference, {}", p.roads_preference)?;
    writeln!(writer, "# industryPreference, {}", p.industry_preference)?;
    writeln!(writer, "# excludePemu, {}", p.exclude_pemu)?;
    writeln!(writer, "# cellSizeKm, {}", p.cell_size_km)?;
    writeln!(writer, "# maxDistanceKm, {}", p.max_distance_km)?;
    writeln!(
        writer,
        "# weights_normalized, wifi={}; amenity={}; road={}; landUse={}; building={}; population={}; industrial={}",
        w.wifi, w.amenity, w.road, w.land_use, w.building, w.population, w.industrial
    )?;

    let mut csv_writer = csv::Writer::from_writer(&mut writer);
    for candidate in &snapshot.candidates {
        csv_writer.serialize(ExportRow::from_candidate(candidate))?;
    }
    csv_writer.flush()?;

    log::info!("Exported {} candidates", snapshot.candidates.len());
    Ok(())
}

/// Reads rows written by [`write_csv`], skipping metadata lines.
///
/// # Errors
///
/// Returns [`ExportError::Csv`] if a row does not parse.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<ExportRow>, ExportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .from_reader(reader);

    csv_reader
        .deserialize()
        .map(|row| row.map_err(ExportError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use sitescore_geometry_models::{BoundingBox, LonLat};
    use sitescore_mcda_models::{ComponentScores, RawMeasurements, ScoringParameters};

    use super::*;
    use crate::snapshot::build_snapshot;

    fn candidate(rank: usize, score: f64) -> Candidate {
        Candidate {
            rank,
            center: LonLat::new(-113.318_234_567, 53.523_456_789),
            score,
            components: ComponentScores {
                wifi: 0.912_345,
                amenity: 0.333_333_3,
                road: 1.0,
                land_use: 0.9,
                building: 0.0,
                population: 0.5,
                industrial: 0.666_666_7,
            },
            raw: RawMeasurements {
                wifi_km: 0.175_31,
                amenity_km: 1.333_7,
                road_km: 0.0,
                industry_km: 999.0,
                building_count: 4,
                land_use_label: "Industrial, heavy".to_string(),
                land_use_score: 0.9,
                population_density: if rank == 1 { None } else { Some(1234.567_89) },
            },
        }
    }

    fn snapshot(candidates: Vec<Candidate>) -> Snapshot {
        build_snapshot(
            &ScoringParameters::default(),
            candidates,
            BoundingBox::new(-113.4, 53.4, -113.2, 53.6),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn round_trip_preserves_rank_order_and_values() {
        let snap = snapshot(vec![
            candidate(1, 0.876_543),
            candidate(2, 0.812_1),
            candidate(3, 0.5),
        ]);
        let mut buffer = Vec::new();
        write_csv(&snap, &mut buffer).unwrap();

        let rows = read_csv(buffer.as_slice()).unwrap();
        let expected: Vec<ExportRow> = snap.candidates.iter().map(ExportRow::from_candidate).collect();
        assert_eq!(rows, expected);
        assert_eq!(rows.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!((rows[0].score - 0.877).abs() < f64::EPSILON);
        assert_eq!(rows[0].population_density, None);
        assert_eq!(rows[1].population_density, Some(1234.568));
        assert_eq!(rows[0].land_use_label, "Industrial, heavy");
    }

    #[test]
    fn header_carries_run_metadata() {
        let mut buffer = Vec::new();
        write_csv(&snapshot(vec![candidate(1, 0.5)]), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("# generated_at, 2024-05-01T12:00:00+00:00"));
        assert!(text.contains("# mode, exposure"));
        assert!(text.contains("# roadsPreference, closer"));
        assert!(text.contains("# excludePemu, true"));
        assert!(text.contains("# weights_normalized, wifi="));
        let header = text.lines().find(|l| !l.starts_with('#')).unwrap();
        assert!(header.starts_with("rank,lat,lon,score,s_wifi"));
    }

    #[test]
    fn empty_snapshot_is_no_results() {
        let mut buffer = Vec::new();
        let err = write_csv(&snapshot(Vec::new()), &mut buffer).unwrap_err();
        assert!(matches!(err, ExportError::NoResults));
        assert_eq!(
            err.to_string(),
            "No top candidates available yet. Run scoring first."
        );
        assert!(buffer.is_empty());
    }
}
