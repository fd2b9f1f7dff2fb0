//! Hourly air-quality station feed.
//!
//! The provincial feed is a CSV export with one row per station, parameter,
//! and hour. This module keeps the latest reading of each parameter per
//! station, converts gas concentrations from ppm to ppb, and attaches the
//! display labels the map popups use.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use sitescore_geometry::{Feature, FeatureCollection, coerce_f64};
use sitescore_geometry_models::fields;
use sitescore_layer_models::{LayerKind, StationReading, StationRecord};

use crate::LayerError;

/// Parameter assumed when a row leaves `ParameterName` blank.
pub const DEFAULT_PARAMETER: &str = "AQHI";

/// Gas parameters published in ppm and displayed in ppb.
pub const PPB_PARAMETERS: &[&str] = &[
    "Ozone",
    "Total Oxides of Nitrogen",
    "Hydrogen Sulphide",
    "Total Reduced Sulphur",
    "Sulphur Dioxide",
    "Nitric Oxide",
    "Nitrogen Dioxide",
];

/// Popup display order of parameters.
pub const PARAMETER_ORDER: &[&str] = &[
    "AQHI",
    "Outdoor Temperature",
    "Relative Humidity",
    "Wind Speed",
    "Wind Direction",
    "Nitrogen Dioxide",
    "Total Oxides of Nitrogen",
    "Nitric Oxide",
    "Ozone",
    "Fine Particulate Matter",
    "Sulphur Dioxide",
    "Hydrogen Sulphide",
    "Total Reduced Sulphur",
    "Carbon Monoxide",
    "Total Hydrocarbons",
    "Methane",
    "Non-methane Hydrocarbons",
];

/// `(parameter, unit, abbreviation, short form)`.
const PARAMETER_LABELS: &[(&str, &str, &str, &str)] = &[
    ("AQHI", " ", "AQHI", "AQHI"),
    ("Ozone", " ppb", "O₃", "O3"),
    ("Total Oxides of Nitrogen", " ppb", "NOx", "NOX"),
    ("Hydrogen Sulphide", " ppb", "H₂S", "H2S"),
    ("Total Reduced Sulphur", " ppb", "TRS", "TRS"),
    ("Sulphur Dioxide", " ppb", "SO₂", "SO2"),
    ("Fine Particulate Matter", " µg/m³", "PM2.5", "PM2.5"),
    ("Total Hydrocarbons", " ppm", "THC", "THC"),
    ("Carbon Monoxide", " ppm", "CO", "CO"),
    ("Wind Direction", " degrees", "wd", "wd"),
    ("Relative Humidity", " %", "RH", "RH"),
    ("Outdoor Temperature", " °C", "ET", "ET"),
    ("Nitric Oxide", " ppb", "NO", "NO"),
    ("Wind Speed", " km/hr", "ws", "ws"),
    ("Non-methane Hydrocarbons", " ppm", "NMHC", "NMHC"),
    ("Nitrogen Dioxide", " ppb", "NO₂", "NO2"),
    ("Methane", " ppm", "CH₄", "CH4"),
];

/// Popup labels that replace the short form for meteorological parameters.
const LABEL_OVERRIDES: &[(&str, &str)] = &[
    ("Outdoor Temperature", "Temp"),
    ("Relative Humidity", "Humidity"),
    ("Wind Speed", "Wind Speed"),
    ("Wind Direction", "Wind Dir"),
];

/// One CSV row as published. Every field is optional so a short or
/// malformed row is dropped during validation rather than failing the
/// whole file.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "StationName", default)]
    station_name: Option<String>,
    #[serde(rename = "ParameterName", default)]
    parameter_name: Option<String>,
    #[serde(rename = "Value", default)]
    value: Option<String>,
    #[serde(rename = "ReadingDate", default)]
    reading_date: Option<String>,
    #[serde(rename = "Latitude", default)]
    latitude: Option<String>,
    #[serde(rename = "Longitude", default)]
    longitude: Option<String>,
}

/// Unit, abbreviation, and short form of a parameter. Unknown parameters
/// get empty labels.
#[must_use]
pub fn parameter_labels(parameter: &str) -> (&'static str, &'static str, &'static str) {
    PARAMETER_LABELS
        .iter()
        .find(|(name, ..)| *name == parameter)
        .map_or(("", "", ""), |(_, unit, abbr, short)| (*unit, *abbr, *short))
}

/// Parses a reading timestamp. Accepts RFC 3339 and naive
/// `YYYY-MM-DD HH:MM[:SS]` forms, the latter taken as UTC.
#[must_use]
pub fn parse_reading_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .map(|naive| naive.and_utc())
}

fn parse_number(raw: Option<&str>) -> Option<f64> {
    coerce_f64(&Value::String(raw?.to_string()))
}

fn validate(row: RawRow) -> Option<StationReading> {
    let station_name = row
        .station_name
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())?;
    let latitude = parse_number(row.latitude.as_deref())?;
    let longitude = parse_number(row.longitude.as_deref())?;

    let parameter = row
        .parameter_name
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_PARAMETER.to_string());

    let mut value = parse_number(row.value.as_deref())?;
    if PPB_PARAMETERS.contains(&parameter.as_str()) {
        value *= 1000.0;
    }

    let reading_date = parse_reading_date(row.reading_date.as_deref()?)?;
    let (unit, abbreviation, short_form) = parameter_labels(&parameter);

    Some(StationReading {
        station_name,
        parameter,
        value,
        unit: unit.to_string(),
        abbreviation: abbreviation.to_string(),
        short_form: short_form.to_string(),
        reading_date,
        latitude,
        longitude,
    })
}

/// Parses the hourly station CSV into readings, dropping rows with
/// non-numeric coordinates or values, or an unreadable timestamp.
///
/// # Errors
///
/// Returns [`LayerError::Csv`] if the header row cannot be read.
pub fn parse_readings(text: &str) -> Result<Vec<StationReading>, LayerError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    reader.headers()?;

    let mut readings = Vec::new();
    let mut dropped = 0usize;

    for result in reader.deserialize::<RawRow>() {
        match result.ok().and_then(validate) {
            Some(reading) => readings.push(reading),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        log::debug!("Dropped {dropped} unusable station rows");
    }

    Ok(readings)
}

fn parameter_rank(parameter: &str) -> usize {
    PARAMETER_ORDER
        .iter()
        .position(|p| *p == parameter)
        .unwrap_or(PARAMETER_ORDER.len())
}

/// Groups readings into one record per station, keeping the latest
/// reading of each parameter. Stations are returned in name order.
#[must_use]
pub fn group_by_station(readings: Vec<StationReading>) -> Vec<StationRecord> {
    let mut stations: BTreeMap<String, BTreeMap<String, StationReading>> = BTreeMap::new();

    for reading in readings {
        let latest = stations
            .entry(reading.station_name.clone())
            .or_default()
            .entry(reading.parameter.clone());

        match latest {
            Entry::Vacant(slot) => {
                slot.insert(reading);
            }
            Entry::Occupied(mut slot) => {
                if reading.reading_date > slot.get().reading_date {
                    slot.insert(reading);
                }
            }
        }
    }

    stations
        .into_iter()
        .filter_map(|(station_name, by_parameter)| {
            let mut readings: Vec<StationReading> = by_parameter.into_values().collect();
            readings.sort_by(|a, b| {
                parameter_rank(&a.parameter)
                    .cmp(&parameter_rank(&b.parameter))
                    .then_with(|| a.parameter.cmp(&b.parameter))
            });

            let newest = readings.iter().max_by_key(|r| r.reading_date)?;
            let (lat, lon, latest_reading) =
                (newest.latitude, newest.longitude, Some(newest.reading_date));
            let aqhi = readings
                .iter()
                .find(|r| r.parameter == DEFAULT_PARAMETER)
                .map(|r| r.value);

            Some(StationRecord {
                station_name,
                lat,
                lon,
                aqhi,
                latest_reading,
                readings,
            })
        })
        .collect()
}

/// Parses the station CSV straight to per-station records.
///
/// # Errors
///
/// Returns [`LayerError::Csv`] if the header row cannot be read.
pub fn parse_station_csv(text: &str) -> Result<Vec<StationRecord>, LayerError> {
    let records = group_by_station(parse_readings(text)?);
    log::info!("Parsed {} air-quality stations", records.len());
    Ok(records)
}

/// Marker color for an AQHI value: low, moderate, high, very high.
#[must_use]
pub fn aqhi_color(aqhi: Option<f64>) -> &'static str {
    match aqhi {
        Some(a) if a.is_nan() => "#666",
        Some(a) if a <= 3.0 => "#2ca25f",
        Some(a) if a <= 6.0 => "#ffb000",
        Some(a) if a <= 10.0 => "#d73027",
        Some(_) => "#7a1fa2",
        None => "#666",
    }
}

/// Display text for an AQHI value; the index is open-ended above 10.
#[must_use]
pub fn aqhi_label(aqhi: Option<f64>) -> String {
    match aqhi {
        Some(a) if a > 10.0 => "10+".to_string(),
        Some(a) => a.to_string(),
        None => "N/A".to_string(),
    }
}

/// Popup lines (`label: value unit`) for every non-AQHI parameter, in
/// display order.
#[must_use]
pub fn summary_lines(record: &StationRecord) -> Vec<String> {
    record
        .readings
        .iter()
        .filter(|r| r.parameter != DEFAULT_PARAMETER)
        .map(|r| {
            let label = LABEL_OVERRIDES
                .iter()
                .find(|(p, _)| *p == r.parameter)
                .map(|(_, label)| *label)
                .or_else(|| (!r.short_form.is_empty()).then_some(r.short_form.as_str()))
                .unwrap_or(r.parameter.as_str());
            format!("{label}: {}{}", r.value, r.unit)
        })
        .collect()
}

/// Point layer of stations, tagged with [`fields::SOURCE_TYPE`].
#[must_use]
pub fn stations_to_layer(records: &[StationRecord]) -> FeatureCollection {
    let tag = LayerKind::Stations.source_type_tag().unwrap_or_default();

    records
        .iter()
        .map(|r| {
            Feature::point(r.lon, r.lat)
                .with_property("stationName", r.station_name.as_str())
                .with_property("aqhi", r.aqhi)
                .with_property("aqhiLabel", aqhi_label(r.aqhi))
                .with_property("color", aqhi_color(r.aqhi))
                .with_property("summary", summary_lines(r))
                .with_property(fields::SOURCE_TYPE, tag)
        })
        .collect()
}
