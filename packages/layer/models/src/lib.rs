#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Layer identifiers and air-quality station record types.
//!
//! Every input the suitability dashboard loads is one [`LayerKind`]. Most
//! layers feed the scoring engine; air-quality stations and `PurpleAir`
//! sensors are display-only overlays described by [`StationRecord`] and
//! plain point features respectively.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One input layer of the dashboard.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LayerKind {
    /// County buildings offering public Wi-Fi.
    Wifi,
    /// Playground points.
    Playgrounds,
    /// Park polygons.
    Parks,
    /// Playing-field polygons.
    Fields,
    /// Splash-park points.
    SplashPads,
    /// Building footprint polygons.
    Buildings,
    /// Street network lines.
    Roads,
    /// Priority Environment Management Unit polygons (exclusion mask).
    Pemu,
    /// Land-use bylaw parcels.
    LandUse,
    /// National Pollutant Release Inventory facilities.
    Npri,
    /// Municipal census enumeration areas.
    Census,
    /// Provincial air-quality monitoring stations.
    Stations,
    /// `PurpleAir` particulate sensors.
    #[serde(rename = "purpleair")]
    #[strum(serialize = "purpleair")]
    PurpleAir,
}

impl LayerKind {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Wifi,
            Self::Playgrounds,
            Self::Parks,
            Self::Fields,
            Self::SplashPads,
            Self::Buildings,
            Self::Roads,
            Self::Pemu,
            Self::LandUse,
            Self::Npri,
            Self::Census,
            Self::Stations,
            Self::PurpleAir,
        ]
    }

    /// Returns `true` for overlays that never enter the score.
    #[must_use]
    pub const fn is_display_only(self) -> bool {
        matches!(self, Self::Stations | Self::PurpleAir)
    }

    /// Layers pooled into the amenity layer.
    #[must_use]
    pub const fn is_amenity(self) -> bool {
        matches!(
            self,
            Self::Playgrounds | Self::Parks | Self::Fields | Self::SplashPads
        )
    }

    /// Value written to the `source_type` attribute of point features
    /// from this layer, for layers that carry one.
    #[must_use]
    pub const fn source_type_tag(self) -> Option<&'static str> {
        match self {
            Self::Stations => Some("station"),
            Self::PurpleAir => Some("purpleair"),
            Self::Npri => Some("npri"),
            _ => None,
        }
    }
}

/// The latest reading of one parameter at one station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationReading {
    /// Station the reading belongs to.
    pub station_name: String,
    /// Full parameter name (e.g. `"Nitrogen Dioxide"`).
    pub parameter: String,
    /// Reading value, with gas concentrations already in ppb.
    pub value: f64,
    /// Display unit including its leading space (e.g. `" ppb"`), or empty.
    pub unit: String,
    /// Typographic abbreviation (e.g. `"NO₂"`), or empty.
    pub abbreviation: String,
    /// ASCII short form (e.g. `"NO2"`), or empty.
    pub short_form: String,
    /// Reading timestamp.
    pub reading_date: DateTime<Utc>,
    /// Station latitude.
    pub latitude: f64,
    /// Station longitude.
    pub longitude: f64,
}

/// One monitoring station with its latest reading per parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationRecord {
    /// Station name as published.
    pub station_name: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Latest Air Quality Health Index, if the station reports one.
    pub aqhi: Option<f64>,
    /// Most recent reading time across all parameters.
    pub latest_reading: Option<DateTime<Utc>>,
    /// Latest reading per parameter, in display order.
    pub readings: Vec<StationReading>,
}

impl StationRecord {
    /// Looks up the latest reading of `parameter`.
    #[must_use]
    pub fn reading(&self, parameter: &str) -> Option<&StationReading> {
        self.readings.iter().find(|r| r.parameter == parameter)
    }
}
