//! Config-driven layer source definition.
//!
//! [`LayerSourceDef`] captures where one input layer comes from in a
//! serializable config struct, so adding or repointing a layer is a TOML
//! edit rather than a code change.

use serde::Deserialize;
use sitescore_layer_models::LayerKind;

use crate::LayerError;

/// Default `ArcGIS` page size (`resultRecordCount`).
pub const DEFAULT_PAGE_SIZE: u64 = 2000;

/// A complete layer source definition, loaded from embedded TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct LayerSourceDef {
    /// Unique identifier (e.g., `"land_use"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Which layer this source feeds.
    pub layer: LayerKind,
    /// Whether scoring cannot run without this layer.
    #[serde(default)]
    pub required: bool,
    /// How to fetch the raw data.
    pub fetcher: FetcherConfig,
}

/// How to fetch one layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FetcherConfig {
    /// `ArcGIS` REST `query` endpoint returning `GeoJSON` pages.
    Arcgis {
        /// The layer's `.../FeatureServer/<id>/query` URL.
        query_url: String,
        /// Records per page.
        #[serde(default = "default_page_size")]
        page_size: u64,
        /// `where` clause.
        #[serde(default = "default_where")]
        where_clause: String,
        /// Field to order pages by, for stable pagination.
        #[serde(default)]
        order_by: Option<String>,
        /// Probe sibling layer ids and the other server type when the
        /// configured layer reports no records.
        #[serde(default)]
        probe_alternates: bool,
    },
    /// Plain JSON rows with coordinate columns.
    PointRows {
        /// Download URL.
        url: String,
    },
    /// Hourly air-quality station CSV.
    StationCsv {
        /// Download URL.
        url: String,
    },
}

const fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

fn default_where() -> String {
    "1=1".to_string()
}

/// Parses a layer source definition from TOML text.
///
/// # Errors
///
/// Returns [`LayerError::Toml`] if the text is not a valid definition.
pub fn parse_source_toml(text: &str) -> Result<LayerSourceDef, LayerError> {
    Ok(toml::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arcgis_definition_with_defaults() {
        let def = parse_source_toml(
            r#"
id = "roads"
name = "Street Network"
layer = "roads"

[fetcher]
type = "arcgis"
query_url = "https://example.com/arcgis/rest/services/Roads/FeatureServer/0/query"
"#,
        )
        .unwrap();

        assert_eq!(def.layer, LayerKind::Roads);
        assert!(!def.required);
        match def.fetcher {
            FetcherConfig::Arcgis {
                page_size,
                where_clause,
                order_by,
                probe_alternates,
                ..
            } => {
                assert_eq!(page_size, DEFAULT_PAGE_SIZE);
                assert_eq!(where_clause, "1=1");
                assert!(order_by.is_none());
                assert!(!probe_alternates);
            }
            other => panic!("unexpected fetcher {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_layer() {
        let err = parse_source_toml(
            r#"
id = "x"
name = "X"
layer = "volcanoes"

[fetcher]
type = "point_rows"
url = "https://example.com/x.json"
"#,
        );
        assert!(err.is_err());
    }
}
