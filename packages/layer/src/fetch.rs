//! Downloads every registered layer and assembles a [`LayerSet`].
//!
//! Each [`LayerSourceDef`] is dispatched to the fetcher its config names.
//! A failing optional layer is logged and left empty so the rest of the
//! run proceeds; a failing required layer aborts loading.

use std::sync::Arc;

use sitescore_geometry::FeatureCollection;
use sitescore_layer_models::StationRecord;

use crate::LayerError;
use crate::arcgis::{fetch_all_geojson, fetch_smart};
use crate::layer_set::{LayerInputs, LayerSet};
use crate::points::rows_to_points;
use crate::progress::ProgressCallback;
use crate::registry::all_sources;
use crate::retry::{send_json, send_text};
use crate::source_def::{FetcherConfig, LayerSourceDef};
use crate::stations::parse_station_csv;

const USER_AGENT: &str = "sitescore/0.1";

/// What one source produced.
#[derive(Debug, Clone)]
pub enum FetchedLayer {
    /// A feature layer.
    Features(FeatureCollection),
    /// Air-quality station records.
    Stations(Vec<StationRecord>),
}

impl FetchedLayer {
    /// Number of features or stations.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Features(fc) => fc.len(),
            Self::Stations(records) => records.len(),
        }
    }

    /// Returns `true` if nothing was fetched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LayerInputs {
    /// Stores a fetched layer in the slot for `source`.
    pub fn insert(&mut self, source: &LayerSourceDef, fetched: FetchedLayer) {
        match fetched {
            FetchedLayer::Features(collection) => self.set(source.layer, collection),
            FetchedLayer::Stations(records) => self.stations = records,
        }
    }
}

/// Builds the HTTP client used for every source.
///
/// # Errors
///
/// Returns [`LayerError::Http`] if the TLS backend cannot be initialized.
pub fn http_client() -> Result<reqwest::Client, LayerError> {
    Ok(reqwest::Client::builder().user_agent(USER_AGENT).build()?)
}

/// Fetches and normalizes one source.
///
/// # Errors
///
/// Returns [`LayerError`] if the download fails or the payload cannot be
/// parsed.
#[allow(clippy::future_not_send)]
pub async fn fetch_source(
    client: &reqwest::Client,
    source: &LayerSourceDef,
) -> Result<FetchedLayer, LayerError> {
    match &source.fetcher {
        FetcherConfig::Arcgis {
            query_url,
            page_size,
            where_clause,
            order_by,
            probe_alternates,
        } => {
            let order_by = order_by.as_deref();
            let collection = if *probe_alternates {
                fetch_smart(client, query_url, where_clause, order_by, *page_size).await?
            } else {
                fetch_all_geojson(client, query_url, where_clause, order_by, *page_size).await?
            };
            Ok(FetchedLayer::Features(collection))
        }
        FetcherConfig::PointRows { url } => {
            let body = send_json(|| client.get(url)).await?;
            Ok(FetchedLayer::Features(rows_to_points(body)?))
        }
        FetcherConfig::StationCsv { url } => {
            let text = send_text(|| client.get(url)).await?;
            Ok(FetchedLayer::Stations(parse_station_csv(&text)?))
        }
    }
}

/// Fetches every source in order.
///
/// # Errors
///
/// Returns the error of the first required source that fails. Optional
/// sources that fail are logged and left empty.
#[allow(clippy::future_not_send)]
pub async fn fetch_all(
    client: &reqwest::Client,
    sources: &[LayerSourceDef],
    progress: Arc<dyn ProgressCallback>,
) -> Result<LayerInputs, LayerError> {
    let mut inputs = LayerInputs::default();
    progress.set_total(u64::try_from(sources.len()).unwrap_or(u64::MAX));

    for source in sources {
        progress.set_message(format!("Fetching {}", source.name));

        match fetch_source(client, source).await {
            Ok(fetched) => {
                log::info!("{}: {} records", source.name, fetched.len());
                inputs.insert(source, fetched);
            }
            Err(e) if source.required => {
                log::error!("{}: {e}", source.name);
                return Err(e);
            }
            Err(e) => {
                log::warn!("{}: {e} (continuing without it)", source.name);
            }
        }

        progress.inc(1);
    }

    progress.finish("All layers fetched".to_string());
    Ok(inputs)
}

/// Fetches every registered source and returns a ready [`LayerSet`].
///
/// # Errors
///
/// Returns [`LayerError`] if the client cannot be built or a required
/// source fails.
#[allow(clippy::future_not_send)]
pub async fn load_registered_layers(
    progress: Arc<dyn ProgressCallback>,
) -> Result<LayerSet, LayerError> {
    let client = http_client()?;
    let inputs = fetch_all(&client, &all_sources(), progress).await?;
    let mut layers = LayerSet::build(inputs);
    layers.mark_ready();
    Ok(layers)
}

#[cfg(test)]
mod tests {
    use sitescore_geometry::Feature;
    use sitescore_layer_models::LayerKind;

    use super::*;
    use crate::registry::source_for;

    #[test]
    fn insert_routes_features_by_layer() {
        let mut inputs = LayerInputs::default();
        let roads = source_for(LayerKind::Roads).unwrap();
        inputs.insert(
            &roads,
            FetchedLayer::Features([Feature::point(1.0, 2.0)].into_iter().collect()),
        );
        assert_eq!(inputs.roads.len(), 1);
        assert!(inputs.wifi.is_empty());
    }

    #[test]
    fn insert_routes_station_records() {
        let mut inputs = LayerInputs::default();
        let stations = source_for(LayerKind::Stations).unwrap();
        let fetched = FetchedLayer::Stations(
            parse_station_csv(
                "StationName,ParameterName,Value,ReadingDate,Latitude,Longitude\n\
                 Edmonton East,AQHI,2,2025-01-10T15:00:00Z,53.55,-113.37\n",
            )
            .unwrap(),
        );
        assert_eq!(fetched.len(), 1);
        inputs.insert(&stations, fetched);
        assert_eq!(inputs.stations.len(), 1);
    }

    #[test]
    fn land_use_insert_is_present_even_when_empty() {
        let mut inputs = LayerInputs::default();
        let land_use = source_for(LayerKind::LandUse).unwrap();
        let fetched = FetchedLayer::Features(FeatureCollection::default());
        assert!(fetched.is_empty());
        inputs.insert(&land_use, fetched);
        assert!(inputs.land_use.is_some());
    }

    #[tokio::test]
    async fn fetch_all_of_nothing_is_empty() {
        let client = reqwest::Client::new();
        let inputs = fetch_all(&client, &[], crate::progress::null_progress())
            .await
            .unwrap();
        assert!(inputs.land_use.is_none());
    }
}
