//! The loaded layers a scoring run reads from.
//!
//! [`LayerInputs`] is the raw, per-source bag of collections as they come
//! off the fetchers. [`LayerSet::build`] normalizes it once (canonical
//! field names, building and park centroids, the pooled amenity layer,
//! census densities) and builds the spatial indexes the per-cell queries
//! need. The engine only ever sees a finished `LayerSet`.

use geo::Point;
use serde_json::Value;
use sitescore_geometry::{
    FeatureCollection, PointIndex, PolygonIndex, bounding_box, centroid_feature,
    distance_to_nearest_feature, distance_to_nearest_line,
};
use sitescore_geometry_models::{BoundingBox, fields};
use sitescore_landuse::LandUseLookup;
use sitescore_landuse_models::LandUseClass;
use sitescore_layer_models::{LayerKind, StationRecord};

use crate::density::{DensityRow, DensityStats, annotate_density, top_density_areas};
use crate::fields::FieldResolver;
use crate::stations::stations_to_layer;

/// Raw layers as fetched, before normalization.
///
/// Every layer defaults to empty. The land-use layer is `None` until
/// supplied, since scoring cannot run without it.
#[derive(Debug, Clone, Default)]
pub struct LayerInputs {
    /// Public Wi-Fi access points.
    pub wifi: FeatureCollection,
    /// Playground points.
    pub playgrounds: FeatureCollection,
    /// Park polygons.
    pub parks: FeatureCollection,
    /// Sports field polygons.
    pub fields: FeatureCollection,
    /// Splash pad points.
    pub splash_pads: FeatureCollection,
    /// Building footprints.
    pub buildings: FeatureCollection,
    /// Road centrelines.
    pub roads: FeatureCollection,
    /// Exclusion-zone polygons.
    pub pemu: FeatureCollection,
    /// Zoning parcels.
    pub land_use: Option<FeatureCollection>,
    /// Industrial emitter points.
    pub npri: FeatureCollection,
    /// Census areas with population and area attributes.
    pub census: FeatureCollection,
    /// Air-quality stations.
    pub stations: Vec<StationRecord>,
    /// `PurpleAir` sensor points.
    pub purpleair: FeatureCollection,
}

impl LayerInputs {
    /// Stores `collection` as the raw input for `kind`.
    ///
    /// Stations are records rather than features; use
    /// [`LayerInputs::stations`] for them.
    pub fn set(&mut self, kind: LayerKind, collection: FeatureCollection) {
        let slot = match kind {
            LayerKind::Wifi => &mut self.wifi,
            LayerKind::Playgrounds => &mut self.playgrounds,
            LayerKind::Parks => &mut self.parks,
            LayerKind::Fields => &mut self.fields,
            LayerKind::SplashPads => &mut self.splash_pads,
            LayerKind::Buildings => &mut self.buildings,
            LayerKind::Roads => &mut self.roads,
            LayerKind::Pemu => &mut self.pemu,
            LayerKind::Npri => &mut self.npri,
            LayerKind::Census => &mut self.census,
            LayerKind::PurpleAir => &mut self.purpleair,
            LayerKind::LandUse => {
                self.land_use = Some(collection);
                return;
            }
            LayerKind::Stations => {
                log::warn!("Ignoring station features; stations are supplied as records");
                return;
            }
        };
        *slot = collection;
    }
}

/// Indexed land-use layer with its extent.
#[derive(Debug)]
struct LandUseLayer {
    parcels: FeatureCollection,
    lookup: LandUseLookup,
    extent: Option<BoundingBox>,
}

/// Indexed census layer with its density distribution.
#[derive(Debug)]
struct CensusLayer {
    areas: FeatureCollection,
    index: PolygonIndex,
    stats: Option<DensityStats>,
}

/// Normalized, indexed layers for scoring.
#[derive(Debug)]
pub struct LayerSet {
    wifi: FeatureCollection,
    amenities: FeatureCollection,
    buildings: FeatureCollection,
    building_index: PointIndex,
    roads: FeatureCollection,
    pemu: FeatureCollection,
    pemu_index: PolygonIndex,
    land_use: Option<LandUseLayer>,
    npri: FeatureCollection,
    census: Option<CensusLayer>,
    stations: Vec<StationRecord>,
    purpleair: FeatureCollection,
    ready: bool,
}

impl LayerSet {
    /// Normalizes raw inputs and builds the spatial indexes.
    ///
    /// The returned set is not ready until [`LayerSet::mark_ready`] is
    /// called.
    #[must_use]
    pub fn build(inputs: LayerInputs) -> Self {
        let LayerInputs {
            wifi,
            playgrounds,
            parks,
            fields: sports_fields,
            splash_pads,
            buildings,
            roads,
            pemu,
            land_use,
            npri,
            census,
            stations,
            purpleair,
        } = inputs;

        let amenities = pool_amenities(playgrounds, &parks, &sports_fields, splash_pads);
        let buildings: FeatureCollection = buildings.iter().filter_map(centroid_feature).collect();
        let building_index = PointIndex::from_collection(&buildings);
        let pemu_index = PolygonIndex::build(&pemu);

        let land_use = land_use.map(|raw| {
            let parcels = FieldResolver::land_use().canonicalize(raw);
            let lookup = LandUseLookup::build(&parcels);
            let extent = bounding_box(&parcels);
            LandUseLayer {
                parcels,
                lookup,
                extent,
            }
        });

        let census = (!census.is_empty()).then(|| {
            let areas = annotate_density(FieldResolver::census().canonicalize(census));
            let index = PolygonIndex::build(&areas);
            let stats = DensityStats::from_collection(&areas);
            CensusLayer {
                areas,
                index,
                stats,
            }
        });

        let purpleair = tag_source_type(purpleair, LayerKind::PurpleAir);

        log::info!(
            "Layers built: {} wifi, {} amenities, {} buildings, {} roads, {} PEMU, {} land-use, {} NPRI, {} census, {} stations, {} PurpleAir",
            wifi.len(),
            amenities.len(),
            buildings.len(),
            roads.len(),
            pemu.len(),
            land_use.as_ref().map_or(0, |l| l.parcels.len()),
            npri.len(),
            census.as_ref().map_or(0, |c| c.areas.len()),
            stations.len(),
            purpleair.len(),
        );

        Self {
            wifi,
            amenities,
            buildings,
            building_index,
            roads,
            pemu,
            pemu_index,
            land_use,
            npri,
            census,
            stations,
            purpleair,
            ready: false,
        }
    }

    /// Marks loading as complete.
    pub const fn mark_ready(&mut self) {
        self.ready = true;
    }

    /// Whether scoring may run: loading finished and land use is present.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready && self.land_use.is_some()
    }

    /// Whether the land-use layer was supplied.
    #[must_use]
    pub const fn has_land_use(&self) -> bool {
        self.land_use.is_some()
    }

    /// Extent of the land-use layer, which the hex grid covers.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.land_use.as_ref().and_then(|l| l.extent)
    }

    /// The normalized collection for `kind`.
    ///
    /// Amenity source layers are pooled at build time and have no
    /// individual collection; use [`LayerSet::amenities`]. Stations are
    /// records; use [`LayerSet::station_layer`].
    #[must_use]
    pub fn layer(&self, kind: LayerKind) -> Option<&FeatureCollection> {
        match kind {
            LayerKind::Wifi => Some(&self.wifi),
            LayerKind::Buildings => Some(&self.buildings),
            LayerKind::Roads => Some(&self.roads),
            LayerKind::Pemu => Some(&self.pemu),
            LayerKind::LandUse => self.land_use.as_ref().map(|l| &l.parcels),
            LayerKind::Npri => Some(&self.npri),
            LayerKind::Census => self.census.as_ref().map(|c| &c.areas),
            LayerKind::PurpleAir => Some(&self.purpleair),
            LayerKind::Playgrounds
            | LayerKind::Parks
            | LayerKind::Fields
            | LayerKind::SplashPads
            | LayerKind::Stations => None,
        }
    }

    /// Playgrounds, splash pads, and park and field centroids.
    #[must_use]
    pub const fn amenities(&self) -> &FeatureCollection {
        &self.amenities
    }

    /// Air-quality station records.
    #[must_use]
    pub fn stations(&self) -> &[StationRecord] {
        &self.stations
    }

    /// Air-quality stations as a display point layer.
    #[must_use]
    pub fn station_layer(&self) -> FeatureCollection {
        stations_to_layer(&self.stations)
    }

    /// Distance in km to the nearest Wi-Fi point.
    #[must_use]
    pub fn distance_to_wifi(&self, point: Point<f64>) -> f64 {
        distance_to_nearest_feature(point, &self.wifi)
    }

    /// Distance in km to the nearest amenity.
    #[must_use]
    pub fn distance_to_amenity(&self, point: Point<f64>) -> f64 {
        distance_to_nearest_feature(point, &self.amenities)
    }

    /// Distance in km to the nearest road line.
    #[must_use]
    pub fn distance_to_road(&self, point: Point<f64>) -> f64 {
        distance_to_nearest_line(point, &self.roads)
    }

    /// Distance in km to the nearest industrial emitter.
    #[must_use]
    pub fn distance_to_industry(&self, point: Point<f64>) -> f64 {
        distance_to_nearest_feature(point, &self.npri)
    }

    /// Building centroids within `radius_km` of `point`.
    #[must_use]
    pub fn building_count_within(&self, point: Point<f64>, radius_km: f64) -> usize {
        self.building_index.count_within_km(point, radius_km)
    }

    /// Land-use class at `point`; the "(no polygons)" class when the layer
    /// is missing or empty.
    #[must_use]
    pub fn land_use_at(&self, point: Point<f64>) -> LandUseClass {
        self.land_use
            .as_ref()
            .map_or_else(LandUseClass::no_polygons, |l| l.lookup.class_at(point))
    }

    /// Whether `point` lies inside any exclusion-zone polygon.
    #[must_use]
    pub fn in_exclusion_zone(&self, point: Point<f64>) -> bool {
        self.pemu_index.contains(point)
    }

    /// Population density of the first census area containing `point`.
    ///
    /// `None` when the point is outside census coverage or there is no
    /// census layer.
    #[must_use]
    pub fn population_density_at(&self, point: Point<f64>) -> Option<f64> {
        let census = self.census.as_ref()?;
        let i = census.index.first_containing(point)?;
        Some(census.areas.features[i].number(fields::DENSITY).unwrap_or(0.0))
    }

    /// The `k` densest census areas, densest first; empty without a census
    /// layer.
    #[must_use]
    pub fn densest_areas(&self, k: usize) -> Vec<DensityRow> {
        self.census
            .as_ref()
            .map_or_else(Vec::new, |c| top_density_areas(&c.areas, k))
    }

    /// Density distribution of the census layer.
    #[must_use]
    pub fn density_stats(&self) -> Option<&DensityStats> {
        self.census.as_ref().and_then(|c| c.stats.as_ref())
    }
}

fn pool_amenities(
    playgrounds: FeatureCollection,
    parks: &FeatureCollection,
    sports_fields: &FeatureCollection,
    splash_pads: FeatureCollection,
) -> FeatureCollection {
    let mut pooled = playgrounds;
    pooled.extend(parks.iter().filter_map(centroid_feature));
    pooled.extend(sports_fields.iter().filter_map(centroid_feature));
    pooled.extend(splash_pads);
    pooled
}

fn tag_source_type(collection: FeatureCollection, kind: LayerKind) -> FeatureCollection {
    let Some(tag) = kind.source_type_tag() else {
        return collection;
    };
    collection
        .into_iter()
        .map(|mut f| {
            f.properties
                .insert(fields::SOURCE_TYPE.to_string(), Value::from(tag));
            f
        })
        .collect()
}
