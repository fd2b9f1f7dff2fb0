//! Loose JSON rows to point features.
//!
//! Sensor feeds publish plain JSON records with coordinates spread across
//! differently-named keys. This module turns any of the common shapes into
//! a point [`FeatureCollection`], keeping every row attribute.

use serde_json::Value;
use sitescore_geometry::{Feature, FeatureCollection, coerce_f64};

use crate::LayerError;

/// Latitude keys, in priority order.
pub const LATITUDE_KEYS: &[&str] = &["lat", "latitude", "Latitude", "LAT", "Lat"];

/// Longitude keys, in priority order.
pub const LONGITUDE_KEYS: &[&str] = &["lon", "lng", "long", "longitude", "Longitude", "LON", "Lng"];

/// Converts row-shaped JSON into a point layer.
///
/// Accepted shapes:
/// * a `GeoJSON` `FeatureCollection` (passed through)
/// * an array of row objects
/// * an object wrapping rows in `data` or `features`
/// * an object of row objects keyed by ID
///
/// Rows without finite coordinates, or that are not objects, are dropped.
///
/// # Errors
///
/// Returns [`LayerError`] if the value is a scalar, or claims to be a
/// `FeatureCollection` but is not valid `GeoJSON`.
pub fn rows_to_points(value: Value) -> Result<FeatureCollection, LayerError> {
    let rows = match value {
        Value::Null => Vec::new(),
        Value::Array(rows) => rows,
        Value::Object(mut map) => {
            if map.get("type").and_then(Value::as_str) == Some("FeatureCollection") {
                return Ok(FeatureCollection::from_json_value(Value::Object(map))?);
            }
            match (map.remove("data"), map.remove("features")) {
                (Some(Value::Array(rows)), _) | (_, Some(Value::Array(rows))) => rows,
                _ => map.into_iter().map(|(_, row)| row).collect(),
            }
        }
        other => {
            return Err(LayerError::Normalization {
                message: format!("expected rows of point records, got {other}"),
            });
        }
    };

    let total = rows.len();
    let collection: FeatureCollection = rows.into_iter().filter_map(row_to_point).collect();

    let dropped = total - collection.len();
    if dropped > 0 {
        log::debug!("Dropped {dropped}/{total} rows without usable coordinates");
    }

    Ok(collection)
}

fn row_to_point(row: Value) -> Option<Feature> {
    let Value::Object(properties) = row else {
        return None;
    };

    let lat = first_coordinate(&properties, LATITUDE_KEYS)?;
    let lon = first_coordinate(&properties, LONGITUDE_KEYS)?;

    Some(Feature::point(lon, lat).with_properties(properties))
}

fn first_coordinate(properties: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|k| properties.get(*k))
        .and_then(coerce_f64)
}

#[cfg(test)]
mod tests {
    use geo::Geometry;
    use serde_json::json;

    use super::*;

    fn coords(f: &Feature) -> (f64, f64) {
        match f.geometry {
            Some(Geometry::Point(p)) => (p.x(), p.y()),
            _ => panic!("expected point"),
        }
    }

    #[test]
    fn array_of_rows() {
        let fc = rows_to_points(json!([
            {"name": "a", "lat": 53.5, "lon": -113.3},
            {"name": "b", "Latitude": "53.6", "Longitude": "-113.2"},
            {"name": "c", "LAT": 53.7, "Lng": -113.1},
        ]))
        .unwrap();

        assert_eq!(fc.len(), 3);
        assert_eq!(coords(&fc.features[0]), (-113.3, 53.5));
        assert_eq!(coords(&fc.features[1]), (-113.2, 53.6));
        assert_eq!(coords(&fc.features[2]), (-113.1, 53.7));
        assert_eq!(fc.features[1].text("name"), Some("b"));
    }

    #[test]
    fn drops_rows_without_coordinates() {
        let fc = rows_to_points(json!([
            {"lat": 53.5, "lon": -113.3},
            {"lat": "n/a", "lon": -113.3},
            {"lat": 53.5},
            {"lat": null, "lon": -113.3},
            "not a row",
        ]))
        .unwrap();
        assert_eq!(fc.len(), 1);
    }

    #[test]
    fn object_keyed_by_id() {
        let fc = rows_to_points(json!({
            "101": {"lat": 53.5, "lng": -113.3},
            "102": {"latitude": 53.6, "long": -113.2},
        }))
        .unwrap();
        assert_eq!(fc.len(), 2);
    }

    #[test]
    fn data_and_features_wrappers() {
        let data = rows_to_points(json!({"data": [{"lat": 1.0, "lon": 2.0}]})).unwrap();
        assert_eq!(data.len(), 1);

        let features = rows_to_points(json!({"features": [{"lat": 1.0, "lon": 2.0}]})).unwrap();
        assert_eq!(features.len(), 1);
    }

    #[test]
    fn feature_collection_passes_through() {
        let fc = rows_to_points(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"id": 1},
                "geometry": {"type": "Point", "coordinates": [-113.3, 53.5]}
            }]
        }))
        .unwrap();
        assert_eq!(fc.len(), 1);
        assert_eq!(coords(&fc.features[0]), (-113.3, 53.5));
    }

    #[test]
    fn malformed_geometry_does_not_drop_the_layer() {
        let fc = rows_to_points(json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"id": 1},
                 "geometry": {"type": "Point", "coordinates": [-113.3, 53.5]}},
                {"type": "Feature", "properties": {"id": 2},
                 "geometry": {"type": "Point", "coordinates": [-113.3]}}
            ]
        }))
        .unwrap();
        assert_eq!(fc.len(), 2);
        assert_eq!(coords(&fc.features[0]), (-113.3, 53.5));
        assert!(fc.features[1].geometry.is_none());
    }

    #[test]
    fn null_is_empty_and_scalars_are_rejected() {
        assert!(rows_to_points(Value::Null).unwrap().is_empty());
        assert!(rows_to_points(json!(42)).is_err());
    }
}
