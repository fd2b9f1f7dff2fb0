//! Feature and feature-collection types shared by every layer.
//!
//! Features are read from `GeoJSON` and converted to `geo` geometries up
//! front, so measurement code never re-parses coordinates. A feature whose
//! geometry cannot be converted is kept with `geometry: None`; the
//! measurement functions skip it.

use geo::Geometry;
use geojson::GeoJson;
use serde_json::Value;

use crate::GeometryError;

/// Open attribute map of a feature.
pub type Properties = serde_json::Map<String, Value>;

/// A single geometry with its attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feature {
    /// The feature geometry, or `None` if it was missing or unparseable.
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes.
    pub properties: Properties,
}

impl Feature {
    /// Creates a feature with the given geometry and no attributes.
    #[must_use]
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: Properties::new(),
        }
    }

    /// Creates a point feature at `lon`/`lat`.
    #[must_use]
    pub fn point(lon: f64, lat: f64) -> Self {
        Self::new(Geometry::Point(geo::Point::new(lon, lat)))
    }

    /// Replaces the attribute map.
    #[must_use]
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Sets a single attribute.
    #[must_use]
    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Returns the raw attribute value for `key`.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Returns the attribute as a finite number.
    ///
    /// Accepts JSON numbers and numeric strings; anything else (including
    /// `NaN` and infinities) is `None`.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        coerce_f64(self.properties.get(key)?)
    }

    /// Returns the attribute as a string slice if it is a JSON string.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Converts a `GeoJSON` feature, dropping geometries that `geo` cannot
    /// represent.
    #[must_use]
    pub fn from_geojson(feature: geojson::Feature) -> Self {
        Self {
            geometry: feature.geometry.and_then(convert_geometry),
            properties: feature.properties.unwrap_or_default(),
        }
    }

    /// Reads one `GeoJSON` feature object without failing.
    ///
    /// A malformed `geometry` member is logged and becomes `None`; the
    /// properties are kept either way. A value that is not an object
    /// yields an empty feature.
    #[must_use]
    pub fn from_json_lenient(value: Value) -> Self {
        let Value::Object(mut object) = value else {
            log::warn!("Skipping non-object feature entry");
            return Self::default();
        };

        let properties = match object.remove("properties") {
            Some(Value::Object(properties)) => properties,
            _ => Properties::new(),
        };
        let geometry = match object.remove("geometry") {
            None | Some(Value::Null) => None,
            Some(raw) => match geojson::Geometry::from_json_value(raw) {
                Ok(g) => convert_geometry(g),
                Err(e) => {
                    log::warn!("Keeping feature without its malformed geometry: {e}");
                    None
                }
            },
        };

        Self {
            geometry,
            properties,
        }
    }

    /// Converts back to a `GeoJSON` feature.
    #[must_use]
    pub fn to_geojson(&self) -> geojson::Feature {
        geojson::Feature {
            bbox: None,
            geometry: self
                .geometry
                .as_ref()
                .map(|g| geojson::Geometry::new(geojson::Value::from(g))),
            id: None,
            properties: Some(self.properties.clone()),
            foreign_members: None,
        }
    }
}

fn convert_geometry(geometry: geojson::Geometry) -> Option<Geometry<f64>> {
    match Geometry::<f64>::try_from(geometry) {
        Ok(geom) => Some(geom),
        Err(e) => {
            log::debug!("Dropping unconvertible feature geometry: {e}");
            None
        }
    }
}

/// Coerces a JSON number or numeric string to a finite `f64`.
#[must_use]
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// An ordered collection of features forming one layer.
///
/// Order is not meaningful beyond giving iteration a stable sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    /// Features in input order.
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Creates a collection from a list of features.
    #[must_use]
    pub const fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns `true` if the collection has no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterates features in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    /// Appends a feature.
    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    /// Parses a `GeoJSON` document.
    ///
    /// See [`FeatureCollection::from_json_value`].
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if the text is not JSON or not a `GeoJSON`
    /// shape.
    pub fn from_geojson_str(text: &str) -> Result<Self, GeometryError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json_value(value)
    }

    /// Reads an already-decoded JSON value as `GeoJSON`.
    ///
    /// Any object with a `features` array is read feature by feature with
    /// [`Feature::from_json_lenient`], so one malformed geometry costs only
    /// that feature's geometry. A bare `Feature` or `Geometry` document
    /// becomes a one-element collection.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if the value is not a `GeoJSON` shape or
    /// its `features` member is not an array.
    pub fn from_json_value(value: Value) -> Result<Self, GeometryError> {
        let Value::Object(mut object) = value else {
            return Ok(Self::from_geojson(GeoJson::from_json_value(value)?));
        };

        match object.remove("features") {
            Some(Value::Array(features)) => {
                Ok(features.into_iter().map(Feature::from_json_lenient).collect())
            }
            Some(other) => Err(GeometryError::Unsupported {
                message: format!("`features` is not an array: {other}"),
            }),
            None => Ok(Self::from_geojson(GeoJson::from_json_value(
                Value::Object(object),
            )?)),
        }
    }

    /// Converts any `GeoJSON` object into a collection.
    #[must_use]
    pub fn from_geojson(geojson: GeoJson) -> Self {
        match geojson {
            GeoJson::FeatureCollection(fc) => {
                fc.features.into_iter().map(Feature::from_geojson).collect()
            }
            GeoJson::Feature(f) => std::iter::once(Feature::from_geojson(f)).collect(),
            GeoJson::Geometry(g) => std::iter::once(Feature::from_geojson(geojson::Feature {
                bbox: None,
                geometry: Some(g),
                id: None,
                properties: None,
                foreign_members: None,
            }))
            .collect(),
        }
    }

    /// Converts back to a `GeoJSON` feature collection.
    #[must_use]
    pub fn to_geojson(&self) -> geojson::FeatureCollection {
        geojson::FeatureCollection {
            bbox: None,
            features: self.features.iter().map(Feature::to_geojson).collect(),
            foreign_members: None,
        }
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

impl Extend<Feature> for FeatureCollection {
    fn extend<I: IntoIterator<Item = Feature>>(&mut self, iter: I) {
        self.features.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_feature_collection() {
        let fc = FeatureCollection::from_geojson_str(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"name":"a"},
                 "geometry":{"type":"Point","coordinates":[-113.3,53.5]}},
                {"type":"Feature","properties":{"name":"b"},"geometry":null}
            ]}"#,
        )
        .unwrap();

        assert_eq!(fc.len(), 2);
        assert!(matches!(fc.features[0].geometry, Some(Geometry::Point(_))));
        assert!(fc.features[1].geometry.is_none());
        assert_eq!(fc.features[1].text("name"), Some("b"));
    }

    #[test]
    fn bare_geometry_becomes_single_feature() {
        let fc = FeatureCollection::from_geojson_str(
            r#"{"type":"LineString","coordinates":[[0,0],[1,1]]}"#,
        )
        .unwrap();
        assert_eq!(fc.len(), 1);
        assert!(fc.features[0].properties.is_empty());
    }

    #[test]
    fn malformed_geometry_keeps_the_rest_of_the_layer() {
        let fc = FeatureCollection::from_json_value(serde_json::json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "good"},
                 "geometry": {"type": "Point", "coordinates": [-113.3, 53.5]}},
                {"type": "Feature", "properties": {"name": "bad polygon"},
                 "geometry": {"type": "Polygon", "coordinates": "oops"}},
                {"type": "Feature", "properties": {"name": "short point"},
                 "geometry": {"type": "Point", "coordinates": [-113.3]}}
            ]
        }))
        .unwrap();

        assert_eq!(fc.len(), 3);
        assert!(matches!(fc.features[0].geometry, Some(Geometry::Point(_))));
        assert!(fc.features[1].geometry.is_none());
        assert_eq!(fc.features[1].text("name"), Some("bad polygon"));
        assert!(fc.features[2].geometry.is_none());
        assert_eq!(fc.features[2].text("name"), Some("short point"));
    }

    #[test]
    fn features_member_must_be_an_array() {
        let err = FeatureCollection::from_json_value(serde_json::json!({
            "type": "FeatureCollection",
            "features": {"oops": true}
        }))
        .unwrap_err();
        assert!(matches!(err, GeometryError::Unsupported { .. }));
    }

    #[test]
    fn rejects_invalid_geojson() {
        assert!(FeatureCollection::from_geojson_str("{\"type\":\"Nope\"}").is_err());
    }

    #[test]
    fn coerces_numeric_strings() {
        let f = Feature::point(0.0, 0.0)
            .with_property("a", "12.5")
            .with_property("b", 3)
            .with_property("c", "abc")
            .with_property("d", Value::Null);
        assert_eq!(f.number("a"), Some(12.5));
        assert_eq!(f.number("b"), Some(3.0));
        assert_eq!(f.number("c"), None);
        assert_eq!(f.number("d"), None);
        assert_eq!(f.number("missing"), None);
    }

    #[test]
    fn converts_back_to_geojson() {
        let fc: FeatureCollection = vec![Feature::point(1.0, 2.0).with_property("k", "v")]
            .into_iter()
            .collect();
        let gj = fc.to_geojson();
        assert_eq!(gj.features.len(), 1);
        let props = gj.features[0].properties.as_ref().unwrap();
        assert_eq!(props["k"], "v");
    }
}
