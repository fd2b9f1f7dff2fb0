//! Canonical attribute resolution.
//!
//! Upstream services spell the same attribute several ways (`tot_pop` vs
//! `TOT_POP`, `Shape_Area` vs `SHAPE__Area`). A [`FieldResolver`] copies the
//! first present alias of each attribute to its canonical name once, when a
//! layer is loaded, so nothing downstream needs to know the variants.

use serde_json::Value;
use sitescore_geometry::{Feature, FeatureCollection};
use sitescore_geometry_models::fields;

/// Population aliases, in priority order.
pub const POPULATION_ALIASES: &[&str] = &[fields::POPULATION, "tot_pop", "TOT_POP"];

/// Area-in-square-metres aliases, in priority order.
pub const AREA_M2_ALIASES: &[&str] = &[
    fields::AREA_M2,
    "Shape_Area",
    "shape_area",
    "SHAPE__Area",
    "SHAPE_Area",
];

/// Zoning-code aliases, in priority order.
pub const ZONE_ALIASES: &[&str] = &[fields::ZONE, "lub_zoning", "ZONE", "DISTRICT", "Zoning"];

/// Zoning-description aliases, in priority order.
pub const DESCRIPTION_ALIASES: &[&str] = &[
    fields::DESCRIPTION,
    "lub_description",
    "LAND_USE",
    "LANDUSE",
];

/// One canonical attribute and the upstream names it may arrive under.
#[derive(Debug, Clone, Copy)]
struct FieldRule {
    canonical: &'static str,
    aliases: &'static [&'static str],
}

/// Copies aliased attributes to their canonical names.
#[derive(Debug, Clone)]
pub struct FieldResolver {
    rules: Vec<FieldRule>,
}

impl FieldResolver {
    /// Resolver for census enumeration areas (population and area).
    #[must_use]
    pub fn census() -> Self {
        Self {
            rules: vec![
                FieldRule {
                    canonical: fields::POPULATION,
                    aliases: POPULATION_ALIASES,
                },
                FieldRule {
                    canonical: fields::AREA_M2,
                    aliases: AREA_M2_ALIASES,
                },
            ],
        }
    }

    /// Resolver for land-use parcels (zone, description, and area).
    #[must_use]
    pub fn land_use() -> Self {
        Self {
            rules: vec![
                FieldRule {
                    canonical: fields::ZONE,
                    aliases: ZONE_ALIASES,
                },
                FieldRule {
                    canonical: fields::DESCRIPTION,
                    aliases: DESCRIPTION_ALIASES,
                },
                FieldRule {
                    canonical: fields::AREA_M2,
                    aliases: AREA_M2_ALIASES,
                },
            ],
        }
    }

    /// Writes every canonical attribute on one feature.
    ///
    /// The first alias holding a non-null value wins. When no alias is
    /// present the canonical attribute is left unset.
    pub fn resolve(&self, feature: &mut Feature) {
        for rule in &self.rules {
            let found = rule
                .aliases
                .iter()
                .find_map(|alias| feature.property(alias).filter(|v| !v.is_null()))
                .cloned();

            match found {
                Some(value) => {
                    feature.properties.insert(rule.canonical.to_string(), value);
                }
                None => {
                    feature.properties.remove(rule.canonical);
                }
            }
        }
    }

    /// Resolves every feature of a layer.
    #[must_use]
    pub fn canonicalize(&self, mut collection: FeatureCollection) -> FeatureCollection {
        let mut unresolved = vec![0usize; self.rules.len()];

        for feature in &mut collection.features {
            self.resolve(feature);
            for (i, rule) in self.rules.iter().enumerate() {
                if feature.property(rule.canonical).is_none_or(Value::is_null) {
                    unresolved[i] += 1;
                }
            }
        }

        for (rule, missing) in self.rules.iter().zip(unresolved) {
            if missing > 0 {
                log::debug!(
                    "{missing}/{} features have no value for '{}'",
                    collection.len(),
                    rule.canonical
                );
            }
        }

        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn census_aliases_resolve_to_canonical() {
        let fc: FeatureCollection = vec![
            Feature::point(0.0, 0.0)
                .with_property("TOT_POP", 120)
                .with_property("SHAPE__Area", 40_000.0),
            Feature::point(0.0, 0.0)
                .with_property("tot_pop", 5)
                .with_property("TOT_POP", 999),
        ]
        .into_iter()
        .collect();

        let out = FieldResolver::census().canonicalize(fc);
        assert_eq!(out.features[0].number(fields::POPULATION), Some(120.0));
        assert_eq!(out.features[0].number(fields::AREA_M2), Some(40_000.0));
        assert_eq!(out.features[1].number(fields::POPULATION), Some(5.0));
        assert!(out.features[1].property(fields::AREA_M2).is_none());
    }

    #[test]
    fn null_alias_falls_through() {
        let mut f = Feature::point(0.0, 0.0)
            .with_property("lub_zoning", Value::Null)
            .with_property("ZONE", "IH")
            .with_property("LAND_USE", "IH - Heavy Industrial");
        FieldResolver::land_use().resolve(&mut f);
        assert_eq!(f.text(fields::ZONE), Some("IH"));
        assert_eq!(f.text(fields::DESCRIPTION), Some("IH - Heavy Industrial"));
    }

    #[test]
    fn empty_string_alias_is_kept() {
        let mut f = Feature::point(0.0, 0.0)
            .with_property("lub_zoning", "")
            .with_property("ZONE", "IH");
        FieldResolver::land_use().resolve(&mut f);
        assert_eq!(f.text(fields::ZONE), Some(""));
    }

    #[test]
    fn canonical_name_wins_over_aliases() {
        let mut f = Feature::point(0.0, 0.0)
            .with_property(fields::POPULATION, 10)
            .with_property("tot_pop", 20);
        FieldResolver::census().resolve(&mut f);
        assert_eq!(f.number(fields::POPULATION), Some(10.0));
    }
}
