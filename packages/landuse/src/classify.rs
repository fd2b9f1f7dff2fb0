//! Description-first land-use classification.
//!
//! Descriptions are tried first, because zoning codes are reused across
//! municipalities with different meanings while descriptions carry the
//! district name. Rules are evaluated strictly in order and the first
//! match wins:
//!
//! 1. authoritative exact/prefix rules on the normalized description
//! 2. keyword patterns, in bucket order
//! 3. a reduced keyword set for Direct Control districts
//! 4. the normalized zoning code against a static code table
//!
//! Anything left over is unclassified and scores neutral.

use regex::Regex;
use sitescore_geometry::Feature;
use sitescore_geometry_models::fields;
use sitescore_landuse_models::LandUseBucket::{
    Agriculture, Commercial, Industrial, Institutional, ParkOpenSpace, Residential,
};
use sitescore_landuse_models::{LandUseBucket, LandUseClass};
use std::sync::LazyLock;

use crate::normalize::{normalize_description, normalize_zone};

/// District families identified outright by description, in evaluation
/// order: `(bucket, prefixes, substrings)`.
const FAMILY_RULES: &[(LandUseBucket, &[&str], &[&str])] = &[
    (
        Agriculture,
        &["AD - AGRICULTURE", "AG - AGRICULTURE", "AR - AGRICULTURE"],
        &["RURAL RESIDENTIAL/AGRICULTURE"],
    ),
    (ParkOpenSpace, &["PC -", "PG -", "PR -", "PRM -"], &[]),
    (
        Industrial,
        &["IH -", "IHH -", "IL -", "ILT -", "IM -", "IMH -"],
        &[],
    ),
    (
        Commercial,
        &["C1 -", "C2 -", "C3 -", "C4 -", "C5 -", "C6 -", "C7 -"],
        &["CITP - CENTRE IN THE PARK"],
    ),
    (Institutional, &["MI -", "MU1 -", "MU2 -", "PS -", "PU -"], &[]),
];

/// Residential district codes at the start of a description.
static RESIDENTIAL_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(ALD|HR1|HR2|HR4|R1A|R1B|R1C|R1D|R1E|R2A|R2B|R2C|R3|R4|R5|R6|R7|RCH|RCL|RCS|RE|RH|RLD1|RM|RS|RSO|SRR1|UV2|UV3|UV4)\b",
    )
    .expect("valid regex")
});

/// Keyword heuristics, tried in this order.
static KEYWORD_RULES: LazyLock<Vec<(Regex, LandUseBucket)>> = LazyLock::new(|| {
    [
        (r"AGRIC|FARM|RURAL", Agriculture),
        (
            r"PARK|OPEN SPACE|RECREATION|TRAIL|NATURAL AREA|CONSERV",
            ParkOpenSpace,
        ),
        (
            r"INDUSTRIAL|WAREHOUSE|LOGISTICS|PROCESSING|PLANT|BUSINESS PARK",
            Industrial,
        ),
        (
            r"COMMERCIAL|RETAIL|SHOPPING|OFFICE|SERVICE COMMERCIAL|DOWNTOWN COMMERCIAL",
            Commercial,
        ),
        (
            r"INSTITUTION|SCHOOL|HOSPITAL|HEALTH|MUNICIPAL|GOVERNMENT|FIRE HALL|POLICE|LIBRARY|CEMETERY",
            Institutional,
        ),
        // Hyphenated forms arrive as " - " after normalization.
        (
            r"RESIDENTIAL|APARTMENT|MULTI(?: - | )FAMILY|SINGLE(?: - | )DETACHED|TOWN(HOUSE)?|ROW(HOUSE)?|MOBILE HOME|URBAN VILLAGE",
            Residential,
        ),
    ]
    .into_iter()
    .map(|(pattern, bucket)| (Regex::new(pattern).expect("valid regex"), bucket))
    .collect()
});

/// Reduced keyword set for Direct Control districts.
static DIRECT_CONTROL_RULES: LazyLock<Vec<(Regex, LandUseBucket)>> = LazyLock::new(|| {
    [
        (r"RESIDENTIAL|URBAN VILLAGE", Residential),
        (r"COMMERCIAL|RETAIL|OFFICE", Commercial),
        (r"INDUSTRIAL", Industrial),
        (r"PARK|OPEN SPACE|RECREATION", ParkOpenSpace),
        (r"AGRIC", Agriculture),
        (r"INSTITUTION|SCHOOL|HOSPITAL|GOVERNMENT", Institutional),
    ]
    .into_iter()
    .map(|(pattern, bucket)| (Regex::new(pattern).expect("valid regex"), bucket))
    .collect()
});

const DIRECT_CONTROL_MARKER: &str = "DC - DIRECT CONTROL";

/// Zoning code to bucket table, used after every description rule fails.
const ZONE_CODES: &[(LandUseBucket, &[&str])] = &[
    (Industrial, &["IH", "IHH", "IL", "ILT", "IM", "IMH"]),
    (
        Commercial,
        &["A", "C1", "C2", "C3", "C4", "C5", "C6", "C7", "CITP", "DC1"],
    ),
    (Institutional, &["MI", "MU1", "MU2", "PS", "PU"]),
    (
        Residential,
        &[
            "ALD", "HR1", "HR2", "HR4", "R1A", "R1B", "R1C", "R1D", "R1E", "R2A", "R2B", "R2C",
            "R3", "R4", "R5", "R6", "R7", "RCH", "RCL", "RCS", "RE", "RH", "RLD1", "RM", "RS",
            "RSO", "SRR1", "UV3",
        ],
    ),
    (ParkOpenSpace, &["PC", "PG", "PR", "PRM"]),
    (Agriculture, &["AD", "AG", "AR", "RA"]),
];

fn first_match(rules: &[(Regex, LandUseBucket)], text: &str) -> Option<LandUseBucket> {
    rules
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, bucket)| *bucket)
}

/// Classifies a zoning description alone.
///
/// The input is normalized first, so raw upstream text can be passed
/// directly. Returns `None` when no description rule applies.
#[must_use]
pub fn classify_description(description: &str) -> Option<LandUseBucket> {
    let d = normalize_description(description);
    if d.is_empty() {
        return None;
    }

    if d == "A - AIRPORT" {
        return Some(Institutional);
    }
    if let Some((bucket, _, _)) = FAMILY_RULES.iter().find(|(_, prefixes, substrings)| {
        prefixes.iter().any(|p| d.starts_with(p)) || substrings.iter().any(|s| d.contains(s))
    }) {
        return Some(*bucket);
    }
    if RESIDENTIAL_CODE_RE.is_match(&d) {
        return Some(Residential);
    }

    if let Some(bucket) = first_match(&KEYWORD_RULES, &d) {
        return Some(bucket);
    }

    if d.contains(DIRECT_CONTROL_MARKER) {
        return first_match(&DIRECT_CONTROL_RULES, &d);
    }

    None
}

/// Looks up a zoning code in the static code table.
///
/// The input is reduced to its first alphanumeric token first.
#[must_use]
pub fn bucket_for_zone(zone: &str) -> Option<LandUseBucket> {
    let code = normalize_zone(zone);
    if code.is_empty() {
        return None;
    }

    ZONE_CODES
        .iter()
        .find(|(_, codes)| codes.contains(&code.as_str()))
        .map(|(bucket, _)| *bucket)
}

/// Classifies a parcel from its raw zoning code and description.
///
/// The description is consulted first; the zoning code only when the
/// description is inconclusive. The raw strings are kept on the result.
#[must_use]
pub fn classify(zone: &str, description: &str) -> LandUseClass {
    classify_description(description)
        .or_else(|| bucket_for_zone(zone))
        .map_or_else(
            || LandUseClass::unclassified(zone, description),
            |bucket| LandUseClass::classified(bucket, zone, description),
        )
}

/// Classifies a normalized land-use feature from its canonical
/// [`fields::ZONE`] and [`fields::DESCRIPTION`] attributes.
#[must_use]
pub fn classify_feature(feature: &Feature) -> LandUseClass {
    let zone = feature.text(fields::ZONE).unwrap_or_default();
    let description = feature.text(fields::DESCRIPTION).unwrap_or_default();
    classify(zone, description)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_class(description: &str, expected: Option<LandUseBucket>) {
        assert_eq!(
            classify_description(description),
            expected,
            "description {description:?}"
        );
    }

    #[test]
    fn heavy_industrial_scores_point_nine() {
        let class = classify("", "IH - HEAVY INDUSTRIAL");
        assert_eq!(class.bucket, Some(Industrial));
        assert!((class.score - 0.90).abs() < f64::EPSILON);
        assert_eq!(class.label, "Industrial");
    }

    #[test]
    fn park_scores_point_four() {
        let class = classify("", "PC - PARK");
        assert_eq!(class.bucket, Some(ParkOpenSpace));
        assert!((class.score - 0.40).abs() < f64::EPSILON);
        assert_eq!(class.label, "Park/Open Space");
    }

    #[test]
    fn garbage_is_neutral() {
        let class = classify("ZZZ9", "QWERTY LOREM");
        assert_eq!(class.bucket, None);
        assert!((class.score - 0.50).abs() < f64::EPSILON);
        assert_eq!(class.label, "Unclassified");
        assert_eq!(class.zone, "ZZZ9");
        assert_eq!(class.description, "QWERTY LOREM");
    }

    #[test]
    fn exact_rules() {
        assert_class("A - Airport", Some(Institutional));
        assert_class("AG - Agriculture General", Some(Agriculture));
        assert_class("Country Rural Residential/Agriculture", Some(Agriculture));
        assert_class("PRM - Municipal Reserve", Some(ParkOpenSpace));
        assert_class("C4 - Regional Commercial", Some(Commercial));
        assert_class("CITP \u{2013} Centre in the Park", Some(Commercial));
        assert_class("MU1 - Mixed Use", Some(Institutional));
        assert_class("R1B - Low Density", Some(Residential));
    }

    #[test]
    fn prefix_rules_beat_keywords() {
        // Contains PARK, but the industrial prefix is authoritative.
        assert_class("IL - Light Industrial Business Park", Some(Industrial));
        // Contains COMMERCIAL, but the park prefix is authoritative.
        assert_class("PR - Commercial Recreation", Some(ParkOpenSpace));
    }

    #[test]
    fn residential_code_needs_word_boundary() {
        // RE is a residential code but must not match "REGIONAL".
        assert_class("REGIONAL OFFICE", Some(Commercial));
        assert_class("RE - Estate Residential", Some(Residential));
    }

    #[test]
    fn keyword_order_is_fixed() {
        // Agriculture is tried before Park/Open Space.
        assert_class("Rural Park", Some(Agriculture));
        assert_class("Natural Area Conservation", Some(ParkOpenSpace));
        assert_class("Warehouse and Logistics", Some(Industrial));
        assert_class("Hospital Campus", Some(Institutional));
        assert_class("Multi-Family Apartments", Some(Residential));
        assert_class("Single Detached", Some(Residential));
    }

    #[test]
    fn direct_control_uses_reduced_keywords() {
        assert_eq!(classify("DC2", "DC - Direct Control").bucket, None);
        assert_class("DC - Direct Control", None);
    }

    #[test]
    fn zone_code_fallback() {
        assert_eq!(classify("IMH", "").bucket, Some(Industrial));
        assert_eq!(classify("CITP \"Area BC\"", "").bucket, Some(Commercial));
        assert_eq!(classify("ra", "").bucket, Some(Agriculture));
        assert_eq!(classify("UV2", "").bucket, None);
    }

    #[test]
    fn description_wins_over_zone() {
        assert_eq!(classify("IH", "PC - Park").bucket, Some(ParkOpenSpace));
    }

    #[test]
    fn classifies_canonical_feature_fields() {
        let feature = Feature::point(0.0, 0.0)
            .with_property(fields::ZONE, "C2")
            .with_property(fields::DESCRIPTION, "");
        let class = classify_feature(&feature);
        assert_eq!(class.bucket, Some(Commercial));
        assert_eq!(class.zone, "C2");

        let empty = classify_feature(&Feature::point(0.0, 0.0));
        assert_eq!(empty.label, "Unclassified");
    }
}
