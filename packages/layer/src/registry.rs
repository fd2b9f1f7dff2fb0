//! Source registry: loads all layer source definitions from embedded TOML.
//!
//! Each `.toml` file in `packages/layer/sources/` is baked into the binary
//! at compile time via [`include_str!`]. Repointing a layer at a different
//! service is a matter of editing its TOML file.

use sitescore_layer_models::LayerKind;

use crate::source_def::{LayerSourceDef, parse_source_toml};

/// TOML configs embedded at compile time.
const SOURCE_TOMLS: &[(&str, &str)] = &[
    // ── Scoring layers ───────────────────────────────────────────────
    ("wifi", include_str!("../sources/wifi.toml")),
    ("playgrounds", include_str!("../sources/playgrounds.toml")),
    ("parks", include_str!("../sources/parks.toml")),
    ("fields", include_str!("../sources/fields.toml")),
    ("splash_pads", include_str!("../sources/splash_pads.toml")),
    ("buildings", include_str!("../sources/buildings.toml")),
    ("roads", include_str!("../sources/roads.toml")),
    ("pemu", include_str!("../sources/pemu.toml")),
    ("land_use", include_str!("../sources/land_use.toml")),
    ("npri", include_str!("../sources/npri.toml")),
    ("census", include_str!("../sources/census.toml")),
    // ── Display-only overlays ────────────────────────────────────────
    ("stations", include_str!("../sources/stations.toml")),
    ("purpleair", include_str!("../sources/purpleair.toml")),
];

/// Total number of configured sources (used in tests).
#[cfg(test)]
const EXPECTED_SOURCE_COUNT: usize = 13;

/// Returns all configured source definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_sources() -> Vec<LayerSourceDef> {
    SOURCE_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_source_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Returns the definition feeding `kind`, if one is configured.
#[must_use]
pub fn source_for(kind: LayerKind) -> Option<LayerSourceDef> {
    all_sources().into_iter().find(|s| s.layer == kind)
}
