//! Zoning text normalization.
//!
//! Applied to every description and zoning code before matching, so that
//! "ih – heavy  industrial" and "IH - HEAVY INDUSTRIAL" classify the same.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Any hyphen, en dash, or em dash with optional surrounding whitespace.
static DASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[-\u{2013}\u{2014}]\s*").expect("valid regex"));

/// Runs of whitespace.
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// First alphanumeric token of a zoning code.
static ZONE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z0-9]+").expect("valid regex"));

/// NFKC-normalizes, trims, and uppercases.
fn upper(input: &str) -> String {
    input.nfkc().collect::<String>().trim().to_uppercase()
}

/// Normalizes a zoning description.
///
/// The pipeline:
/// 1. Unicode NFKC
/// 2. Trim and uppercase
/// 3. Every dash variant becomes a single `" - "` separator
/// 4. Collapse whitespace
#[must_use]
pub fn normalize_description(input: &str) -> String {
    let u = upper(input);
    let dashed = DASH_RE.replace_all(&u, " - ");
    WHITESPACE_RE.replace_all(&dashed, " ").trim().to_string()
}

/// Normalizes a zoning code to its first alphanumeric token.
///
/// `CITP "Area BC"` becomes `CITP`, `AG (stuff)` becomes `AG`. Input with
/// no alphanumeric token is returned uppercased.
#[must_use]
pub fn normalize_zone(input: &str) -> String {
    let u = upper(input);
    ZONE_TOKEN_RE
        .find(&u)
        .map_or_else(|| u.clone(), |m| m.as_str().to_string())
}
