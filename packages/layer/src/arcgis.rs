//! Paginated `ArcGIS` REST fetcher.
//!
//! Pulls every feature from a `FeatureServer` or `MapServer` `query`
//! endpoint as `GeoJSON`, one page at a time. Pagination is driven by a
//! [`PageCursor`] that knows when to stop, so the network loop itself stays
//! trivial and the termination rules are unit-testable without a server.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;
use sitescore_geometry::FeatureCollection;

use crate::LayerError;
use crate::retry::send_json;

/// Offsets past this are treated as a runaway pagination loop.
pub const MAX_OFFSET: u64 = 2_000_000;

/// Sibling layer ids tried when probing a service.
const PROBE_LAYER_IDS: std::ops::Range<u32> = 0..10;

static LAYER_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(/(FeatureServer|MapServer)/)(\d+)(/query.*)$").expect("valid regex")
});

/// Walks `resultOffset` values for one paginated query.
///
/// The cursor stops after a page comes back empty, after a page comes back
/// shorter than the page size, or once the next offset would pass
/// [`MAX_OFFSET`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    page_size: u64,
    offset: u64,
    done: bool,
}

impl PageCursor {
    /// Creates a cursor at offset zero. A zero page size is bumped to one.
    #[must_use]
    pub fn new(page_size: u64) -> Self {
        Self {
            page_size: page_size.max(1),
            offset: 0,
            done: false,
        }
    }

    /// Records per request.
    #[must_use]
    pub const fn page_size(&self) -> u64 {
        self.page_size
    }

    /// The offset of the next page to request, or `None` once finished.
    #[must_use]
    pub const fn next_offset(&self) -> Option<u64> {
        if self.done { None } else { Some(self.offset) }
    }

    /// Advances past a page that returned `received` features.
    pub const fn advance(&mut self, received: u64) {
        if self.done {
            return;
        }
        if received == 0 || received < self.page_size {
            self.done = true;
            return;
        }
        self.offset += received;
        if self.offset > MAX_OFFSET {
            self.done = true;
        }
    }

    /// Whether pagination has finished.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }
}

/// Builds the URL for one page of a `GeoJSON` query.
///
/// Parameters are appended to whatever query string `query_url` already
/// carries.
///
/// # Errors
///
/// Returns [`LayerError::Normalization`] if `query_url` is not a valid URL.
pub fn page_url(
    query_url: &str,
    where_clause: &str,
    order_by: Option<&str>,
    offset: u64,
    count: u64,
) -> Result<Url, LayerError> {
    let offset = offset.to_string();
    let count = count.to_string();
    let mut params: Vec<(&str, &str)> = vec![
        ("where", where_clause),
        ("outFields", "*"),
        ("f", "geojson"),
        ("returnExceededLimitFeatures", "true"),
        ("outSR", "4326"),
    ];
    if let Some(field) = order_by {
        params.push(("orderByFields", field));
    }
    params.push(("resultOffset", &offset));
    params.push(("resultRecordCount", &count));

    parse_url(query_url, &params)
}

/// Builds the `returnCountOnly` URL used to size a layer before fetching.
///
/// # Errors
///
/// Returns [`LayerError::Normalization`] if `query_url` is not a valid URL.
pub fn count_url(query_url: &str, where_clause: &str) -> Result<Url, LayerError> {
    parse_url(
        query_url,
        &[
            ("returnCountOnly", "true"),
            ("where", where_clause),
            ("f", "json"),
        ],
    )
}

fn parse_url(query_url: &str, params: &[(&str, &str)]) -> Result<Url, LayerError> {
    Url::parse_with_params(query_url, params).map_err(|e| LayerError::Normalization {
        message: format!("invalid query URL {query_url}: {e}"),
    })
}

/// Candidate query URLs for a service whose configured layer may be stale.
///
/// The configured URL comes first, then layer ids `0..10` on the same
/// server type, then `0..10` on the other server type (`FeatureServer` and
/// `MapServer` swapped). URLs without a recognizable layer path yield only
/// themselves. Duplicates are removed, keeping first occurrence.
#[must_use]
pub fn alternate_query_urls(query_url: &str) -> Vec<String> {
    let mut urls = vec![query_url.to_string()];

    let Some(caps) = LAYER_PATH_RE.captures(query_url) else {
        return urls;
    };
    let (Some(whole), Some(server), Some(tail)) = (caps.get(0), caps.get(2), caps.get(4)) else {
        return urls;
    };

    let base = &query_url[..whole.start()];
    let other = if server.as_str().eq_ignore_ascii_case("FeatureServer") {
        "MapServer"
    } else {
        "FeatureServer"
    };

    for server_name in [server.as_str(), other] {
        for id in PROBE_LAYER_IDS {
            let candidate = format!("{base}/{server_name}/{id}{}", tail.as_str());
            if !urls.contains(&candidate) {
                urls.push(candidate);
            }
        }
    }

    urls
}

/// Asks the service how many records match `where_clause`.
///
/// Returns `None` if the request fails or the response carries no count.
#[allow(clippy::future_not_send)]
pub async fn query_count(client: &reqwest::Client, query_url: &str, where_clause: &str) -> Option<u64> {
    let url = count_url(query_url, where_clause).ok()?;
    let body = send_json(|| client.get(url.clone())).await.ok()?;
    body.get("count")?.as_u64()
}

/// Fetches every feature from one query endpoint, page by page.
///
/// # Errors
///
/// Returns [`LayerError`] if a request fails after retries, the service
/// reports an error, or a page is not valid `GeoJSON`.
#[allow(clippy::future_not_send)]
pub async fn fetch_all_geojson(
    client: &reqwest::Client,
    query_url: &str,
    where_clause: &str,
    order_by: Option<&str>,
    page_size: u64,
) -> Result<FeatureCollection, LayerError> {
    let mut cursor = PageCursor::new(page_size);
    let mut collection = FeatureCollection::default();

    while let Some(offset) = cursor.next_offset() {
        let url = page_url(query_url, where_clause, order_by, offset, cursor.page_size())?;
        log::debug!("GET {url}");

        let body = send_json(|| client.get(url.clone())).await?;
        if let Some(error) = body.get("error") {
            return Err(LayerError::Normalization {
                message: format!("service error from {query_url}: {error}"),
            });
        }

        let page = FeatureCollection::from_json_value(body)?;
        let received = u64::try_from(page.len()).unwrap_or(u64::MAX);
        collection.extend(page);
        cursor.advance(received);

        log::info!("  {} features fetched from {query_url}", collection.len());
    }

    Ok(collection)
}

/// Fetches a layer, probing sibling layer ids and server types first.
///
/// The first candidate from [`alternate_query_urls`] whose count query
/// reports at least one record is fetched in full. When no candidate
/// answers, an empty collection is returned.
///
/// # Errors
///
/// Returns [`LayerError`] if fetching the chosen candidate fails.
#[allow(clippy::future_not_send)]
pub async fn fetch_smart(
    client: &reqwest::Client,
    query_url: &str,
    where_clause: &str,
    order_by: Option<&str>,
    page_size: u64,
) -> Result<FeatureCollection, LayerError> {
    for candidate in alternate_query_urls(query_url) {
        match query_count(client, &candidate, where_clause).await {
            Some(count) if count > 0 => {
                if candidate != query_url {
                    log::info!("Probed {candidate} ({count} records) in place of {query_url}");
                }
                return fetch_all_geojson(client, &candidate, where_clause, order_by, page_size)
                    .await;
            }
            _ => log::debug!("No records at {candidate}"),
        }
    }

    log::warn!("No responding layer found for {query_url}");
    Ok(FeatureCollection::default())
}
