//! Overpass API client for fetching POI candidates, plus Nominatim
//! geocoding of the property's location string.
//!
//! One query per category, with:
//! - Connection pooling shared across categories
//! - Dispatch rate limiting (spaces out request starts)
//! - Concurrent fetching with bounded concurrency, results kept in request order
//! - Retry with exponential backoff on 429, 5xx and network errors

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::geo_utils::miles_to_meters;
use crate::{AnalysisRequest, Category, CategoryFetch, GeoPoint, PoiError, RawCandidate, Result, TagFilter};

/// Public Overpass instance.
pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Public Nominatim search endpoint.
pub const DEFAULT_GEOCODER_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";

/// Configuration for [`OverpassClient`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Overpass interpreter URL.
    /// Default: the public overpass-api.de instance
    pub endpoint: String,

    /// Nominatim search URL used by [`OverpassClient::geocode`].
    /// Default: the public nominatim.openstreetmap.org instance
    pub geocoder_endpoint: String,

    /// Server-side query timeout passed in the query header.
    /// Default: 25 seconds
    pub query_timeout_secs: u64,

    /// Client-side timeout for one HTTP request.
    /// Default: 30 seconds
    pub request_timeout_secs: u64,

    /// Maximum category queries in flight.
    /// Default: 4
    pub max_concurrency: usize,

    /// Minimum spacing between request starts.
    /// Default: 250ms
    pub dispatch_interval_ms: u64,

    /// Retries after the first attempt before giving up.
    /// Default: 3
    pub max_retries: u32,

    /// Base of the exponential retry backoff; waits are 2x, 4x, then 8x this.
    /// Default: 500ms
    pub backoff_base_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            geocoder_endpoint: DEFAULT_GEOCODER_ENDPOINT.to_string(),
            query_timeout_secs: 25,
            request_timeout_secs: 30,
            max_concurrency: 4,
            dispatch_interval_ms: 250,
            max_retries: 3,
            backoff_base_ms: 500,
        }
    }
}

// ============================================================================
// Query and response format
// ============================================================================

/// Overpass QL query for every node, way and relation matching `filter`
/// within `radius_meters` of `center`.
pub fn build_query(filter: &TagFilter, center: &GeoPoint, radius_meters: f64, timeout_secs: u64) -> String {
    format!(
        "[out:json][timeout:{}];nwr{}(around:{:.0},{},{});out center tags;",
        timeout_secs,
        filter.overpass_selector(),
        radius_meters.max(0.0),
        center.latitude,
        center.longitude
    )
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

/// Nodes carry `lat`/`lon`; ways and relations carry `center` with `out center`.
#[derive(Debug, Deserialize)]
struct OverpassElement {
    id: Option<u64>,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<LatLon>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct LatLon {
    lat: f64,
    lon: f64,
}

impl OverpassElement {
    fn into_candidate(self) -> RawCandidate {
        let position = match (self.lat, self.lon, self.center) {
            (Some(lat), Some(lon), _) => Some((lat, lon)),
            (_, _, Some(c)) => Some((c.lat, c.lon)),
            _ => None,
        };
        RawCandidate {
            geometry: position.map(|(lat, lon)| geo::Geometry::Point(geo::Point::new(lon, lat))),
            osm_id: self.id,
            tags: self.tags,
        }
    }
}

/// Parse an Overpass JSON response body.
///
/// Elements without a position are kept with no geometry and are skipped
/// later, during POI extraction.
pub fn parse_response(body: &[u8]) -> Result<Vec<RawCandidate>> {
    let response: OverpassResponse = serde_json::from_slice(body)?;
    Ok(response
        .elements
        .into_iter()
        .map(OverpassElement::into_candidate)
        .collect())
}

/// Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Parse a Nominatim `format=json` search response into the first valid
/// coordinate, or `None` when nothing matched.
pub fn parse_geocode_response(body: &[u8]) -> Result<Option<GeoPoint>> {
    let places: Vec<NominatimPlace> = serde_json::from_slice(body)?;
    Ok(places.into_iter().find_map(|place| {
        let point = GeoPoint::new(place.lat.trim().parse().ok()?, place.lon.trim().parse().ok()?);
        point.is_valid().then_some(point)
    }))
}

// ============================================================================
// Rate limiting
// ============================================================================

/// Spaces out when requests START, so concurrent queries never hit the
/// server in a burst.
struct DispatchRateLimiter {
    interval: Duration,
    backoff_base_ms: u64,
    next_dispatch: Mutex<Instant>,
    dispatched_count: AtomicU32,
    consecutive_429s: AtomicU32,
}

impl DispatchRateLimiter {
    fn new(interval: Duration, backoff_base_ms: u64) -> Self {
        Self {
            interval,
            backoff_base_ms,
            next_dispatch: Mutex::new(Instant::now()),
            dispatched_count: AtomicU32::new(0),
            consecutive_429s: AtomicU32::new(0),
        }
    }

    /// Wait for our dispatch slot. Each caller gets a unique slot.
    async fn wait_for_dispatch_slot(&self) -> u32 {
        let (wait, dispatch_num) = {
            let mut next = self.next_dispatch.lock().await;
            let now = Instant::now();
            let dispatch_at = if *next > now { *next } else { now };
            *next = dispatch_at + self.interval;

            let num = self.dispatched_count.fetch_add(1, Ordering::Relaxed) + 1;
            (dispatch_at.saturating_duration_since(now), num)
        };

        // Wait outside the lock
        if wait > Duration::from_millis(5) {
            debug!("[Dispatch #{}] Waiting {:?} for slot", dispatch_num, wait);
            tokio::time::sleep(wait).await;
        }

        dispatch_num
    }

    fn record_success(&self) {
        self.consecutive_429s.store(0, Ordering::Relaxed);
    }

    fn record_429(&self) -> Duration {
        let count = self.consecutive_429s.fetch_add(1, Ordering::Relaxed) + 1;
        let backoff = backoff_delay(self.backoff_base_ms, count);
        warn!(
            "[DispatchRateLimiter] Got 429! Consecutive: {}, backing off {:?}",
            count, backoff
        );
        backoff
    }
}

/// Exponential backoff: 2, 4, then 8 times `base_ms`, capped there.
/// With the default 500ms base that is 1s, 2s, 4s.
fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(1 << attempt.clamp(1, 3)))
}

// ============================================================================
// Client
// ============================================================================

/// Fetches raw candidates for categories from an Overpass endpoint.
pub struct OverpassClient {
    client: Client,
    config: FetchConfig,
    rate_limiter: Arc<DispatchRateLimiter>,
}

impl OverpassClient {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(config.max_concurrency.max(1) * 2)
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(30))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("poi-proximity/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let rate_limiter = Arc::new(DispatchRateLimiter::new(
            Duration::from_millis(config.dispatch_interval_ms),
            config.backoff_base_ms,
        ));

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch every category for `request`, keeping the order of `categories`.
    ///
    /// Never fails as a whole: each category carries its own result.
    pub async fn fetch_all(&self, request: &AnalysisRequest, categories: &[Category]) -> Vec<CategoryFetch> {
        let start = Instant::now();
        info!(
            "[OverpassClient] Fetching {} categories around {} (max concurrent: {})",
            categories.len(),
            request.location,
            self.config.max_concurrency
        );

        let results: Vec<CategoryFetch> = stream::iter(categories.iter().copied())
            .map(|category| async move {
                let result = self
                    .fetch_category(category, &request.center, request.radius_miles)
                    .await;
                CategoryFetch { category, result }
            })
            .buffered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        let failed = results.iter().filter(|f| f.result.is_err()).count();
        let candidates: usize = results
            .iter()
            .filter_map(|f| f.result.as_ref().ok())
            .map(Vec::len)
            .sum();
        info!(
            "[OverpassClient] DONE: {} candidates from {}/{} categories ({} failed) in {:.2}s",
            candidates,
            results.len() - failed,
            results.len(),
            failed,
            start.elapsed().as_secs_f64()
        );

        results
    }

    /// Fetch one category.
    ///
    /// # Errors
    ///
    /// [`PoiError::RateLimited`] when 429s persist past the retry budget,
    /// [`PoiError::Status`] for other unsuccessful statuses, and
    /// [`PoiError::Http`] or [`PoiError::Json`] for transport or body errors.
    pub async fn fetch_category(
        &self,
        category: Category,
        center: &GeoPoint,
        radius_miles: f64,
    ) -> Result<Vec<RawCandidate>> {
        let query = build_query(
            &category.tag_filter(),
            center,
            miles_to_meters(radius_miles),
            self.config.query_timeout_secs,
        );
        let label = format!("Fetch {}", category);
        let req_start = Instant::now();
        debug!("[{}] {}", label, query);

        let body = self
            .send_with_retry(&label, || {
                self.client
                    .post(&self.config.endpoint)
                    .form(&[("data", query.as_str())])
            })
            .await?;

        let candidates = parse_response(&body)?;
        debug!(
            "[{}] {} candidates ({:.1}KB) in {:?}",
            label,
            candidates.len(),
            body.len() as f64 / 1024.0,
            req_start.elapsed()
        );
        Ok(candidates)
    }

    /// Resolve a free-form location (e.g. a street address) to coordinates
    /// with a Nominatim search, taking the top result.
    ///
    /// # Errors
    ///
    /// [`PoiError::LocationNotFound`] when the search has no usable result.
    /// Otherwise the same errors as [`Self::fetch_category`].
    pub async fn geocode(&self, location: &str) -> Result<GeoPoint> {
        let body = self
            .send_with_retry("Geocode", || {
                self.client
                    .get(&self.config.geocoder_endpoint)
                    .query(&[("q", location), ("format", "json"), ("limit", "1")])
            })
            .await?;

        match parse_geocode_response(&body)? {
            Some(point) => {
                info!(
                    "[Geocode] {} -> ({:.6}, {:.6})",
                    location, point.latitude, point.longitude
                );
                Ok(point)
            }
            None => Err(PoiError::LocationNotFound(location.to_string())),
        }
    }

    /// Send a request under the dispatch limiter, retrying 429s, 5xx and
    /// network errors up to `max_retries` times. Returns the body of the
    /// first successful response.
    async fn send_with_retry<F>(&self, label: &str, build: F) -> Result<Vec<u8>>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retries = 0;

        loop {
            let dispatch_num = self.rate_limiter.wait_for_dispatch_slot().await;
            debug!("[{}] Dispatch #{}", label, dispatch_num);

            match build().send().await {
                Ok(resp) => {
                    let status = resp.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        retries += 1;
                        if retries > self.config.max_retries {
                            return Err(PoiError::RateLimited { attempts: retries });
                        }
                        let wait = self.rate_limiter.record_429();
                        tokio::time::sleep(wait).await;
                        continue;
                    }

                    self.rate_limiter.record_success();

                    if status.is_server_error() {
                        retries += 1;
                        if retries > self.config.max_retries {
                            return Err(PoiError::Status(status.as_u16()));
                        }
                        let wait = backoff_delay(self.config.backoff_base_ms, retries);
                        warn!("[{}] HTTP {}, retry {} after {:?}", label, status, retries, wait);
                        tokio::time::sleep(wait).await;
                        continue;
                    }

                    if !status.is_success() {
                        return Err(PoiError::Status(status.as_u16()));
                    }

                    return Ok(resp.bytes().await?.to_vec());
                }
                Err(e) => {
                    retries += 1;
                    if retries > self.config.max_retries {
                        return Err(e.into());
                    }
                    let wait = backoff_delay(self.config.backoff_base_ms, retries);
                    warn!("[{}] Error: {}, retry {} after {:?}", label, e, retries, wait);
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

/// Blocking wrapper: runs [`OverpassClient::fetch_all`] on a fresh tokio runtime.
pub fn fetch_categories_sync(
    config: FetchConfig,
    request: &AnalysisRequest,
    categories: &[Category],
) -> Result<Vec<CategoryFetch>> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;
    let client = OverpassClient::new(config)?;
    Ok(rt.block_on(client.fetch_all(request, categories)))
}
