//! In-memory stand-in for the Jobo Enterprise API.
//!
//! Serves every public endpoint over a generated `Dataset` so the SDK can be
//! exercised end to end without network access or an API key.

pub mod auto_apply;
pub mod dataset;

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

pub use dataset::{Dataset, Job};

pub const TEST_API_KEY: &str = "test-api-key";
const CURSOR_PREFIX: &str = "cur_";

#[derive(Clone)]
pub struct AppState {
    api_key: Arc<str>,
    dataset: Arc<Dataset>,
    sessions: Arc<RwLock<HashMap<Uuid, auto_apply::Session>>>,
}

/// Error body in the shape the real API uses: `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "detail": self.detail }))).into_response()
    }
}

pub fn app() -> Router {
    app_with(TEST_API_KEY, Dataset::default())
}

pub fn app_with(api_key: &str, dataset: Dataset) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        dataset: Arc::new(dataset),
        sessions: Arc::new(RwLock::new(HashMap::new())),
    };
    Router::new()
        .route("/api/feed/jobs", post(feed_jobs))
        .route("/api/feed/jobs/expired", get(expired_job_ids))
        .route("/api/jobs", get(search_simple))
        .route("/api/jobs/search", post(search_advanced))
        .route("/api/locations/geocode", get(geocode))
        .route("/api/auto-apply/start", post(auto_apply::start))
        .route("/api/auto-apply/set-answers", post(auto_apply::set_answers))
        .route("/api/auto-apply/sessions/{id}", delete(auto_apply::end))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state)
}

pub async fn run(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, app).await
}

async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok());
    if presented != Some(&*state.api_key) {
        return ApiError::new(StatusCode::UNAUTHORIZED, "Invalid API key").into_response();
    }
    next.run(request).await
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct LocationFilter {
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
}

#[derive(Deserialize)]
pub struct FeedBody {
    pub locations: Option<Vec<LocationFilter>>,
    pub sources: Option<Vec<String>>,
    pub is_remote: Option<bool>,
    pub posted_after: Option<DateTime<Utc>>,
    pub cursor: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
}

fn default_batch_size() -> i64 {
    1000
}

#[derive(Serialize, Deserialize)]
pub struct FeedPage {
    pub jobs: Vec<Job>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

#[derive(Deserialize)]
pub struct ExpiredQuery {
    pub expired_since: String,
    pub cursor: Option<String>,
    pub batch_size: Option<i64>,
}

#[derive(Serialize, Deserialize)]
pub struct ExpiredPage {
    pub job_ids: Vec<Uuid>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

fn matches_location_filter(job: &Job, filter: &LocationFilter) -> bool {
    let same = |want: &Option<String>, have: &Option<String>| match (want, have) {
        (None, _) => true,
        (Some(want), Some(have)) => want.eq_ignore_ascii_case(have),
        (Some(_), None) => false,
    };
    job.locations.iter().any(|loc| {
        same(&filter.country, &loc.country)
            && same(&filter.region, &loc.state)
            && same(&filter.city, &loc.city)
    })
}

fn decode_cursor(cursor: Option<&str>) -> Result<usize, ApiError> {
    match cursor {
        None | Some("") => Ok(0),
        Some(raw) => raw
            .strip_prefix(CURSOR_PREFIX)
            .and_then(|offset| offset.parse().ok())
            .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "Invalid cursor")),
    }
}

/// Slice `items[offset..offset + batch]` and compute the continuation cursor.
fn cursor_page<T: Clone>(items: &[T], offset: usize, batch: usize) -> (Vec<T>, Option<String>, bool) {
    let start = offset.min(items.len());
    let end = (start + batch).min(items.len());
    let has_more = end < items.len();
    let next = has_more.then(|| format!("{CURSOR_PREFIX}{end}"));
    (items[start..end].to_vec(), next, has_more)
}

fn check_batch_size(batch_size: i64, max: i64) -> Result<usize, ApiError> {
    if (1..=max).contains(&batch_size) {
        Ok(batch_size as usize)
    } else {
        Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("batch_size must be between 1 and {max}"),
        ))
    }
}

async fn feed_jobs(
    State(state): State<AppState>,
    Json(body): Json<FeedBody>,
) -> Result<Json<FeedPage>, ApiError> {
    let batch = check_batch_size(body.batch_size, 1000)?;
    let offset = decode_cursor(body.cursor.as_deref())?;

    let filtered: Vec<Job> = state
        .dataset
        .jobs
        .iter()
        .filter(|job| {
            body.locations
                .as_ref()
                .is_none_or(|filters| filters.is_empty() || filters.iter().any(|f| matches_location_filter(job, f)))
        })
        .filter(|job| body.sources.as_ref().is_none_or(|s| s.contains(&job.source)))
        .filter(|job| body.is_remote.is_none_or(|remote| job.is_remote == remote))
        .filter(|job| body.posted_after.is_none_or(|after| job.date_posted.is_some_and(|d| d > after)))
        .cloned()
        .collect();

    let (jobs, next_cursor, has_more) = cursor_page(&filtered, offset, batch);
    debug!(offset, returned = jobs.len(), has_more, "feed page");
    Ok(Json(FeedPage {
        jobs,
        next_cursor,
        has_more,
    }))
}

async fn expired_job_ids(
    State(state): State<AppState>,
    Query(query): Query<ExpiredQuery>,
) -> Result<Json<ExpiredPage>, ApiError> {
    let since = DateTime::parse_from_rfc3339(&query.expired_since)
        .map_err(|_| ApiError::new(StatusCode::BAD_REQUEST, "expired_since must be an ISO-8601 timestamp"))?
        .with_timezone(&Utc);
    if since < Utc::now() - Duration::days(7) {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "expired_since cannot be more than 7 days in the past",
        ));
    }
    let batch = check_batch_size(query.batch_size.unwrap_or(1000), 10_000)?;
    let offset = decode_cursor(query.cursor.as_deref())?;

    let (job_ids, next_cursor, has_more) = cursor_page(&state.dataset.expired_ids, offset, batch);
    Ok(Json(ExpiredPage {
        job_ids,
        next_cursor,
        has_more,
    }))
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct SimpleQuery {
    pub q: Option<String>,
    pub location: Option<String>,
    pub sources: Option<String>,
    pub remote: Option<bool>,
    pub posted_after: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Deserialize)]
pub struct AdvancedBody {
    pub queries: Option<Vec<String>>,
    pub locations: Option<Vec<String>>,
    pub sources: Option<Vec<String>>,
    pub is_remote: Option<bool>,
    pub posted_after: Option<DateTime<Utc>>,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn first_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    25
}

#[derive(Serialize, Deserialize)]
pub struct SearchPage {
    pub jobs: Vec<Job>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// Normalised search filters shared by both search endpoints.
struct SearchFilter {
    queries: Vec<String>,
    locations: Vec<String>,
    sources: Vec<String>,
    remote: Option<bool>,
    posted_after: Option<DateTime<Utc>>,
}

impl SearchFilter {
    fn matches(&self, job: &Job) -> bool {
        let text = format!("{} {}", job.title, job.description).to_lowercase();
        let place = job
            .locations
            .iter()
            .map(|l| l.location.to_lowercase())
            .collect::<Vec<_>>()
            .join(" | ");

        (self.queries.is_empty() || self.queries.iter().any(|q| text.contains(&q.to_lowercase())))
            && (self.locations.is_empty()
                || self.locations.iter().any(|l| place.contains(&l.to_lowercase())))
            && (self.sources.is_empty() || self.sources.contains(&job.source))
            && self.remote.is_none_or(|remote| job.is_remote == remote)
            && self
                .posted_after
                .is_none_or(|after| job.date_posted.is_some_and(|d| d > after))
    }
}

fn search_page(
    dataset: &Dataset,
    filter: &SearchFilter,
    page: u32,
    page_size: u32,
) -> Result<SearchPage, ApiError> {
    if page < 1 {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "page must be >= 1"));
    }
    if !(1..=100).contains(&page_size) {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "page_size must be between 1 and 100"));
    }
    let matching: Vec<&Job> = dataset.jobs.iter().filter(|job| filter.matches(job)).collect();
    let total = matching.len();
    let total_pages = total.div_ceil(page_size as usize) as u32;
    let start = ((page - 1) as usize * page_size as usize).min(total);
    let end = (start + page_size as usize).min(total);

    Ok(SearchPage {
        jobs: matching[start..end].iter().map(|job| (*job).clone()).collect(),
        total: total as u64,
        page,
        page_size,
        total_pages,
    })
}

async fn search_simple(
    State(state): State<AppState>,
    Query(query): Query<SimpleQuery>,
) -> Result<Json<SearchPage>, ApiError> {
    let split = |raw: Option<String>| -> Vec<String> {
        raw.map(|s| {
            s.split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect()
        })
        .unwrap_or_default()
    };
    let filter = SearchFilter {
        queries: query.q.into_iter().filter(|q| !q.is_empty()).collect(),
        locations: query.location.into_iter().filter(|l| !l.is_empty()).collect(),
        sources: split(query.sources),
        remote: query.remote,
        posted_after: query.posted_after,
    };
    let page = search_page(
        &state.dataset,
        &filter,
        query.page.unwrap_or(1),
        query.page_size.unwrap_or(25),
    )?;
    Ok(Json(page))
}

async fn search_advanced(
    State(state): State<AppState>,
    Json(body): Json<AdvancedBody>,
) -> Result<Json<SearchPage>, ApiError> {
    let filter = SearchFilter {
        queries: body.queries.unwrap_or_default(),
        locations: body.locations.unwrap_or_default(),
        sources: body.sources.unwrap_or_default(),
        remote: body.is_remote,
        posted_after: body.posted_after,
    };
    let page = search_page(&state.dataset, &filter, body.page, body.page_size)?;
    Ok(Json(page))
}

// ---------------------------------------------------------------------------
// Geocoding
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct GeocodeQuery {
    pub location: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GeocodedLocation {
    pub display_name: String,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Serialize, Deserialize)]
pub struct GeocodeResult {
    pub input: String,
    pub succeeded: bool,
    pub locations: Vec<GeocodedLocation>,
    pub method: Option<String>,
    pub error: Option<String>,
}

const GAZETTEER: [(&str, &str, &str, &str, &str, f64, f64); 4] = [
    ("san francisco", "San Francisco", "California", "United States", "US", 37.7749, -122.4194),
    ("london", "London", "England", "United Kingdom", "GB", 51.5072, -0.1276),
    ("berlin", "Berlin", "Berlin", "Germany", "DE", 52.52, 13.405),
    ("austin", "Austin", "Texas", "United States", "US", 30.2672, -97.7431),
];

async fn geocode(Query(query): Query<GeocodeQuery>) -> Json<GeocodeResult> {
    let needle = query.location.trim().to_lowercase();
    if needle == "remote" || needle.starts_with("remote ") {
        return Json(GeocodeResult {
            input: query.location,
            succeeded: true,
            locations: Vec::new(),
            method: Some("remote_keyword".to_string()),
            error: None,
        });
    }

    let locations: Vec<GeocodedLocation> = GAZETTEER
        .iter()
        .filter(|(key, ..)| needle.starts_with(key))
        .map(|(_, city, region, country, code, lat, lon)| GeocodedLocation {
            display_name: format!("{city}, {region}, {country}"),
            city: Some(city.to_string()),
            region: Some(region.to_string()),
            country: Some(country.to_string()),
            country_code: Some(code.to_string()),
            latitude: Some(*lat),
            longitude: Some(*lon),
        })
        .collect();

    let succeeded = !locations.is_empty();
    Json(GeocodeResult {
        input: query.location,
        succeeded,
        method: succeeded.then(|| "gazetteer".to_string()),
        error: (!succeeded).then(|| "No matching location found".to_string()),
        locations,
    })
}
