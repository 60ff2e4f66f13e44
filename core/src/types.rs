//! Domain DTOs for the Jobo Enterprise API.
//!
//! # Design
//! Response records mirror the server's JSON and are never mutated after
//! parsing. Mandatory fields are plain types so a body missing one fails to
//! deserialize; everything the server may omit is an `Option`, an empty
//! `Vec`, or a `false` flag. Request bundles skip `None` fields when
//! serialized, so only what the caller set reaches the server.
//!
//! These types are defined independently from the mock-server crate;
//! integration tests catch schema drift between the two.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::JoboError;

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// Company associated with a job listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCompany {
    pub id: Uuid,
    pub name: String,
}

/// Geographic location of a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobLocation {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobCompensation {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default)]
    pub is_estimated: bool,
}

/// A job listing returned by the feed and search endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub company: JobCompany,
    pub description: String,
    pub listing_url: String,
    pub apply_url: String,
    #[serde(default)]
    pub locations: Vec<JobLocation>,
    #[serde(default)]
    pub compensation: Option<JobCompensation>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub workplace_type: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    /// ATS the listing was ingested from, e.g. `greenhouse`.
    pub source: String,
    /// Identifier of the listing inside `source`.
    pub source_id: String,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub date_posted: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub valid_through: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_remote: bool,
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

/// Structured location filter for the feed. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl LocationFilter {
    pub fn country(country: impl Into<String>) -> Self {
        Self {
            country: Some(country.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.country.is_none() && self.region.is_none() && self.city.is_none()
    }
}

pub const DEFAULT_FEED_BATCH_SIZE: u32 = 1000;

/// Body of `POST /api/feed/jobs`.
///
/// A job matches when it matches ANY of `locations`. `cursor: None` asks for
/// the first page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFeedRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<LocationFilter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_remote: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_after: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub batch_size: u32,
}

impl Default for JobFeedRequest {
    fn default() -> Self {
        Self {
            locations: None,
            sources: None,
            is_remote: None,
            posted_after: None,
            cursor: None,
            batch_size: DEFAULT_FEED_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFeedResponse {
    #[serde(default)]
    pub jobs: Vec<Job>,
    /// Opaque; only meaningful when `has_more` is true.
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// Query of `GET /api/feed/jobs/expired`.
///
/// The server rejects `expired_since` older than seven days; the client
/// passes it through unchecked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredJobIdsRequest {
    pub expired_since: DateTime<Utc>,
    pub cursor: Option<String>,
    pub batch_size: u32,
}

impl ExpiredJobIdsRequest {
    pub fn new(expired_since: DateTime<Utc>) -> Self {
        Self {
            expired_since,
            cursor: None,
            batch_size: DEFAULT_FEED_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiredJobIdsResponse {
    #[serde(default)]
    pub job_ids: Vec<Uuid>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Query of `GET /api/jobs`. Unset or empty fields are not transmitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleSearchRequest {
    pub q: Option<String>,
    pub location: Option<String>,
    /// Comma-separated source identifiers.
    pub sources: Option<String>,
    pub remote: Option<bool>,
    pub posted_after: Option<DateTime<Utc>>,
    pub page: u32,
    pub page_size: u32,
}

impl SimpleSearchRequest {
    pub fn query(q: impl Into<String>) -> Self {
        Self {
            q: Some(q.into()),
            ..Self::default()
        }
    }
}

impl Default for SimpleSearchRequest {
    fn default() -> Self {
        Self {
            q: None,
            location: None,
            sources: None,
            remote: None,
            posted_after: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Body of `POST /api/jobs/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSearchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queries: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_remote: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_after: Option<DateTime<Utc>>,
    pub page: u32,
    pub page_size: u32,
}

impl JobSearchRequest {
    pub fn queries<I, S>(queries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queries: Some(queries.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }
}

impl Default for JobSearchRequest {
    fn default() -> Self {
        Self {
            queries: None,
            locations: None,
            sources: None,
            is_remote: None,
            posted_after: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Response of both search endpoints. When `total_pages > 0`, `page <= total_pages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSearchResponse {
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub total_pages: u32,
}

fn first_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

// ---------------------------------------------------------------------------
// Geocoding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedLocation {
    pub display_name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Outcome of geocoding one input string.
///
/// `succeeded == false` is a normal result, not an error; the reason is in
/// `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResultItem {
    pub input: String,
    pub succeeded: bool,
    #[serde(default)]
    pub locations: Vec<GeocodedLocation>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Auto apply
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub apply_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetAnswersRequest {
    pub session_id: Uuid,
    pub answers: Vec<FieldAnswer>,
}

/// A file attached to an answer. `data` is standard base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAnswerFile {
    pub file_name: String,
    pub content_type: String,
    pub data: String,
}

impl FieldAnswerFile {
    pub fn from_bytes(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: &[u8],
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>, JoboError> {
        STANDARD.decode(&self.data).map_err(|e| {
            JoboError::InvalidRequest(format!("file {:?} is not valid base64: {e}", self.file_name))
        })
    }
}

/// Caller's answer to one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAnswer {
    pub field_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FieldAnswerFile>>,
}

impl FieldAnswer {
    pub fn text(field_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            value: Some(value.into()),
            values: None,
            files: None,
        }
    }

    pub fn multi<I, S>(field_id: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field_id: field_id.into(),
            value: None,
            values: Some(values.into_iter().map(Into::into).collect()),
            files: None,
        }
    }

    pub fn files(field_id: impl Into<String>, files: Vec<FieldAnswerFile>) -> Self {
        Self {
            field_id: field_id.into(),
            value: None,
            values: None,
            files: Some(files),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValidations {
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
}

/// One field of the form the session currently wants filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFieldInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<FieldOption>>,
    #[serde(default)]
    pub validations: Option<FieldValidations>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field_id: String,
    pub message: String,
}

/// Session state after `start` or `set-answers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoApplySessionResponse {
    pub session_id: Uuid,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub provider_display_name: Option<String>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_terminal: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub current_url: Option<String>,
    #[serde(default)]
    pub validation_errors: Vec<ValidationError>,
    #[serde(default)]
    pub fields: Vec<FormFieldInfo>,
}

impl AutoApplySessionResponse {
    /// True while the session is open and has fields for the caller to answer.
    pub fn awaiting_answers(&self) -> bool {
        !self.is_terminal && !self.fields.is_empty()
    }

    pub fn has_validation_errors(&self) -> bool {
        !self.validation_errors.is_empty()
    }
}

/// Timestamps as the server sends them: RFC 3339, or ISO-8601 without an
/// offset, which is read as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(|naive| naive.and_utc())
    }

    pub mod option {
        use super::*;

        pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(ts) => serializer.serialize_some(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => parse(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid timestamp {raw:?}"))),
                None => Ok(None),
            }
        }
    }
}
