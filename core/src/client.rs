//! Stateless HTTP request builder and response parser for the Jobo API.
//!
//! # Design
//! `JoboApi` holds only the base URL and the default headers; it carries no
//! mutable state between calls. Each endpoint is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that consumes
//! an `HttpResponse`. The blocking and async SDK surfaces execute the actual
//! round-trip between the two, so neither duplicates any of the logic here.

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::config::{ClientConfig, API_KEY_HEADER};
use crate::error::JoboError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    AutoApplySessionResponse, ExpiredJobIdsRequest, ExpiredJobIdsResponse, FieldAnswer,
    GeocodeResultItem, JobFeedRequest, JobFeedResponse, JobSearchRequest, JobSearchResponse,
    SetAnswersRequest, SimpleSearchRequest, StartSessionRequest,
};
use crate::validate::{check_not_blank, Validate};

const FEED_JOBS: &str = "/api/feed/jobs";
const FEED_EXPIRED: &str = "/api/feed/jobs/expired";
const JOBS: &str = "/api/jobs";
const JOBS_SEARCH: &str = "/api/jobs/search";
const GEOCODE: &str = "/api/locations/geocode";
const AUTO_APPLY_START: &str = "/api/auto-apply/start";
const AUTO_APPLY_SET_ANSWERS: &str = "/api/auto-apply/set-answers";
const AUTO_APPLY_SESSIONS: &str = "/api/auto-apply/sessions";

/// Request builder and response parser for every Jobo endpoint.
#[derive(Debug, Clone)]
pub struct JoboApi {
    base_url: String,
    headers: Vec<(String, String)>,
}

impl JoboApi {
    pub fn new(config: &ClientConfig) -> Result<Self, JoboError> {
        let base_url = config.base_url().trim_end_matches('/').to_string();
        let parsed = Url::parse(&base_url)
            .map_err(|e| JoboError::Config(format!("invalid base URL {base_url:?}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(JoboError::Config(format!("base URL {base_url:?} cannot carry paths")));
        }

        Ok(Self {
            base_url,
            headers: vec![
                (API_KEY_HEADER.to_string(), config.api_key().to_string()),
                ("User-Agent".to_string(), config.user_agent().to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ],
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -- feed ---------------------------------------------------------------

    pub fn build_get_jobs(&self, request: &JobFeedRequest) -> Result<HttpRequest, JoboError> {
        request.validate()?;
        self.json_request(HttpMethod::Post, FEED_JOBS, request)
    }

    pub fn parse_get_jobs(&self, response: HttpResponse) -> Result<JobFeedResponse, JoboError> {
        parse_json(response)
    }

    pub fn build_get_expired_job_ids(
        &self,
        request: &ExpiredJobIdsRequest,
    ) -> Result<HttpRequest, JoboError> {
        request.validate()?;
        let mut query = vec![
            ("expired_since", request.expired_since.to_rfc3339()),
            ("batch_size", request.batch_size.to_string()),
        ];
        if let Some(cursor) = request.cursor.as_deref().filter(|c| !c.is_empty()) {
            query.push(("cursor", cursor.to_string()));
        }
        self.get_request(FEED_EXPIRED, &query)
    }

    pub fn parse_get_expired_job_ids(
        &self,
        response: HttpResponse,
    ) -> Result<ExpiredJobIdsResponse, JoboError> {
        parse_json(response)
    }

    // -- search -------------------------------------------------------------

    pub fn build_search(&self, request: &SimpleSearchRequest) -> Result<HttpRequest, JoboError> {
        request.validate()?;
        let mut query = Vec::new();
        push_non_empty(&mut query, "q", request.q.as_deref());
        push_non_empty(&mut query, "location", request.location.as_deref());
        push_non_empty(&mut query, "sources", request.sources.as_deref());
        if let Some(remote) = request.remote {
            query.push(("remote", remote.to_string()));
        }
        if let Some(posted_after) = request.posted_after {
            query.push(("posted_after", posted_after.to_rfc3339()));
        }
        query.push(("page", request.page.to_string()));
        query.push(("page_size", request.page_size.to_string()));
        self.get_request(JOBS, &query)
    }

    pub fn build_search_advanced(
        &self,
        request: &JobSearchRequest,
    ) -> Result<HttpRequest, JoboError> {
        request.validate()?;
        self.json_request(HttpMethod::Post, JOBS_SEARCH, request)
    }

    /// Parses the response of either search endpoint.
    pub fn parse_search(&self, response: HttpResponse) -> Result<JobSearchResponse, JoboError> {
        parse_json(response)
    }

    // -- locations ----------------------------------------------------------

    pub fn build_geocode(&self, location: &str) -> Result<HttpRequest, JoboError> {
        check_not_blank("location", location)?;
        self.get_request(GEOCODE, &[("location", location.to_string())])
    }

    /// `succeeded == false` in the body is returned as data, not an error.
    pub fn parse_geocode(&self, response: HttpResponse) -> Result<GeocodeResultItem, JoboError> {
        parse_json(response)
    }

    // -- auto apply ---------------------------------------------------------

    pub fn build_start_session(&self, apply_url: &str) -> Result<HttpRequest, JoboError> {
        check_not_blank("apply_url", apply_url)?;
        let body = StartSessionRequest {
            apply_url: apply_url.to_string(),
        };
        self.json_request(HttpMethod::Post, AUTO_APPLY_START, &body)
    }

    pub fn build_set_answers(
        &self,
        session_id: Uuid,
        answers: &[FieldAnswer],
    ) -> Result<HttpRequest, JoboError> {
        let body = SetAnswersRequest {
            session_id,
            answers: answers.to_vec(),
        };
        self.json_request(HttpMethod::Post, AUTO_APPLY_SET_ANSWERS, &body)
    }

    /// Parses the response of `start` and `set-answers`.
    pub fn parse_session(
        &self,
        response: HttpResponse,
    ) -> Result<AutoApplySessionResponse, JoboError> {
        parse_json(response)
    }

    pub fn build_end_session(&self, session_id: Uuid) -> Result<HttpRequest, JoboError> {
        let path = format!("{AUTO_APPLY_SESSIONS}/{session_id}");
        Ok(self.request(HttpMethod::Delete, self.endpoint(&path, &[])?, None))
    }

    /// `Ok(true)` if the session was ended, `Ok(false)` if the server had no
    /// such session. Every other failure is an error.
    pub fn parse_end_session(&self, response: HttpResponse) -> Result<bool, JoboError> {
        if response.is_success() {
            return Ok(true);
        }
        if response.status == 404 {
            return Ok(false);
        }
        Err(JoboError::from_response(&response))
    }

    // -- helpers ------------------------------------------------------------

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<String, JoboError> {
        let mut url = Url::parse(&format!("{}{path}", self.base_url))
            .map_err(|e| JoboError::InvalidRequest(format!("cannot build URL for {path}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url.into())
    }

    fn request(&self, method: HttpMethod, url: String, body: Option<String>) -> HttpRequest {
        let mut headers = self.headers.clone();
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        HttpRequest {
            method,
            url,
            headers,
            body,
        }
    }

    fn get_request(&self, path: &str, query: &[(&str, String)]) -> Result<HttpRequest, JoboError> {
        Ok(self.request(HttpMethod::Get, self.endpoint(path, query)?, None))
    }

    fn json_request<T: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        payload: &T,
    ) -> Result<HttpRequest, JoboError> {
        let body =
            serde_json::to_string(payload).map_err(|e| JoboError::Serialization(e.to_string()))?;
        Ok(self.request(method, self.endpoint(path, &[])?, Some(body)))
    }
}

fn push_non_empty(query: &mut Vec<(&'static str, String)>, name: &'static str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        query.push((name, value.to_string()));
    }
}

/// Translate non-2xx statuses, then deserialize the body.
fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, JoboError> {
    if !response.is_success() {
        return Err(JoboError::from_response(&response));
    }
    serde_json::from_str(&response.body).map_err(|e| JoboError::Deserialization(e.to_string()))
}
