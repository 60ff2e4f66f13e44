//! Blocking surface. Every call holds the calling thread for one round-trip.
//!
//! Mirrors the async client method for method; only the suspension mechanism
//! differs.

use std::{fmt, sync::Arc};

use jobo_core::{
    AutoApplySessionResponse, ClientConfig, ExpiredJobIdsRequest, ExpiredJobIdsResponse,
    FieldAnswer, GeocodeResultItem, HttpRequest, HttpResponse, JobFeedRequest, JobFeedResponse,
    JobSearchRequest, JobSearchResponse, JoboApi, JoboError, PageQuery, PageStep, Pager,
    SimpleSearchRequest,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    log_failure, observe,
    transport::{Transport, UreqTransport},
};

#[derive(Clone)]
struct Shared {
    api: JoboApi,
    transport: Arc<dyn Transport>,
}

impl Shared {
    fn send(&self, request: Result<HttpRequest, JoboError>) -> Result<HttpResponse, JoboError> {
        observe(self.transport.execute(request?))
    }
}

/// Blocking client for the Jobo Enterprise API.
#[derive(Clone)]
pub struct JoboClient {
    shared: Shared,
}

impl fmt::Debug for JoboClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoboClient")
            .field("base_url", &self.shared.api.base_url())
            .finish_non_exhaustive()
    }
}

impl JoboClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, JoboError> {
        Self::from_config(ClientConfig::new(api_key))
    }

    pub fn from_env() -> Result<Self, JoboError> {
        Self::from_config(ClientConfig::from_env()?)
    }

    pub fn from_config(config: ClientConfig) -> Result<Self, JoboError> {
        let transport = UreqTransport::new(config.timeout());
        Self::with_transport(config, transport)
    }

    pub fn with_transport<T>(config: ClientConfig, transport: T) -> Result<Self, JoboError>
    where
        T: Transport + 'static,
    {
        let api = JoboApi::new(&config)?;
        debug!(base_url = api.base_url(), "blocking Jobo client ready");
        Ok(Self {
            shared: Shared {
                api,
                transport: Arc::new(transport),
            },
        })
    }

    pub fn feed(&self) -> FeedClient {
        FeedClient {
            shared: self.shared.clone(),
        }
    }

    pub fn search(&self) -> SearchClient {
        SearchClient {
            shared: self.shared.clone(),
        }
    }

    pub fn locations(&self) -> LocationsClient {
        LocationsClient {
            shared: self.shared.clone(),
        }
    }

    pub fn auto_apply(&self) -> AutoApplyClient {
        AutoApplyClient {
            shared: self.shared.clone(),
        }
    }

    pub fn api(&self) -> &JoboApi {
        &self.shared.api
    }
}

#[derive(Clone)]
pub struct FeedClient {
    shared: Shared,
}

impl FeedClient {
    pub fn get_jobs(&self, request: &JobFeedRequest) -> Result<JobFeedResponse, JoboError> {
        let response = self.shared.send(self.shared.api.build_get_jobs(request))?;
        observe(self.shared.api.parse_get_jobs(response))
    }

    pub fn iter_jobs(&self, request: JobFeedRequest) -> Pages<JobFeedRequest> {
        Pages::new(&self.shared, request)
    }

    pub fn get_expired_job_ids(
        &self,
        request: &ExpiredJobIdsRequest,
    ) -> Result<ExpiredJobIdsResponse, JoboError> {
        let response = self
            .shared
            .send(self.shared.api.build_get_expired_job_ids(request))?;
        observe(self.shared.api.parse_get_expired_job_ids(response))
    }

    pub fn iter_expired_job_ids(&self, request: ExpiredJobIdsRequest) -> Pages<ExpiredJobIdsRequest> {
        Pages::new(&self.shared, request)
    }
}

#[derive(Clone)]
pub struct SearchClient {
    shared: Shared,
}

impl SearchClient {
    pub fn search(&self, request: &SimpleSearchRequest) -> Result<JobSearchResponse, JoboError> {
        let response = self.shared.send(self.shared.api.build_search(request))?;
        observe(self.shared.api.parse_search(response))
    }

    pub fn search_advanced(&self, request: &JobSearchRequest) -> Result<JobSearchResponse, JoboError> {
        let response = self.shared.send(self.shared.api.build_search_advanced(request))?;
        observe(self.shared.api.parse_search(response))
    }

    pub fn iter_jobs(&self, request: JobSearchRequest) -> Pages<JobSearchRequest> {
        Pages::new(&self.shared, request)
    }
}

#[derive(Clone)]
pub struct LocationsClient {
    shared: Shared,
}

impl LocationsClient {
    pub fn geocode(&self, location: &str) -> Result<GeocodeResultItem, JoboError> {
        let response = self.shared.send(self.shared.api.build_geocode(location))?;
        observe(self.shared.api.parse_geocode(response))
    }
}

#[derive(Clone)]
pub struct AutoApplyClient {
    shared: Shared,
}

impl AutoApplyClient {
    pub fn start_session(&self, apply_url: &str) -> Result<AutoApplySessionResponse, JoboError> {
        let response = self.shared.send(self.shared.api.build_start_session(apply_url))?;
        observe(self.shared.api.parse_session(response))
    }

    pub fn set_answers(
        &self,
        session_id: Uuid,
        answers: &[FieldAnswer],
    ) -> Result<AutoApplySessionResponse, JoboError> {
        let response = self
            .shared
            .send(self.shared.api.build_set_answers(session_id, answers))?;
        observe(self.shared.api.parse_session(response))
    }

    pub fn end_session(&self, session_id: Uuid) -> Result<bool, JoboError> {
        let response = self.shared.send(self.shared.api.build_end_session(session_id))?;
        observe(self.shared.api.parse_end_session(response))
    }
}

/// Iterator over the items of a paginated query, fetching pages on demand.
///
/// Yields `None` after the first error.
pub struct Pages<Q: PageQuery> {
    pager: Pager<Q>,
    transport: Arc<dyn Transport>,
}

impl<Q: PageQuery> Pages<Q> {
    fn new(shared: &Shared, query: Q) -> Self {
        Self {
            pager: Pager::new(shared.api.clone(), query),
            transport: Arc::clone(&shared.transport),
        }
    }

    pub fn pages_fetched(&self) -> usize {
        self.pager.pages_fetched()
    }
}

impl<Q: PageQuery> Iterator for Pages<Q> {
    type Item = Result<Q::Item, JoboError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.pager.next_step() {
                Ok(PageStep::Item(item)) => return Some(Ok(item)),
                Ok(PageStep::Done) => return None,
                Ok(PageStep::Fetch(request)) => {
                    let received = self
                        .transport
                        .execute(request)
                        .and_then(|response| self.pager.receive(response));
                    if let Err(err) = received {
                        self.pager.finish();
                        log_failure(&err);
                        return Some(Err(err));
                    }
                }
                Err(err) => {
                    self.pager.finish();
                    return Some(Err(err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use jobo_core::HttpMethod;

    use super::*;

    /// Replays canned responses and records what was sent.
    struct Scripted {
        responses: Mutex<Vec<HttpResponse>>,
        sent: Mutex<Vec<HttpRequest>>,
    }

    impl Scripted {
        fn new(mut responses: Vec<HttpResponse>) -> Arc<Self> {
            responses.reverse();
            Arc::new(Self {
                responses: Mutex::new(responses),
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    impl Transport for Arc<Scripted> {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, JoboError> {
            self.sent.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| JoboError::InvalidRequest("script exhausted".into()))
        }
    }

    fn client(script: &Arc<Scripted>) -> JoboClient {
        let config = ClientConfig::new("k").with_base_url("http://jobs.test");
        JoboClient::with_transport(config, Arc::clone(script)).unwrap()
    }

    fn job(id: u128) -> serde_json::Value {
        serde_json::json!({
            "id": Uuid::from_u128(id),
            "title": "t",
            "company": {"id": Uuid::from_u128(99), "name": "c"},
            "description": "d",
            "listing_url": "l",
            "apply_url": "a",
            "source": "lever",
            "source_id": id.to_string(),
        })
    }

    #[test]
    fn feed_iteration_follows_cursors() {
        let script = Scripted::new(vec![
            HttpResponse::new(
                200,
                serde_json::json!({"jobs": [job(1), job(2)], "next_cursor": "c2", "has_more": true})
                    .to_string(),
            ),
            HttpResponse::new(
                200,
                serde_json::json!({"jobs": [job(3)], "next_cursor": null, "has_more": false})
                    .to_string(),
            ),
        ]);
        let mut pages = client(&script).feed().iter_jobs(JobFeedRequest::default());
        let ids: Vec<_> = pages.by_ref().map(|job| job.unwrap().id).collect();

        assert_eq!(ids, vec![Uuid::from_u128(1), Uuid::from_u128(2), Uuid::from_u128(3)]);
        assert_eq!(pages.pages_fetched(), 2);

        let sent = script.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].method, HttpMethod::Post);
        let second: serde_json::Value = serde_json::from_str(sent[1].body.as_deref().unwrap()).unwrap();
        assert_eq!(second["cursor"], "c2");
    }

    #[test]
    fn iteration_stops_after_error() {
        let script = Scripted::new(vec![
            HttpResponse::new(
                200,
                serde_json::json!({"jobs": [job(1)], "total": 3, "page": 1, "page_size": 1, "total_pages": 3})
                    .to_string(),
            ),
            HttpResponse::new(503, r#"{"detail":"maintenance"}"#),
        ]);
        let mut pages = client(&script).search().iter_jobs(JobSearchRequest {
            page_size: 1,
            ..JobSearchRequest::default()
        });

        assert!(pages.next().unwrap().is_ok());
        let err = pages.next().unwrap().unwrap_err();
        assert!(matches!(err, JoboError::Server(_)));
        assert_eq!(err.detail(), Some("maintenance"));
        assert!(pages.next().is_none());
        assert_eq!(script.sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn invalid_parameters_never_reach_the_transport() {
        let script = Scripted::new(Vec::new());
        let err = client(&script)
            .feed()
            .get_jobs(&JobFeedRequest {
                batch_size: 0,
                ..JobFeedRequest::default()
            })
            .unwrap_err();
        assert!(matches!(err, JoboError::InvalidRequest(_)));
        assert!(script.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn end_session_maps_not_found_to_false() {
        let script = Scripted::new(vec![
            HttpResponse::new(200, "{}"),
            HttpResponse::new(404, r#"{"detail":"Session not found"}"#),
        ]);
        let auto_apply = client(&script).auto_apply();
        assert!(auto_apply.end_session(Uuid::from_u128(7)).unwrap());
        assert!(!auto_apply.end_session(Uuid::from_u128(7)).unwrap());
    }
}
