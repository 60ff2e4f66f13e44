//! Async surface.

use std::{
    fmt,
    pin::Pin,
    sync::Arc,
    task::{ready, Context, Poll},
};

use futures::{future::BoxFuture, Stream};
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
    transport::{AsyncTransport, ReqwestTransport},
};

#[derive(Clone)]
struct Shared {
    api: JoboApi,
    transport: Arc<dyn AsyncTransport>,
}

impl Shared {
    async fn send(&self, request: Result<HttpRequest, JoboError>) -> Result<HttpResponse, JoboError> {
        observe(self.transport.execute(request?).await)
    }
}

/// Async client for the Jobo Enterprise API.
///
/// Cheap to clone; clones and sub-clients share one transport and its
/// connection pool.
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
    /// Client against the production API with default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self, JoboError> {
        Self::from_config(ClientConfig::new(api_key))
    }

    /// Reads `JOBO_API_KEY` and the optional overrides from the environment.
    pub fn from_env() -> Result<Self, JoboError> {
        Self::from_config(ClientConfig::from_env()?)
    }

    pub fn from_config(config: ClientConfig) -> Result<Self, JoboError> {
        let transport = ReqwestTransport::new(config.timeout())?;
        Self::with_transport(config, transport)
    }

    /// Use a custom transport. The config's timeout is not applied to it.
    pub fn with_transport<T>(config: ClientConfig, transport: T) -> Result<Self, JoboError>
    where
        T: AsyncTransport + 'static,
    {
        let api = JoboApi::new(&config)?;
        debug!(base_url = api.base_url(), "async Jobo client ready");
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

    /// The request builder behind this client.
    pub fn api(&self) -> &JoboApi {
        &self.shared.api
    }
}

// ---------------------------------------------------------------------------
// Sub-clients
// ---------------------------------------------------------------------------

/// Bulk feed and expired-job endpoints.
#[derive(Clone)]
pub struct FeedClient {
    shared: Shared,
}

impl FeedClient {
    pub async fn get_jobs(&self, request: &JobFeedRequest) -> Result<JobFeedResponse, JoboError> {
        let response = self.shared.send(self.shared.api.build_get_jobs(request)).await?;
        observe(self.shared.api.parse_get_jobs(response))
    }

    /// Every job matching `request`, following cursors until `has_more` is
    /// false. A cursor already set on `request` is where iteration starts.
    pub fn iter_jobs(&self, request: JobFeedRequest) -> PageStream<JobFeedRequest> {
        PageStream::new(&self.shared, request)
    }

    pub async fn get_expired_job_ids(
        &self,
        request: &ExpiredJobIdsRequest,
    ) -> Result<ExpiredJobIdsResponse, JoboError> {
        let response = self
            .shared
            .send(self.shared.api.build_get_expired_job_ids(request))
            .await?;
        observe(self.shared.api.parse_get_expired_job_ids(response))
    }

    pub fn iter_expired_job_ids(
        &self,
        request: ExpiredJobIdsRequest,
    ) -> PageStream<ExpiredJobIdsRequest> {
        PageStream::new(&self.shared, request)
    }
}

/// Simple and advanced search.
#[derive(Clone)]
pub struct SearchClient {
    shared: Shared,
}

impl SearchClient {
    pub async fn search(&self, request: &SimpleSearchRequest) -> Result<JobSearchResponse, JoboError> {
        let response = self.shared.send(self.shared.api.build_search(request)).await?;
        observe(self.shared.api.parse_search(response))
    }

    pub async fn search_advanced(
        &self,
        request: &JobSearchRequest,
    ) -> Result<JobSearchResponse, JoboError> {
        let response = self
            .shared
            .send(self.shared.api.build_search_advanced(request))
            .await?;
        observe(self.shared.api.parse_search(response))
    }

    /// Every job matching `request` across pages, starting at `request.page`.
    pub fn iter_jobs(&self, request: JobSearchRequest) -> PageStream<JobSearchRequest> {
        PageStream::new(&self.shared, request)
    }
}

#[derive(Clone)]
pub struct LocationsClient {
    shared: Shared,
}

impl LocationsClient {
    /// Resolve free text to structured locations. An unresolvable input is an
    /// `Ok` result with `succeeded == false`.
    pub async fn geocode(&self, location: &str) -> Result<GeocodeResultItem, JoboError> {
        let response = self.shared.send(self.shared.api.build_geocode(location)).await?;
        observe(self.shared.api.parse_geocode(response))
    }
}

/// Auto-apply sessions: start, answer zero or more times, end.
#[derive(Clone)]
pub struct AutoApplyClient {
    shared: Shared,
}

impl AutoApplyClient {
    pub async fn start_session(&self, apply_url: &str) -> Result<AutoApplySessionResponse, JoboError> {
        let response = self
            .shared
            .send(self.shared.api.build_start_session(apply_url))
            .await?;
        observe(self.shared.api.parse_session(response))
    }

    pub async fn set_answers(
        &self,
        session_id: Uuid,
        answers: &[FieldAnswer],
    ) -> Result<AutoApplySessionResponse, JoboError> {
        let response = self
            .shared
            .send(self.shared.api.build_set_answers(session_id, answers))
            .await?;
        observe(self.shared.api.parse_session(response))
    }

    /// `Ok(false)` when the server no longer knows the session.
    pub async fn end_session(&self, session_id: Uuid) -> Result<bool, JoboError> {
        let response = self
            .shared
            .send(self.shared.api.build_end_session(session_id))
            .await?;
        observe(self.shared.api.parse_end_session(response))
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Lazily fetched items of a paginated query.
///
/// Pages are requested one at a time as the stream is polled. The stream ends
/// after the first error.
pub struct PageStream<Q: PageQuery> {
    pager: Pager<Q>,
    transport: Arc<dyn AsyncTransport>,
    in_flight: Option<BoxFuture<'static, Result<HttpResponse, JoboError>>>,
}

impl<Q: PageQuery> PageStream<Q> {
    fn new(shared: &Shared, query: Q) -> Self {
        Self {
            pager: Pager::new(shared.api.clone(), query),
            transport: Arc::clone(&shared.transport),
            in_flight: None,
        }
    }

    /// Pages received so far.
    pub fn pages_fetched(&self) -> usize {
        self.pager.pages_fetched()
    }
}

// The in-flight future is boxed; nothing else is structurally pinned.
impl<Q: PageQuery> Unpin for PageStream<Q> {}

impl<Q: PageQuery> Stream for PageStream<Q> {
    type Item = Result<Q::Item, JoboError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(fetch) = this.in_flight.as_mut() {
                let outcome = ready!(fetch.as_mut().poll(cx));
                this.in_flight = None;
                if let Err(err) = outcome.and_then(|response| this.pager.receive(response)) {
                    this.pager.finish();
                    log_failure(&err);
                    return Poll::Ready(Some(Err(err)));
                }
                continue;
            }

            match this.pager.next_step() {
                Ok(PageStep::Item(item)) => return Poll::Ready(Some(Ok(item))),
                Ok(PageStep::Done) => return Poll::Ready(None),
                Ok(PageStep::Fetch(request)) => {
                    let transport = Arc::clone(&this.transport);
                    this.in_flight = Some(Box::pin(async move { transport.execute(request).await }));
                }
                Err(err) => {
                    this.pager.finish();
                    return Poll::Ready(Some(Err(err)));
                }
            }
        }
    }
}
