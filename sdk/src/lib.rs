//! Typed client for the Jobo Enterprise jobs API.
//!
//! # Overview
//! Two surfaces over the same I/O-free core (`jobo-core`):
//!
//! - [`JoboClient`] at the crate root is async and runs on reqwest.
//! - [`blocking::JoboClient`] blocks the calling thread and runs on ureq.
//!
//! Both expose the same four sub-clients (`feed`, `search`, `locations`,
//! `auto_apply`) with identical request types, response types and errors.
//!
//! ```no_run
//! # async fn demo() -> Result<(), jobo_enterprise::JoboError> {
//! use futures::TryStreamExt;
//! use jobo_enterprise::{JobFeedRequest, JoboClient};
//!
//! let client = JoboClient::from_env()?;
//! let jobs: Vec<_> = client.feed().iter_jobs(JobFeedRequest::default()).try_collect().await?;
//! println!("{} jobs", jobs.len());
//! # Ok(())
//! # }
//! ```

pub mod blocking;
mod client;
pub mod transport;

pub use client::{AutoApplyClient, FeedClient, JoboClient, LocationsClient, PageStream, SearchClient};
pub use jobo_core::{
    config, types, ApiErrorBody, AutoApplySessionResponse, ClientConfig, ExpiredJobIdsRequest,
    ExpiredJobIdsResponse, FieldAnswer, FieldAnswerFile, FieldOption, FieldValidations,
    FormFieldInfo, GeocodeResultItem, GeocodedLocation, HttpMethod, HttpRequest, HttpResponse,
    Job, JobCompany, JobCompensation, JobFeedRequest, JobFeedResponse, JobLocation,
    JobSearchRequest, JobSearchResponse, JoboApi, JoboError, LocationFilter, SetAnswersRequest,
    SimpleSearchRequest, StartSessionRequest, ValidationError,
};
pub use transport::{AsyncTransport, ReqwestTransport, Transport, UreqTransport};

use tracing::warn;

/// Surface failures worth an operator's attention. Everything else is left to
/// the caller.
pub(crate) fn log_failure(err: &JoboError) {
    match err {
        JoboError::RateLimit {
            response,
            retry_after,
        } => warn!(status = response.status, ?retry_after, "rate limited by Jobo API"),
        JoboError::Server(body) => {
            warn!(status = body.status, detail = %body.detail, "Jobo API server error")
        }
        JoboError::Transport(source) => warn!(error = %source, "Jobo API unreachable"),
        _ => {}
    }
}

pub(crate) fn observe<T>(result: Result<T, JoboError>) -> Result<T, JoboError> {
    if let Err(err) = &result {
        log_failure(err);
    }
    result
}
