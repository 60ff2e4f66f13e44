//! I/O-free API client core for the Jobo Enterprise jobs service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The blocking and async
//! surfaces in `jobo-enterprise` execute the round-trips, so the core stays
//! deterministic and testable.
//!
//! # Design
//! - `JoboApi` is stateless: base URL plus default headers.
//! - Each endpoint is split into `build_*` and `parse_*`, so the I/O
//!   boundary is explicit.
//! - `JoboError::from_response` is the single status-to-error translator.
//! - `Pager` holds all auto-pagination rules; hosts only execute the
//!   requests it hands out.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod pagination;
pub mod types;
pub mod validate;

pub use client::JoboApi;
pub use config::ClientConfig;
pub use error::{ApiErrorBody, JoboError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use pagination::{PageQuery, PageStep, Pager};
pub use types::{
    AutoApplySessionResponse, ExpiredJobIdsRequest, ExpiredJobIdsResponse, FieldAnswer,
    FieldAnswerFile, FieldOption, FieldValidations, FormFieldInfo, GeocodeResultItem,
    GeocodedLocation, Job, JobCompany, JobCompensation, JobFeedRequest, JobFeedResponse,
    JobLocation, JobSearchRequest, JobSearchResponse, LocationFilter, SetAnswersRequest,
    SimpleSearchRequest, StartSessionRequest, ValidationError,
};
