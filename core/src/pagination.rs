//! Auto-pagination as an I/O-free stepping machine.
//!
//! # Design
//! `Pager` never performs a request itself. `next_step` hands out either a
//! buffered item, the next page request for the host to execute, or `Done`;
//! the host feeds the response back through `receive`. The blocking iterator
//! and the async stream in the SDK both drive this one machine, so page
//! advancement rules live only here.
//!
//! No snapshot isolation: every page is an independent request, and the
//! backing data may change between them.

use std::collections::VecDeque;

use tracing::debug;
use uuid::Uuid;

use crate::client::JoboApi;
use crate::error::JoboError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{ExpiredJobIdsRequest, Job, JobFeedRequest, JobSearchRequest};

/// A request whose results span several pages.
pub trait PageQuery {
    type Item;

    /// Build the request for the page this query currently points at.
    fn build(&self, api: &JoboApi) -> Result<HttpRequest, JoboError>;

    /// Parse one page and advance to the next one. Returns the page's items
    /// and whether another page should be fetched.
    fn advance(
        &mut self,
        api: &JoboApi,
        response: HttpResponse,
    ) -> Result<(Vec<Self::Item>, bool), JoboError>;
}

impl PageQuery for JobFeedRequest {
    type Item = Job;

    fn build(&self, api: &JoboApi) -> Result<HttpRequest, JoboError> {
        api.build_get_jobs(self)
    }

    fn advance(
        &mut self,
        api: &JoboApi,
        response: HttpResponse,
    ) -> Result<(Vec<Job>, bool), JoboError> {
        let page = api.parse_get_jobs(response)?;
        let more = advance_cursor(&mut self.cursor, page.has_more, page.next_cursor);
        Ok((page.jobs, more))
    }
}

impl PageQuery for ExpiredJobIdsRequest {
    type Item = Uuid;

    fn build(&self, api: &JoboApi) -> Result<HttpRequest, JoboError> {
        api.build_get_expired_job_ids(self)
    }

    fn advance(
        &mut self,
        api: &JoboApi,
        response: HttpResponse,
    ) -> Result<(Vec<Uuid>, bool), JoboError> {
        let page = api.parse_get_expired_job_ids(response)?;
        let more = advance_cursor(&mut self.cursor, page.has_more, page.next_cursor);
        Ok((page.job_ids, more))
    }
}

impl PageQuery for JobSearchRequest {
    type Item = Job;

    fn build(&self, api: &JoboApi) -> Result<HttpRequest, JoboError> {
        api.build_search_advanced(self)
    }

    fn advance(
        &mut self,
        api: &JoboApi,
        response: HttpResponse,
    ) -> Result<(Vec<Job>, bool), JoboError> {
        let page = api.parse_search(response)?;
        if self.page >= page.total_pages {
            return Ok((page.jobs, false));
        }
        self.page += 1;
        Ok((page.jobs, true))
    }
}

/// A `has_more` page without a cursor cannot be continued, so it ends the
/// sequence as well.
fn advance_cursor(cursor: &mut Option<String>, has_more: bool, next: Option<String>) -> bool {
    match next {
        Some(next) if has_more && !next.is_empty() => {
            *cursor = Some(next);
            true
        }
        _ => false,
    }
}

/// What the host should do next.
#[derive(Debug)]
pub enum PageStep<T> {
    Item(T),
    Fetch(HttpRequest),
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PagerState {
    Ready,
    AwaitingResponse,
    Exhausted,
}

/// Drives a `PageQuery` through all of its pages.
///
/// Finite and not restartable; create a new pager to start over. Any error
/// ends the sequence.
pub struct Pager<Q: PageQuery> {
    api: JoboApi,
    query: Q,
    buffer: VecDeque<Q::Item>,
    state: PagerState,
    pages_fetched: usize,
}

impl<Q: PageQuery> Pager<Q> {
    pub fn new(api: JoboApi, query: Q) -> Self {
        Self {
            api,
            query,
            buffer: VecDeque::new(),
            state: PagerState::Ready,
            pages_fetched: 0,
        }
    }

    pub fn next_step(&mut self) -> Result<PageStep<Q::Item>, JoboError> {
        if let Some(item) = self.buffer.pop_front() {
            return Ok(PageStep::Item(item));
        }
        match self.state {
            PagerState::Exhausted => Ok(PageStep::Done),
            PagerState::AwaitingResponse => Err(JoboError::InvalidRequest(
                "a page request is already in flight".into(),
            )),
            PagerState::Ready => match self.query.build(&self.api) {
                Ok(request) => {
                    self.state = PagerState::AwaitingResponse;
                    Ok(PageStep::Fetch(request))
                }
                Err(err) => {
                    self.state = PagerState::Exhausted;
                    Err(err)
                }
            },
        }
    }

    pub fn receive(&mut self, response: HttpResponse) -> Result<(), JoboError> {
        if self.state != PagerState::AwaitingResponse {
            return Err(JoboError::InvalidRequest(
                "received a page that was never requested".into(),
            ));
        }
        match self.query.advance(&self.api, response) {
            Ok((items, more)) => {
                self.pages_fetched += 1;
                debug!(page = self.pages_fetched, items = items.len(), more, "received page");
                self.buffer.extend(items);
                self.state = if more {
                    PagerState::Ready
                } else {
                    PagerState::Exhausted
                };
                Ok(())
            }
            Err(err) => {
                self.state = PagerState::Exhausted;
                Err(err)
            }
        }
    }

    /// End the sequence early, e.g. after a transport failure. Buffered items
    /// are dropped.
    pub fn finish(&mut self) {
        self.buffer.clear();
        self.state = PagerState::Exhausted;
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == PagerState::Exhausted && self.buffer.is_empty()
    }
}
