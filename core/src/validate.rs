//! Client-side parameter checks run before a request is built.

use std::ops::RangeInclusive;

use crate::error::JoboError;
use crate::types::{ExpiredJobIdsRequest, JobFeedRequest, JobSearchRequest, SimpleSearchRequest};

pub const FEED_BATCH_SIZE: RangeInclusive<u32> = 1..=1000;
pub const EXPIRED_BATCH_SIZE: RangeInclusive<u32> = 1..=10_000;
pub const PAGE_SIZE: RangeInclusive<u32> = 1..=100;

pub trait Validate {
    fn validate(&self) -> Result<(), JoboError>;
}

impl Validate for JobFeedRequest {
    fn validate(&self) -> Result<(), JoboError> {
        check_range("batch_size", self.batch_size, &FEED_BATCH_SIZE)
    }
}

impl Validate for ExpiredJobIdsRequest {
    fn validate(&self) -> Result<(), JoboError> {
        check_range("batch_size", self.batch_size, &EXPIRED_BATCH_SIZE)
    }
}

impl Validate for SimpleSearchRequest {
    fn validate(&self) -> Result<(), JoboError> {
        check_page(self.page, self.page_size)
    }
}

impl Validate for JobSearchRequest {
    fn validate(&self) -> Result<(), JoboError> {
        check_page(self.page, self.page_size)
    }
}

fn check_page(page: u32, page_size: u32) -> Result<(), JoboError> {
    if page < 1 {
        return Err(JoboError::InvalidRequest(format!("page must be >= 1, got {page}")));
    }
    check_range("page_size", page_size, &PAGE_SIZE)
}

fn check_range(name: &str, value: u32, range: &RangeInclusive<u32>) -> Result<(), JoboError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(JoboError::InvalidRequest(format!(
            "{name} must be between {} and {}, got {value}",
            range.start(),
            range.end()
        )))
    }
}

pub(crate) fn check_not_blank(name: &str, value: &str) -> Result<(), JoboError> {
    if value.trim().is_empty() {
        Err(JoboError::InvalidRequest(format!("{name} must not be empty")))
    } else {
        Ok(())
    }
}
