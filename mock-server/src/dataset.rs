//! Deterministic fixture data served by the mock API.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_JOB_COUNT: usize = 57;
pub const DEFAULT_EXPIRED_COUNT: usize = 23;

const TITLES: [&str; 5] = [
    "Rust Engineer",
    "Data Engineer",
    "Product Designer",
    "Site Reliability Engineer",
    "Frontend Developer",
];
const COMPANIES: [&str; 4] = ["Northwind", "Initech", "Globex", "Umbrella Labs"];
const SOURCES: [&str; 3] = ["greenhouse", "lever", "workday"];
const PLACES: [(&str, &str, &str); 3] = [
    ("Austin", "TX", "US"),
    ("London", "England", "GB"),
    ("Berlin", "Berlin", "DE"),
];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Location {
    pub location: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Compensation {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: Option<String>,
    pub period: Option<String>,
    pub raw_text: Option<String>,
    pub is_estimated: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub company: Company,
    pub description: String,
    pub listing_url: String,
    pub apply_url: String,
    pub locations: Vec<Location>,
    pub compensation: Option<Compensation>,
    pub employment_type: Option<String>,
    pub workplace_type: Option<String>,
    pub experience_level: Option<String>,
    pub source: String,
    pub source_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub date_posted: Option<DateTime<Utc>>,
    pub valid_through: Option<DateTime<Utc>>,
    pub is_remote: bool,
}

/// Jobs plus ids of listings that have since expired.
#[derive(Clone, Debug)]
pub struct Dataset {
    pub jobs: Vec<Job>,
    pub expired_ids: Vec<Uuid>,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::generate(DEFAULT_JOB_COUNT, DEFAULT_EXPIRED_COUNT)
    }
}

impl Dataset {
    pub fn generate(job_count: usize, expired_count: usize) -> Self {
        let epoch = Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).single().unwrap_or_default();
        let jobs = (0..job_count).map(|i| generate_job(i, epoch)).collect();
        let expired_ids = (0..expired_count)
            .map(|i| Uuid::from_u128(0xE000_0000 + i as u128))
            .collect();
        Self { jobs, expired_ids }
    }
}

fn generate_job(i: usize, epoch: DateTime<Utc>) -> Job {
    let title = TITLES[i % TITLES.len()];
    let company = COMPANIES[i % COMPANIES.len()];
    let source = SOURCES[i % SOURCES.len()];
    let (city, state, country) = PLACES[i % PLACES.len()];
    let is_remote = i % 4 == 0;
    let posted = epoch + Duration::hours(i as i64 * 12);
    let slug = company.to_lowercase().replace(' ', "-");

    Job {
        id: Uuid::from_u128(i as u128 + 1),
        title: title.to_string(),
        company: Company {
            id: Uuid::from_u128(0xC000 + (i % COMPANIES.len()) as u128),
            name: company.to_string(),
        },
        description: format!("{company} is hiring a {title} to join the team in {city}."),
        listing_url: format!("https://boards.example.com/{slug}/jobs/{}", i + 1),
        apply_url: format!("https://boards.example.com/{slug}/jobs/{}/apply", i + 1),
        locations: vec![Location {
            location: format!("{city}, {country}"),
            city: Some(city.to_string()),
            state: Some(state.to_string()),
            country: Some(country.to_string()),
            latitude: None,
            longitude: None,
        }],
        compensation: (i % 3 == 0).then(|| Compensation {
            min: Some(90_000.0 + (i as f64) * 1_000.0),
            max: Some(120_000.0 + (i as f64) * 1_000.0),
            currency: Some("USD".to_string()),
            period: Some("year".to_string()),
            raw_text: None,
            is_estimated: i % 2 == 0,
        }),
        employment_type: Some("full_time".to_string()),
        workplace_type: Some(if is_remote { "remote" } else { "onsite" }.to_string()),
        experience_level: None,
        source: source.to_string(),
        source_id: format!("{source}-{}", 1000 + i),
        created_at: posted,
        updated_at: posted + Duration::hours(1),
        date_posted: Some(posted),
        valid_through: None,
        is_remote,
    }
}
