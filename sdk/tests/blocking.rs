//! Blocking client against the mock server over real HTTP.
//!
//! # Design
//! Each test starts the mock server on a random port in a background thread
//! with its own runtime, then drives the ureq-backed client against it.

use std::collections::HashSet;

use chrono::{Duration, Utc};
use jobo_enterprise::{
    blocking::JoboClient, ClientConfig, ExpiredJobIdsRequest, FieldAnswer, FieldAnswerFile,
    JobFeedRequest, JobSearchRequest, JoboError, LocationFilter, SimpleSearchRequest,
};
use mock_server::TEST_API_KEY;
use uuid::Uuid;

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, mock_server::app()).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn client_with_key(base_url: &str, api_key: &str) -> JoboClient {
    JoboClient::from_config(ClientConfig::new(api_key).with_base_url(base_url)).unwrap()
}

fn client() -> JoboClient {
    client_with_key(&start_server(), TEST_API_KEY)
}

// --- feed ---

#[test]
fn feed_iteration_yields_every_job_once() {
    let client = client();
    let mut pages = client.feed().iter_jobs(JobFeedRequest {
        batch_size: 10,
        ..JobFeedRequest::default()
    });
    let jobs: Vec<_> = pages.by_ref().collect::<Result<_, _>>().unwrap();

    assert_eq!(jobs.len(), 57);
    let unique: HashSet<_> = jobs.iter().map(|job| job.id).collect();
    assert_eq!(unique.len(), jobs.len());
    assert_eq!(pages.pages_fetched(), 6);
}

#[test]
fn feed_single_page_and_filters() {
    let client = client();
    let page = client
        .feed()
        .get_jobs(&JobFeedRequest {
            locations: Some(vec![LocationFilter::country("DE")]),
            is_remote: Some(true),
            batch_size: 5,
            ..JobFeedRequest::default()
        })
        .unwrap();

    assert!(!page.jobs.is_empty());
    assert!(page.jobs.len() <= 5);
    for job in &page.jobs {
        assert!(job.is_remote);
        assert_eq!(job.locations[0].country.as_deref(), Some("DE"));
        assert!(job.created_at.is_some());
    }
}

#[test]
fn expired_ids_iterate_to_the_end() {
    let client = client();
    let mut request = ExpiredJobIdsRequest::new(Utc::now() - Duration::days(2));
    request.batch_size = 7;
    let ids: Vec<Uuid> = client
        .feed()
        .iter_expired_job_ids(request)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(ids.len(), 23);
}

#[test]
fn expired_since_older_than_a_week_is_a_validation_error() {
    let client = client();
    let err = client
        .feed()
        .get_expired_job_ids(&ExpiredJobIdsRequest::new(Utc::now() - Duration::days(30)))
        .unwrap_err();
    assert!(matches!(err, JoboError::Validation(_)), "got {err:?}");
    assert_eq!(err.status(), Some(400));
    assert!(err.detail().unwrap().contains("7 days"));
}

// --- search ---

#[test]
fn simple_search_page_math() {
    let client = client();
    let page = client.search().search(&SimpleSearchRequest::default()).unwrap();
    assert_eq!(page.total, 57);
    assert_eq!(page.page, 1);
    assert_eq!(page.jobs.len(), 25);
    assert_eq!(page.total_pages, 3);
}

#[test]
fn simple_search_only_sends_set_filters() {
    let client = client();
    let page = client
        .search()
        .search(&SimpleSearchRequest {
            location: Some("London".into()),
            remote: Some(false),
            page_size: 100,
            ..SimpleSearchRequest::query("designer")
        })
        .unwrap();
    assert!(page.total > 0);
    for job in &page.jobs {
        assert!(job.title.contains("Designer"));
        assert!(!job.is_remote);
        assert_eq!(job.locations[0].city.as_deref(), Some("London"));
    }
}

#[test]
fn search_iteration_walks_all_pages() {
    let client = client();
    let mut pages = client.search().iter_jobs(JobSearchRequest {
        page_size: 4,
        ..JobSearchRequest::queries(["engineer"])
    });
    let jobs: Vec<_> = pages.by_ref().collect::<Result<_, _>>().unwrap();

    let first = client
        .search()
        .search_advanced(&JobSearchRequest {
            page_size: 4,
            ..JobSearchRequest::queries(["engineer"])
        })
        .unwrap();
    assert_eq!(jobs.len() as u64, first.total);
    assert_eq!(pages.pages_fetched() as u32, first.total_pages);
    let unique: HashSet<_> = jobs.iter().map(|job| job.id).collect();
    assert_eq!(unique.len(), jobs.len());
}

// --- locations ---

#[test]
fn geocode_known_and_unknown() {
    let client = client();
    let hit = client.locations().geocode("San Francisco, CA").unwrap();
    assert!(hit.succeeded);
    assert!(!hit.locations.is_empty());
    assert!(hit.locations[0].latitude.is_some());
    assert!(hit.locations[0].longitude.is_some());

    let miss = client.locations().geocode("Atlantis").unwrap();
    assert!(!miss.succeeded);
    assert!(miss.error.is_some());
}

// --- auto apply ---

#[test]
fn auto_apply_lifecycle() {
    let client = client();
    let auto_apply = client.auto_apply();

    let started = auto_apply
        .start_session("https://jobs.lever.co/acme/123/apply")
        .unwrap();
    assert!(started.awaiting_answers());
    assert_eq!(started.provider_id.as_deref(), Some("lever"));

    let partial = auto_apply
        .set_answers(started.session_id, &[FieldAnswer::text("full_name", "Ada Lovelace")])
        .unwrap();
    assert!(partial.has_validation_errors());
    assert!(!partial.is_terminal);

    let done = auto_apply
        .set_answers(
            started.session_id,
            &[
                FieldAnswer::text("full_name", "Ada Lovelace"),
                FieldAnswer::text("email", "ada@example.com"),
                FieldAnswer::multi("work_authorization", ["yes"]),
                FieldAnswer::files(
                    "resume",
                    vec![FieldAnswerFile::from_bytes("cv.pdf", "application/pdf", b"%PDF-1.7")],
                ),
            ],
        )
        .unwrap();
    assert!(done.success);
    assert!(done.is_terminal);
    assert!(!done.awaiting_answers());

    assert!(auto_apply.end_session(started.session_id).unwrap());
    assert!(!auto_apply.end_session(started.session_id).unwrap());
}

#[test]
fn end_session_on_unknown_id_is_false() {
    let client = client();
    assert!(!client.auto_apply().end_session(Uuid::new_v4()).unwrap());
}

// --- errors ---

#[test]
fn bad_api_key_is_authentication_everywhere() {
    let client = client_with_key(&start_server(), "wrong-key");

    let errors = [
        client.feed().get_jobs(&JobFeedRequest::default()).map(|_| ()),
        client
            .feed()
            .get_expired_job_ids(&ExpiredJobIdsRequest::new(Utc::now()))
            .map(|_| ()),
        client.search().search(&SimpleSearchRequest::default()).map(|_| ()),
        client
            .search()
            .search_advanced(&JobSearchRequest::default())
            .map(|_| ()),
        client.locations().geocode("London").map(|_| ()),
        client
            .auto_apply()
            .start_session("https://example.com/apply")
            .map(|_| ()),
        client.auto_apply().end_session(Uuid::new_v4()).map(|_| ()),
    ];
    for result in errors {
        let err = result.unwrap_err();
        assert!(matches!(err, JoboError::Authentication(_)), "got {err:?}");
        assert_eq!(err.detail(), Some("Invalid API key"));
    }

    let first = client.feed().iter_jobs(JobFeedRequest::default()).next().unwrap();
    assert!(matches!(first, Err(JoboError::Authentication(_))));
}

#[test]
fn unreachable_host_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_with_key(&format!("http://{addr}"), TEST_API_KEY);
    let err = client.locations().geocode("London").unwrap_err();
    assert!(matches!(err, JoboError::Transport(_)), "got {err:?}");
    assert!(err.is_retryable());
}
