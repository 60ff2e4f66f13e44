//! Smoke tests against the real API. Skipped unless `JOBO_API_KEY` is set.

use jobo_enterprise::{blocking, ClientConfig, JobFeedRequest, JoboClient, SimpleSearchRequest};
use uuid::Uuid;

fn live_config() -> Option<ClientConfig> {
    match ClientConfig::from_env() {
        Ok(config) => Some(config),
        Err(_) => {
            eprintln!("JOBO_API_KEY not set; skipping live test");
            None
        }
    }
}

#[test]
fn live_blocking_search() {
    let Some(config) = live_config() else { return };
    let client = blocking::JoboClient::from_config(config).unwrap();

    let page = client
        .search()
        .search(&SimpleSearchRequest {
            page_size: 5,
            ..SimpleSearchRequest::query("software engineer")
        })
        .unwrap();
    assert!(page.jobs.len() <= 5);
    if page.total_pages > 0 {
        assert!(page.page <= page.total_pages);
    }
}

#[test]
fn live_blocking_geocode() {
    let Some(config) = live_config() else { return };
    let client = blocking::JoboClient::from_config(config).unwrap();

    let result = client.locations().geocode("San Francisco, CA").unwrap();
    assert!(result.succeeded);
    let first = &result.locations[0];
    assert!(first.latitude.is_some() && first.longitude.is_some());
}

#[tokio::test]
async fn live_async_feed_and_end_session() {
    let Some(config) = live_config() else { return };
    let client = JoboClient::from_config(config).unwrap();

    let page = client
        .feed()
        .get_jobs(&JobFeedRequest {
            batch_size: 3,
            ..JobFeedRequest::default()
        })
        .await
        .unwrap();
    assert!(page.jobs.len() <= 3);

    assert!(!client.auto_apply().end_session(Uuid::new_v4()).await.unwrap());
}
