//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results. Comparing parsed JSON (not raw strings) avoids
//! false negatives from field-ordering differences.

use jobo_core::{
    ClientConfig, HttpMethod, HttpResponse, JobFeedRequest, JobFeedResponse, JobSearchRequest,
    JobSearchResponse, JoboApi, JoboError,
};

const BASE_URL: &str = "http://localhost:3000";

fn api() -> JoboApi {
    JoboApi::new(&ClientConfig::new("vector-key").with_base_url(BASE_URL)).unwrap()
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

/// Vectors store bodies either as raw strings or as inline JSON.
fn simulated_response(sim: &serde_json::Value) -> HttpResponse {
    let body = match &sim["body"] {
        serde_json::Value::String(raw) => raw.clone(),
        other => other.to_string(),
    };
    let headers = sim
        .get("headers")
        .and_then(|h| h.as_array())
        .map(|pairs| {
            pairs
                .iter()
                .map(|pair| {
                    let pair = pair.as_array().unwrap();
                    (pair[0].as_str().unwrap().to_string(), pair[1].as_str().unwrap().to_string())
                })
                .collect()
        })
        .unwrap_or_default();
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers,
        body,
    }
}

fn assert_request(
    name: &str,
    req: &jobo_core::HttpRequest,
    expected: &serde_json::Value,
) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.url, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: url");
    assert_eq!(req.header("x-api-key"), Some("vector-key"), "{name}: api key header");
    assert_eq!(req.header("content-type"), Some("application/json"), "{name}: content type");
    let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
    assert_eq!(body, expected["body"], "{name}: body");
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

#[test]
fn feed_test_vectors() {
    let raw = include_str!("../../test-vectors/feed.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let api = api();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input: JobFeedRequest = serde_json::from_value(case["input"].clone()).unwrap();

        let req = api.build_get_jobs(&input).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let page = api.parse_get_jobs(simulated_response(&case["simulated_response"])).unwrap();
        let expected: JobFeedResponse = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(page, expected, "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// Advanced search
// ---------------------------------------------------------------------------

#[test]
fn search_test_vectors() {
    let raw = include_str!("../../test-vectors/search.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let api = api();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input: JobSearchRequest = serde_json::from_value(case["input"].clone()).unwrap();

        let req = api.build_search_advanced(&input).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let page = api.parse_search(simulated_response(&case["simulated_response"])).unwrap();
        let expected: JobSearchResponse = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(page, expected, "{name}: parsed result");
        if page.total_pages > 0 {
            assert!(page.page <= page.total_pages, "{name}: page within total_pages");
        }
    }
}

// ---------------------------------------------------------------------------
// Error translation
// ---------------------------------------------------------------------------

fn kind(err: &JoboError) -> &'static str {
    match err {
        JoboError::Authentication(_) => "Authentication",
        JoboError::RateLimit { .. } => "RateLimit",
        JoboError::Validation(_) => "Validation",
        JoboError::Server(_) => "Server",
        JoboError::Api(_) => "Api",
        _ => "client-side",
    }
}

#[test]
fn error_test_vectors() {
    let raw = include_str!("../../test-vectors/errors.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let api = api();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let response = simulated_response(&case["response"]);
        let status = response.status;
        let raw_body = response.body.clone();

        // Every endpoint shares the translator; exercise two of them.
        let feed_err = api.parse_get_jobs(response.clone()).unwrap_err();
        let geo_err = api.parse_geocode(response).unwrap_err();

        for err in [&feed_err, &geo_err] {
            assert_eq!(kind(err), case["expected_kind"].as_str().unwrap(), "{name}: kind");
            assert_eq!(err.status(), Some(status), "{name}: status");
            assert_eq!(err.detail(), case["expected_detail"].as_str(), "{name}: detail");
            assert_eq!(err.raw_body(), Some(raw_body.as_str()), "{name}: raw body");
            if let Some(expected) = case.get("expected_retry_after") {
                assert_eq!(err.retry_after(), expected.as_u64(), "{name}: retry_after");
            }
        }
    }
}
