use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use worktrack::{
    BearerAuth, CancellationToken, Client, ClientConfig, CostBudgetConfig, Error, RateLimitReason,
    Request, RetryPolicy,
};

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new(server.uri(), BearerAuth::new("token"))
        .with_http_client_builder(|builder| builder.no_proxy())
}

fn myself() -> Request {
    Request::get("/rest/api/3/myself").build().expect("request")
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn past_resume_time_retries_and_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/myself"))
        .respond_with(
            ResponseTemplate::new(429).insert_header("Retry-After", "2021-05-10T11:00:00Z"),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/api/3/myself"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accountId": "u1"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(config_for(&server)).expect("client");
    let me: serde_json::Value = client.execute_json(&myself()).await.expect("response");
    assert_eq!(me["accountId"], "u1");
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn http_date_header_is_understood() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(429).insert_header("Retry-After", "Mon, 10 May 2021 11:00:00 GMT"),
        )
        .expect(3)
        .mount(&server)
        .await;

    let client = Client::new(config_for(&server)).expect("client");
    let err = client.execute(&myself()).await.unwrap_err();

    let failure = err.rate_limit().expect("rate limit failure");
    assert_eq!(failure.reason, RateLimitReason::RetriesExhausted);
    assert_eq!(failure.attempts, 3);
    assert_eq!(
        failure.header.as_deref(),
        Some("Mon, 10 May 2021 11:00:00 GMT")
    );
    assert!(err.to_string().starts_with("rate limited (retries exhausted); attempts=3"));
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn delta_seconds_header_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "120"))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(config_for(&server)).expect("client");
    let err = client.execute(&myself()).await.unwrap_err();

    assert!(err.is_rate_limited());
    let failure = err.rate_limit().unwrap();
    assert_eq!(failure.reason, RateLimitReason::UnparseableHeader);
    assert_eq!(failure.header.as_deref(), Some("120"));
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn server_errors_fail_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(
        config_for(&server).with_retry_policy(RetryPolicy::new(10, Duration::from_secs(60))),
    )
    .expect("client");
    let err = client.execute(&myself()).await.unwrap_err();
    assert!(matches!(err, Error::Transport { status: 502, .. }));
    assert!(!err.is_rate_limited());
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn unauthorized_is_an_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(config_for(&server)).expect("client");
    let err = client.execute(&myself()).await.unwrap_err();
    assert!(err.is_auth_error());
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn local_budget_throttles_before_the_server_sees_anything() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let budget = CostBudgetConfig::new(2, Duration::from_secs(3600))
        .with_max_wait(Duration::from_millis(10));
    let client = Client::new(config_for(&server).with_local_budget(budget)).expect("client");

    client.execute(&myself()).await.expect("first");
    client.execute(&myself()).await.expect("second");
    let err = client.execute(&myself()).await.unwrap_err();

    assert!(err.is_local_throttle());
    assert!(!err.is_rate_limited());
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn cancelled_client_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    let client = Client::new(config_for(&server).with_cancellation_token(token.clone()))
        .expect("client");
    token.cancel();

    let err = client.execute(&myself()).await.unwrap_err();
    assert!(err.is_cancelled());
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn attempt_timeout_applies_to_a_prebuilt_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let http = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("http client");
    let config = ClientConfig::new(server.uri(), BearerAuth::new("token"))
        .with_http_client(http)
        .with_timeout(Duration::from_millis(100));
    let client = Client::new(config).expect("client");

    let started = std::time::Instant::now();
    let err = client.execute(&myself()).await.unwrap_err();
    assert!(matches!(err, Error::Http(ref inner) if inner.is_timeout()), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(2));
}
