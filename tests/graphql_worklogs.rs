use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use worktrack::jira::JiraIssueByKey;
use worktrack::{BearerAuth, Client, ClientConfig, Error, Operation};

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new(server.uri(), BearerAuth::new("gateway-token"))
        .with_http_client_builder(|builder| builder.no_proxy())
}

fn worklog_edge(cursor: &str, id: &str, seconds: i64) -> Value {
    json!({
        "cursor": cursor,
        "node": {
            "worklogId": id,
            "author": {"accountId": "u1", "name": "User One"},
            "timeSpent": {"timeInSeconds": seconds},
            "created": "2021-01-01T00:00:00Z",
            "updated": "2021-01-01T01:00:00Z",
            "startDate": "2021-01-01T00:00:00Z"
        }
    })
}

fn request_body(request: &wiremock::Request) -> Value {
    serde_json::from_slice(&request.body).expect("json body")
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn worklogs_follow_end_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({"variables": {"after": "c1"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"issue": {"worklogs": {
                "pageInfo": {"hasNextPage": false, "endCursor": null},
                "edges": [worklog_edge("e2", "w2", 120)]
            }}}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"issue": {"worklogs": {
                "pageInfo": {"hasNextPage": true, "endCursor": "c1"},
                "edges": [worklog_edge("e1", "w1", 60)]
            }}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(config_for(&server)).expect("client");
    let worklogs = client
        .list_issue_worklogs("cloud-123", "A-1", 1)
        .await
        .expect("worklogs");

    let ids: Vec<_> = worklogs.iter().map(|w| w.worklog_id.as_str()).collect();
    assert_eq!(ids, vec!["w1", "w2"]);
    assert_eq!(worklogs[1].time_spent_seconds(), Some(120));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let first = request_body(&requests[0]);
    let second = request_body(&requests[1]);
    assert_eq!(first["operationName"], "JiraIssueWorklogsPage");
    assert_eq!(first["variables"]["after"], Value::Null);
    assert_eq!(first["variables"]["cloudId"], "cloud-123");
    assert_eq!(first["variables"]["first"], 1);
    assert_eq!(second["variables"]["after"], "c1");
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn worklogs_without_cursor_fail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"issue": {"worklogs": {
                "pageInfo": {"hasNextPage": true, "endCursor": null},
                "edges": [{"node": {"worklogId": "w1"}}]
            }}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(config_for(&server)).expect("client");
    let err = client
        .list_issue_worklogs("cloud-123", "A-1", 1)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::PaginationCursorMissing { ref path } if path == "jira.issue.worklogs"
    ));
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn partial_issue_is_returned_unless_strict() {
    let server = MockServer::start().await;
    let body = json!({
        "data": {"issueByKey": {
            "key": "A-1",
            "status": {"name": "In Progress"},
            "reporter": null
        }},
        "errors": [{
            "message": "reporter is not visible",
            "path": ["issueByKey", "reporter"],
            "extensions": {"statusCode": 403, "requestId": "req-1"}
        }]
    });
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let lenient = Client::new(config_for(&server)).expect("client");
    let issue = lenient
        .get_issue_by_key("cloud-123", "A-1")
        .await
        .expect("issue")
        .expect("present");
    assert_eq!(issue.key, "A-1");
    assert_eq!(issue.status.unwrap().name, "In Progress");

    let response = lenient
        .execute_operation::<JiraIssueByKey>(json!({"cloudId": "cloud-123", "key": "A-1"}))
        .await
        .expect("response");
    assert!(response.is_partial());
    assert_eq!(response.request_id(), Some("req-1"));
    assert_eq!(response.errors[0].status_code(), Some(403));

    let strict = Client::new(config_for(&server).with_strict(true)).expect("client");
    let err = strict.get_issue_by_key("cloud-123", "A-1").await.unwrap_err();
    match err {
        Error::GraphQl {
            message,
            partial_data,
            status,
            ..
        } => {
            assert_eq!(message, "reporter is not visible");
            assert_eq!(status, Some(200));
            assert_eq!(partial_data.unwrap()["issueByKey"]["key"], "A-1");
        }
        other => panic!("expected graphql error, got {other:?}"),
    }
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn missing_sprint_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({
            "operationName": "JiraSprintById",
            "variables": {"id": "ari:cloud:jira:sprint/9"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"sprintById": null}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(config_for(&server)).expect("client");
    let sprint = client
        .get_sprint_by_id("ari:cloud:jira:sprint/9")
        .await
        .expect("response");
    assert!(sprint.is_none());
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn experimental_flags_sent_as_repeated_headers() {
    struct BetaQuery;

    impl Operation for BetaQuery {
        const QUERY: &'static str = "query BetaQuery { me { accountId } }";
        const NAME: &'static str = "BetaQuery";
        const EXPERIMENTAL_APIS: &'static [&'static str] = &["JiraPlans", "TeamsBeta"];
        type Response = Value;
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"me": null}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(config_for(&server).with_experimental_api("TeamsBeta"))
        .expect("client");
    client
        .execute_operation::<BetaQuery>(json!({}))
        .await
        .expect("response");

    let requests = server.received_requests().await.unwrap();
    let flags: Vec<_> = requests[0]
        .headers
        .get_all("x-experimentalapi")
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect();
    assert_eq!(flags, vec!["TeamsBeta", "JiraPlans"]);
    assert_eq!(
        requests[0].headers.get("authorization").unwrap(),
        "Bearer gateway-token"
    );
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn worklogs_without_page_info_fail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"issue": {"worklogs": {
                "edges": [worklog_edge("e1", "w1", 60)]
            }}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(config_for(&server)).expect("client");
    let err = client
        .list_issue_worklogs("cloud-123", "A-1", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Json(_)), "got {err:?}");
}
