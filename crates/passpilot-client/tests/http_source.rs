//! Tests for `HttpPassSource` against a mock REST server.

use passpilot_api::Plan;
use passpilot_client::{HttpPassSource, PassSource, SourceError};
use passpilot_util::SchoolId;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup(token: Option<&str>) -> (MockServer, HttpPassSource) {
    let server = MockServer::start().await;
    let source = HttpPassSource::new(
        &server.uri(),
        token.map(str::to_string),
        Duration::from_secs(5),
    )
    .unwrap();
    (server, source)
}

#[tokio::test]
async fn fetches_active_passes_with_bearer_token() {
    let (server, source) = setup(Some("session-jwt")).await;

    let body = json!([
        {
            "id": "p-1",
            "studentName": "Avery Chen",
            "issuedAt": "2025-08-18T20:19:59.196Z",
            "expiresAt": "2025-08-18T20:34:59.196Z",
            "destination": "Nurse"
        },
        {
            "id": "p-2",
            "studentName": "Jordan Diaz",
            "issuedAt": "garbage",
            "expiresAt": "2025-08-18T20:40:00Z"
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/api/schools/lincoln-high/passes/active"))
        .and(header("authorization", "Bearer session-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let passes = source
        .fetch_active_passes(&SchoolId::new("lincoln-high"))
        .await
        .unwrap();

    assert_eq!(passes.len(), 2);
    assert_eq!(passes[0].student_name, "Avery Chen");
    assert!(passes[0].expires_at.is_some());
    // A malformed timestamp does not reject the record
    assert!(passes[1].issued_at.is_none());
    assert!(passes[1].expires_at.is_some());
}

#[tokio::test]
async fn fetches_school_record() {
    let (server, source) = setup(None).await;

    Mock::given(method("GET"))
        .and(path("/api/schools/lincoln-high"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "lincoln-high",
            "name": "Lincoln High",
            "plan": "free_trial",
            "isTrialExpired": true,
            "trialEndDate": "2025-08-20T00:00:00Z"
        })))
        .mount(&server)
        .await;

    let school = source
        .fetch_school(&SchoolId::new("lincoln-high"))
        .await
        .unwrap();

    assert_eq!(school.plan, Plan::FreeTrial);
    assert!(school.is_trial_expired);
    assert_eq!(school.name, "Lincoln High");
}

#[tokio::test]
async fn accepts_wrapped_history() {
    let (server, source) = setup(None).await;

    Mock::given(method("GET"))
        .and(path("/api/schools/s1/passes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": "p-1", "studentName": "A", "duration": 12 }
            ]
        })))
        .mount(&server)
        .await;

    let passes = source.fetch_passes(&SchoolId::new("s1")).await.unwrap();
    assert_eq!(passes.len(), 1);
    assert_eq!(passes[0].stored_duration, Some(12));
}

#[tokio::test]
async fn one_bad_record_does_not_drop_the_list() {
    let (server, source) = setup(None).await;

    Mock::given(method("GET"))
        .and(path("/api/schools/s1/passes/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "p-1", "studentName": "Avery", "expiresAt": "2025-08-18T20:34:59Z" },
            { "studentName": "No Id" },
            { "id": { "oid": "x" }, "studentName": "Object Id" },
            { "id": 17, "studentName": null, "duration": 3, "storedDuration": 4 }
        ])))
        .mount(&server)
        .await;

    let passes = source
        .fetch_active_passes(&SchoolId::new("s1"))
        .await
        .unwrap();

    assert_eq!(passes.len(), 2);
    assert_eq!(passes[0].id.as_str(), "p-1");
    assert_eq!(passes[1].id.as_str(), "17");
    assert_eq!(passes[1].student_name, "");
    assert_eq!(passes[1].stored_duration, Some(4));
}

#[tokio::test]
async fn maps_error_statuses() {
    let (server, source) = setup(None).await;

    Mock::given(method("GET"))
        .and(path("/api/schools/locked"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/schools/broken/passes/active"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = source.fetch_school(&SchoolId::new("locked")).await.unwrap_err();
    assert!(matches!(err, SourceError::Unauthorized(_)));

    let err = source
        .fetch_active_passes(&SchoolId::new("broken"))
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Status { status: 503, .. }));

    // Nothing mounted for this path: wiremock answers 404
    let err = source.fetch_school(&SchoolId::new("missing")).await.unwrap_err();
    assert!(matches!(err, SourceError::NotFound(_)));
}

#[tokio::test]
async fn rejects_non_json_body() {
    let (server, source) = setup(None).await;

    Mock::given(method("GET"))
        .and(path("/api/schools/s1/passes/active"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let err = source
        .fetch_active_passes(&SchoolId::new("s1"))
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Decode(_)));
}
