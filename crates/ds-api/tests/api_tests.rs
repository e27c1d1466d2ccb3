//! Router tests
//!
//! Exercise the HTTP boundary end to end with `tower::oneshot`: envelope
//! shape, the exception-to-status table, JSON rejection refinement, and a
//! wiremock-backed happy path.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ds_api::{api_router, ApiContext, HealthState};
use ds_config::AppConfig;

fn router_for(config: &AppConfig) -> (Router, HealthState) {
    let context = ApiContext::from_config(config);
    let health = HealthState::new(context.clone(), Some("test".into()));
    let (router, _api) = api_router(context, health.clone());
    (router, health)
}

fn empty_router() -> Router {
    router_for(&AppConfig::default()).0
}

fn openshift_config(url: &str) -> AppConfig {
    let toml = format!(
        r#"
        [openshift.instances.dev]
        url = "{url}"
        token = "t"
        namespace = "demo-cd"
        "#
    );
    AppConfig::from_toml_str(&toml).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn unknown_route_gets_an_enveloped_404() {
    let response = empty_router()
        .oneshot(
            Request::builder()
                .uri("/api/v1/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "NO_SUCH_ROUTE");
    assert!(json["message"].as_str().unwrap().contains("GET /api/v1/nope"));
}

#[tokio::test]
async fn wrong_method_gets_an_enveloped_405() {
    let response = empty_router()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/v1/tickets")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn syntactically_broken_body_is_a_400() {
    let response = empty_router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/tickets")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{ not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "MALFORMED_BODY");
    assert!(json["message"].as_str().unwrap().contains("not valid JSON"));
}

#[tokio::test]
async fn missing_required_field_is_reported_as_such() {
    let response = empty_router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/tickets")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{ "project": "DEMO" }"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "MALFORMED_BODY");
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("missing a required field"));
}

#[tokio::test]
async fn missing_content_type_is_a_415() {
    let response = empty_router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/tickets")
                .body(Body::from(r#"{}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let json = body_json(response).await;
    assert_eq!(json["error"], "UNSUPPORTED_MEDIA_TYPE");
    assert!(json["message"].as_str().unwrap().contains("application/json"));
}

#[tokio::test]
async fn invalid_role_gets_its_own_error_code() {
    let response = empty_router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/project/DEMO/users")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{ "username": "jane", "role": "owner" }"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "INVALID_ROLE");
    assert!(json["message"].as_str().unwrap().contains("owner"));
}

#[tokio::test]
async fn user_status_requires_a_numeric_request_id() {
    let router = empty_router();

    let missing = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/project/DEMO/users/jane/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(missing).await["error"], "MISSING_PARAMETER");

    let malformed = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/project/DEMO/users/jane/status?requestId=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(malformed).await["error"], "INVALID_PARAMETER");
}

#[tokio::test]
async fn unknown_instance_fails_validation() {
    let server = MockServer::start().await;
    let (router, _) = router_for(&openshift_config(&server.uri()));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/secrets/app-secret?instance=qa")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "VALIDATION_ERROR");
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("OpenShift instance 'qa' does not exist"));
}

#[tokio::test]
async fn secret_value_round_trips_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/demo-cd/secrets/app-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "password": "czNjcmV0" }
        })))
        .mount(&server)
        .await;

    let (router, _) = router_for(&openshift_config(&server.uri()));
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/secrets/app-secret/keys/password")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["value"], "s3cret");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn upstream_failures_surface_as_502_with_the_command_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/demo-cd/secrets/app-secret"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (router, _) = router_for(&openshift_config(&server.uri()));
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/secrets/app-secret/keys/password")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"], "GET_SECRET_VALUE_FAILED");
    assert!(json["message"].as_str().unwrap().contains("openshift"));
}

#[tokio::test]
async fn absent_secret_is_a_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/demo-cd/secrets/app-secret"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (router, _) = router_for(&openshift_config(&server.uri()));
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/secrets/app-secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "GET_SECRET_FAILED");
}

#[tokio::test]
async fn secret_exists_answers_false_on_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/demo-cd/secrets/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (router, _) = router_for(&openshift_config(&server.uri()));
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/secrets/gone/exists")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["exists"], false);
}

#[tokio::test]
async fn readiness_flips_with_the_flag() {
    let context = ApiContext::from_config(&AppConfig::default());
    let health = HealthState::new(context.clone(), None);
    let (router, _) = api_router(context, health.clone());

    let before = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(before.status(), StatusCode::SERVICE_UNAVAILABLE);

    health.set_ready();
    let after = router
        .oneshot(
            Request::builder()
                .uri("/health/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(after.status(), StatusCode::OK);
    assert_eq!(body_json(after).await["status"], "UP");
}

#[tokio::test]
async fn cache_clear_names_every_system() {
    let response = empty_router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/admin/cache/clear")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let cleared: Vec<String> = json["data"]["cleared"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        cleared,
        vec![
            "bitbucket",
            "jira",
            "openshift",
            "aap",
            "uipath",
            "webhook-proxy"
        ]
    );
}
