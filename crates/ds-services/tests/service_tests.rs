//! Service-layer tests against a mock HTTP server
//!
//! Covers:
//! - Status-to-error-code mapping on real responses
//! - Existence predicates: 404 answers false, other failures still fail
//! - Health and connection validation never erroring
//! - Secret decoding and missing-key reporting
//! - Command wrapping into the {error_code, service_name, operation} triple
//! - Read-timeout classification

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ds_config::AppConfig;
use ds_connect::{ClientFactory, InstanceRegistry};
use ds_services::aap::{AapService, ExecuteWorkflowAsyncCommand, ExecuteWorkflowRequest};
use ds_services::bitbucket::BitbucketService;
use ds_services::jira::JiraService;
use ds_services::openshift::{GetSecretValueCommand, GetSecretValueRequest, OpenShiftService};
use ds_services::uipath::UiPathService;
use ds_services::{CommandError, FailureClass};

fn factory(system: &str, url: &str) -> Arc<ClientFactory> {
    factory_with(system, url, "")
}

fn factory_with(system: &str, url: &str, extra: &str) -> Arc<ClientFactory> {
    let toml = format!(
        r#"
        [bitbucket.instances.test]
        url = "{url}"
        token = "test-token"
        {extra}
        "#
    );
    let config = AppConfig::from_toml_str(&toml).unwrap();
    let registry = InstanceRegistry::from_system_config(system, &config.bitbucket);
    Arc::new(ClientFactory::new(Arc::new(registry)))
}

#[tokio::test]
async fn default_branch_is_decoded_and_authenticated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/1.0/projects/DEMO/repos/app/branches/default"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "refs/heads/main",
            "displayId": "main",
            "isDefault": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = BitbucketService::new(factory("bitbucket", &server.uri()));
    let branch = service
        .get_default_branch(None, "DEMO", "app")
        .await
        .unwrap();

    assert_eq!(branch.display_id, "main");
    assert!(branch.is_default);
}

#[tokio::test]
async fn branch_exists_requires_an_exact_match() {
    let server = MockServer::start().await;

    // filterText is a substring filter; the page holds near-misses too.
    Mock::given(method("GET"))
        .and(path("/rest/api/1.0/projects/DEMO/repos/app/branches"))
        .and(query_param("filterText", "main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "values": [
                { "id": "refs/heads/main-backup", "displayId": "main-backup" },
                { "id": "refs/heads/main", "displayId": "main" }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/api/1.0/projects/DEMO/repos/app/branches"))
        .and(query_param("filterText", "release"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "values": [
                { "id": "refs/heads/release-1.0", "displayId": "release-1.0" }
            ]
        })))
        .mount(&server)
        .await;

    let service = BitbucketService::new(factory("bitbucket", &server.uri()));
    assert!(service.branch_exists(None, "DEMO", "app", "main").await.unwrap());
    assert!(!service
        .branch_exists(None, "DEMO", "app", "release")
        .await
        .unwrap());
}

#[tokio::test]
async fn existence_checks_treat_404_as_false_but_nothing_else() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/project/GONE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/api/2/project/LOCKED"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/api/2/project/BROKEN"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let service = JiraService::new(factory("jira", &server.uri()));

    assert!(!service.project_exists(None, "GONE").await.unwrap());

    let unauthorized = service.project_exists(None, "LOCKED").await.unwrap_err();
    assert_eq!(unauthorized.code(), "UNAUTHORIZED");
    assert!(unauthorized.to_string().contains("credentials"));

    let upstream = service.project_exists(None, "BROKEN").await.unwrap_err();
    assert_eq!(upstream.code(), "UPSTREAM_ERROR");
}

#[tokio::test]
async fn validate_connection_reports_false_instead_of_failing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/myself"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let service = JiraService::new(factory("jira", &server.uri()));
    assert!(!service.validate_connection(None).await);
    assert!(!service.is_healthy().await);
}

#[tokio::test]
async fn health_is_true_when_any_instance_answers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/1.0/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "values": []
        })))
        .mount(&server)
        .await;

    let service = BitbucketService::new(factory("bitbucket", &server.uri()));
    assert!(service.is_healthy().await);
}

#[tokio::test]
async fn secret_values_are_base64_decoded() {
    let server = MockServer::start().await;

    // "admin" / "s3cret" in base64, as the cluster API returns them.
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/demo-cd/secrets/app-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "username": "YWRtaW4=",
                "password": "czNjcmV0"
            }
        })))
        .mount(&server)
        .await;

    let service = OpenShiftService::new(factory("openshift", &server.uri()));
    let secret = service
        .get_secret(None, Some("demo-cd"), "app-secret")
        .await
        .unwrap();

    assert_eq!(secret["username"], "admin");
    assert_eq!(secret["password"], "s3cret");
}

#[tokio::test]
async fn missing_secret_key_names_the_available_ones() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/demo-cd/secrets/app-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "username": "YWRtaW4=", "password": "czNjcmV0" }
        })))
        .mount(&server)
        .await;

    let service = OpenShiftService::new(factory("openshift", &server.uri()));
    let err = service
        .get_secret_value(None, Some("demo-cd"), "app-secret", "api-key")
        .await
        .unwrap_err();

    assert_eq!(err.code(), "NOT_FOUND");
    assert!(err.to_string().contains("password, username"));
}

#[tokio::test]
async fn get_secret_value_command_wraps_failures_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/demo-cd/secrets/app-secret"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let service = Arc::new(OpenShiftService::new(factory("openshift", &server.uri())));
    let command = GetSecretValueCommand::new(service);
    let err = command
        .execute(&GetSecretValueRequest {
            instance: None,
            namespace: Some("demo-cd".into()),
            name: "app-secret".into(),
            key: "password".into(),
        })
        .await
        .unwrap_err();

    match err {
        CommandError::External(wrapped) => {
            assert_eq!(wrapped.error_code, "GET_SECRET_VALUE_FAILED");
            assert_eq!(wrapped.service_name, "openshift");
            assert_eq!(wrapped.operation, "getSecretValue");
            assert_eq!(wrapped.failure_class(), FailureClass::Upstream);
            // The underlying cause stays visible.
            assert!(wrapped.source.is_some());
        }
        other => panic!("expected an external error, got {other:?}"),
    }
}

#[tokio::test]
async fn blank_input_fails_validation_before_any_request() {
    let server = MockServer::start().await;
    // No mocks mounted: a request would fail the test via connection errors.

    let service = Arc::new(OpenShiftService::new(factory("openshift", &server.uri())));
    let command = GetSecretValueCommand::new(service);
    let err = command
        .execute(&GetSecretValueRequest {
            instance: None,
            namespace: Some("demo-cd".into()),
            name: "  ".into(),
            key: "password".into(),
        })
        .await
        .unwrap_err();

    match err {
        CommandError::Validation(message) => {
            assert!(message.contains("name must not be blank"));
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn workflow_launch_resolves_the_template_first() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/workflow_job_templates/"))
        .and(query_param("name", "deploy-app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [ { "id": 42 } ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v2/workflow_job_templates/42/launch/"))
        .and(body_json(serde_json::json!({
            "extra_vars": { "env": "dev" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "job": 4711,
            "status": "pending",
            "url": "/api/v2/workflow_jobs/4711/"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = AapService::new(factory("aap", &server.uri()));
    let launch = service
        .execute_workflow(None, "deploy-app", serde_json::json!({ "env": "dev" }))
        .await
        .unwrap();

    assert_eq!(launch.job_id, 4711);
    assert_eq!(launch.status, "pending");
}

#[tokio::test]
async fn unknown_workflow_template_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/workflow_job_templates/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": []
        })))
        .mount(&server)
        .await;

    let service = AapService::new(factory("aap", &server.uri()));
    let err = service
        .execute_workflow(None, "no-such-workflow", serde_json::json!({}))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "NOT_FOUND");
    assert!(err.to_string().contains("no-such-workflow"));
}

#[tokio::test]
async fn stalled_async_launch_reports_an_initiation_timeout() {
    let server = MockServer::start().await;

    // The template lookup stalls past the command's wait bound.
    Mock::given(method("GET"))
        .and(path("/api/v2/workflow_job_templates/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "results": [ { "id": 42 } ] }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let service = Arc::new(AapService::new(factory("aap", &server.uri())));
    let command = ExecuteWorkflowAsyncCommand::with_wait(service, Duration::from_millis(100));
    let err = command
        .execute(&ExecuteWorkflowRequest {
            instance: None,
            workflow: "deploy-app".into(),
            extra_vars: serde_json::json!({}),
        })
        .await
        .unwrap_err();

    match err {
        CommandError::External(wrapped) => {
            assert_eq!(wrapped.error_code, "WORKFLOW_INITIATION_TIMEOUT");
            assert_eq!(wrapped.service_name, "aap");
            assert_eq!(wrapped.operation, "executeWorkflowAsync");
            assert!(wrapped.to_string().contains("deploy-app"));
        }
        other => panic!("expected an external error, got {other:?}"),
    }
}

#[tokio::test]
async fn queue_items_carry_the_folder_header_when_configured() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/odata/Queues/UiPathODataSvc.AddQueueItem"))
        .and(header("X-UIPATH-OrganizationUnitId", "folder-7"))
        .and(body_json(serde_json::json!({
            "itemData": {
                "Name": "invoices",
                "Reference": "inv-2024-001",
                "Priority": "Normal",
                "SpecificContent": { "amount": 120 }
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "Id": 9001,
            "Status": "New",
            "Reference": "inv-2024-001"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = UiPathService::new(factory_with(
        "uipath",
        &server.uri(),
        r#"namespace = "folder-7""#,
    ));
    let item = service
        .add_queue_item(
            None,
            "invoices",
            "inv-2024-001",
            serde_json::json!({ "amount": 120 }),
        )
        .await
        .unwrap();

    assert_eq!(item.id, 9001);
    assert_eq!(item.status, "New");
}

#[tokio::test]
async fn slow_responses_classify_as_read_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/project/SLOW"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "id": "1", "key": "SLOW", "name": "Slow" }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let service = JiraService::new(factory_with(
        "jira",
        &server.uri(),
        "read-timeout-ms = 200",
    ));
    let err = service.get_project(None, "SLOW").await.unwrap_err();

    assert_eq!(err.code(), "READ_TIMEOUT");
    assert!(err.to_string().contains("timed out"));
}
