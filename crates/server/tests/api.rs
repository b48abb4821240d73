//! HTTP-level tests for the intake endpoints, driven through the router with
//! `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use harvest::{
    CanonicalRecord, IdentityPolicy, IdentityTuple, IngestConfig, IntakeOrchestrator,
    RecordStore, StoreError, StoredRecord,
};
use http_body_util::BodyExt;
use serde_json::Value;
use server::{build_router, ServerConfig, ServerState};
use store::InMemoryStore;
use tower::ServiceExt;

const FORM: &str = concat!(
    "id=QR-42&variedad=freedom&tamano=largo&numero_tallos=30",
    "&etapa=corte&bloque=3&tipo=fin_corte"
);

fn intake_over(store: Arc<dyn RecordStore>) -> IntakeOrchestrator {
    IntakeOrchestrator::new(IngestConfig::default(), IdentityPolicy::Exact, vec![store])
        .expect("orchestrator")
}

fn app_with(config: ServerConfig, store: Arc<dyn RecordStore>) -> Router {
    build_router(Arc::new(ServerState::with_intake(
        config,
        intake_over(store),
    )))
}

fn app() -> (Router, Arc<InMemoryStore>) {
    let sheet = Arc::new(InMemoryStore::new("sheet"));
    (app_with(ServerConfig::default(), sheet.clone()), sheet)
}

fn form_post(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/submit")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

struct DownStore;

#[async_trait]
impl RecordStore for DownStore {
    fn name(&self) -> &str {
        "down"
    }

    async fn append(&self, _record: &CanonicalRecord) -> Result<StoredRecord, StoreError> {
        Err(StoreError::backend("sheet offline"))
    }

    async fn exists(&self, _identity: &IdentityTuple) -> Result<bool, StoreError> {
        Ok(false)
    }
}

#[tokio::test]
async fn form_submission_is_persisted() {
    let (app, sheet) = app();

    let response = app.oneshot(form_post(FORM)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(body["status"], "persisted");
    assert_eq!(body["forced"], false);
    assert_eq!(body["record"]["id"], "QR-42");
    assert_eq!(body["stored_to"][0]["store"], "sheet");
    assert_eq!(body["stored_to"][0]["sequence"], 1);
    assert_eq!(sheet.len(), 1);
}

#[tokio::test]
async fn duplicate_answers_conflict_with_resubmit_form() {
    let (app, sheet) = app();

    let first = app.clone().oneshot(form_post(FORM)).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.clone().oneshot(form_post(FORM)).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = json_body(second).await;
    assert_eq!(body["error"]["code"], "DUPLICATE");
    assert_eq!(body["error"]["details"]["candidate"]["id"], "QR-42");
    let resubmit = &body["error"]["details"]["resubmit"];
    assert_eq!(resubmit["force"], "true");
    assert_eq!(resubmit["numero_tallos"], "30");
    assert_eq!(resubmit["bloque"], "3");
    assert_eq!(sheet.len(), 1);

    let forced = app
        .oneshot(form_post(&format!("{FORM}&force=true")))
        .await
        .unwrap();
    assert_eq!(forced.status(), StatusCode::CREATED);
    assert_eq!(json_body(forced).await["forced"], true);
    assert_eq!(sheet.len(), 2);
}

#[tokio::test]
async fn json_submission_uses_the_same_pipeline() {
    let (app, sheet) = app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/submissions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({
                "id": "QR-7",
                "variety": "vendela",
                "size": "na",
                "stem_count": 12,
                "stage": "corte",
                "block": 1,
                "record_type": "end_of_cut",
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["record"]["block"], "1");
    assert!(body["record"].get("size").map_or(true, Value::is_null));
    assert_eq!(sheet.len(), 1);
}

#[tokio::test]
async fn numeric_json_id_is_accepted() {
    let (app, sheet) = app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/submissions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"id":42,"variety":"freedom","size":"corto","stem_count":"30","block":"3"}"#,
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json_body(response).await["record"]["id"], "42");
    assert_eq!(sheet.len(), 1);
}

#[tokio::test]
async fn long_stage_is_accepted_by_default() {
    let (app, sheet) = app();

    let stage = "a".repeat(300);
    let body = FORM.replace("etapa=corte", &format!("etapa={stage}"));
    let response = app.oneshot(form_post(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json_body(response).await["record"]["stage"], stage);
    assert_eq!(sheet.len(), 1);
}

#[tokio::test]
async fn invalid_stem_count_is_a_bad_request() {
    let (app, sheet) = app();

    let body = FORM.replace("numero_tallos=30", "numero_tallos=treinta");
    let response = app.oneshot(form_post(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"]["reason"], "INVALID_STEM_COUNT");
    assert!(sheet.is_empty());
}

#[tokio::test]
async fn missing_variety_is_a_bad_request() {
    let (app, _) = app();

    let body = FORM.replace("variedad=freedom&", "");
    let response = app.oneshot(form_post(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"]["details"]["reason"],
        "MISSING_FIELD"
    );
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let (app, _) = app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/submissions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn unlisted_client_is_forbidden() {
    let sheet = Arc::new(InMemoryStore::new("sheet"));
    let config = ServerConfig {
        allowed_ips: vec!["10.0.0.".into()],
        ..Default::default()
    };
    let app = app_with(config, sheet.clone());

    let mut blocked = form_post(FORM);
    blocked
        .headers_mut()
        .insert("x-forwarded-for", "192.168.1.20".parse().unwrap());
    let response = app.clone().oneshot(blocked).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["error"]["code"], "FORBIDDEN");
    assert!(sheet.is_empty());

    let mut allowed = form_post(FORM);
    allowed
        .headers_mut()
        .insert("x-forwarded-for", "10.0.0.15".parse().unwrap());
    let response = app.oneshot(allowed).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(sheet.len(), 1);
}

#[tokio::test]
async fn store_failure_hides_the_detail() {
    let app = app_with(ServerConfig::default(), Arc::new(DownStore));

    let response = app.oneshot(form_post(FORM)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "STORE_ERROR");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(!message.contains("sheet offline"));
}

#[tokio::test]
async fn form_options_for_vendela_block() {
    let (app, _) = app();

    let request = Request::builder()
        .uri("/api/v1/form-options?bloque=1")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["block"], "1");
    assert_eq!(body["default_variety"], "vendela");
    assert_eq!(body["varieties"][0]["value"], "vendela");
    assert_eq!(body["varieties"][0]["sizes"], serde_json::json!(["ruso", "na"]));
}

#[tokio::test]
async fn national_form_offers_no_sizes() {
    let (app, _) = app();

    let request = Request::builder()
        .uri("/api/v1/form-options?block=1&type=national")
        .body(Body::empty())
        .unwrap();
    let body = json_body(app.oneshot(request).await.unwrap()).await;
    assert_eq!(body["record_type"], "national");
    for variety in body["varieties"].as_array().unwrap() {
        assert_eq!(variety["sizes"], serde_json::json!([]));
    }
}

#[tokio::test]
async fn unknown_record_type_in_form_options_is_rejected() {
    let (app, _) = app();

    let request = Request::builder()
        .uri("/api/v1/form-options?type=weekly")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_and_readiness() {
    let (app, _) = app();

    let health = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(json_body(health).await["status"], "healthy");

    let ready = app
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(ready.status(), StatusCode::OK);
    let body = json_body(ready).await;
    assert_eq!(body["components"]["stores"], serde_json::json!(["sheet"]));
    assert_eq!(body["components"]["identity_policy"], "exact");
}

#[tokio::test]
async fn metrics_without_recorder_is_not_found() {
    let (app, _) = app();

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (app, _) = app();

    for uri in ["/nope", "/api/v1/metadata"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(json_body(response).await["error"]["code"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn api_info_lists_only_served_endpoints() {
    let (app, _) = app();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let endpoints = body["endpoints"].as_array().unwrap();
    assert!(endpoints.contains(&Value::from("/api/v1/form-options")));
    assert!(!endpoints.contains(&Value::from("/api/v1/metadata")));
}
