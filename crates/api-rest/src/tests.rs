use super::*;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request as HttpRequest};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use pcm_core::infrastructure::signature::{EmbeddedWidgetCreationResult, SignatureService};
use pcm_core::{PcmResult, StorageBackend};
use serde_json::{json, Value};
use std::path::PathBuf;
use tower::ServiceExt;

const KEY: &str = "test-key";

struct StubSignature;

#[async_trait]
impl SignatureService for StubSignature {
    async fn create_embedded_widget(
        &self,
        _document: &[u8],
        _file_name: &str,
        _document_name: &str,
        _form_field_layer_template: Option<&str>,
        _signer_email: &str,
    ) -> PcmResult<EmbeddedWidgetCreationResult> {
        Ok(EmbeddedWidgetCreationResult {
            document_key: "DOC-KEY".into(),
            javascript: "<script></script>".into(),
        })
    }

    async fn get_signed_document(&self, _document_key: &str) -> PcmResult<Vec<u8>> {
        Ok(b"%PDF-signed".to_vec())
    }
}

fn app() -> Router {
    let cfg = Arc::new(
        PcmConfig::new(
            PathBuf::from("unused"),
            StorageBackend::Memory,
            "2.16.840.1.113883.3.467".into(),
        )
        .unwrap(),
    );
    let services = Services::with_collaborators(cfg.clone(), Arc::new(StubSignature), None).unwrap();
    router(AppState::new(cfg, services, Some(KEY.into())))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = HttpRequest::builder()
        .method(method)
        .uri(uri)
        .header(API_KEY_HEADER, KEY);
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let res = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn register_patient(app: &Router) -> u64 {
    let (status, patient) = send(
        app,
        Method::POST,
        "/patients",
        Some(json!({
            "username": "jdoe",
            "first_name": "John",
            "last_name": "Doe",
            "email": "john.doe@example.com",
            "medical_record_number": "MRN-1",
            "gender": "M"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = patient["id"].as_u64().unwrap();

    for provider in [
        json!({"kind": "organizational", "npi": "1083949036", "org_name": "Valley Health Clinic"}),
        json!({"kind": "individual", "npi": "1174858088", "first_name": "Jane", "last_name": "Smith"}),
    ] {
        let (status, _) = send(
            app,
            Method::POST,
            &format!("/patients/{id}/providers"),
            Some(provider),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    id
}

fn consent_terms() -> Value {
    let today = Utc::now().date_naive();
    json!({
        "name": "Share with Dr Smith",
        "start_date": (today + Duration::days(1)).to_string(),
        "end_date": (today + Duration::days(366)).to_string(),
        "organizational_providers_permitted_to_disclose": ["1083949036"],
        "providers_disclosure_is_made_to": ["1174858088"],
        "do_not_share_sensitivity_policy_codes": ["ETH"],
        "share_for_purpose_of_use_codes": ["TREAT"]
    })
}

#[tokio::test]
async fn health_is_open() {
    let res = app()
        .oneshot(HttpRequest::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_api_key() {
    let app = app();
    let res = app
        .clone()
        .oneshot(HttpRequest::get("/patients").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .oneshot(
            HttpRequest::get("/patients")
                .header(API_KEY_HEADER, "wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn save_then_conflict() {
    let app = app();
    let patient = register_patient(&app).await;
    let uri = format!("/patients/{patient}/consents");

    let (status, saved) = send(&app, Method::POST, &uri, Some(consent_terms())).await;
    assert_eq!(status, StatusCode::CREATED);
    let consent_id = saved["consent_id"].as_u64().unwrap();

    let (status, conflict) = send(&app, Method::POST, &uri, Some(consent_terms())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(conflict["conflicting_consent_id"], json!(consent_id));

    let (status, list) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["consents"][0]["stage"], "CONSENT_SAVED");
    assert_eq!(list["consents"][0]["recipient_provider_names"], json!(["Smith, Jane"]));

    let (_, count) = send(&app, Method::GET, "/consents/count", None).await;
    assert_eq!(count["count"], 1);
}

#[tokio::test]
async fn invalid_consent_is_bad_request() {
    let app = app();
    let patient = register_patient(&app).await;
    let mut terms = consent_terms();
    terms["end_date"] = terms["start_date"].clone();

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/patients/{patient}/consents"),
        Some(terms),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn consent_without_purpose_or_recipient_is_bad_request() {
    let app = app();
    let patient = register_patient(&app).await;
    let uri = format!("/patients/{patient}/consents");

    let mut no_purpose = consent_terms();
    no_purpose["share_for_purpose_of_use_codes"] = json!([]);
    let (status, _) = send(&app, Method::POST, &uri, Some(no_purpose)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut no_recipient = consent_terms();
    no_recipient["providers_disclosure_is_made_to"] = json!([]);
    let (status, _) = send(&app, Method::POST, &uri, Some(no_recipient)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, count) = send(&app, Method::GET, "/consents/count", None).await;
    assert_eq!(count["count"], 0);
}

#[tokio::test]
async fn unknown_consent_is_not_found() {
    let app = app();
    let (status, _) = send(&app, Method::GET, "/consents/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, "/consents/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn signing_flow_blocks_delete() {
    let app = app();
    let patient = register_patient(&app).await;
    let (_, saved) = send(
        &app,
        Method::POST,
        &format!("/patients/{patient}/consents"),
        Some(consent_terms()),
    )
    .await;
    let id = saved["consent_id"].as_u64().unwrap();

    let (status, widget) = send(&app, Method::POST, &format!("/consents/{id}/signature"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(widget["document_key"], "DOC-KEY");

    let (status, stage) = send(
        &app,
        Method::POST,
        &format!("/consents/{id}/signature/complete"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stage["stage"], "CONSENT_SIGNED");

    let (status, _) = send(&app, Method::DELETE, &format!("/consents/{id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, revocation) = send(
        &app,
        Method::POST,
        &format!("/consents/{id}/revocation"),
        Some(json!({"revocation_type": "NO NEVER"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(revocation["consent_id"], id);

    let (_, stage) = send(
        &app,
        Method::POST,
        &format!("/consents/{id}/revocation/complete"),
        None,
    )
    .await;
    assert_eq!(stage["stage"], "REVOCATION_REVOKED");

    let (_, pdf) = send(&app, Method::GET, &format!("/consents/{id}/revocation/pdf"), None).await;
    assert_eq!(pdf["revocation_type"], "NO NEVER");
}

#[tokio::test]
async fn unsigned_consent_can_be_deleted() {
    let app = app();
    let patient = register_patient(&app).await;
    let (_, saved) = send(
        &app,
        Method::POST,
        &format!("/patients/{patient}/consents"),
        Some(consent_terms()),
    )
    .await;
    let id = saved["consent_id"].as_u64().unwrap();

    let res = app
        .clone()
        .oneshot(
            HttpRequest::delete(format!("/consents/{id}"))
                .header(API_KEY_HEADER, KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn reference_codes_by_kind() {
    let app = app();
    let (status, codes) = send(&app, Method::GET, "/reference/purpose-of-use", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(codes["codes"]
        .as_array()
        .unwrap()
        .iter()
        .any(|c| c["code"] == "TREAT"));

    let (status, _) = send(&app, Method::GET, "/reference/horoscope", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
