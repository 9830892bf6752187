//! # API REST
//!
//! REST API implementation for PCM.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - API key checks on every route except `/health`
//!
//! Uses `api-shared` for request and response types.

#![warn(rust_2018_idioms)]

mod consents;
mod convert;
mod patients;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{validate_api_key, HealthService, API_KEY_HEADER};
use pcm_core::{PcmConfig, PcmError, Services};

/// Application state for the REST API
///
/// Holds the resolved configuration, every service, and the API key callers must present.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<PcmConfig>,
    services: Services,
    api_key: Option<Arc<str>>,
}

impl AppState {
    /// `api_key` of `None` leaves the API open, which is only meant for local development.
    pub fn new(cfg: Arc<PcmConfig>, services: Services, api_key: Option<String>) -> Self {
        Self {
            cfg,
            services,
            api_key: api_key.map(Arc::from),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        patients::list_patients,
        patients::create_patient,
        patients::get_patient,
        patients::add_provider,
        patients::get_fhir_patient,
        patients::list_allergies,
        patients::create_allergy,
        patients::list_reference_codes,
        consents::list_patient_consents,
        consents::save_consent,
        consents::list_consent_entries,
        consents::count_consents,
        consents::get_consent,
        consents::delete_consent,
        consents::get_consent_stage,
        consents::get_consent_pdf,
        consents::get_consent_xacml,
        consents::get_consent_cdar2,
        consents::get_consent_fhir,
        consents::create_consent_signature,
        consents::complete_consent_signature,
        consents::create_revocation,
        consents::complete_revocation,
        consents::get_revocation_pdf,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::CreatePatientReq,
        api_shared::ProviderKind,
        api_shared::AddProviderReq,
        api_shared::ProviderRes,
        api_shared::PatientRes,
        api_shared::ListPatientsRes,
        api_shared::ConsentTerms,
        api_shared::SaveConsentRes,
        api_shared::ConsentSummaryRes,
        api_shared::ListConsentsRes,
        api_shared::ConsentEntryRes,
        api_shared::ConsentEntriesRes,
        api_shared::CountRes,
        api_shared::StageRes,
        api_shared::ConsentPdfRes,
        api_shared::RevocationReq,
        api_shared::RevocationPdfRes,
        api_shared::SigningWidgetRes,
        api_shared::AllergyReq,
        api_shared::AllergyRes,
        api_shared::ListAllergiesRes,
        api_shared::ReferenceCodeRes,
        api_shared::ListReferenceCodesRes,
    ))
)]
struct ApiDoc;

/// Build the full REST router.
///
/// `/health` and the Swagger UI are open; every other route runs behind [`require_api_key`].
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/patients",
            get(patients::list_patients).post(patients::create_patient),
        )
        .route("/patients/:id", get(patients::get_patient))
        .route("/patients/:id/providers", post(patients::add_provider))
        .route("/patients/:id/fhir", get(patients::get_fhir_patient))
        .route(
            "/patients/:id/consents",
            get(consents::list_patient_consents).post(consents::save_consent),
        )
        .route(
            "/patients/:id/allergies",
            get(patients::list_allergies).post(patients::create_allergy),
        )
        .route("/consents", get(consents::list_consent_entries))
        .route("/consents/count", get(consents::count_consents))
        .route(
            "/consents/:id",
            get(consents::get_consent).delete(consents::delete_consent),
        )
        .route("/consents/:id/stage", get(consents::get_consent_stage))
        .route("/consents/:id/pdf", get(consents::get_consent_pdf))
        .route("/consents/:id/xacml", get(consents::get_consent_xacml))
        .route("/consents/:id/cdar2", get(consents::get_consent_cdar2))
        .route("/consents/:id/fhir", get(consents::get_consent_fhir))
        .route(
            "/consents/:id/signature",
            post(consents::create_consent_signature),
        )
        .route(
            "/consents/:id/signature/complete",
            post(consents::complete_consent_signature),
        )
        .route("/consents/:id/revocation", post(consents::create_revocation))
        .route(
            "/consents/:id/revocation/complete",
            post(consents::complete_revocation),
        )
        .route(
            "/consents/:id/revocation/pdf",
            get(consents::get_revocation_pdf),
        )
        .route("/reference/:kind", get(patients::list_reference_codes))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Reject requests whose `x-api-key` header does not match the configured key.
async fn require_api_key(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    if let Some(expected) = state.api_key.as_deref() {
        let provided = req
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        if let Err(e) = validate_api_key(provided, expected) {
            tracing::warn!("Rejected request to {}: {}", req.uri().path(), e);
            return Err((StatusCode::UNAUTHORIZED, "Invalid API key"));
        }
    }
    Ok(next.run(req).await)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = api_shared::HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<api_shared::HealthRes> {
    Json(HealthService::check_health())
}

/// Log a service error and map it onto a status code and a fixed message.
pub(crate) fn error_response(context: &'static str, e: PcmError) -> (StatusCode, &'static str) {
    tracing::error!("{}: {:?}", context, e);
    match e {
        PcmError::NotFound { .. } => (StatusCode::NOT_FOUND, "Not found"),
        PcmError::InvalidInput(_) | PcmError::Text(_) => (StatusCode::BAD_REQUEST, "Invalid input"),
        PcmError::DuplicateProviders => (
            StatusCode::BAD_REQUEST,
            "A provider cannot both disclose and receive",
        ),
        PcmError::Assertion { .. } => (StatusCode::BAD_REQUEST, "Consent assertion failed"),
        PcmError::InvalidState(_) => (
            StatusCode::CONFLICT,
            "Operation not allowed in the consent's current state",
        ),
        PcmError::Signature(_) | PcmError::Hie(_) => {
            (StatusCode::BAD_GATEWAY, "Upstream service error")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
    }
}

#[cfg(test)]
mod tests;
