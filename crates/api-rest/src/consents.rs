//! Consent endpoints: saving, reading, exports, signing and revocation.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};

use crate::{convert, error_response, AppState};
use api_shared as api;
use pcm_core::services::dto::SaveOutcome;

const DEFAULT_PAGE_SIZE: usize = 20;

#[utoipa::path(
    get,
    path = "/patients/{id}/consents",
    params(("id" = u64, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Consents of the patient", body = api::ListConsentsRes),
        (status = 404, description = "Patient not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn list_patient_consents(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<api::ListConsentsRes>, (StatusCode, &'static str)> {
    let consents = state
        .services
        .consents
        .find_all_consents_dto_by_patient(id)
        .map_err(|e| error_response("List consents error", e))?;

    Ok(Json(api::ListConsentsRes {
        consents: consents.into_iter().map(convert::consent_summary).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/patients/{id}/consents",
    params(("id" = u64, Path, description = "Patient id")),
    request_body = api::ConsentTerms,
    responses(
        (status = 201, description = "Consent saved", body = api::SaveConsentRes),
        (status = 400, description = "Invalid dates, providers or codes"),
        (status = 404, description = "Patient or consent not found"),
        (status = 409, description = "Conflicts with an existing consent, or consent already sent for signature", body = api::SaveConsentRes)
    )
)]
/// Save a new consent, or edit an unsigned one when the body carries an id
///
/// # Returns
/// * `201` with the saved consent id
/// * `409` with the id of the conflicting consent when providers and dates overlap
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - the dates are missing, in the past, or out of order,
/// - a provider is not on the patient's list or appears on both sides,
/// - a code is unknown, or a consent assertion fails.
#[axum::debug_handler]
pub(crate) async fn save_consent(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(terms): Json<api::ConsentTerms>,
) -> Result<(StatusCode, Json<api::SaveConsentRes>), (StatusCode, &'static str)> {
    let outcome = state
        .services
        .consents
        .save_consent(convert::consent_dto(terms), id)
        .map_err(|e| error_response("Save consent error", e))?;

    Ok(match outcome {
        SaveOutcome::Saved(consent) => (
            StatusCode::CREATED,
            Json(api::SaveConsentRes {
                consent_id: consent.id,
                conflicting_consent_id: None,
            }),
        ),
        SaveOutcome::Conflict(conflicting) => (
            StatusCode::CONFLICT,
            Json(api::SaveConsentRes {
                consent_id: None,
                conflicting_consent_id: Some(conflicting),
            }),
        ),
    })
}

#[utoipa::path(
    get,
    path = "/consents",
    params(api::PageParams),
    responses(
        (status = 200, description = "A page of consents", body = api::ConsentEntriesRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn list_consent_entries(
    State(state): State<AppState>,
    Query(page): Query<api::PageParams>,
) -> Result<Json<api::ConsentEntriesRes>, (StatusCode, &'static str)> {
    let consents = state
        .services
        .consents
        .find_consent_entries(page.first.unwrap_or(0), page.max.unwrap_or(DEFAULT_PAGE_SIZE))
        .map_err(|e| error_response("List consent entries error", e))?;

    Ok(Json(api::ConsentEntriesRes {
        consents: consents.into_iter().filter_map(convert::consent_entry).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/consents/count",
    responses((status = 200, description = "Number of stored consents", body = api::CountRes))
)]
#[axum::debug_handler]
pub(crate) async fn count_consents(
    State(state): State<AppState>,
) -> Result<Json<api::CountRes>, (StatusCode, &'static str)> {
    let count = state
        .services
        .consents
        .count_all_consents()
        .map_err(|e| error_response("Count consents error", e))?;
    Ok(Json(api::CountRes { count }))
}

#[utoipa::path(
    get,
    path = "/consents/{id}",
    params(("id" = u64, Path, description = "Consent id")),
    responses(
        (status = 200, description = "Consent terms", body = api::ConsentTerms),
        (status = 404, description = "Consent not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_consent(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<api::ConsentTerms>, (StatusCode, &'static str)> {
    match state.services.consents.find_consent_dto(id) {
        Ok(Some(dto)) => Ok(Json(convert::consent_terms(dto))),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Not found")),
        Err(e) => Err(error_response("Get consent error", e)),
    }
}

#[utoipa::path(
    delete,
    path = "/consents/{id}",
    params(("id" = u64, Path, description = "Consent id")),
    responses(
        (status = 204, description = "Consent deleted"),
        (status = 404, description = "Consent not found"),
        (status = 409, description = "Signed consents cannot be deleted")
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_consent(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, (StatusCode, &'static str)> {
    let consents = &state.services.consents;
    let exists = consents
        .find_consent(id)
        .map_err(|e| error_response("Delete consent error", e))?
        .is_some();
    if !exists {
        return Err((StatusCode::NOT_FOUND, "Not found"));
    }

    match consents.delete_consent(id) {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err((StatusCode::CONFLICT, "Signed consents cannot be deleted")),
        Err(e) => Err(error_response("Delete consent error", e)),
    }
}

#[utoipa::path(
    get,
    path = "/consents/{id}/stage",
    params(("id" = u64, Path, description = "Consent id")),
    responses(
        (status = 200, description = "Signing stage of the consent document", body = api::StageRes),
        (status = 404, description = "Consent not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_consent_stage(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<api::StageRes>, (StatusCode, &'static str)> {
    let stage = state
        .services
        .consents
        .get_consent_signed_stage(id)
        .map_err(|e| error_response("Get consent stage error", e))?;
    Ok(Json(api::StageRes {
        consent_id: id,
        stage: stage.as_str().to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/consents/{id}/pdf",
    params(("id" = u64, Path, description = "Consent id")),
    responses(
        (status = 200, description = "Signed document if present, unsigned otherwise", body = api::ConsentPdfRes),
        (status = 404, description = "Consent not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_consent_pdf(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<api::ConsentPdfRes>, (StatusCode, &'static str)> {
    state
        .services
        .consents
        .find_consent_pdf_dto(id)
        .map(|pdf| Json(convert::consent_pdf(pdf)))
        .map_err(|e| error_response("Get consent PDF error", e))
}

#[utoipa::path(
    get,
    path = "/consents/{id}/xacml",
    params(("id" = u64, Path, description = "Consent id")),
    responses(
        (status = 200, description = "XACML policy", body = String, content_type = "application/xml"),
        (status = 404, description = "Consent not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_consent_xacml(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, (StatusCode, &'static str)> {
    let xml = state
        .services
        .consents
        .find_exported_xacml(id)
        .map_err(|e| error_response("Get XACML error", e))?;
    Ok(([(header::CONTENT_TYPE, "application/xml")], xml))
}

#[utoipa::path(
    get,
    path = "/consents/{id}/cdar2",
    params(("id" = u64, Path, description = "Consent id")),
    responses(
        (status = 200, description = "CDA R2 consent directive", body = String, content_type = "application/xml"),
        (status = 404, description = "Consent not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_consent_cdar2(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, (StatusCode, &'static str)> {
    let xml = state
        .services
        .consents
        .find_exported_cdar2(id)
        .map_err(|e| error_response("Get CDA R2 error", e))?;
    Ok(([(header::CONTENT_TYPE, "application/xml")], xml))
}

#[utoipa::path(
    get,
    path = "/consents/{id}/fhir",
    params(("id" = u64, Path, description = "Consent id")),
    responses(
        (status = 200, description = "FHIR Contract resource", body = String, content_type = "application/fhir+json"),
        (status = 404, description = "Consent not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_consent_fhir(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, (StatusCode, &'static str)> {
    let json = state
        .services
        .consents
        .render_fhir_contract(id)
        .map_err(|e| error_response("Render FHIR contract error", e))?;
    Ok(([(header::CONTENT_TYPE, "application/fhir+json")], json))
}

#[utoipa::path(
    post,
    path = "/consents/{id}/signature",
    params(("id" = u64, Path, description = "Consent id")),
    responses(
        (status = 200, description = "Signing widget for the consent document", body = api::SigningWidgetRes),
        (status = 404, description = "Consent not found"),
        (status = 409, description = "Consent already signed"),
        (status = 502, description = "Signature provider failed")
    )
)]
/// Send the consent document out for signature and return the embeddable widget.
#[axum::debug_handler]
pub(crate) async fn create_consent_signature(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<api::SigningWidgetRes>, (StatusCode, &'static str)> {
    let consents = &state.services.consents;
    let pdf = consents
        .find_consent_pdf_dto(id)
        .map_err(|e| error_response("Create signing widget error", e))?;
    let widget = consents
        .create_consent_embedded_widget(&pdf)
        .await
        .map_err(|e| error_response("Create signing widget error", e))?;

    Ok(Json(api::SigningWidgetRes {
        consent_id: id,
        document_key: widget.document_key,
        javascript: widget.javascript,
    }))
}

#[utoipa::path(
    post,
    path = "/consents/{id}/signature/complete",
    params(("id" = u64, Path, description = "Consent id")),
    responses(
        (status = 200, description = "Consent signed", body = api::StageRes),
        (status = 409, description = "Consent not awaiting signature"),
        (status = 502, description = "Signature provider or HIE failed")
    )
)]
/// Fetch the signed document from the signature provider and mark the consent signed.
#[axum::debug_handler]
pub(crate) async fn complete_consent_signature(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<api::StageRes>, (StatusCode, &'static str)> {
    let consent = state
        .services
        .consents
        .complete_consent_signing(id)
        .await
        .map_err(|e| error_response("Complete consent signing error", e))?;
    Ok(Json(api::StageRes {
        consent_id: id,
        stage: consent.stage().as_str().to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/consents/{id}/revocation",
    params(("id" = u64, Path, description = "Consent id")),
    request_body = api::RevocationReq,
    responses(
        (status = 200, description = "Signing widget for the revocation document", body = api::SigningWidgetRes),
        (status = 404, description = "Consent not found"),
        (status = 409, description = "Consent not signed or already revoked"),
        (status = 502, description = "Signature provider failed")
    )
)]
/// Generate a revocation document for a signed consent and send it out for signature.
#[axum::debug_handler]
pub(crate) async fn create_revocation(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<api::RevocationReq>,
) -> Result<Json<api::SigningWidgetRes>, (StatusCode, &'static str)> {
    let consents = &state.services.consents;
    let mut request = consents
        .find_consent_revokation_pdf_dto(id)
        .map_err(|e| error_response("Create revocation error", e))?;
    request.revocation_type = req.revocation_type;
    request.content = None;

    let widget = consents
        .create_revocation_embedded_widget(&request)
        .await
        .map_err(|e| error_response("Create revocation error", e))?;

    Ok(Json(api::SigningWidgetRes {
        consent_id: id,
        document_key: widget.document_key,
        javascript: widget.javascript,
    }))
}

#[utoipa::path(
    post,
    path = "/consents/{id}/revocation/complete",
    params(("id" = u64, Path, description = "Consent id")),
    responses(
        (status = 200, description = "Consent revoked", body = api::StageRes),
        (status = 409, description = "Revocation not awaiting signature"),
        (status = 502, description = "Signature provider failed")
    )
)]
#[axum::debug_handler]
pub(crate) async fn complete_revocation(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<api::StageRes>, (StatusCode, &'static str)> {
    let consent = state
        .services
        .consents
        .complete_revocation_signing(id)
        .await
        .map_err(|e| error_response("Complete revocation signing error", e))?;
    Ok(Json(api::StageRes {
        consent_id: id,
        stage: consent.stage().as_str().to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/consents/{id}/revocation/pdf",
    params(("id" = u64, Path, description = "Consent id")),
    responses(
        (status = 200, description = "Revocation type and signed revocation document", body = api::RevocationPdfRes),
        (status = 404, description = "Consent not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_revocation_pdf(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<api::RevocationPdfRes>, (StatusCode, &'static str)> {
    state
        .services
        .consents
        .find_consent_revokation_pdf_dto(id)
        .map(|dto| Json(convert::revocation_pdf(dto)))
        .map_err(|e| error_response("Get revocation PDF error", e))
}
