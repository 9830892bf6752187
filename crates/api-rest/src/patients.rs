//! Patient, allergy and reference-code endpoints.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};

use crate::{convert, error_response, AppState};
use api_shared as api;
use pcm_core::domain::ReferenceKind;
use pcm_core::services::dto::PatientDto;
use pcm_core::services::fhir_service::FhirPatientService;
use pcm_core::PcmResult;

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "List of patients", body = api::ListPatientsRes),
        (status = 401, description = "Missing or invalid API key"),
        (status = 500, description = "Internal server error")
    )
)]
/// List every registered patient with their providers.
#[axum::debug_handler]
pub(crate) async fn list_patients(
    State(state): State<AppState>,
) -> Result<Json<api::ListPatientsRes>, (StatusCode, &'static str)> {
    let patients = state
        .services
        .patients
        .list_patients()
        .and_then(|all| {
            all.into_iter()
                .map(PatientDto::try_from)
                .collect::<PcmResult<Vec<_>>>()
        })
        .map_err(|e| error_response("List patients error", e))?;

    Ok(Json(api::ListPatientsRes {
        patients: patients.into_iter().map(convert::patient_res).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = api::CreatePatientReq,
    responses(
        (status = 201, description = "Patient created", body = api::PatientRes),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
/// Register a new patient
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - a required name, username or medical record number is blank,
/// - the email address is malformed,
/// - the username is already registered.
#[axum::debug_handler]
pub(crate) async fn create_patient(
    State(state): State<AppState>,
    Json(req): Json<api::CreatePatientReq>,
) -> Result<(StatusCode, Json<api::PatientRes>), (StatusCode, &'static str)> {
    let patient = state
        .services
        .patients
        .create_patient(convert::new_patient(req))
        .and_then(PatientDto::try_from)
        .map_err(|e| error_response("Create patient error", e))?;

    Ok((StatusCode::CREATED, Json(convert::patient_res(patient))))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = u64, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient", body = api::PatientRes),
        (status = 404, description = "Patient not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<api::PatientRes>, (StatusCode, &'static str)> {
    state
        .services
        .patients
        .find_patient_dto(id)
        .map(|p| Json(convert::patient_res(p)))
        .map_err(|e| error_response("Get patient error", e))
}

#[utoipa::path(
    post,
    path = "/patients/{id}/providers",
    params(("id" = u64, Path, description = "Patient id")),
    request_body = api::AddProviderReq,
    responses(
        (status = 200, description = "Updated patient", body = api::PatientRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Patient not found")
    )
)]
/// Add a provider to the patient's list, replacing any entry with the same NPI.
#[axum::debug_handler]
pub(crate) async fn add_provider(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<api::AddProviderReq>,
) -> Result<Json<api::PatientRes>, (StatusCode, &'static str)> {
    let patient = convert::provider(req)
        .and_then(|provider| state.services.patients.add_provider(id, provider))
        .and_then(PatientDto::try_from)
        .map_err(|e| error_response("Add provider error", e))?;

    Ok(Json(convert::patient_res(patient)))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/fhir",
    params(("id" = u64, Path, description = "Patient id")),
    responses(
        (status = 200, description = "FHIR Patient resource", body = String, content_type = "application/fhir+json"),
        (status = 404, description = "Patient not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_fhir_patient(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, (StatusCode, &'static str)> {
    let fhir = FhirPatientService::new(state.cfg.policy_domain_id());
    let json = state
        .services
        .patients
        .find_patient_dto(id)
        .and_then(|p| fhir.render_fhir_patient(&p))
        .map_err(|e| error_response("Render FHIR patient error", e))?;

    Ok(([(header::CONTENT_TYPE, "application/fhir+json")], json))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/allergies",
    params(("id" = u64, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Allergies of the patient", body = api::ListAllergiesRes),
        (status = 404, description = "Patient not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn list_allergies(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<api::ListAllergiesRes>, (StatusCode, &'static str)> {
    let allergies = state
        .services
        .patients
        .find_patient_dto(id)
        .and_then(|_| state.services.allergies.find_allergies_by_patient(id))
        .map_err(|e| error_response("List allergies error", e))?;

    Ok(Json(api::ListAllergiesRes {
        allergies: allergies.into_iter().filter_map(convert::allergy_res).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/patients/{id}/allergies",
    params(("id" = u64, Path, description = "Patient id")),
    request_body = api::AllergyReq,
    responses(
        (status = 201, description = "Allergy recorded", body = api::AllergyRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Patient not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_allergy(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<api::AllergyReq>,
) -> Result<(StatusCode, Json<api::AllergyRes>), (StatusCode, &'static str)> {
    let saved = state
        .services
        .patients
        .find_patient_dto(id)
        .and_then(|_| {
            state
                .services
                .allergies
                .save_allergy(convert::allergy(id, req))
        })
        .map_err(|e| error_response("Save allergy error", e))?;

    let res = convert::allergy_res(saved)
        .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))?;
    Ok((StatusCode::CREATED, Json(res)))
}

#[utoipa::path(
    get,
    path = "/reference/{kind}",
    params(("kind" = String, Path, description = "clinical-document-type, clinical-document-section-type, sensitivity-policy, purpose-of-use or result-status")),
    responses(
        (status = 200, description = "Reference codes", body = api::ListReferenceCodesRes),
        (status = 400, description = "Unknown reference kind")
    )
)]
#[axum::debug_handler]
pub(crate) async fn list_reference_codes(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<api::ListReferenceCodesRes>, (StatusCode, &'static str)> {
    let kind: ReferenceKind = kind.parse().map_err(|e| {
        tracing::error!("Reference codes error: {}", e);
        (StatusCode::BAD_REQUEST, "Unknown reference kind")
    })?;

    Ok(Json(api::ListReferenceCodesRes {
        kind: kind.as_str().to_string(),
        codes: state
            .services
            .references
            .list(kind)
            .iter()
            .map(convert::reference_code)
            .collect(),
    }))
}
