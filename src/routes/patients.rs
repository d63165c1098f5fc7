use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::constants::{PATIENTS_ROLES, SCOPE_PATIENTS_READ, SCOPE_PATIENTS_WRITE};
use crate::error::{AppError, Result};
use crate::identity::Identity;
use crate::models::{Patient, PatientBody, PatientResponse};
use crate::AppState;

/// List all patients ordered by name
pub async fn list_patients(
    State(state): State<AppState>,
    caller: Identity,
) -> Result<Json<Vec<PatientResponse>>> {
    caller.require_scopes(&[SCOPE_PATIENTS_READ])?;
    caller.require_any_role(PATIENTS_ROLES)?;

    let patients = sqlx::query_as::<_, Patient>("SELECT * FROM patients ORDER BY name ASC")
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(patients.into_iter().map(PatientResponse::from).collect()))
}

/// Register a new patient
pub async fn create_patient(
    State(state): State<AppState>,
    caller: Identity,
    Json(body): Json<PatientBody>,
) -> Result<(StatusCode, Json<PatientResponse>)> {
    caller.require_scopes(&[SCOPE_PATIENTS_READ])?;
    caller.require_any_role(PATIENTS_ROLES)?;
    if !caller.has_scope(SCOPE_PATIENTS_WRITE) {
        return Err(AppError::Forbidden("patients:write required"));
    }

    let (name, dob, phone) = body.into_fields()?;

    let patient = sqlx::query_as::<_, Patient>(
        "INSERT INTO patients (name, dob, phone) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&name)
    .bind(dob)
    .bind(&phone)
    .fetch_one(&state.pool)
    .await?;

    state
        .audit
        .record(&caller.actor(), "patient_create", Some(&patient.id.to_string()));
    tracing::info!("Patient created: {}", patient.id);

    Ok((StatusCode::CREATED, Json(patient.into())))
}

pub async fn get_patient(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<PatientResponse>> {
    caller.require_scopes(&[SCOPE_PATIENTS_READ])?;
    caller.require_any_role(PATIENTS_ROLES)?;

    let patient = sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(patient.into()))
}

/// Replace a patient's name, dob and phone
pub async fn update_patient(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<PatientBody>,
) -> Result<Json<PatientResponse>> {
    caller.require_scopes(&[SCOPE_PATIENTS_READ])?;
    caller.require_any_role(PATIENTS_ROLES)?;
    if !caller.has_scope(SCOPE_PATIENTS_WRITE) {
        return Err(AppError::Forbidden("patients:write required"));
    }

    let (name, dob, phone) = body.into_fields()?;

    let patient = sqlx::query_as::<_, Patient>(
        "UPDATE patients SET name = $2, dob = $3, phone = $4 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&name)
    .bind(dob)
    .bind(&phone)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound)?;

    state
        .audit
        .record(&caller.actor(), "patient_update", Some(&id.to_string()));

    Ok(Json(patient.into()))
}

/// Delete a patient; records and appointments cascade at the database level
pub async fn delete_patient(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    caller.require_scopes(&[SCOPE_PATIENTS_READ])?;
    caller.require_any_role(PATIENTS_ROLES)?;
    if !caller.has_scope(SCOPE_PATIENTS_WRITE) {
        return Err(AppError::Forbidden("patients:write required"));
    }

    let result = sqlx::query("DELETE FROM patients WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    state
        .audit
        .record(&caller.actor(), "patient_delete", Some(&id.to_string()));
    tracing::info!("Patient deleted: {}", id);

    Ok(StatusCode::NO_CONTENT)
}
