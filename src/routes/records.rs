use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::constants::{
    DEFAULT_RECORDS_PAGE_LIMIT, DEFAULT_RECORD_TYPE, MAX_RECORDS_PAGE_LIMIT, RECORDS_ROLES,
    SCOPE_RECORDS_READ, SCOPE_RECORDS_WRITE,
};
use crate::error::{AppError, Result};
use crate::identity::Identity;
use crate::models::{
    parse_patient_id, CreateRecordBody, MedicalRecord, PatchRecordBody, RecordResponse,
    UpdateRecordBody,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRecordsParams {
    pub patient_id: Option<String>,
    pub limit: Option<i64>,
}

/// List records, newest first, optionally filtered by patient
pub async fn list_records(
    State(state): State<AppState>,
    caller: Identity,
    Query(params): Query<ListRecordsParams>,
) -> Result<Json<Vec<RecordResponse>>> {
    caller.require_scopes(&[SCOPE_RECORDS_READ])?;
    caller.require_any_role(RECORDS_ROLES)?;

    let limit = params
        .limit
        .unwrap_or(DEFAULT_RECORDS_PAGE_LIMIT)
        .clamp(1, MAX_RECORDS_PAGE_LIMIT);

    let records = match params.patient_id.as_deref() {
        Some(pid) => {
            let pid = parse_patient_id(Some(pid))?;
            sqlx::query_as::<_, MedicalRecord>(
                "SELECT * FROM records WHERE patient_id = $1 ORDER BY ts DESC LIMIT $2",
            )
            .bind(pid)
            .bind(limit)
            .fetch_all(&state.pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, MedicalRecord>("SELECT * FROM records ORDER BY ts DESC LIMIT $1")
                .bind(limit)
                .fetch_all(&state.pool)
                .await?
        }
    };

    Ok(Json(records.into_iter().map(RecordResponse::from).collect()))
}

/// Append a clinical record for a patient
pub async fn create_record(
    State(state): State<AppState>,
    caller: Identity,
    Json(body): Json<CreateRecordBody>,
) -> Result<(StatusCode, Json<RecordResponse>)> {
    caller.require_scopes(&[SCOPE_RECORDS_READ])?;
    caller.require_any_role(RECORDS_ROLES)?;
    if !caller.has_scope(SCOPE_RECORDS_WRITE) {
        return Err(AppError::Forbidden("records:write required"));
    }

    let patient_id = parse_patient_id(body.patient_id.as_deref())?;
    let record_type = body
        .record_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_RECORD_TYPE);

    // The patient_id foreign key rejects inserts for unknown patients
    let record = sqlx::query_as::<_, MedicalRecord>(
        "INSERT INTO records (patient_id, type, note) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(patient_id)
    .bind(record_type)
    .bind(&body.note)
    .fetch_one(&state.pool)
    .await
    .map_err(AppError::from_write)?;

    state
        .audit
        .record(&caller.actor(), "record_create", Some(&record.id.to_string()));
    tracing::info!("Record created for patient {}", patient_id);

    Ok((StatusCode::CREATED, Json(record.into())))
}

pub async fn get_record(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<RecordResponse>> {
    caller.require_scopes(&[SCOPE_RECORDS_READ])?;
    caller.require_any_role(RECORDS_ROLES)?;

    let record = sqlx::query_as::<_, MedicalRecord>("SELECT * FROM records WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(record.into()))
}

/// Full replacement: patientId required, type keeps its old value when
/// omitted, note is overwritten with whatever was sent
pub async fn update_record(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateRecordBody>,
) -> Result<Json<RecordResponse>> {
    caller.require_scopes(&[SCOPE_RECORDS_READ])?;
    caller.require_any_role(RECORDS_ROLES)?;
    if !caller.has_scope(SCOPE_RECORDS_WRITE) {
        return Err(AppError::Forbidden("records:write required"));
    }

    let existing = sqlx::query_as::<_, MedicalRecord>("SELECT * FROM records WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound)?;

    let patient_id = parse_patient_id(body.patient_id.as_deref())?;
    let record_type = body
        .record_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .unwrap_or(existing.record_type);

    let record = sqlx::query_as::<_, MedicalRecord>(
        "UPDATE records SET patient_id = $2, type = $3, note = $4 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(patient_id)
    .bind(&record_type)
    .bind(&body.note)
    .fetch_one(&state.pool)
    .await
    .map_err(AppError::from_write)?;

    state
        .audit
        .record(&caller.actor(), "record_update", Some(&id.to_string()));

    Ok(Json(record.into()))
}

/// Partial update: only supplied fields change; an explicit null note
/// clears it
pub async fn patch_record(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<PatchRecordBody>,
) -> Result<Json<RecordResponse>> {
    caller.require_scopes(&[SCOPE_RECORDS_READ])?;
    caller.require_any_role(RECORDS_ROLES)?;
    if !caller.has_scope(SCOPE_RECORDS_WRITE) {
        return Err(AppError::Forbidden("records:write required"));
    }

    let existing = sqlx::query_as::<_, MedicalRecord>("SELECT * FROM records WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound)?;

    let patient_id = match body.patient_id.as_deref() {
        Some(pid) => parse_patient_id(Some(pid))?,
        None => existing.patient_id,
    };
    let record_type = body
        .record_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .unwrap_or(existing.record_type);
    let note = match body.note {
        Some(note) => note,
        None => existing.note,
    };

    let record = sqlx::query_as::<_, MedicalRecord>(
        "UPDATE records SET patient_id = $2, type = $3, note = $4 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(patient_id)
    .bind(&record_type)
    .bind(&note)
    .fetch_one(&state.pool)
    .await
    .map_err(AppError::from_write)?;

    state
        .audit
        .record(&caller.actor(), "record_update", Some(&id.to_string()));

    Ok(Json(record.into()))
}

pub async fn delete_record(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    caller.require_scopes(&[SCOPE_RECORDS_READ])?;
    caller.require_any_role(RECORDS_ROLES)?;
    if !caller.has_scope(SCOPE_RECORDS_WRITE) {
        return Err(AppError::Forbidden("records:write required"));
    }

    let result = sqlx::query("DELETE FROM records WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    state
        .audit
        .record(&caller.actor(), "record_delete", Some(&id.to_string()));

    Ok(StatusCode::NO_CONTENT)
}
