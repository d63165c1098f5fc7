use std::collections::hash_map::Entry;
use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::constants::{
    CANCELED_APPOINTMENT_STATUS, DEFAULT_APPOINTMENT_STATUS, IDEMPOTENCY_KEY_TTL_SECS,
    SCHEDULING_ROLES, SCOPE_SCHEDULING_READ, SCOPE_SCHEDULING_WRITE,
};
use crate::error::{AppError, Result};
use crate::identity::Identity;
use crate::models::{
    parse_patient_id,
    appointment::{parse_doctor_id, parse_when},
    Appointment, AppointmentResponse, CreateAppointmentBody, UpdateAppointmentBody,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAppointmentsParams {
    pub patient_id: Option<String>,
    pub upcoming: Option<String>,
}

/// List appointments in chronological order, optionally filtered by
/// patient and/or restricted to the future
pub async fn list_appointments(
    State(state): State<AppState>,
    caller: Identity,
    Query(params): Query<ListAppointmentsParams>,
) -> Result<Json<Vec<AppointmentResponse>>> {
    caller.require_scopes(&[SCOPE_SCHEDULING_READ])?;
    caller.require_any_role(SCHEDULING_ROLES)?;

    let patient_id = match params.patient_id.as_deref() {
        Some(pid) => Some(parse_patient_id(Some(pid))?),
        None => None,
    };
    let upcoming = params.upcoming.as_deref() == Some("true");

    let appointments = match (patient_id, upcoming) {
        (Some(pid), true) => {
            sqlx::query_as::<_, Appointment>(
                "SELECT * FROM appointments
                 WHERE patient_id = $1 AND when_ts >= now()
                 ORDER BY when_ts ASC",
            )
            .bind(pid)
            .fetch_all(&state.pool)
            .await?
        }
        (Some(pid), false) => {
            sqlx::query_as::<_, Appointment>(
                "SELECT * FROM appointments WHERE patient_id = $1 ORDER BY when_ts ASC",
            )
            .bind(pid)
            .fetch_all(&state.pool)
            .await?
        }
        (None, true) => {
            sqlx::query_as::<_, Appointment>(
                "SELECT * FROM appointments WHERE when_ts >= now() ORDER BY when_ts ASC",
            )
            .fetch_all(&state.pool)
            .await?
        }
        (None, false) => {
            sqlx::query_as::<_, Appointment>("SELECT * FROM appointments ORDER BY when_ts ASC")
                .fetch_all(&state.pool)
                .await?
        }
    };

    Ok(Json(
        appointments
            .into_iter()
            .map(AppointmentResponse::from)
            .collect(),
    ))
}

/// Schedule an appointment. Requires an `Idempotency-Key` header so
/// client retries cannot double-book.
pub async fn create_appointment(
    State(state): State<AppState>,
    caller: Identity,
    headers: HeaderMap,
    Json(body): Json<CreateAppointmentBody>,
) -> Result<(StatusCode, Json<AppointmentResponse>)> {
    caller.require_scopes(&[SCOPE_SCHEDULING_READ])?;
    caller.require_any_role(SCHEDULING_ROLES)?;

    // Replayed keys are rejected before the write-scope check
    claim_idempotency_key(&state, &headers)?;

    if !caller.has_scope(SCOPE_SCHEDULING_WRITE) {
        return Err(AppError::Forbidden("scheduling:write required"));
    }

    let patient_id = parse_patient_id(body.patient_id.as_deref())?;
    let doctor_id = parse_doctor_id(body.doctor_id.as_deref())?;
    let when_ts = parse_when(body.when.as_deref().unwrap_or(""))?;
    let status = body
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_APPOINTMENT_STATUS);

    let appointment = sqlx::query_as::<_, Appointment>(
        "INSERT INTO appointments (patient_id, doctor_id, when_ts, status)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(patient_id)
    .bind(&doctor_id)
    .bind(when_ts)
    .bind(status)
    .fetch_one(&state.pool)
    .await
    .map_err(AppError::from_write)?;

    state.audit.record(
        &caller.actor(),
        "appointment_create",
        Some(&appointment.id.to_string()),
    );
    tracing::info!("Appointment created for patient {}", patient_id);

    Ok((StatusCode::CREATED, Json(appointment.into())))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentResponse>> {
    caller.require_scopes(&[SCOPE_SCHEDULING_READ])?;
    caller.require_any_role(SCHEDULING_ROLES)?;

    let appointment = sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(appointment.into()))
}

/// Apply the supplied fields; a blank status is ignored rather than stored
pub async fn update_appointment(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateAppointmentBody>,
) -> Result<Json<AppointmentResponse>> {
    caller.require_scopes(&[SCOPE_SCHEDULING_READ])?;
    caller.require_any_role(SCHEDULING_ROLES)?;
    if !caller.has_scope(SCOPE_SCHEDULING_WRITE) {
        return Err(AppError::Forbidden("scheduling:write required"));
    }

    let existing = sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound)?;

    let patient_id = match body.patient_id.as_deref() {
        Some(pid) => parse_patient_id(Some(pid))?,
        None => existing.patient_id,
    };
    let doctor_id = match body.doctor_id.as_deref() {
        Some(d) => parse_doctor_id(Some(d))?,
        None => existing.doctor_id,
    };
    let when_ts = match body.when.as_deref() {
        Some(w) => parse_when(w)?,
        None => existing.when_ts,
    };
    let status = body
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .unwrap_or(existing.status);

    let appointment = sqlx::query_as::<_, Appointment>(
        "UPDATE appointments
         SET patient_id = $2, doctor_id = $3, when_ts = $4, status = $5
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(patient_id)
    .bind(&doctor_id)
    .bind(when_ts)
    .bind(&status)
    .fetch_one(&state.pool)
    .await
    .map_err(AppError::from_write)?;

    state
        .audit
        .record(&caller.actor(), "appointment_update", Some(&id.to_string()));

    Ok(Json(appointment.into()))
}

pub async fn delete_appointment(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    caller.require_scopes(&[SCOPE_SCHEDULING_READ])?;
    caller.require_any_role(SCHEDULING_ROLES)?;
    if !caller.has_scope(SCOPE_SCHEDULING_WRITE) {
        return Err(AppError::Forbidden("scheduling:write required"));
    }

    let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    state
        .audit
        .record(&caller.actor(), "appointment_delete", Some(&id.to_string()));

    Ok(StatusCode::NO_CONTENT)
}

/// Mark an appointment as canceled. The row is kept; status is an open
/// string, so no transition checks apply.
pub async fn cancel_appointment(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentResponse>> {
    caller.require_scopes(&[SCOPE_SCHEDULING_READ])?;
    caller.require_any_role(SCHEDULING_ROLES)?;
    if !caller.has_scope(SCOPE_SCHEDULING_WRITE) {
        return Err(AppError::Forbidden("scheduling:write required"));
    }

    let appointment = sqlx::query_as::<_, Appointment>(
        "UPDATE appointments SET status = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(CANCELED_APPOINTMENT_STATUS)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound)?;

    state
        .audit
        .record(&caller.actor(), "appointment_cancel", Some(&id.to_string()));

    Ok(Json(appointment.into()))
}

/// Consume the request's idempotency key, rejecting replays
fn claim_idempotency_key(state: &AppState, headers: &HeaderMap) -> Result<()> {
    let key = headers
        .get("idempotency-key")
        .and_then(|v| v.to_str().ok())
        .filter(|k| !k.is_empty())
        .ok_or(AppError::IdempotencyRequired)?;

    let mut seen = state
        .idempotency_keys
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    claim_key(&mut seen, key, chrono::Utc::now().timestamp())
}

/// Claim `key`; keys older than the TTL are dropped first so the set
/// stays bounded
fn claim_key(seen: &mut HashMap<String, i64>, key: &str, now: i64) -> Result<()> {
    seen.retain(|_, claimed_at| now - *claimed_at < IDEMPOTENCY_KEY_TTL_SECS);

    match seen.entry(key.to_string()) {
        Entry::Occupied(_) => Err(AppError::DuplicateRequest),
        Entry::Vacant(slot) => {
            slot.insert(now);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_key_rejects_replay() {
        let mut seen = HashMap::new();

        assert!(claim_key(&mut seen, "key-1", 1_000).is_ok());
        assert!(matches!(
            claim_key(&mut seen, "key-1", 1_001),
            Err(AppError::DuplicateRequest)
        ));
        assert!(claim_key(&mut seen, "key-2", 1_001).is_ok());
    }

    #[test]
    fn test_claim_key_expires_old_keys() {
        let mut seen = HashMap::new();

        assert!(claim_key(&mut seen, "key-1", 1_000).is_ok());
        // Once the TTL has passed the key can be claimed again
        assert!(claim_key(&mut seen, "key-1", 1_000 + IDEMPOTENCY_KEY_TTL_SECS).is_ok());
        assert_eq!(seen.len(), 1);
    }
}
