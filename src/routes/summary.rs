use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::constants::{
    SCOPE_PATIENTS_READ, SCOPE_RECORDS_READ, SCOPE_SCHEDULING_READ, SUMMARY_RECENT_RECORDS,
    SUMMARY_ROLES,
};
use crate::error::{AppError, Result};
use crate::identity::Identity;
use crate::models::{
    Appointment, AppointmentResponse, MedicalRecord, Patient, PatientResponse, RecordResponse,
};
use crate::AppState;

/// Aggregated view of one patient: identity, recent records and upcoming
/// appointments, fetched concurrently
pub async fn patient_summary(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>> {
    caller.require_scopes(&[
        SCOPE_PATIENTS_READ,
        SCOPE_RECORDS_READ,
        SCOPE_SCHEDULING_READ,
    ])?;
    caller.require_any_role(SUMMARY_ROLES)?;

    let patient = sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool);
    let records = sqlx::query_as::<_, MedicalRecord>(
        "SELECT * FROM records WHERE patient_id = $1 ORDER BY ts DESC LIMIT $2",
    )
    .bind(id)
    .bind(SUMMARY_RECENT_RECORDS)
    .fetch_all(&state.pool);
    let appointments = sqlx::query_as::<_, Appointment>(
        "SELECT * FROM appointments
         WHERE patient_id = $1 AND when_ts >= now()
         ORDER BY when_ts ASC",
    )
    .bind(id)
    .fetch_all(&state.pool);

    let (patient, records, appointments) = tokio::try_join!(patient, records, appointments)?;
    let patient = patient.ok_or(AppError::NotFound)?;

    state
        .audit
        .record(&caller.actor(), "patient_summary", Some(&id.to_string()));

    Ok(Json(json!({
        "patient": PatientResponse::from(patient),
        "recentRecords": records
            .into_iter()
            .map(RecordResponse::from)
            .collect::<Vec<_>>(),
        "upcomingAppointments": appointments
            .into_iter()
            .map(AppointmentResponse::from)
            .collect::<Vec<_>>(),
    })))
}
