use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: String,
    pub when_ts: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentResponse {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: String,
    pub when: DateTime<Utc>,
    pub status: String,
}

impl From<Appointment> for AppointmentResponse {
    fn from(a: Appointment) -> Self {
        Self {
            id: a.id,
            patient_id: a.patient_id,
            doctor_id: a.doctor_id,
            when: a.when_ts,
            status: a.status,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentBody {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub when: Option<String>,
    pub status: Option<String>,
}

/// Partial update; only supplied fields are applied
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentBody {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub when: Option<String>,
    pub status: Option<String>,
}

/// Parse an ISO 8601 timestamp; both `Z` and explicit offsets are accepted
pub fn parse_when(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::InvalidInputHint {
            code: "bad_when",
            hint: "Use ISO 8601 (e.g. 2025-09-22T14:30:00Z)",
        })
}

/// Validate a doctor identifier: required, non-empty after trimming
pub fn parse_doctor_id(value: Option<&str>) -> Result<String> {
    let doctor = value.unwrap_or("").trim();
    if doctor.is_empty() {
        return Err(AppError::InvalidInput("doctor_id_required"));
    }
    Ok(doctor.to_string())
}
