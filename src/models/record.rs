use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Clinical record (prontuário) row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MedicalRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    #[sqlx(rename = "type")]
    pub record_type: String,
    pub note: Option<String>,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    pub id: Uuid,
    pub patient_id: Uuid,
    #[serde(rename = "type")]
    pub record_type: String,
    pub note: Option<String>,
    pub ts: DateTime<Utc>,
}

impl From<MedicalRecord> for RecordResponse {
    fn from(r: MedicalRecord) -> Self {
        Self {
            id: r.id,
            patient_id: r.patient_id,
            record_type: r.record_type,
            note: r.note,
            ts: r.ts,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordBody {
    pub patient_id: Option<String>,
    #[serde(rename = "type")]
    pub record_type: Option<String>,
    pub note: Option<String>,
}

/// Full replacement; `patientId` is required, an absent note clears the field
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecordBody {
    pub patient_id: Option<String>,
    #[serde(rename = "type")]
    pub record_type: Option<String>,
    pub note: Option<String>,
}

/// Partial update; an absent `note` is left untouched while an explicit
/// null clears it, hence the nested Option
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchRecordBody {
    pub patient_id: Option<String>,
    #[serde(rename = "type")]
    pub record_type: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub note: Option<Option<String>>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}
