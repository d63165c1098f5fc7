pub mod appointment;
pub mod patient;
pub mod record;
pub mod user;

pub use appointment::{
    Appointment, AppointmentResponse, CreateAppointmentBody, UpdateAppointmentBody,
};
pub use patient::{Patient, PatientBody, PatientResponse};
pub use record::{
    CreateRecordBody, MedicalRecord, PatchRecordBody, RecordResponse, UpdateRecordBody,
};
pub use user::{LoginRequest, TokenResponse, User};

use uuid::Uuid;

use crate::error::{AppError, Result};

/// Parse a `patientId` body field into a UUID
pub fn parse_patient_id(value: Option<&str>) -> Result<Uuid> {
    value
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or(AppError::InvalidInput("bad_patient_id"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_patient_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_patient_id(Some(&id.to_string())).unwrap(), id);

        assert!(parse_patient_id(None).is_err());
        assert!(parse_patient_id(Some("")).is_err());
        assert!(parse_patient_id(Some("not-a-uuid")).is_err());
    }
}
