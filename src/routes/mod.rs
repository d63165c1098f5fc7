pub mod appointments;
pub mod auth;
pub mod health;
pub mod patients;
pub mod records;
pub mod summary;

pub use appointments::{
    cancel_appointment, create_appointment, delete_appointment, get_appointment,
    list_appointments, update_appointment,
};
pub use auth::{login, refresh};
pub use health::health_check;
pub use patients::{create_patient, delete_patient, get_patient, list_patients, update_patient};
pub use records::{
    create_record, delete_record, get_record, list_records, patch_record, update_record,
};
pub use summary::patient_summary;
