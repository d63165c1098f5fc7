use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub dob: Option<NaiveDate>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Wire form of a patient; `created_at` stays internal
#[derive(Debug, Serialize)]
pub struct PatientResponse {
    pub id: Uuid,
    pub name: String,
    pub dob: Option<NaiveDate>,
    pub phone: Option<String>,
}

impl From<Patient> for PatientResponse {
    fn from(p: Patient) -> Self {
        Self {
            id: p.id,
            name: p.name,
            dob: p.dob,
            phone: p.phone,
        }
    }
}

/// Create/replace payload for a patient
#[derive(Debug, Deserialize)]
pub struct PatientBody {
    pub name: Option<String>,
    pub dob: Option<String>,
    pub phone: Option<String>,
}

impl PatientBody {
    /// Validate and normalize into `(name, dob, phone)`.
    ///
    /// Name is required after trimming; a present but empty dob counts as
    /// absent; phone is trimmed with empty collapsing to null.
    pub fn into_fields(self) -> Result<(String, Option<NaiveDate>, Option<String>)> {
        let name = self.name.as_deref().unwrap_or("").trim().to_string();
        if name.is_empty() {
            return Err(AppError::InvalidInput("name_required"));
        }

        let dob = match self.dob.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => Some(parse_dob(s)?),
            None => None,
        };

        let phone = self
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        Ok((name, dob, phone))
    }
}

/// Parse a `YYYY-MM-DD` date of birth
pub fn parse_dob(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| AppError::InvalidInputHint {
        code: "bad_dob_format",
        hint: "Use YYYY-MM-DD",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(name: Option<&str>, dob: Option<&str>, phone: Option<&str>) -> PatientBody {
        PatientBody {
            name: name.map(String::from),
            dob: dob.map(String::from),
            phone: phone.map(String::from),
        }
    }

    #[test]
    fn test_parse_dob() {
        assert_eq!(
            parse_dob("1990-05-17").unwrap(),
            NaiveDate::from_ymd_opt(1990, 5, 17).unwrap()
        );
        assert!(parse_dob("17/05/1990").is_err());
        assert!(parse_dob("1990-13-01").is_err());
    }

    #[test]
    fn test_into_fields_requires_name() {
        assert!(matches!(
            body(None, None, None).into_fields(),
            Err(AppError::InvalidInput("name_required"))
        ));
        assert!(body(Some("   "), None, None).into_fields().is_err());
    }

    #[test]
    fn test_into_fields_normalizes() {
        let (name, dob, phone) = body(Some("  Maria Silva "), Some("1985-01-02"), Some("  "))
            .into_fields()
            .unwrap();

        assert_eq!(name, "Maria Silva");
        assert_eq!(dob, NaiveDate::from_ymd_opt(1985, 1, 2));
        assert!(phone.is_none());
    }

    #[test]
    fn test_into_fields_bad_dob() {
        assert!(matches!(
            body(Some("Maria"), Some("02-01-1985"), None).into_fields(),
            Err(AppError::InvalidInputHint { code: "bad_dob_format", .. })
        ));
    }

    #[test]
    fn test_response_omits_created_at() {
        let patient = Patient {
            id: Uuid::new_v4(),
            name: "Maria".to_string(),
            dob: None,
            phone: Some("555-0100".to_string()),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(PatientResponse::from(patient)).unwrap();
        assert!(json.get("created_at").is_none());
        assert_eq!(json["name"], "Maria");
        assert_eq!(json["dob"], serde_json::Value::Null);
    }
}
