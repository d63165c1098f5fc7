/// Record type used when the client does not supply one
pub const DEFAULT_RECORD_TYPE: &str = "evolucao";

/// Status assigned to new appointments when none is supplied
pub const DEFAULT_APPOINTMENT_STATUS: &str = "scheduled";

/// Status set by the cancel endpoint
pub const CANCELED_APPOINTMENT_STATUS: &str = "canceled";

/// Default page size for record listings
pub const DEFAULT_RECORDS_PAGE_LIMIT: i64 = 50;

/// Hard cap on record listing page size
pub const MAX_RECORDS_PAGE_LIMIT: i64 = 500;

/// Number of recent records included in a patient summary
pub const SUMMARY_RECENT_RECORDS: i64 = 10;

/// How long a consumed idempotency key stays on record
pub const IDEMPOTENCY_KEY_TTL_SECS: i64 = 86_400;

// =============================================================================
// Scopes
// =============================================================================

pub const SCOPE_PATIENTS_READ: &str = "patients:read";
pub const SCOPE_PATIENTS_WRITE: &str = "patients:write";
pub const SCOPE_RECORDS_READ: &str = "records:read";
pub const SCOPE_RECORDS_WRITE: &str = "records:write";
pub const SCOPE_SCHEDULING_READ: &str = "scheduling:read";
pub const SCOPE_SCHEDULING_WRITE: &str = "scheduling:write";

// =============================================================================
// Roles allowed per area
// =============================================================================

/// Roles allowed to access patient endpoints
pub const PATIENTS_ROLES: &[&str] = &["MEDICO", "ENFERMEIRO", "RECEPCIONISTA", "ADMIN"];

/// Roles allowed to access record endpoints
pub const RECORDS_ROLES: &[&str] = &["MEDICO", "ENFERMEIRO", "ADMIN"];

/// Roles allowed to access scheduling endpoints
pub const SCHEDULING_ROLES: &[&str] = &["MEDICO", "RECEPCIONISTA", "ADMIN"];

/// Roles allowed to read the aggregated patient summary
pub const SUMMARY_ROLES: &[&str] = &["MEDICO", "ENFERMEIRO", "RECEPCIONISTA", "ADMIN"];
