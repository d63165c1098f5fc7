use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use serde_json::json;

/// Append-only JSON-lines audit trail for sensitive operations.
///
/// Every write endpoint and the patient summary record an event here in
/// addition to normal tracing output.
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Record an audit event. Failures are logged, never fatal.
    pub fn record(&self, actor: &str, action: &str, target: Option<&str>) {
        let mut event = json!({
            "ts": Utc::now().to_rfc3339(),
            "actor": actor,
            "action": action,
        });
        if let Some(target) = target {
            event["target"] = json!(target);
        }

        if let Err(e) = self.append(&event.to_string()) {
            tracing::error!("Audit log write failed: {}", e);
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_record_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let log = AuditLog::new(&path);

        log.record("anonymous", "auth_login_attempt", None);
        log.record("user-1", "patient_delete", Some("patient-9"));

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["actor"], "anonymous");
        assert_eq!(first["action"], "auth_login_attempt");
        assert!(first.get("target").is_none());
        assert!(first["ts"].as_str().is_some());

        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["target"], "patient-9");
    }
}
