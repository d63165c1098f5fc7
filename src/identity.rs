use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::security;
use crate::AppState;

/// Authenticated caller, extracted from the `Authorization` Bearer token.
///
/// Extraction fails with 401 when the header is missing or the token does
/// not verify. Scope and role checks are the handlers' responsibility.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub roles: Vec<String>,
    pub scopes: Vec<String>,
}

impl Identity {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    /// Require every listed scope
    pub fn require_scopes(&self, scopes: &[&str]) -> Result<()> {
        if scopes.iter().all(|s| self.has_scope(s)) {
            Ok(())
        } else {
            Err(AppError::Forbidden("missing scopes"))
        }
    }

    /// Require at least one of the listed roles
    pub fn require_any_role(&self, roles: &[&str]) -> Result<()> {
        if self.roles.iter().any(|r| roles.contains(&r.as_str())) {
            Ok(())
        } else {
            Err(AppError::Forbidden("missing role"))
        }
    }

    pub fn actor(&self) -> String {
        self.user_id.to_string()
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let claims = security::verify_token(token, &state.config)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;

        Ok(Identity {
            user_id,
            roles: claims.roles,
            scopes: claims.scopes,
        })
    }
}

/// Extract the Bearer token from an `Authorization` header, if any
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(roles: &[&str], scopes: &[&str]) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            roles: roles.iter().map(|s| s.to_string()).collect(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_require_scopes() {
        let caller = identity(&["MEDICO"], &["patients:read", "records:read"]);

        assert!(caller.require_scopes(&["patients:read"]).is_ok());
        assert!(caller
            .require_scopes(&["patients:read", "records:read"])
            .is_ok());
        assert!(caller.require_scopes(&["patients:write"]).is_err());
        // All listed scopes must be present
        assert!(caller
            .require_scopes(&["patients:read", "patients:write"])
            .is_err());
    }

    #[test]
    fn test_require_any_role() {
        let caller = identity(&["ENFERMEIRO"], &[]);

        assert!(caller.require_any_role(&["MEDICO", "ENFERMEIRO"]).is_ok());
        assert!(caller.require_any_role(&["MEDICO", "ADMIN"]).is_err());
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, "Basic abc".parse().unwrap());
        assert!(bearer_token(&headers).is_none());
    }
}
