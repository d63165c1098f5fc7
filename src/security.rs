use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::User;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Password hashing
// =============================================================================

/// Hash a password with argon2id and a fresh random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| AppError::PasswordHash)
}

/// Verify a password against a stored argon2 hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

// =============================================================================
// Access tokens (HS256, JWT-compatible)
// =============================================================================

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub aud: String,
    /// User id as a string
    pub sub: String,
    pub roles: Vec<String>,
    pub scopes: Vec<String>,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

/// Issue a signed access token for a user
pub fn issue_token(user: &User, config: &Config) -> Result<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        iss: config.jwt_issuer.clone(),
        aud: config.jwt_audience.clone(),
        sub: user.id.to_string(),
        roles: user.roles.clone(),
        scopes: user.scopes.clone(),
        iat: now,
        nbf: now,
        exp: now + config.access_ttl_min * 60,
    };
    sign_token(&claims, &config.jwt_secret)
}

/// Sign claims into a compact `header.payload.signature` token
pub fn sign_token(claims: &Claims, secret: &str) -> Result<String> {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload =
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).map_err(|_| AppError::TokenSigning)?);
    let signing_input = format!("{header}.{payload}");

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AppError::TokenSigning)?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature}"))
}

/// Verify a token's signature and registered claims
pub fn verify_token(token: &str, config: &Config) -> Result<Claims> {
    let claims = decode_signed_claims(token, &config.jwt_secret).ok_or(AppError::Unauthorized)?;

    if claims.iss != config.jwt_issuer || claims.aud != config.jwt_audience {
        tracing::warn!("Token with wrong issuer or audience rejected");
        return Err(AppError::Unauthorized);
    }

    let now = chrono::Utc::now().timestamp();
    if now < claims.nbf || now >= claims.exp {
        return Err(AppError::Unauthorized);
    }

    Ok(claims)
}

/// Decode claims after checking only the signature.
///
/// The rate limiter uses this to key buckets by subject even when the token
/// has already expired.
pub fn decode_signed_claims(token: &str, secret: &str) -> Option<Claims> {
    let mut parts = token.splitn(3, '.');
    let header = parts.next()?;
    let payload = parts.next()?;
    let signature = parts.next()?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(header.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    let sig_bytes = URL_SAFE_NO_PAD.decode(signature).ok()?;
    mac.verify_slice(&sig_bytes).ok()?;

    let payload_bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&payload_bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn test_config() -> Config {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            database_url: String::new(),
            database_max_connections: 5,
            allowed_origins: vec![],
            jwt_secret: "test-secret".to_string(),
            jwt_issuer: "auth-service".to_string(),
            jwt_audience: "emr-gateway".to_string(),
            access_ttl_min: 30,
            rate_limit_rpm: 120,
            seed_user: false,
            audit_log_path: String::new(),
            environment: "test".to_string(),
        }
    }

    fn test_claims(now: i64) -> Claims {
        Claims {
            iss: "auth-service".to_string(),
            aud: "emr-gateway".to_string(),
            sub: Uuid::new_v4().to_string(),
            roles: vec!["MEDICO".to_string()],
            scopes: vec!["patients:read".to_string()],
            iat: now,
            nbf: now,
            exp: now + 1800,
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("secret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_verify_password_garbage_hash() {
        assert!(!verify_password("secret", "not-a-hash"));
    }

    #[test]
    fn test_sign_and_verify_roundtrip() {
        let config = test_config();
        let claims = test_claims(Utc::now().timestamp());
        let token = sign_token(&claims, &config.jwt_secret).unwrap();

        let verified = verify_token(&token, &config).unwrap();
        assert_eq!(verified.sub, claims.sub);
        assert_eq!(verified.roles, claims.roles);
        assert_eq!(verified.scopes, claims.scopes);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let config = test_config();
        let claims = test_claims(Utc::now().timestamp());
        let token = sign_token(&claims, "other-secret").unwrap();

        assert!(verify_token(&token, &config).is_err());
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let config = test_config();
        let claims = test_claims(Utc::now().timestamp());
        let token = sign_token(&claims, &config.jwt_secret).unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(br#"{"sub":"evil"}"#);
        parts[1] = &forged;
        let tampered = parts.join(".");

        assert!(verify_token(&tampered, &config).is_err());
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let config = test_config();
        let mut claims = test_claims(Utc::now().timestamp() - 7200);
        claims.exp = claims.iat + 1800;
        let token = sign_token(&claims, &config.jwt_secret).unwrap();

        assert!(verify_token(&token, &config).is_err());
        // Signature is still valid, so rate limiting can attribute the call
        assert!(decode_signed_claims(&token, &config.jwt_secret).is_some());
    }

    #[test]
    fn test_verify_rejects_wrong_audience() {
        let config = test_config();
        let mut claims = test_claims(Utc::now().timestamp());
        claims.aud = "other-gateway".to_string();
        let token = sign_token(&claims, &config.jwt_secret).unwrap();

        assert!(verify_token(&token, &config).is_err());
    }

    #[test]
    fn test_decode_rejects_malformed_token() {
        assert!(decode_signed_claims("not-a-token", "secret").is_none());
        assert!(decode_signed_claims("a.b", "secret").is_none());
    }
}
