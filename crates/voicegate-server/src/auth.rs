//! Caller authentication.
//!
//! Callers present `Authorization: Bearer <jwt>` issued by the identity
//! provider (HS256, shared key). The `sub` claim is the uid; the optional
//! `premium` custom claim is trusted as-is. Credentials issued before the
//! account's revocation cut-off are rejected.

use actix_web::HttpRequest;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use voicegate::{CallerIdentity, IdentityError};

use crate::db::Database;
use crate::error::ApiError;

/// Claims carried by a caller credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialClaims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium: Option<bool>,
}

pub struct CredentialVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl CredentialVerifier {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Check signature and expiry.
    pub fn verify(&self, token: &str) -> Result<CredentialClaims, IdentityError> {
        let data = decode::<CredentialClaims>(token, &self.key, &self.validation)
            .map_err(|e| IdentityError::InvalidCredential(e.to_string()))?;
        if data.claims.sub.is_empty() {
            return Err(IdentityError::InvalidCredential("empty subject".to_string()));
        }
        Ok(data.claims)
    }
}

/// Extract the bearer token from the `Authorization` header.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the caller of `req`, or fail with `Unauthenticated`.
pub fn authenticate(
    req: &HttpRequest,
    verifier: &CredentialVerifier,
    db: &Database,
) -> Result<CallerIdentity, ApiError> {
    let token = bearer_token(req).ok_or(ApiError::Unauthenticated)?;

    let claims = verifier.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "rejected caller credential");
        ApiError::Unauthenticated
    })?;

    if let Some(cutoff) = db.tokens_valid_after(&claims.sub)? {
        if claims.iat.unwrap_or(0) < cutoff {
            tracing::debug!(uid = %claims.sub, "rejected revoked caller credential");
            return Err(ApiError::Unauthenticated);
        }
    }

    Ok(CallerIdentity {
        uid: claims.sub,
        premium_claim: claims.premium.unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &[u8], claims: &CredentialClaims) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    fn claims(sub: &str, premium: Option<bool>) -> CredentialClaims {
        let now = chrono::Utc::now().timestamp();
        CredentialClaims {
            sub: sub.to_string(),
            exp: (now + 3600) as usize,
            iat: Some(now),
            premium,
        }
    }

    #[test]
    fn test_verify_accepts_valid_token() {
        let verifier = CredentialVerifier::new(b"k");
        let verified = verifier.verify(&token(b"k", &claims("u1", Some(true)))).unwrap();
        assert_eq!(verified.sub, "u1");
        assert_eq!(verified.premium, Some(true));
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let verifier = CredentialVerifier::new(b"k");
        assert!(verifier.verify(&token(b"other", &claims("u1", None))).is_err());
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let verifier = CredentialVerifier::new(b"k");
        let mut expired = claims("u1", None);
        expired.exp = (chrono::Utc::now().timestamp() - 3600) as usize;
        assert!(verifier.verify(&token(b"k", &expired)).is_err());
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let verifier = CredentialVerifier::new(b"k");
        assert!(verifier.verify("not.a.jwt").is_err());
    }
}
