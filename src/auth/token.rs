use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::models::Role;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenError {
    #[error("token is empty")]
    Empty,
    #[error("token is not a three-part JWT")]
    Malformed,
    #[error("token payload is not valid base64url: {0}")]
    Encoding(String),
    #[error("token payload is not valid JSON: {0}")]
    Claims(String),
    #[error("token carries unknown role {0:?}")]
    UnknownRole(String),
    #[error("token expired")]
    Expired,
}

/// Claims issued by the election service alongside every session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub role: String,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub exp: Option<i64>,
}

/// A session token whose payload has been decoded. The role is only ever read from here.
#[derive(Clone, PartialEq)]
pub struct AccessToken {
    raw: String,
    claims: TokenClaims,
    role: Role,
}

impl AccessToken {
    /// Decodes `raw` without verifying the signature; the service does that on every call.
    pub fn decode(raw: &str) -> Result<Self, TokenError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TokenError::Empty);
        }

        let parts: Vec<&str> = raw.split('.').collect();
        if parts.len() != 3 || parts.iter().any(|part| part.is_empty()) {
            return Err(TokenError::Malformed);
        }

        let payload = URL_SAFE_NO_PAD
            .decode(parts[1].trim_end_matches('='))
            .map_err(|e| TokenError::Encoding(e.to_string()))?;
        let claims: TokenClaims =
            serde_json::from_slice(&payload).map_err(|e| TokenError::Claims(e.to_string()))?;

        let role = Role::from_claim(&claims.role)
            .ok_or_else(|| TokenError::UnknownRole(claims.role.clone()))?;

        if let Some(exp) = claims.exp {
            if exp <= chrono::Utc::now().timestamp() {
                return Err(TokenError::Expired);
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            claims,
            role,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn subject(&self) -> &str {
        &self.claims.sub
    }

    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("sub", &self.claims.sub)
            .field("role", &self.role)
            .field("exp", &self.claims.exp)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod test_tokens {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

    /// Builds an unsigned JWT the way the service lays them out.
    pub fn make_token(sub: &str, role: &str, exp: Option<i64>) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let mut claims = serde_json::json!({ "sub": sub, "role": role, "iat": 1_700_000_000 });
        if let Some(exp) = exp {
            claims["exp"] = serde_json::json!(exp);
        }
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.c2lnbmF0dXJl")
    }

    pub fn voter_token() -> String {
        make_token("+919876543210", "ROLE_USER", Some(far_future()))
    }

    pub fn admin_token() -> String {
        make_token("admin", "ROLE_ADMIN", Some(far_future()))
    }

    fn far_future() -> i64 {
        chrono::Utc::now().timestamp() + 86_400
    }
}
