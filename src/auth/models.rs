use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Voter,
    Admin,
}

impl Role {
    /// Maps the authority string the service puts in the token's `role` claim.
    pub fn from_claim(claim: &str) -> Option<Self> {
        match claim.trim() {
            "ROLE_USER" | "USER" => Some(Self::Voter),
            "ROLE_ADMIN" | "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Voter => "Voter",
            Self::Admin => "Admin",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendOtpRequest {
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    pub phone: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Body the service sends alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_claims() {
        assert_eq!(Role::from_claim("ROLE_USER"), Some(Role::Voter));
        assert_eq!(Role::from_claim("ROLE_ADMIN"), Some(Role::Admin));
        assert_eq!(Role::from_claim("ROLE_ROOT"), None);
    }

    #[test]
    fn error_body_prefers_error_field() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error":"Voter already eligible","message":"x"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Voter already eligible"));

        let body: ErrorBody = serde_json::from_str(r#"{"message":"Nominee deleted"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Nominee deleted"));
    }
}
