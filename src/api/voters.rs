use super::models::*;
use super::NtrovoteClient;
use crate::error::ClientError;

impl NtrovoteClient {
    /// Outstanding one-time codes, as the admin OTP panel shows them.
    pub async fn get_otps(&self) -> Result<Vec<OtpEntry>, ClientError> {
        self.authenticated_get("/admin/otps").await
    }

    pub async fn get_voting_stats(&self, election_id: i64) -> Result<VotingStats, ClientError> {
        let endpoint = format!("/admin/voting-stats/{}", election_id);
        self.authenticated_get(&endpoint).await
    }

    pub async fn get_eligible_voters(&self) -> Result<Vec<EligibleVoter>, ClientError> {
        self.authenticated_get("/admin/users").await
    }

    pub async fn add_eligible_voter(&self, phone: &str, name: &str) -> Result<EligibleVoter, ClientError> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(ClientError::Validation("Phone number is required".to_string()));
        }

        let request = NewVoter {
            phone: phone.to_string(),
            name: name.trim().to_string(),
        };
        self.authenticated_post("/admin/users", &request).await
    }

    pub async fn remove_eligible_voter(&self, phone: &str) -> Result<(), ClientError> {
        let endpoint = format!("/admin/users/{}", urlencoding::encode(phone.trim()));
        self.authenticated_delete(&endpoint).await
    }
}
