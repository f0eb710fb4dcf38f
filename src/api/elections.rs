use reqwest::multipart::{Form, Part};

use super::models::*;
use super::NtrovoteClient;
use crate::error::ClientError;

impl NtrovoteClient {
    pub async fn create_election(&self, election: &NewElection) -> Result<Election, ClientError> {
        if election.title.trim().is_empty() {
            return Err(ClientError::Validation("Election title is required".to_string()));
        }
        self.authenticated_post("/elections/admin", election).await
    }

    pub async fn update_election_status(
        &self,
        election_id: i64,
        status: ElectionStatus,
    ) -> Result<(), ClientError> {
        let endpoint = format!("/elections/admin/{}/status", election_id);
        self.authenticated_put(&endpoint, &StatusUpdate { status }).await
    }

    /// Deletes every vote cast in the election.
    pub async fn reset_election(&self, election_id: i64) -> Result<(), ClientError> {
        let endpoint = format!("/elections/admin/{}/reset", election_id);
        self.authenticated_post_unit::<()>(&endpoint, None).await
    }

    /// Closes the election and records the nominee with the most votes as winner.
    pub async fn finalize_election(&self, election_id: i64) -> Result<Election, ClientError> {
        let endpoint = format!("/elections/admin/{}/finalize", election_id);
        self.authenticated_post(&endpoint, &serde_json::json!({})).await
    }

    pub async fn delete_election(&self, election_id: i64) -> Result<(), ClientError> {
        let endpoint = format!("/elections/admin/{}", election_id);
        self.authenticated_delete(&endpoint).await
    }

    // Nominees
    pub async fn add_nominee(&self, election_id: i64, nominee: NewNominee) -> Result<Nominee, ClientError> {
        if nominee.name.trim().is_empty() {
            return Err(ClientError::Validation("Nominee name is required".to_string()));
        }

        let mut form = Form::new()
            .text("name", nominee.name)
            .text("details", nominee.details);
        if let Some(image) = nominee.image {
            let part = Part::bytes(image.bytes).file_name(image.file_name);
            form = form.part("image", part);
        }

        let endpoint = format!("/elections/admin/{}/nominees", election_id);
        let request = self.http().post(self.url(&endpoint)).multipart(form);
        let response = self.send_authorized(request).await?;
        Ok(response.json().await?)
    }

    pub async fn delete_nominee(&self, nominee_id: i64) -> Result<(), ClientError> {
        let endpoint = format!("/elections/admin/nominees/{}", nominee_id);
        self.authenticated_delete(&endpoint).await
    }
}
