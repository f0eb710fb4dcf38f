use std::future::Future;

use super::models::CastVoteRequest;
use super::NtrovoteClient;
use crate::error::ClientError;

/// Vote submission, the only service call a ballot makes.
pub trait BallotApi: Send + Sync {
    fn cast_vote(
        &self,
        election_id: i64,
        nominee_id: i64,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}

impl BallotApi for NtrovoteClient {
    async fn cast_vote(&self, election_id: i64, nominee_id: i64) -> Result<(), ClientError> {
        let request = CastVoteRequest {
            election_id,
            nominee_id,
        };
        self.authenticated_post_unit("/vote", Some(&request)).await?;
        log::info!("Vote recorded for nominee {} in election {}", nominee_id, election_id);
        Ok(())
    }
}
