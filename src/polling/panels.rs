use super::poll_manager::PollManager;
use crate::api::{NomineeResult, NtrovoteClient, OtpEntry, VotingStats};

pub fn otp_panel(client: &NtrovoteClient) -> PollManager<Vec<OtpEntry>> {
    let client = client.clone();
    PollManager::global("OTP list", move || {
        let client = client.clone();
        async move { client.get_otps().await }
    })
}

pub fn stats_panel(client: &NtrovoteClient) -> PollManager<VotingStats> {
    let client = client.clone();
    PollManager::targeted("Voting statistics", move |election_id| {
        let client = client.clone();
        async move { client.get_voting_stats(election_id).await }
    })
}

pub fn results_panel(client: &NtrovoteClient) -> PollManager<Vec<NomineeResult>> {
    let client = client.clone();
    PollManager::targeted("Live results", move |election_id| {
        let client = client.clone();
        async move { client.get_results(election_id).await }
    })
}

/// The dashboard's three live panels. Statistics and results follow the selected election.
pub struct AdminPanels {
    pub otps: PollManager<Vec<OtpEntry>>,
    pub stats: PollManager<VotingStats>,
    pub results: PollManager<Vec<NomineeResult>>,
}

impl AdminPanels {
    pub fn new(client: &NtrovoteClient) -> Self {
        Self {
            otps: otp_panel(client),
            stats: stats_panel(client),
            results: results_panel(client),
        }
    }

    pub fn select_election(&mut self, election_id: Option<i64>) {
        self.stats.set_target(election_id);
        self.results.set_target(election_id);
    }

    pub fn teardown(&mut self) {
        self.otps.teardown();
        self.stats.teardown();
        self.results.teardown();
    }
}
