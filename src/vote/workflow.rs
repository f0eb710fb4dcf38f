use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::api::BallotApi;
use crate::auth::Role;
use crate::routing::{Navigator, Route};

pub const REDIRECT_DELAY: Duration = Duration::from_secs(2);
pub const ERROR_CLEAR_DELAY: Duration = Duration::from_secs(3);

pub const VOTE_FAILED: &str = "Failed to vote";
pub const VOTE_RECORDED: &str = "Vote cast successfully! Redirecting...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VotePhase {
    Selecting,
    Confirming,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoteAttempt {
    pub election_id: i64,
    pub selected: Option<i64>,
    pub phase: VotePhase,
    pub message: Option<String>,
}

impl VoteAttempt {
    fn new(election_id: i64) -> Self {
        Self {
            election_id,
            selected: None,
            phase: VotePhase::Selecting,
            message: None,
        }
    }
}

#[derive(Default)]
struct Timers {
    redirect: Option<JoinHandle<()>>,
    clear: Option<JoinHandle<()>>,
}

impl Timers {
    fn cancel_all(&mut self) {
        for handle in [self.redirect.take(), self.clear.take()].into_iter().flatten() {
            handle.abort();
        }
    }
}

/// One visit to one election's ballot. Dropping the workflow cancels the pending redirect and
/// message clearing.
pub struct VoteWorkflow<A> {
    api: A,
    navigator: Navigator,
    attempt: Arc<Mutex<VoteAttempt>>,
    timers: Mutex<Timers>,
}

impl<A: BallotApi> VoteWorkflow<A> {
    pub fn new(api: A, navigator: Navigator, election_id: i64) -> Self {
        Self {
            api,
            navigator,
            attempt: Arc::new(Mutex::new(VoteAttempt::new(election_id))),
            timers: Mutex::new(Timers::default()),
        }
    }

    pub fn snapshot(&self) -> VoteAttempt {
        self.attempt().clone()
    }

    pub fn phase(&self) -> VotePhase {
        self.attempt().phase
    }

    pub fn selected(&self) -> Option<i64> {
        self.attempt().selected
    }

    pub fn message(&self) -> Option<String> {
        self.attempt().message.clone()
    }

    pub fn can_cast(&self) -> bool {
        let attempt = self.attempt();
        attempt.phase == VotePhase::Selecting && attempt.selected.is_some()
    }

    /// Picks a nominee. From a failed attempt this is the retry and returns to selecting.
    pub fn select(&self, nominee_id: i64) -> bool {
        let mut attempt = self.attempt();
        match attempt.phase {
            VotePhase::Selecting => {}
            VotePhase::Failed => {
                if let Some(clear) = self.timers().clear.take() {
                    clear.abort();
                }
                attempt.phase = VotePhase::Selecting;
                attempt.message = None;
            }
            _ => return false,
        }
        attempt.selected = Some(nominee_id);
        true
    }

    /// Asks for confirmation. Without a selection nothing happens.
    pub fn cast(&self) -> bool {
        let mut attempt = self.attempt();
        if attempt.phase != VotePhase::Selecting || attempt.selected.is_none() {
            return false;
        }
        attempt.phase = VotePhase::Confirming;
        true
    }

    pub fn cancel(&self) -> bool {
        let mut attempt = self.attempt();
        if attempt.phase != VotePhase::Confirming {
            return false;
        }
        attempt.phase = VotePhase::Selecting;
        true
    }

    /// Submits the confirmed selection and returns the phase it ended in. Only the call that
    /// moves the attempt out of confirming submits anything.
    pub async fn confirm(&self) -> VotePhase {
        let (election_id, nominee_id) = {
            let mut attempt = self.attempt();
            let Some(nominee_id) = attempt.selected else {
                return attempt.phase;
            };
            if attempt.phase != VotePhase::Confirming {
                return attempt.phase;
            }
            attempt.phase = VotePhase::Submitting;
            (attempt.election_id, nominee_id)
        };

        let outcome = self.api.cast_vote(election_id, nominee_id).await;

        let mut attempt = self.attempt();
        match outcome {
            Ok(()) => {
                attempt.phase = VotePhase::Succeeded;
                attempt.message = Some(VOTE_RECORDED.to_string());
                self.schedule_redirect();
            }
            Err(e) => {
                log::warn!("Vote in election {} failed: {}", election_id, e);
                attempt.phase = VotePhase::Failed;
                attempt.message = Some(e.user_message(VOTE_FAILED));
                self.schedule_clear();
            }
        }
        attempt.phase
    }

    /// Cancels pending delayed actions. Called when the ballot is left.
    pub fn teardown(&self) {
        self.timers().cancel_all();
    }

    fn schedule_redirect(&self) {
        let navigator = self.navigator.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(REDIRECT_DELAY).await;
            navigator.navigate(Route::landing(Role::Voter));
        });
        if let Some(previous) = self.timers().redirect.replace(handle) {
            previous.abort();
        }
    }

    fn schedule_clear(&self) {
        let attempt = Arc::clone(&self.attempt);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(ERROR_CLEAR_DELAY).await;
            let mut attempt = attempt.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if attempt.phase == VotePhase::Failed {
                attempt.phase = VotePhase::Selecting;
                attempt.message = None;
            }
        });
        if let Some(previous) = self.timers().clear.replace(handle) {
            previous.abort();
        }
    }

    fn attempt(&self) -> MutexGuard<'_, VoteAttempt> {
        self.attempt.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn timers(&self) -> MutexGuard<'_, Timers> {
        self.timers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<A> Drop for VoteWorkflow<A> {
    fn drop(&mut self) {
        self.timers
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::test_tokens::voter_token;
    use crate::auth::SessionStore;
    use crate::error::ClientError;
    use crate::routing::View;

    #[derive(Clone, Default)]
    struct FakeBallot {
        submitted: Arc<Mutex<Vec<(i64, i64)>>>,
        error: Option<ClientError>,
        latency: Option<Duration>,
    }

    impl FakeBallot {
        fn submitted(&self) -> Vec<(i64, i64)> {
            self.submitted.lock().unwrap().clone()
        }
    }

    impl BallotApi for FakeBallot {
        async fn cast_vote(&self, election_id: i64, nominee_id: i64) -> Result<(), ClientError> {
            self.submitted.lock().unwrap().push((election_id, nominee_id));
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            match &self.error {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        }
    }

    fn voter_on_ballot(election_id: i64) -> Navigator {
        let session = SessionStore::in_memory();
        session.restore();
        session.login(&voter_token()).unwrap();
        let navigator = Navigator::new(session, Route::Ballot(election_id));
        assert_eq!(navigator.location().view, View::Show(Route::Ballot(election_id)));
        navigator
    }

    fn already_voted() -> ClientError {
        ClientError::Rejected {
            status: 409,
            message: Some("You have already voted in this election".into()),
        }
    }

    #[tokio::test]
    async fn cast_without_selection_does_nothing() {
        let workflow = VoteWorkflow::new(FakeBallot::default(), voter_on_ballot(1), 1);
        assert!(!workflow.can_cast());
        assert!(!workflow.cast());
        assert_eq!(workflow.phase(), VotePhase::Selecting);
        assert_eq!(workflow.confirm().await, VotePhase::Selecting);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_choice_is_never_submitted() {
        let api = FakeBallot::default();
        let workflow = VoteWorkflow::new(api.clone(), voter_on_ballot(4), 4);

        workflow.select(10);
        assert!(workflow.cast());
        assert!(!workflow.select(11));
        assert!(workflow.cancel());
        assert_eq!(workflow.selected(), Some(10));

        workflow.select(11);
        workflow.cast();
        assert_eq!(workflow.confirm().await, VotePhase::Succeeded);
        assert_eq!(api.submitted(), vec![(4, 11)]);
    }

    #[tokio::test(start_paused = true)]
    async fn success_redirects_home_after_two_seconds() {
        let navigator = voter_on_ballot(2);
        let workflow = VoteWorkflow::new(FakeBallot::default(), navigator.clone(), 2);
        workflow.select(5);
        workflow.cast();

        assert_eq!(workflow.confirm().await, VotePhase::Succeeded);
        assert_eq!(workflow.message().as_deref(), Some(VOTE_RECORDED));
        assert!(!workflow.select(6));
        assert!(!workflow.cast());

        tokio::time::sleep(Duration::from_millis(1900)).await;
        assert_eq!(navigator.location().view, View::Show(Route::Ballot(2)));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(navigator.location().view, View::Show(Route::VoterHome));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_clears_after_three_seconds() {
        let api = FakeBallot {
            error: Some(already_voted()),
            ..FakeBallot::default()
        };
        let workflow = VoteWorkflow::new(api, voter_on_ballot(3), 3);
        workflow.select(7);
        workflow.cast();

        assert_eq!(workflow.confirm().await, VotePhase::Failed);
        assert_eq!(
            workflow.message().as_deref(),
            Some("You have already voted in this election")
        );

        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert_eq!(workflow.phase(), VotePhase::Selecting);
        assert_eq!(workflow.message(), None);
        assert_eq!(workflow.selected(), Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_uses_generic_message() {
        let api = FakeBallot {
            error: Some(ClientError::Transient("timed out".into())),
            ..FakeBallot::default()
        };
        let workflow = VoteWorkflow::new(api, voter_on_ballot(3), 3);
        workflow.select(7);
        workflow.cast();

        workflow.confirm().await;
        assert_eq!(workflow.message().as_deref(), Some(VOTE_FAILED));
    }

    #[tokio::test(start_paused = true)]
    async fn second_confirm_does_not_resubmit() {
        let api = FakeBallot {
            latency: Some(Duration::from_millis(300)),
            ..FakeBallot::default()
        };
        let workflow = VoteWorkflow::new(api.clone(), voter_on_ballot(8), 8);
        workflow.select(1);
        workflow.cast();

        let (first, second) = tokio::join!(workflow.confirm(), workflow.confirm());
        assert_eq!(first, VotePhase::Succeeded);
        assert_eq!(second, VotePhase::Submitting);
        assert_eq!(api.submitted().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn leaving_the_ballot_cancels_the_redirect() {
        let navigator = voter_on_ballot(2);
        let workflow = VoteWorkflow::new(FakeBallot::default(), navigator.clone(), 2);
        workflow.select(5);
        workflow.cast();
        workflow.confirm().await;

        drop(workflow);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(navigator.location().view, View::Show(Route::Ballot(2)));
    }
}
