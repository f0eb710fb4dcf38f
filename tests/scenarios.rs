//! End-to-end controller scenarios against in-process fakes of the election service.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ntrovote_client::auth::login_flow::INVALID_CREDENTIALS;
use ntrovote_client::auth::{
    AdminLogin, AuthApi, LoginResult, LoginStep, MemoryStorage, Role, SessionStore, TokenStorage, VoterLogin,
};
use ntrovote_client::routing::{Navigator, Route, View};
use ntrovote_client::{BallotApi, ClientError, PollManager, VotePhase, VoteWorkflow, POLL_PERIOD};

fn make_token(sub: &str, role: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let exp = chrono::Utc::now().timestamp() + 3_600;
    let claims = serde_json::json!({ "sub": sub, "role": role, "exp": exp });
    format!("{}.{}.c2ln", header, URL_SAFE_NO_PAD.encode(claims.to_string()))
}

fn restored_session(storage: Arc<MemoryStorage>) -> SessionStore {
    let session = SessionStore::new(storage);
    session.restore();
    session
}

#[derive(Clone, Default)]
struct FakeAuth {
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeAuth {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl AuthApi for FakeAuth {
    async fn send_otp(&self, phone: &str) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push(format!("send-otp {}", phone));
        Ok(())
    }

    async fn verify_otp(&self, phone: &str, code: &str) -> Result<String, ClientError> {
        self.calls.lock().unwrap().push(format!("verify-otp {} {}", phone, code));
        if code == "123456" {
            Ok(make_token(phone, "ROLE_USER"))
        } else {
            Err(ClientError::Auth("Invalid OTP".to_string()))
        }
    }

    async fn admin_login(&self, username: &str, password: &str) -> Result<String, ClientError> {
        self.calls.lock().unwrap().push(format!("admin-login {}", username));
        if password == "correct horse" {
            Ok(make_token(username, "ROLE_ADMIN"))
        } else {
            Err(ClientError::Auth("Bad credentials".to_string()))
        }
    }
}

struct AlreadyVoted;

impl BallotApi for AlreadyVoted {
    async fn cast_vote(&self, _election_id: i64, _nominee_id: i64) -> Result<(), ClientError> {
        Err(ClientError::Rejected {
            status: 400,
            message: Some("You have already voted in this election".to_string()),
        })
    }
}

#[tokio::test]
async fn voter_signs_in_with_phone_and_otp() {
    let session = restored_session(Arc::new(MemoryStorage::new()));
    let navigator = Navigator::new(session.clone(), Route::Login);
    let auth = FakeAuth::default();
    let login = VoterLogin::new(auth.clone(), navigator.clone());

    assert_eq!(login.submit_phone("9876543210").await, LoginResult::OtpSent);
    assert_eq!(login.step(), LoginStep::AwaitingOtp);

    let result = login.submit_otp("123456").await;
    assert_eq!(
        result,
        LoginResult::Success {
            role: Role::Voter,
            landing: Route::VoterHome
        }
    );
    assert_eq!(session.role(), Some(Role::Voter));
    assert_eq!(navigator.location().view, View::Show(Route::VoterHome));
    assert_eq!(
        auth.calls(),
        vec!["send-otp 9876543210".to_string(), "verify-otp 9876543210 123456".to_string()]
    );
}

#[tokio::test]
async fn short_phone_number_never_reaches_the_service() {
    let session = restored_session(Arc::new(MemoryStorage::new()));
    let auth = FakeAuth::default();
    let login = VoterLogin::new(auth.clone(), Navigator::new(session, Route::Login));

    assert!(matches!(login.submit_phone("98765").await, LoginResult::Error(_)));
    assert_eq!(login.step(), LoginStep::AwaitingPhone);
    assert!(auth.calls().is_empty());
}

#[tokio::test]
async fn wrong_admin_password_leaves_no_session() {
    let storage = Arc::new(MemoryStorage::new());
    let session = restored_session(storage.clone());
    let navigator = Navigator::new(session.clone(), Route::AdminLogin);
    let login = AdminLogin::new(FakeAuth::default(), navigator.clone());

    let result = login.submit("admin", "hunter2").await;
    assert_eq!(result, LoginResult::Error(INVALID_CREDENTIALS.to_string()));
    assert_eq!(login.message().as_deref(), Some(INVALID_CREDENTIALS));
    assert_eq!(session.token(), None);
    assert_eq!(storage.load().unwrap(), None);
    assert_eq!(navigator.location().view, View::Show(Route::AdminLogin));
}

#[tokio::test]
async fn admin_lands_on_the_dashboard() {
    let session = restored_session(Arc::new(MemoryStorage::new()));
    let navigator = Navigator::new(session.clone(), Route::AdminLogin);
    let login = AdminLogin::new(FakeAuth::default(), navigator.clone());

    let result = login.submit("admin", "correct horse").await;
    assert!(matches!(result, LoginResult::Success { role: Role::Admin, .. }));
    assert_eq!(navigator.location().view, View::Show(Route::AdminDashboard));
}

#[tokio::test(start_paused = true)]
async fn already_voted_shows_the_reason_then_returns_to_selecting() {
    let session = restored_session(Arc::new(MemoryStorage::with_token(make_token("9876543210", "ROLE_USER"))));
    let navigator = Navigator::new(session, Route::Ballot(7));
    let workflow = VoteWorkflow::new(AlreadyVoted, navigator.clone(), 7);

    assert!(workflow.select(3));
    assert!(workflow.cast());
    assert_eq!(workflow.confirm().await, VotePhase::Failed);
    assert_eq!(
        workflow.message().as_deref(),
        Some("You have already voted in this election")
    );

    tokio::time::sleep(Duration::from_millis(2_900)).await;
    assert_eq!(workflow.phase(), VotePhase::Failed);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(workflow.phase(), VotePhase::Selecting);
    assert_eq!(workflow.message(), None);
    assert_eq!(navigator.location().view, View::Show(Route::Ballot(7)));
}

#[test]
fn admin_opening_a_voter_route_is_sent_to_the_dashboard() {
    let session = restored_session(Arc::new(MemoryStorage::with_token(make_token("admin", "ROLE_ADMIN"))));
    let navigator = Navigator::new(session, Route::Login);

    assert_eq!(navigator.navigate(Route::VoterHome), View::Show(Route::AdminDashboard));
    assert_eq!(navigator.navigate(Route::Ballot(4)), View::Show(Route::AdminDashboard));
}

#[test]
fn protected_route_waits_for_the_session_then_redirects() {
    let session = SessionStore::new(Arc::new(MemoryStorage::new()));
    let navigator = Navigator::new(session.clone(), Route::AdminDashboard);
    assert_eq!(navigator.location().view, View::Pending);

    session.restore();
    assert_eq!(navigator.regate(), View::Show(Route::AdminLogin));
}

#[test]
fn corrupted_stored_token_starts_signed_out() {
    let storage = Arc::new(MemoryStorage::with_token("not-a-jwt"));
    let session = restored_session(storage.clone());

    assert!(!session.current().is_loading());
    assert_eq!(session.token(), None);
    assert_eq!(session.role(), None);
    assert_eq!(storage.load().unwrap(), None);
}

fn counting_panel(fetches: Arc<AtomicUsize>) -> PollManager<usize> {
    PollManager::global("otps", move || {
        let fetches = fetches.clone();
        async move { Ok::<_, ClientError>(fetches.fetch_add(1, Ordering::SeqCst) + 1) }
    })
}

#[tokio::test(start_paused = true)]
async fn toggling_a_panel_twice_leaves_nothing_scheduled() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let mut panel = counting_panel(fetches.clone());

    panel.toggle();
    panel.toggle();
    assert!(!panel.is_scheduled());

    let settled = fetches.load(Ordering::SeqCst);
    tokio::time::sleep(POLL_PERIOD * 3).await;
    assert_eq!(fetches.load(Ordering::SeqCst), settled);
}

#[tokio::test(start_paused = true)]
async fn changing_target_fetches_the_new_one_once_immediately() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    let mut panel = PollManager::targeted("stats", move |id| {
        let recorder = recorder.clone();
        async move {
            recorder.lock().unwrap().push(id);
            Ok::<_, ClientError>(id)
        }
    });

    panel.set_target(Some(1));
    panel.set_visible(true);
    tokio::time::sleep(Duration::from_millis(10)).await;

    panel.set_target(Some(2));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    assert_eq!(panel.snapshot().data, Some(2));

    tokio::time::sleep(POLL_PERIOD).await;
    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 2]);

    panel.teardown();
}
