use std::sync::{Mutex, MutexGuard};

use super::auth_manager::AuthApi;
use super::models::Role;
use crate::error::ClientError;
use crate::helpers::{is_valid_phone, InFlight, PHONE_ERROR};
use crate::routing::{Navigator, Route};

pub const SEND_OTP_FAILED: &str = "Failed to send OTP";
pub const INVALID_OTP: &str = "Invalid OTP";
pub const OTP_REQUIRED: &str = "Please enter the OTP";
pub const INVALID_CREDENTIALS: &str = "Invalid Credentials";
pub const CREDENTIALS_REQUIRED: &str = "Please enter username and password";
pub const LOGIN_UNAVAILABLE: &str = "Login failed. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStep {
    AwaitingPhone,
    AwaitingOtp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoginResult {
    OtpSent,
    Success { role: Role, landing: Route },
    /// The step did not advance; the message is also kept on the controller.
    Error(String),
    /// A request for this step is still outstanding; nothing was done.
    Busy,
}

#[derive(Debug)]
struct VoterState {
    step: LoginStep,
    phone: String,
    message: Option<String>,
}

impl VoterState {
    fn fresh() -> Self {
        Self {
            step: LoginStep::AwaitingPhone,
            phone: String::new(),
            message: None,
        }
    }
}

/// Phone + OTP login for voters.
pub struct VoterLogin<A> {
    api: A,
    navigator: Navigator,
    state: Mutex<VoterState>,
    in_flight: InFlight,
}

impl<A: AuthApi> VoterLogin<A> {
    pub fn new(api: A, navigator: Navigator) -> Self {
        Self {
            api,
            navigator,
            state: Mutex::new(VoterState::fresh()),
            in_flight: InFlight::new(),
        }
    }

    pub fn step(&self) -> LoginStep {
        self.state().step
    }

    /// The number the OTP was sent to, once on the OTP step.
    pub fn phone(&self) -> Option<String> {
        let state = self.state();
        (state.step == LoginStep::AwaitingOtp).then(|| state.phone.clone())
    }

    pub fn message(&self) -> Option<String> {
        self.state().message.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_busy()
    }

    pub async fn submit_phone(&self, phone: &str) -> LoginResult {
        let Some(_pending) = self.in_flight.try_begin() else {
            return LoginResult::Busy;
        };

        if self.step() != LoginStep::AwaitingPhone {
            return LoginResult::Error("Invalid state for sending an OTP".to_string());
        }

        if !is_valid_phone(phone) {
            return self.fail(PHONE_ERROR.to_string());
        }

        match self.api.send_otp(phone).await {
            Ok(()) => {
                let mut state = self.state();
                state.step = LoginStep::AwaitingOtp;
                state.phone = phone.to_string();
                state.message = None;
                LoginResult::OtpSent
            }
            Err(e) => {
                log::warn!("OTP dispatch for {} failed: {}", phone, e);
                self.fail(e.user_message(SEND_OTP_FAILED))
            }
        }
    }

    pub async fn submit_otp(&self, code: &str) -> LoginResult {
        let Some(_pending) = self.in_flight.try_begin() else {
            return LoginResult::Busy;
        };

        let phone = match self.phone() {
            Some(phone) => phone,
            None => return LoginResult::Error("Invalid state for OTP verification".to_string()),
        };

        let code = code.trim();
        if code.is_empty() {
            return self.fail(OTP_REQUIRED.to_string());
        }

        let token = match self.api.verify_otp(&phone, code).await {
            Ok(token) => token,
            Err(e) => {
                log::warn!("OTP verification for {} failed: {}", phone, e);
                let message = if e.is_transient() { LOGIN_UNAVAILABLE } else { INVALID_OTP };
                return self.fail(message.to_string());
            }
        };

        match complete_login(&self.navigator, &token) {
            Ok(result) => {
                *self.state() = VoterState::fresh();
                result
            }
            Err(message) => self.fail(message),
        }
    }

    /// Returns to the phone step, dropping any entered code. Ignored while a request runs.
    pub fn back(&self) -> bool {
        if self.in_flight.is_busy() {
            return false;
        }
        let mut state = self.state();
        if state.step != LoginStep::AwaitingOtp {
            return false;
        }
        state.step = LoginStep::AwaitingPhone;
        state.message = None;
        true
    }

    /// Starts over from an empty phone step.
    pub fn reset(&self) {
        if !self.in_flight.is_busy() {
            *self.state() = VoterState::fresh();
        }
    }

    fn fail(&self, message: String) -> LoginResult {
        self.state().message = Some(message.clone());
        LoginResult::Error(message)
    }

    fn state(&self) -> MutexGuard<'_, VoterState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Username + password login for administrators.
pub struct AdminLogin<A> {
    api: A,
    navigator: Navigator,
    message: Mutex<Option<String>>,
    in_flight: InFlight,
}

impl<A: AuthApi> AdminLogin<A> {
    pub fn new(api: A, navigator: Navigator) -> Self {
        Self {
            api,
            navigator,
            message: Mutex::new(None),
            in_flight: InFlight::new(),
        }
    }

    pub fn message(&self) -> Option<String> {
        self.slot().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_busy()
    }

    pub async fn submit(&self, username: &str, password: &str) -> LoginResult {
        let Some(_pending) = self.in_flight.try_begin() else {
            return LoginResult::Busy;
        };

        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return self.fail(CREDENTIALS_REQUIRED);
        }

        let token = match self.api.admin_login(username, password).await {
            Ok(token) => token,
            Err(e) => {
                // Same message whichever field was wrong.
                log::warn!("Admin login for {} failed: {}", username, e);
                let message = if e.is_transient() { LOGIN_UNAVAILABLE } else { INVALID_CREDENTIALS };
                return self.fail(message);
            }
        };

        match complete_login(&self.navigator, &token) {
            Ok(result) => {
                *self.slot() = None;
                result
            }
            Err(message) => self.fail(&message),
        }
    }

    pub fn clear_message(&self) {
        *self.slot() = None;
    }

    fn fail(&self, message: &str) -> LoginResult {
        *self.slot() = Some(message.to_string());
        LoginResult::Error(message.to_string())
    }

    fn slot(&self) -> MutexGuard<'_, Option<String>> {
        self.message.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn complete_login(navigator: &Navigator, token: &str) -> Result<LoginResult, String> {
    match navigator.session().login(token) {
        Ok(role) => {
            let landing = Route::landing(role);
            navigator.navigate(landing);
            Ok(LoginResult::Success { role, landing })
        }
        Err(e @ ClientError::InvalidToken(_)) => {
            log::error!("Service issued an unusable token: {}", e);
            Err(LOGIN_UNAVAILABLE.to_string())
        }
        Err(e) => Err(e.user_message(LOGIN_UNAVAILABLE)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    Voter,
    Admin,
}

/// The login screen's two protocols behind one switch.
pub struct LoginFlow<A> {
    pub voter: VoterLogin<A>,
    pub admin: AdminLogin<A>,
    mode: LoginMode,
}

impl<A: AuthApi + Clone> LoginFlow<A> {
    pub fn new(api: A, navigator: Navigator, mode: LoginMode) -> Self {
        Self {
            voter: VoterLogin::new(api.clone(), navigator.clone()),
            admin: AdminLogin::new(api, navigator),
            mode,
        }
    }

    pub fn mode(&self) -> LoginMode {
        self.mode
    }

    /// Switching back to the voter tab always restarts at the phone step.
    pub fn set_mode(&mut self, mode: LoginMode) {
        if mode == LoginMode::Voter {
            self.voter.reset();
        } else {
            self.admin.clear_message();
        }
        self.mode = mode;
    }
}
