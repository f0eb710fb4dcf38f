use reqwest::{Client, StatusCode};
use std::future::Future;

use super::models::*;
use crate::api::client::{build_http_client, rejection_from_response};
use crate::error::ClientError;
use crate::settings::ClientSettings;

/// The unauthenticated half of the election service: the endpoints that hand out tokens.
pub trait AuthApi: Send + Sync {
    fn send_otp(&self, phone: &str) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Returns the session token on success.
    fn verify_otp(
        &self,
        phone: &str,
        code: &str,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;

    /// Returns the session token on success.
    fn admin_login(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;
}

#[derive(Clone)]
pub struct AuthManager {
    client: Client,
    base_url: String,
}

impl AuthManager {
    pub fn new(settings: &ClientSettings) -> Self {
        Self {
            client: build_http_client(settings),
            base_url: settings.api_base_url().to_string(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn request_token<B: serde::Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<String, ClientError> {
        let response = self
            .client
            .post(self.url(endpoint))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let token: TokenResponse = response.json().await?;
                Ok(token.token)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let reason = rejection_from_response(response)
                    .await
                    .user_message("Authentication failed");
                Err(ClientError::Auth(reason))
            }
            _ => Err(rejection_from_response(response).await),
        }
    }
}

impl AuthApi for AuthManager {
    async fn send_otp(&self, phone: &str) -> Result<(), ClientError> {
        let body = SendOtpRequest { phone: phone.to_string() };
        let response = self
            .client
            .post(self.url("/auth/send-otp"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            log::info!("OTP dispatched to {}", phone);
            Ok(())
        } else {
            Err(rejection_from_response(response).await)
        }
    }

    async fn verify_otp(&self, phone: &str, code: &str) -> Result<String, ClientError> {
        let body = VerifyOtpRequest {
            phone: phone.to_string(),
            code: code.to_string(),
        };
        self.request_token("/auth/verify-otp", &body).await
    }

    async fn admin_login(&self, username: &str, password: &str) -> Result<String, ClientError> {
        let body = AdminLoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.request_token("/admin/login", &body).await
    }
}
