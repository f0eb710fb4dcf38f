use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::models::*;
use crate::auth::{ErrorBody, SessionStore};
use crate::error::ClientError;
use crate::settings::ClientSettings;

pub(crate) fn build_http_client(settings: &ClientSettings) -> Client {
    Client::builder()
        .timeout(settings.request_timeout())
        .build()
        .unwrap_or_else(|e| {
            log::warn!("Failed to configure HTTP client, using defaults: {}", e);
            Client::new()
        })
}

/// Turns a non-2xx response into a domain rejection or, for server faults, a transient error.
pub(crate) async fn rejection_from_response(response: Response) -> ClientError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = error_message(&text);

    if status.is_server_error() {
        ClientError::Transient(format!(
            "{} {}",
            status,
            message.unwrap_or_else(|| "Unknown error".to_string())
        ))
    } else {
        ClientError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.into_message(),
        Err(_) if !body.starts_with('{') && !body.starts_with('<') => Some(body.to_string()),
        Err(_) => None,
    }
}

/// Authenticated access to the election service. Every call carries the current session
/// token; a call the service refuses as unauthorized signs the session out.
#[derive(Clone)]
pub struct NtrovoteClient {
    client: Client,
    base_url: String,
    session: SessionStore,
}

impl NtrovoteClient {
    pub fn new(settings: &ClientSettings, session: SessionStore) -> Self {
        Self {
            client: build_http_client(settings),
            base_url: settings.api_base_url().to_string(),
            session,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub(crate) fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Attaches the bearer token, sends, and sorts the response into success or error.
    pub(crate) async fn send_authorized(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let token = self.session.token().ok_or(ClientError::Unauthorized)?;
        let response = request.bearer_auth(&token).send().await?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                // A newer login may have replaced the token while this call was out.
                if self.session.token().as_deref() == Some(token.as_str()) {
                    log::warn!("Service rejected the session ({}), signing out", response.status());
                    self.session.logout();
                }
                Err(ClientError::Unauthorized)
            }
            _ => Err(rejection_from_response(response).await),
        }
    }

    // Helper method for authenticated requests
    pub async fn authenticated_get<T>(&self, endpoint: &str) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let request = self.client.get(self.url(endpoint));
        let response = self.send_authorized(request).await?;
        Ok(response.json().await?)
    }

    pub async fn authenticated_post<T, B>(&self, endpoint: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: serde::Serialize,
    {
        let request = self
            .client
            .post(self.url(endpoint))
            .header("Content-Type", "application/json")
            .json(body);
        let response = self.send_authorized(request).await?;

        let response_text = response.text().await?;
        log::debug!("API response for {}: {}", endpoint, response_text);
        serde_json::from_str(&response_text)
            .map_err(|e| ClientError::Transient(format!("Unexpected response from {}: {}", endpoint, e)))
    }

    /// POST whose response body is not needed.
    pub async fn authenticated_post_unit<B>(&self, endpoint: &str, body: Option<&B>) -> Result<(), ClientError>
    where
        B: serde::Serialize,
    {
        let mut request = self.client.post(self.url(endpoint));
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send_authorized(request).await?;
        Ok(())
    }

    pub async fn authenticated_put<B>(&self, endpoint: &str, body: &B) -> Result<(), ClientError>
    where
        B: serde::Serialize,
    {
        let request = self.client.put(self.url(endpoint)).json(body);
        self.send_authorized(request).await?;
        Ok(())
    }

    pub async fn authenticated_delete(&self, endpoint: &str) -> Result<(), ClientError> {
        let request = self.client.delete(self.url(endpoint));
        self.send_authorized(request).await?;
        Ok(())
    }

    // Elections
    pub async fn get_all_elections(&self) -> Result<Vec<Election>, ClientError> {
        self.authenticated_get("/elections/admin/all").await
    }

    pub async fn get_active_elections(&self) -> Result<Vec<Election>, ClientError> {
        self.authenticated_get("/elections/active").await
    }

    /// Election with its nominees.
    pub async fn get_election(&self, election_id: i64) -> Result<Election, ClientError> {
        let endpoint = format!("/elections/{}", election_id);
        self.authenticated_get(&endpoint).await
    }

    pub async fn get_results(&self, election_id: i64) -> Result<Vec<NomineeResult>, ClientError> {
        let endpoint = format!("/elections/admin/{}/results", election_id);
        self.authenticated_get(&endpoint).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::test_tokens::*;
    use crate::routing::{Navigator, Route, View};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// One-shot service that answers its first request with 401. `received` fires once the
    /// request headers are in; the answer goes out after `release` fires.
    async fn refusing_service() -> (String, oneshot::Receiver<()>, oneshot::Sender<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let (received_tx, received_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut read = 0;
            while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf[read..]).await.unwrap();
                if n == 0 {
                    break;
                }
                read += n;
            }
            let _ = received_tx.send(());
            let _ = release_rx.await;
            socket
                .write_all(b"HTTP/1.1 401 Unauthorized\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                .await
                .unwrap();
        });

        (base_url, received_rx, release_tx)
    }

    fn admin_session() -> SessionStore {
        let session = SessionStore::in_memory();
        session.restore();
        session.login(&admin_token()).unwrap();
        session
    }

    #[test]
    fn error_message_reads_service_bodies() {
        assert_eq!(
            error_message(r#"{"error":"Already voted in this election"}"#).as_deref(),
            Some("Already voted in this election")
        );
        assert_eq!(error_message("Election is closed").as_deref(), Some("Election is closed"));
        assert_eq!(error_message("   "), None);
        assert_eq!(error_message("<html>oops</html>"), None);
        assert_eq!(error_message(r#"{"status":409}"#), None);
    }

    #[tokio::test]
    async fn calls_without_a_session_never_leave_the_client() {
        let session = SessionStore::in_memory();
        session.restore();
        // Nothing listens on port 9; reaching the network would give a transient error.
        let client = NtrovoteClient::new(&ClientSettings::with_base_url("http://127.0.0.1:9"), session);

        let err = client.get_active_elections().await.unwrap_err();
        assert_eq!(err, ClientError::Unauthorized);
    }

    #[tokio::test]
    async fn refused_session_signs_out_and_returns_to_login() {
        let (base_url, _received, release) = refusing_service().await;
        release.send(()).unwrap();

        let session = admin_session();
        let navigator = Navigator::new(session.clone(), Route::AdminDashboard);
        assert_eq!(navigator.location().view, View::Show(Route::AdminDashboard));
        let watcher = navigator.watch_session();
        let mut location = navigator.subscribe();

        let client = NtrovoteClient::new(&ClientSettings::with_base_url(base_url), session.clone());
        let err = client.get_all_elections().await.unwrap_err();
        assert_eq!(err, ClientError::Unauthorized);
        assert_eq!(session.token(), None);

        let moved = tokio::time::timeout(
            Duration::from_secs(2),
            location.wait_for(|l| l.view == View::Show(Route::AdminLogin)),
        )
        .await;
        assert!(matches!(moved, Ok(Ok(_))));
        watcher.abort();
    }

    #[tokio::test]
    async fn refusal_for_a_replaced_token_keeps_the_new_session() {
        let (base_url, received, release) = refusing_service().await;
        let session = admin_session();
        let client = NtrovoteClient::new(&ClientSettings::with_base_url(base_url), session.clone());

        let call = tokio::spawn({
            let client = client.clone();
            async move { client.get_all_elections().await }
        });
        received.await.unwrap();

        let replacement = make_token("second-admin", "ROLE_ADMIN", None);
        session.login(&replacement).unwrap();
        release.send(()).unwrap();

        assert_eq!(call.await.unwrap().unwrap_err(), ClientError::Unauthorized);
        assert_eq!(session.token().as_deref(), Some(replacement.as_str()));
    }
}
