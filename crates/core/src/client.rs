//! Single point of HTTP dispatch with uniform auth and error semantics.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{header, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    api::{
        AccountsApi, AuthApi, CardsApi, ListResponse, StoragesApi, TransactionsApi, UsersApi,
    },
    config::AppConfig,
    error::{ApiError, ApiResult},
    session::{SessionEvent, SessionStore},
};

/// HTTP client shared by every resource module.
///
/// All calls attach the session token when one is held, apply the fixed
/// request timeout, and funnel status handling through one place: a 401
/// from any request clears the session globally (once) before the error
/// reaches the caller. No retries, no caching.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
    events: mpsc::Sender<SessionEvent>,
}

impl ApiClient {
    /// Build a client from configuration, an explicit session store, and
    /// the channel session-expiry notifications are delivered on.
    pub fn new(
        config: &AppConfig,
        session: Arc<SessionStore>,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            events,
        })
    }

    /// The session store backing this client.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Auth operations.
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    /// Account operations.
    pub fn accounts(&self) -> AccountsApi<'_> {
        AccountsApi::new(self)
    }

    /// Card operations.
    pub fn cards(&self) -> CardsApi<'_> {
        CardsApi::new(self)
    }

    /// Cold-storage operations.
    pub fn storages(&self) -> StoragesApi<'_> {
        StoragesApi::new(self)
    }

    /// Ledger operations.
    pub fn transactions(&self) -> TransactionsApi<'_> {
        TransactionsApi::new(self)
    }

    /// User-profile operations.
    pub fn users(&self) -> UsersApi<'_> {
        UsersApi::new(self)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.dispatch(Method::GET, path, None::<&()>).await?;
        Ok(response.json().await?)
    }

    /// GET a list endpoint, normalizing both response shapes the backend
    /// has been observed to use: a bare array and `{"results": [...]}`.
    pub(crate) async fn get_list<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Vec<T>> {
        let response = self.dispatch(Method::GET, path, None::<&()>).await?;
        let list: ListResponse<T> = response.json().await?;
        Ok(list.into_items())
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.dispatch(Method::POST, path, Some(body)).await?;
        Ok(response.json().await?)
    }

    /// POST variant of [`ApiClient::get_list`] for lookup endpoints that
    /// take a body and return a list.
    pub(crate) async fn post_list<B, T>(&self, path: &str, body: &B) -> ApiResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.dispatch(Method::POST, path, Some(body)).await?;
        let list: ListResponse<T> = response.json().await?;
        Ok(list.into_items())
    }

    pub(crate) async fn put<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.dispatch(Method::PUT, path, Some(body)).await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn delete(&self, path: &str) -> ApiResult<()> {
        self.dispatch(Method::DELETE, path, None::<&()>).await?;
        Ok(())
    }

    async fn dispatch<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method, &url);
        if let Some(token) = self.session.token() {
            builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            // Global session invalidation; only the first 401 in flight
            // clears the store and notifies.
            if self.session.invalidate() {
                warn!("backend returned 401, session cleared");
                let _ = self.events.try_send(SessionEvent::Expired);
            }
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            return Err(ApiError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        debug!(%url, status = status.as_u16(), "request ok");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Card;
    use std::net::SocketAddr;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Serve `count` connections with the same canned response and collect
    /// the raw requests.
    async fn serve(response: String, count: usize) -> (SocketAddr, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for _ in 0..count {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buffer = vec![0u8; 8192];
                let read = socket.read(&mut buffer).await.unwrap();
                requests.push(String::from_utf8_lossy(&buffer[..read]).to_string());
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
            requests
        });
        (addr, handle)
    }

    fn test_config(addr: SocketAddr) -> AppConfig {
        AppConfig {
            base_url: format!("http://{addr}"),
            request_timeout_secs: 5,
            page_size: 10,
            scan_device: None,
            scan_fallback: false,
        }
    }

    fn logged_in_store() -> Arc<SessionStore> {
        let store = SessionStore::in_memory();
        store.set(crate::session::Session {
            token: "abc123".to_string(),
            profile: serde_json::from_value(serde_json::json!({
                "uuid": "7f8a1c9e-1111-4222-8333-444455556666",
                "first_name": "Ada",
                "last_name": "Obi",
                "phone": "08012345678",
                "address": "",
                "user_type": "ADMIN"
            }))
            .unwrap(),
        });
        Arc::new(store)
    }

    #[tokio::test]
    async fn authenticated_requests_carry_the_token_header() {
        let (addr, server) = serve(http_response("200 OK", "[]"), 1).await;
        let (tx, _rx) = mpsc::channel(4);
        let client = ApiClient::new(&test_config(addr), logged_in_store(), tx).unwrap();

        let cards: Vec<Card> = client.get_list("/api/cards/").await.unwrap();
        assert!(cards.is_empty());

        let requests = server.await.unwrap();
        assert!(requests[0].contains("authorization: Token abc123")
            || requests[0].contains("Authorization: Token abc123"));
    }

    #[tokio::test]
    async fn list_normalization_accepts_both_shapes() {
        let card = serde_json::json!({
            "uuid": "7f8a1c9e-1111-4222-8333-444455556666",
            "name_on_card": "ADA OBI",
            "is_blocked": false
        });
        let bare = serde_json::json!([card]).to_string();
        let enveloped = serde_json::json!({ "results": [card] }).to_string();

        let mut decoded = Vec::new();
        for body in [bare, enveloped] {
            let (addr, _server) = serve(http_response("200 OK", &body), 1).await;
            let (tx, _rx) = mpsc::channel(4);
            let client = ApiClient::new(&test_config(addr), logged_in_store(), tx).unwrap();
            let cards: Vec<Card> = client.get_list("/api/cards/").await.unwrap();
            decoded.push(cards);
        }

        assert_eq!(decoded[0].len(), 1);
        assert_eq!(decoded[0][0].uuid, decoded[1][0].uuid);
        assert_eq!(decoded[0][0].name_on_card, decoded[1][0].name_on_card);
    }

    #[tokio::test]
    async fn concurrent_401s_clear_the_session_once() {
        let body = serde_json::json!({"detail": "Invalid token."}).to_string();
        let (addr, _server) = serve(http_response("401 Unauthorized", &body), 2).await;
        let (tx, mut rx) = mpsc::channel(4);
        let store = logged_in_store();
        let client = ApiClient::new(&test_config(addr), Arc::clone(&store), tx).unwrap();

        let first = client.get::<serde_json::Value>("/api/accounts/");
        let second = client.get::<serde_json::Value>("/api/cards/");
        let (first, second) = tokio::join!(first, second);

        assert!(matches!(first, Err(ApiError::Unauthorized)));
        assert!(matches!(second, Err(ApiError::Unauthorized)));
        assert!(!store.is_authenticated());

        // Exactly one expiry notification regardless of how many requests
        // were in flight.
        assert_eq!(rx.recv().await, Some(SessionEvent::Expired));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn backend_errors_pass_the_raw_body_through() {
        let body = serde_json::json!({"phone": ["already exists"]}).to_string();
        let (addr, _server) = serve(http_response("400 Bad Request", &body), 1).await;
        let (tx, _rx) = mpsc::channel(4);
        let client = ApiClient::new(&test_config(addr), logged_in_store(), tx).unwrap();

        let result = client.get::<serde_json::Value>("/api/users/").await;
        match result {
            Err(ApiError::Backend { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body["phone"][0], "already exists");
            }
            other => panic!("expected backend error, got {other:?}"),
        }
    }
}
