//! HTTP client for the relay, used by front ends and scripts.
//!
//! The client keeps the session cookie it was issued and replays it on every
//! call. [`RelayClient::monthly_report`] pulls raw entries and categories and
//! runs the same aggregation the server uses.

use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response, header};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::constants::{MAX_LIMIT, SESSION_COOKIE_NAME};
use crate::models::{
    Category, GetCategoriesResponse, GetEntriesQuery, GetEntriesResponse, ProfileResponse,
    PublicUser,
};
use crate::reports::{MonthlySummary, summarize_by_month};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("relay returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("not logged in")]
    NotLoggedIn,
    #[error("relay response did not carry a session cookie")]
    MissingCookie,
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct ClientSession {
    /// `auth_token=<value>` pair ready for a `Cookie` header.
    cookie: String,
    user: PublicUser,
}

#[derive(Clone)]
pub struct RelayClient {
    http: Client,
    base_url: String,
    session: Arc<RwLock<Option<ClientSession>>>,
}

fn session_cookie_pair(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .find(|pair| {
            pair.split_once('=')
                .is_some_and(|(name, value)| name == SESSION_COOKIE_NAME && !value.is_empty())
        })
        .map(str::to_string)
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

impl RelayClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_http(Client::new(), base_url)
    }

    pub fn with_http(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn current_user(&self) -> Option<PublicUser> {
        self.session.read().await.as_ref().map(|s| s.user.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    async fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let guard = self.session.read().await;
        let session = guard.as_ref().ok_or(ClientError::NotLoggedIn)?;
        Ok(self
            .request(method, path)
            .header(header::COOKIE, session.cookie.as_str()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.authed(Method::GET, path).await?.send().await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn open_session(&self, path: &str, email: &str, password: &str) -> Result<PublicUser, ClientError> {
        let response = self
            .request(Method::POST, path)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let cookie = session_cookie_pair(&response).ok_or(ClientError::MissingCookie)?;
        let user: PublicUser = response.json().await?;

        *self.session.write().await = Some(ClientSession {
            cookie,
            user: user.clone(),
        });
        debug!(user_id = %user.id, "relay session opened");
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<PublicUser, ClientError> {
        self.open_session("/auth/login", email, password).await
    }

    pub async fn signup(&self, email: &str, password: &str) -> Result<PublicUser, ClientError> {
        self.open_session("/auth/signup", email, password).await
    }

    /// Forgets the local session first; a failed remote call is still reported.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let previous = self.session.write().await.take();

        let mut request = self.request(Method::POST, "/auth/logout");
        if let Some(session) = &previous {
            request = request.header(header::COOKIE, session.cookie.as_str());
        }

        match request.send().await {
            Ok(response) => ensure_success(response).await.map(|_| ()),
            Err(e) => {
                warn!(error = %e, "logout request failed; local session already cleared");
                Err(e.into())
            }
        }
    }

    pub async fn me(&self) -> Result<PublicUser, ClientError> {
        self.get_json("/auth/me").await
    }

    pub async fn profile(&self) -> Result<ProfileResponse, ClientError> {
        self.get_json("/api/profile").await
    }

    pub async fn transactions(&self, query: &GetEntriesQuery) -> Result<GetEntriesResponse, ClientError> {
        let response = self
            .authed(Method::GET, "/api/transactions")
            .await?
            .query(query)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    pub async fn categories(&self) -> Result<Vec<Category>, ClientError> {
        let response: GetCategoriesResponse = self.get_json("/api/categories").await?;
        Ok(response.categories)
    }

    /// Every entry of the user, newest month first, grouped client-side.
    pub async fn monthly_report(&self) -> Result<Vec<MonthlySummary>, ClientError> {
        let categories = self.categories().await?;

        let mut entries = Vec::new();
        loop {
            let page = self
                .transactions(&GetEntriesQuery {
                    limit: Some(MAX_LIMIT),
                    offset: Some(entries.len() as u32),
                    ..Default::default()
                })
                .await?;
            let fetched = page.entries.len();
            entries.extend(page.entries);
            if fetched == 0 || entries.len() as u32 >= page.total_count {
                break;
            }
        }

        Ok(summarize_by_month(&entries, &categories))
    }
}
