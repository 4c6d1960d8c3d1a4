//! REST Backend
//!
//! Client for the hosted platform: PostgREST tables under `/rest/v1` and the
//! GoTrue auth API under `/auth/v1`. Row access policies are enforced by the
//! server; this client only forwards the session's bearer token.

mod auth;
mod query;
mod tables;
mod token;

pub use query::Query;
pub use token::{decode_claims, TokenClaims};

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult, Session, UserId};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

impl From<reqwest::Error> for DomainError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            DomainError::Internal(format!("unexpected response: {}", e))
        } else {
            DomainError::Network(e.to_string())
        }
    }
}

/// Map an error response to a domain error, preferring the server's message
pub fn status_error(status: u16, body: &str) -> DomainError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|key| json.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| format!("request failed with status {}", status));

    match status {
        400 | 422 => DomainError::InvalidInput(message),
        401 | 403 => DomainError::Unauthorized(message),
        404 => DomainError::NotFound(message),
        409 => DomainError::Conflict(message),
        _ => DomainError::Internal(message),
    }
}

/// A client of the hosted platform
pub struct RestBackend {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    session: Mutex<Option<Session>>,
}

impl RestBackend {
    pub fn new(url: &str, anon_key: &str) -> DomainResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        Ok(Self {
            http,
            base_url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            session: Mutex::new(None),
        })
    }

    /// Resume a session from a stored access token
    pub async fn restore_session(&self, access_token: &str) -> DomainResult<Session> {
        let claims = decode_claims(access_token)?;
        let session = Session {
            user_id: UserId::new(claims.sub),
            email: claims.email.unwrap_or_default(),
            access_token: Some(access_token.to_string()),
        };
        *self.session.lock().await = Some(session.clone());
        Ok(session)
    }

    /// Check that the platform answers with this key
    pub async fn ping(&self) -> DomainResult<()> {
        let request = self
            .http
            .get(format!("{}/auth/v1/health", self.base_url))
            .header("apikey", &self.anon_key);
        check(request.send().await?).await?;
        Ok(())
    }

    async fn bearer(&self) -> String {
        self.session
            .lock()
            .await
            .as_ref()
            .and_then(|session| session.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone())
    }

    async fn require_user(&self) -> DomainResult<UserId> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|session| session.user_id.clone())
            .ok_or_else(|| DomainError::Unauthorized("not signed in".to_string()))
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer().await)
    }

    async fn table(&self, method: Method, table: &str, query: &Query) -> RequestBuilder {
        let path = if query.is_empty() {
            format!("/rest/v1/{}", table)
        } else {
            format!("/rest/v1/{}?{}", table, query.to_query_string())
        };
        self.request(method, &path).await
    }

    async fn fetch<T: DeserializeOwned>(&self, table: &str, query: &Query) -> DomainResult<Vec<T>> {
        let response = self.table(Method::GET, table, query).await.send().await?;
        Ok(check(response).await?.json().await?)
    }

    /// Insert one row and return it as stored
    async fn insert<T: DeserializeOwned>(&self, table: &str, row: &Value) -> DomainResult<T> {
        let response = self
            .table(Method::POST, table, &Query::new())
            .await
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        let mut rows: Vec<T> = check(response).await?.json().await?;
        if rows.is_empty() {
            return Err(DomainError::Unauthorized(format!("insert into {} was not permitted", table)));
        }
        Ok(rows.swap_remove(0))
    }

    /// Apply a change to matching rows, returning how many changed
    async fn modify(&self, method: Method, table: &str, query: &Query, body: Option<&Value>) -> DomainResult<usize> {
        let mut request = self
            .table(method, table, query)
            .await
            .header("Prefer", "return=representation");
        if let Some(body) = body {
            request = request.json(body);
        }
        let rows: Vec<Value> = check(request.send().await?).await?.json().await?;
        Ok(rows.len())
    }
}

async fn check(response: Response) -> DomainResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    log::warn!("Request failed ({}): {}", status_label(status), body);
    Err(status_error(status.as_u16(), &body))
}

fn status_label(status: StatusCode) -> String {
    status.canonical_reason().map_or_else(|| status.as_u16().to_string(), str::to_string)
}
