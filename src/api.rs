//! HTTP transport for the catalog server's REST API.

use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::types::{MatchRecord, SearchResponse};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

/// Shared HTTP client. Holds the cookie jar that carries the login session.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| ClientError::Transport(format!("invalid base URL {base_url}: {e}")))?;
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url { &self.base }

    pub(crate) fn url(&self, path: &str) -> ClientResult<Url> {
        self.base
            .join(path)
            .map_err(|e| ClientError::Transport(format!("invalid path {path}: {e}")))
    }

    /// `GET /api/search?q=`.
    pub async fn search(&self, query: &str) -> ClientResult<Vec<MatchRecord>> {
        let mut url = self.url("/api/search")?;
        url.query_pairs_mut().append_pair("q", query);
        let resp = self.http.get(url).send().await?;
        let body: SearchResponse = read_json(resp).await?;
        debug!(query, results = body.results.len(), "search response");
        Ok(body.results)
    }

    pub async fn login(&self, username: &str, password: &str) -> ClientResult<()> {
        let resp = self
            .http
            .post(self.url("/api/login")?)
            .json(&LoginBody { username, password })
            .send()
            .await?;
        check_status(resp).await.map(|_| ())
    }

    pub async fn logout(&self) -> ClientResult<()> {
        let resp =
            self.http.post(self.url("/api/logout")?).json(&serde_json::json!({})).send().await?;
        check_status(resp).await.map(|_| ())
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        let resp = self.http.get(url).send().await?;
        read_json(resp).await
    }

    pub(crate) async fn get_ok(&self, url: Url) -> ClientResult<()> {
        let resp = self.http.get(url).send().await?;
        check_status(resp).await.map(|_| ())
    }

    pub(crate) async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<()> {
        let resp = self.http.post(self.url(path)?).json(body).send().await?;
        check_status(resp).await.map(|_| ())
    }
}

/// Passes 2xx responses through; otherwise turns the `{ error }` body (or the
/// bare status) into [`ClientError::Status`].
pub(crate) async fn check_status(resp: Response) -> ClientResult<Response> {
    let status = resp.status();
    if status.is_success() { return Ok(resp); }
    let text = resp.text().await.unwrap_or_default();
    Err(status_error(status, &text))
}

fn status_error(status: StatusCode, body: &str) -> ClientError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("operation failed: {}", status.as_u16()));
    ClientError::Status { status: status.as_u16(), message }
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> ClientResult<T> {
    let resp = check_status(resp).await?;
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
