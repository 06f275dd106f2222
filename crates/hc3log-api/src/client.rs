// HC3 HTTP client
//
// Wraps `reqwest::Client` with HC3-specific URL construction and
// Basic-auth headers. Two surfaces: the `refreshStates` long-poll feed
// and ad-hoc resource lookups for the details dialog.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::RefreshResponse;
use crate::transport::TransportConfig;

/// Extra client-side headroom on top of the server-side hold time, so a
/// long-poll request is never cut off by its own timeout while the server
/// is still legitimately holding it open.
const LONG_POLL_HEADROOM: Duration = Duration::from_secs(15);

/// Raw HTTP client for the HC3 REST API.
///
/// All requests carry `Authorization: Basic user:password` and
/// `Content-Type: application/json`. The caller owns retry/reconnect
/// policy; this type reports each request's outcome and nothing more.
pub struct Hc3Client {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
    timeout: Option<Duration>,
}

impl Hc3Client {
    /// Create a new client from a base URL (e.g. `http://192.168.1.57`)
    /// and Basic-auth credentials.
    pub fn new(
        base_url: Url,
        username: String,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            username,
            password,
            timeout: transport.timeout,
        })
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an API path: `{base}/api{path}`.
    fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api{path}"))?)
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Poll the event feed: `GET /api/refreshStates?last={cursor}[&timeout={hold}]`.
    ///
    /// With `hold_secs` set, the server holds the connection open for up
    /// to that many seconds and returns as soon as events exist. The
    /// client-side timeout (when configured) is widened past the hold
    /// time so it only fires on genuinely dead connections.
    pub async fn refresh_states(
        &self,
        last: u64,
        hold_secs: Option<u64>,
    ) -> Result<RefreshResponse, Error> {
        let mut url = self.api_url("/refreshStates")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("last", &last.to_string());
            if let Some(hold) = hold_secs {
                query.append_pair("timeout", &hold.to_string());
            }
        }

        debug!(%url, last, "polling refreshStates");

        let mut request = self.authed_get(url);
        if let Some(timeout) = self.timeout {
            let effective = match hold_secs {
                Some(hold) => Duration::from_secs(hold) + LONG_POLL_HEADROOM,
                None => timeout,
            };
            request = request.timeout(effective);
        }

        let resp = request.send().await.map_err(Error::Transport)?;
        Self::parse_body(resp).await
    }

    /// Fetch an arbitrary API resource: `GET /api{path}`.
    ///
    /// Used by the details dialog; `path` comes from
    /// [`detail_path`](crate::endpoints::detail_path).
    pub async fn lookup(&self, path: &str) -> Result<Value, Error> {
        let url = self.api_url(path)?;
        debug!(%url, "resource lookup");

        let mut request = self.authed_get(url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let resp = request.send().await.map_err(Error::Transport)?;
        Self::parse_body(resp).await
    }

    fn authed_get(&self, url: Url) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
    }

    /// Check the status, then parse the body as JSON.
    async fn parse_body<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        let url = resp.url().to_string();

        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: "controller rejected the configured credentials".into(),
            });
        }

        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}
