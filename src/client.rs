use std::fmt;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::analytics::Analytics;
use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.pagerduty.com";
pub const TOKEN_ENV: &str = "PAGERDUTY_TOKEN";
pub const API_URL_ENV: &str = "PAGERDUTY_API_URL";

const ACCEPT_V2: &str = "application/vnd.pagerduty+json;version=2";
const EARLY_ACCESS_HEADER: &str = "x-early-access";
const ANALYTICS_EARLY_ACCESS: &str = "analytics-v2";

/// Connection settings for the PagerDuty REST API.
#[derive(Clone)]
pub struct ClientConfig {
    pub token: String,
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Read `PAGERDUTY_TOKEN` (required) and `PAGERDUTY_API_URL` (optional).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token = lookup(TOKEN_ENV)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Config(format!("{TOKEN_ENV} is not set")))?;
        let base_url = lookup(API_URL_ENV)
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Ok(Self { token, base_url })
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Shared transport for every PagerDuty call made by this crate.
///
/// Cheap to clone; the underlying `reqwest::Client` pools connections
/// and is reference-counted. No timeout is configured here: supply a
/// `reqwest::Client` through [`Client::with_http_client`] to set one.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    auth: HeaderValue,
}

impl Client {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::from_config(ClientConfig::new(token))
    }

    pub fn from_env() -> Result<Self> {
        Self::from_config(ClientConfig::from_env()?)
    }

    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let token = config.token.trim();
        if token.is_empty() {
            return Err(Error::Config("API token cannot be empty".into()));
        }
        let mut auth = HeaderValue::from_str(&format!("Token token={token}"))
            .map_err(|_| Error::Config("API token contains invalid characters".into()))?;
        auth.set_sensitive(true);
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: parse_base_url(&config.base_url)?,
            auth,
        })
    }

    /// Point the client at a different API host (e.g. a regional endpoint
    /// or a local mock server).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    /// Replace the underlying HTTP client, e.g. to configure timeouts or proxies.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn analytics(&self) -> Analytics<'_> {
        Analytics::new(self)
    }

    /// Build an absolute URL from path segments. Each segment is
    /// percent-encoded on its own, so identifiers can't escape their slot.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::UrlParse(format!("cannot be a base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments)?;
        let request = self.request(Method::GET, url.clone());
        self.execute(request, Method::GET, &url).await
    }

    pub(crate) async fn post<B, T>(&self, segments: &[&str], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        let request = self.request(Method::POST, url.clone()).json(body);
        self.execute(request, Method::POST, &url).await
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .headers(self.default_headers())
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_V2));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("pagerduty-analytics/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            EARLY_ACCESS_HEADER,
            HeaderValue::from_static(ANALYTICS_EARLY_ACCESS),
        );
        headers.insert(AUTHORIZATION, self.auth.clone());
        headers
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        method: Method,
        url: &Url,
    ) -> Result<T> {
        log::debug!("{method} {}", url.path());
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            log::warn!("{method} {} returned {status}", url.path());
            return Err(Error::Status {
                status,
                message: error_message(&body),
            });
        }

        log::trace!("{method} {} -> {} bytes", url.path(), body.len());
        Ok(serde_json::from_str(&body)?)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

fn parse_base_url(input: &str) -> Result<Url> {
    let url = Url::parse(input.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::UrlParse(format!(
            "unsupported scheme '{}' in {input}",
            url.scheme()
        )));
    }
    if url.cannot_be_a_base() {
        return Err(Error::UrlParse(format!("cannot be a base URL: {input}")));
    }
    Ok(url)
}

/// PagerDuty's error envelope: `{"error": {"message": .., "code": .., "errors": [..]}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    errors: Vec<String>,
}

/// Prefer the structured error message; fall back to the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope { error }) => {
            let mut msg = error.message.unwrap_or_else(|| "unknown error".to_string());
            if let Some(code) = error.code {
                msg.push_str(&format!(" (code {code})"));
            }
            if !error.errors.is_empty() {
                msg.push_str(": ");
                msg.push_str(&error.errors.join(", "));
            }
            msg
        }
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}
