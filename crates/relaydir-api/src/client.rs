// ── Query backend client ──
//
// Entry point for table reads and edge-function invocations. Wraps
// `reqwest::Client` with key headers and URL construction; all query
// mechanics live in `QueryBuilder`.

use reqwest::Method;
use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::query::QueryBuilder;
use crate::transport::ClientConfig;

/// Client for the hosted query backend.
///
/// Cheap to clone is not needed here: consumers share it behind an `Arc`.
pub struct QueryClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
}

impl QueryClient {
    /// Create a client from a [`ClientConfig`].
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let http = config.build_client()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Create a client with a pre-built `reqwest::Client` (used by tests).
    pub fn with_client(http: reqwest::Client, base_url: Url, api_key: SecretString) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Start a read against `table`: `GET {base}/rest/v1/{table}`.
    pub fn from(&self, table: &str) -> Result<QueryBuilder, Error> {
        Ok(QueryBuilder::new(
            self.http.clone(),
            self.endpoint_url(&["rest", "v1", table])?,
            self.api_key.clone(),
        ))
    }

    /// Invoke a named edge function with a JSON body.
    ///
    /// Non-success responses surface as [`Error::EdgeFunction`] with the
    /// raw body preserved so callers can extract the server's message.
    pub async fn invoke_function(
        &self,
        name: &str,
        method: Method,
        body: &serde_json::Value,
    ) -> Result<(), Error> {
        let url = self.endpoint_url(&["functions", "v1", name])?;
        debug!("{} {}", method, url);

        let key = self.api_key.expose_secret();
        let resp = self
            .http
            .request(method, url)
            .header("apikey", key)
            .header(AUTHORIZATION, format!("Bearer {key}"))
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        Err(Error::EdgeFunction {
            name: name.to_owned(),
            status: status.as_u16(),
            body,
        })
    }

    /// Append path segments to the base URL. Segments are percent-encoded
    /// individually, so odd table or function names cannot change the
    /// URL's structure.
    fn endpoint_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| Error::InvalidUrl {
                base: self.base_url.to_string(),
                path: segments.join("/"),
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }
}
