// ── HTTP transport configuration ──

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::Error;

/// Connection settings for the query backend.
///
/// `base_url` is the project root (e.g. `https://xyz.supabase.example`);
/// the REST prefix (`/rest/v1`) and the functions prefix (`/functions/v1`)
/// are appended by the client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    /// Anonymous/service API key, sent as both `apikey` and bearer token.
    pub api_key: SecretString,
    /// Optional whole-request timeout. `None` means requests are never
    /// aborted locally; a hung call stalls only its own fetch.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: Url, api_key: SecretString) -> Self {
        Self {
            base_url,
            api_key,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the underlying `reqwest::Client`.
    pub(crate) fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().map_err(Error::Transport)
    }
}
