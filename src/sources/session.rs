use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::cookie::Jar;
use reqwest::header::{self, HeaderMap, HeaderValue};
use url::Url;

use crate::config::ProviderConfig;
use crate::core::cookies::CredentialSet;
use crate::core::identifier::PlaylistId;

/// Transport context shared by both resolution tiers.
///
/// Holds one blocking client, so cookies set by the endpoint response are
/// still present when the playlist page is requested.
pub struct Session {
    client: Client,
    base: Url,
}

impl Session {
    pub fn new(provider: &ProviderConfig, credentials: &CredentialSet) -> Result<Self> {
        let base = Url::parse(provider.base_url.trim_end_matches('/'))
            .with_context(|| format!("invalid provider base URL {:?}", provider.base_url))?;

        let jar = Arc::new(Jar::default());
        credentials.install(&jar);

        let client = Client::builder()
            .user_agent(provider.user_agent.as_str())
            .default_headers(default_headers(&base, provider)?)
            .cookie_provider(jar)
            .timeout(Duration::from_secs(provider.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client, base })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn endpoint_url(&self, id: &PlaylistId) -> String {
        format!("{}/api/playlist/detail?id={}", self.origin(), id.as_str())
    }

    pub fn playlist_page_url(&self, id: &PlaylistId) -> String {
        format!("{}/playlist?id={}", self.origin(), id.as_str())
    }

    pub fn song_url(&self, track_id: u64) -> String {
        format!("{}/song?id={}", self.origin(), track_id)
    }

    /// Resolves a page href (relative or absolute) against the provider origin.
    pub fn resolve_href(&self, href: &str) -> Option<Url> {
        self.base.join(href).ok()
    }

    fn origin(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }
}

fn default_headers(base: &Url, provider: &ProviderConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
    // Uncompressed bodies avoid decoding mismatches.
    headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("identity"));
    headers.insert(
        header::REFERER,
        HeaderValue::from_str(base.as_str()).context("invalid Referer header")?,
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_str(&provider.accept_language).context("invalid Accept-Language header")?,
    );
    Ok(headers)
}

#[cfg(test)]
pub(crate) fn test_session(base_url: &str) -> Session {
    let provider = ProviderConfig {
        base_url: base_url.to_string(),
        timeout_secs: 5,
        ..Default::default()
    };
    Session::new(&provider, &CredentialSet::default()).expect("session")
}
