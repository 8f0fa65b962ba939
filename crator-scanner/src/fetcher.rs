use crate::error::{Result, ScanError};
use crate::response::{RedirectRecord, Response};
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Options for building a [`Fetcher`]
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Proxy for every request, e.g. `socks5h://127.0.0.1:9050` for onion routing
    pub proxy: Option<String>,
    pub max_redirects: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; rv:128.0) Gecko/20100101 Firefox/128.0"
                .to_string(),
            proxy: None,
            max_redirects: 10,
        }
    }
}

/// HTTP transport that follows redirects itself so every hop lands in
/// [`Response::history`].
pub struct Fetcher {
    client: Client,
    max_redirects: usize,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Self::with_options(FetchOptions::default())
    }

    pub fn with_options(options: FetchOptions) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(options.user_agent)
            .timeout(Duration::from_secs(options.timeout_secs))
            .connect_timeout(Duration::from_secs(options.timeout_secs / 2))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none());

        if let Some(proxy) = options.proxy {
            builder = builder.proxy(reqwest::Proxy::all(&proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
            max_redirects: options.max_redirects,
        })
    }

    /// Fetch `url`, following up to `max_redirects` hops.
    pub async fn fetch(&self, url: &str) -> Result<Response> {
        let mut current =
            Url::parse(url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;
        let mut history = Vec::new();

        loop {
            debug!("Fetching {}", current);
            let response = self.client.get(current.clone()).send().await?;
            let status_code = response.status().as_u16();

            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());

            if response.status().is_redirection()
                && let Some(location) = location
            {
                if history.len() >= self.max_redirects {
                    return Err(ScanError::TooManyRedirects {
                        url: url.to_string(),
                        hops: history.len(),
                    });
                }

                let next = current.join(&location).map_err(|e| {
                    ScanError::InvalidUrl(format!("bad Location '{}': {}", location, e))
                })?;
                debug!("  -> {} redirect to {}", status_code, next);
                history.push(RedirectRecord::new(status_code, current.as_str()));
                current = next;
                continue;
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());
            let body = response.bytes().await?.to_vec();

            info!(
                "Fetched {} ({}, {} bytes, {} redirect(s))",
                current,
                status_code,
                body.len(),
                history.len()
            );

            return Ok(Response {
                url: current.to_string(),
                status_code,
                content_type,
                body,
                history,
            });
        }
    }
}
