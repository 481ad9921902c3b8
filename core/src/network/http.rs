use std::net::SocketAddrV4;
use std::time::Duration;

use async_trait::async_trait;
use proxyscout_common::candidate::Verdict;
use reqwest::{Client, Proxy, StatusCode, Url};
use thiserror::Error;

use crate::ports::ProxyValidator;

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("failed to build HTTP client through proxy {proxy}")]
    Client {
        proxy: SocketAddrV4,
        #[source]
        source: reqwest::Error,
    },
}

/// Sends a request for a "generate 204" endpoint through the candidate.
///
/// Only an exact `204 No Content` on the final response counts. Redirects
/// are followed up to reqwest's default limit, each hop through the same
/// proxy.
pub struct HttpValidator {
    test_url: Url,
    timeout: Duration,
}

impl HttpValidator {
    pub fn new(test_url: Url, timeout: Duration) -> Self {
        Self { test_url, timeout }
    }

    fn client_for(&self, proxy: SocketAddrV4) -> Result<Client, ValidateError> {
        let proxy_url = format!("http://{proxy}");
        let into_err = |source| ValidateError::Client { proxy, source };

        Client::builder()
            .proxy(Proxy::http(&proxy_url).map_err(into_err)?)
            .proxy(Proxy::https(&proxy_url).map_err(into_err)?)
            .timeout(self.timeout)
            .build()
            .map_err(into_err)
    }
}

#[async_trait]
impl ProxyValidator for HttpValidator {
    async fn validate(&self, proxy: SocketAddrV4) -> Result<Verdict, ValidateError> {
        let client = self.client_for(proxy)?;

        let verdict = match client.get(self.test_url.clone()).send().await {
            Ok(response) if response.status() == StatusCode::NO_CONTENT => Verdict::Valid,
            Ok(response) => Verdict::UnexpectedStatus(response.status().as_u16()),
            Err(e) if e.is_timeout() => Verdict::TimedOut,
            Err(e) => Verdict::Transport(e.to_string()),
        };
        Ok(verdict)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
