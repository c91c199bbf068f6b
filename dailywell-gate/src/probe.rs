//! Gate probe
//!
//! One outbound GET per launch. [`HttpProbe`] is the reqwest-backed probe;
//! the [`GateProbe`] trait lets start-up code and tests substitute another.

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{redirect, Client, Response};
use tracing::debug;
use url::Url;

use crate::config::GateConfig;
use crate::decision::ProbeOutcome;
use crate::error::GateError;

const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
const BROWSER_ACCEPT_ENCODING: &str = "gzip, deflate, br";
const MAX_REDIRECTS: usize = 10;

#[async_trait]
pub trait GateProbe: Send + Sync {
    /// Issue the probe. Never errors: failures are reported as `ProbeOutcome::Failed`.
    async fn probe(&self, url: &Url) -> ProbeOutcome;
}

/// Validate the configured endpoint before any request is made.
pub fn parse_endpoint(endpoint: &str) -> Result<Url, GateError> {
    let malformed = |reason: String| GateError::MalformedEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let url = Url::parse(endpoint.trim()).map_err(|e| malformed(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(malformed(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(malformed("missing host".to_string()));
    }
    Ok(url)
}

/// reqwest-backed probe
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(config: &GateConfig) -> Result<Self, GateError> {
        let redirect_policy = if config.follow_redirects {
            redirect::Policy::limited(MAX_REDIRECTS)
        } else {
            redirect::Policy::none()
        };

        let mut builder = Client::builder()
            .timeout(config.timeout())
            .redirect(redirect_policy);
        if config.browser_headers {
            builder = builder.default_headers(browser_headers());
        }

        let client = builder
            .build()
            .map_err(|e| GateError::TransportFailure(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl GateProbe for HttpProbe {
    async fn probe(&self, url: &Url) -> ProbeOutcome {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return ProbeOutcome::Failed(transport_failure(&e)),
        };

        let status = response.status().as_u16();
        let content_length = declared_content_length(response.headers());
        debug!(status, ?content_length, "gate probe response");

        // Only a 200 needs its body inspected.
        let body_len = if status == 200 {
            match first_chunk_len(response).await {
                Ok(len) => len,
                Err(e) => return ProbeOutcome::Failed(transport_failure(&e)),
            }
        } else {
            0
        };

        ProbeOutcome::Response {
            status,
            content_length,
            body_len,
        }
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(MOBILE_USER_AGENT));
    headers.insert(header::ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE),
    );
    headers.insert(
        header::ACCEPT_ENCODING,
        HeaderValue::from_static(BROWSER_ACCEPT_ENCODING),
    );
    headers
}

fn declared_content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

async fn first_chunk_len(mut response: Response) -> Result<usize, reqwest::Error> {
    while let Some(chunk) = response.chunk().await? {
        if !chunk.is_empty() {
            return Ok(chunk.len());
        }
    }
    Ok(0)
}

fn transport_failure(e: &reqwest::Error) -> GateError {
    let kind = if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else if e.is_body() || e.is_decode() {
        "body"
    } else {
        "request"
    };
    GateError::TransportFailure(format!("{kind}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert_eq!(
            parse_endpoint("https://example.com/offer?id=1").unwrap().host_str(),
            Some("example.com")
        );
        assert!(parse_endpoint(" http://127.0.0.1:8080/ ").is_ok());
    }

    #[test]
    fn rejects_malformed_endpoints() {
        for endpoint in [
            "not a url",
            "",
            "example.com/offer",
            "ftp://example.com/offer",
            "mailto:someone@example.com",
            "file:///etc/hosts",
            "https://",
        ] {
            assert!(
                matches!(
                    parse_endpoint(endpoint),
                    Err(GateError::MalformedEndpoint { .. })
                ),
                "{endpoint:?} should be malformed"
            );
        }
    }

    #[test]
    fn content_length_header_is_parsed() {
        let mut headers = HeaderMap::new();
        assert_eq!(declared_content_length(&headers), None);
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("19"));
        assert_eq!(declared_content_length(&headers), Some(19));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("lots"));
        assert_eq!(declared_content_length(&headers), None);
    }

    #[test]
    fn browser_headers_are_complete() {
        let headers = browser_headers();
        for name in [
            header::USER_AGENT,
            header::ACCEPT,
            header::ACCEPT_LANGUAGE,
            header::ACCEPT_ENCODING,
        ] {
            assert!(headers.contains_key(&name), "missing {name}");
        }
    }

    #[test]
    fn client_builds_for_both_redirect_modes() {
        let mut config = GateConfig::new("https://example.com");
        assert!(HttpProbe::new(&config).is_ok());
        config.follow_redirects = true;
        config.browser_headers = false;
        assert!(HttpProbe::new(&config).is_ok());
    }
}
