//! Probe executor: one outbound request per check, one outcome per request.
//!
//! The request future is raced against the check's deadline with
//! [`tokio::time::timeout`]. Whichever finishes first decides the
//! [`ProbeOutcome`]; the loser is dropped, so a late response can never
//! produce a second outcome for the same probe.

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::{Method, Url};
use uptime_core::{CheckDefinition, HttpMethod, ProbeOutcome};

/// Issues a single probe against a check's target.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, check: &CheckDefinition) -> ProbeOutcome;
}

/// HTTP(S) prober backed by a shared `reqwest` client.
///
/// Redirects are not followed: a `301` is reported as `301` so it can be
/// listed as an acceptable code.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, check: &CheckDefinition) -> ProbeOutcome {
        let url = match Url::parse(&check.target_url()) {
            Ok(url) => url,
            Err(e) => {
                return ProbeOutcome::NetworkError {
                    detail: format!("invalid URL: {e}"),
                }
            }
        };

        let request = self.client.request(method(check.method), url).send();

        let outcome = match tokio::time::timeout(check.timeout(), request).await {
            Err(_elapsed) => ProbeOutcome::Timeout,
            Ok(Ok(response)) => ProbeOutcome::Success {
                response_code: response.status().as_u16(),
            },
            Ok(Err(e)) => ProbeOutcome::NetworkError {
                detail: error_chain(&e),
            },
        };

        tracing::debug!(check_id = %check.id, ?outcome, "Probe finished");
        outcome
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// `reqwest` hides the useful cause (refused, DNS, TLS) in the source chain.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
