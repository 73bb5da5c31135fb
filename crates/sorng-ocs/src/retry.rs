// ──────────────────────────────────────────────────────────────────────────────
// sorng-ocs · retry
// ──────────────────────────────────────────────────────────────────────────────
// Opt-in resilience decorator around any `HttpExecutor`:
//  • Exponential back-off on transport failures and 5xx replies (GET/HEAD only)
//  • `Retry-After`-aware waiting on 429 (any method)
// Resource managers never retry; wrap the executor instead.
// ──────────────────────────────────────────────────────────────────────────────

use crate::error::OcsError;
use crate::transport::{HttpExecutor, HttpRequest, RawResponse};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Method;
use std::time::Duration;

const INITIAL_BACKOFF_MS: u64 = 500;
const TOO_MANY_REQUESTS: u16 = 429;

/// Retries the wrapped executor up to `max_retries` extra times.
///
/// A 429 means the server refused the request, so any method is resent.
/// Transport failures and 5xx replies may follow a request that already took
/// effect; those are resent only for GET and HEAD.
#[derive(Debug, Clone)]
pub struct RetryExecutor<E> {
    inner: E,
    max_retries: u32,
    initial_backoff: Duration,
}

impl<E: HttpExecutor> RetryExecutor<E> {
    pub fn new(inner: E, max_retries: u32) -> Self {
        Self {
            inner,
            max_retries,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        }
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff.saturating_mul(2u32.saturating_pow(attempt))
    }

    fn retry_after(&self, resp: &RawResponse, attempt: u32) -> Duration {
        resp.headers
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.backoff(attempt))
    }
}

fn is_replayable(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

#[async_trait]
impl<E: HttpExecutor> HttpExecutor for RetryExecutor<E> {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, OcsError> {
        let replayable = is_replayable(&request.method);
        let mut attempt = 0u32;

        loop {
            match self.inner.send(request.clone()).await {
                Ok(resp) if resp.status == TOO_MANY_REQUESTS && attempt < self.max_retries => {
                    let wait = self.retry_after(&resp, attempt);
                    warn!("429 rate-limited, waiting {:?} (attempt {})", wait, attempt);
                    tokio::time::sleep(wait).await;
                }
                Ok(resp) if resp.status >= 500 && replayable && attempt < self.max_retries => {
                    let wait = self.backoff(attempt);
                    warn!("{} server error, retrying in {:?}", resp.status, wait);
                    tokio::time::sleep(wait).await;
                }
                Err(OcsError::Transport(e)) if replayable && attempt < self.max_retries => {
                    let wait = self.backoff(attempt);
                    debug!("request error, retrying in {:?}: {}", wait, e);
                    tokio::time::sleep(wait).await;
                }
                other => return other,
            }
            attempt += 1;
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
