//! Remote flag write path (AC node).
//!
//! Read-modify-write against the contents API: `GET` the document to learn
//! its current revision marker, then `PUT` the new Base64-wrapped body with
//! that marker. A [`PublishGuard`] bounds write amplification to roughly one
//! write per guard interval under steady state while guaranteeing that every
//! value *change* goes out immediately.

use log::{info, warn};

use super::document;
use crate::app::ports::HttpPort;
use crate::config::NodeConfig;
use crate::error::{CommsError, Result};

// ───────────────────────────────────────────────────────────────
// Publish guard
// ───────────────────────────────────────────────────────────────

/// Per-publisher rate/redundancy guard.
///
/// A push is due when the value differs from the last *successfully* pushed
/// one, or when the minimum interval has elapsed since that push. Failed
/// pushes never update the guard, so the next poll retries unconditionally.
#[derive(Debug, Default)]
pub struct PublishGuard {
    last_push_ms: Option<u64>,
    last_value: Option<bool>,
}

impl PublishGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a push of `value` at `now_ms` should go ahead.
    pub fn should_push(&self, value: bool, now_ms: u64, min_interval_ms: u64) -> bool {
        match (self.last_value, self.last_push_ms) {
            (Some(prev), Some(at)) => {
                prev != value || now_ms.saturating_sub(at) >= min_interval_ms
            }
            // Nothing pushed yet this boot.
            _ => true,
        }
    }

    /// Record a successful push.
    pub fn record(&mut self, value: bool, now_ms: u64) {
        self.last_value = Some(value);
        self.last_push_ms = Some(now_ms);
    }
}

// ───────────────────────────────────────────────────────────────
// Flag publisher
// ───────────────────────────────────────────────────────────────

/// Outcome of one [`FlagPublisher::sync`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The document was overwritten with the new value.
    Pushed,
    /// The guard suppressed a redundant write.
    Skipped,
}

pub struct FlagPublisher {
    url: String,
    auth_header: String,
    min_interval_ms: u64,
    guard: PublishGuard,
}

impl FlagPublisher {
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            url: config.document_url(),
            auth_header: format!("token {}", config.github_token),
            min_interval_ms: u64::from(config.flag_min_publish_ms),
            guard: PublishGuard::new(),
        }
    }

    /// Push `value` into the shared document if the guard allows it.
    ///
    /// Both the `GET` (revision fetch) and the `PUT` must return 2xx; any
    /// failure leaves the guard untouched and surfaces as `Err`, and the
    /// caller's next poll retries regardless of the interval.
    pub fn sync(
        &mut self,
        http: &mut impl HttpPort,
        value: bool,
        now_ms: u64,
    ) -> Result<SyncOutcome> {
        if !self.guard.should_push(value, now_ms, self.min_interval_ms) {
            return Ok(SyncOutcome::Skipped);
        }

        let headers = [
            ("Authorization", self.auth_header.as_str()),
            ("Accept", "application/vnd.github.v3+json"),
            ("User-Agent", "doorlink"),
        ];

        let get = http.get(&self.url, &headers)?;
        if !get.is_success() {
            warn!("flag publisher: revision fetch returned {}", get.status);
            return Err(CommsError::HttpStatus(get.status).into());
        }
        let sha = document::parse_sha(&get.body)?;

        let body = document::put_body(value, &sha);
        let put = http.put(&self.url, &headers, &body)?;
        if !put.is_success() {
            warn!("flag publisher: overwrite returned {}", put.status);
            return Err(CommsError::HttpStatus(put.status).into());
        }

        self.guard.record(value, now_ms);
        info!("flag publisher: sensor2={} pushed (rev {})", value, sha);
        Ok(SyncOutcome::Pushed)
    }
}
