use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use phoenix_core::{AccessRecord, Principal};
use phoenix_db::{AccessLedger, RepositoryError};

/// Trailing-window rate limiting over the access ledger. Purely a query; it
/// never writes.
pub struct RateLimiter {
    ledger: Arc<dyn AccessLedger>,
}

impl RateLimiter {
    pub fn new(ledger: Arc<dyn AccessLedger>) -> Self {
        Self { ledger }
    }

    /// True when the principal already holds `max_count` or more records in
    /// the closed interval `[now - window, now]`. A `max_count` of zero
    /// therefore limits every request, and a zero window falls out of the
    /// closed-interval query without any special case.
    ///
    /// Fails open: a ledger query error admits the request. Availability is
    /// deliberately preferred over strict quota enforcement here; the miss is
    /// logged rather than surfaced.
    pub async fn is_limited(
        &self,
        principal: &Principal,
        window: Duration,
        max_count: u64,
    ) -> bool {
        let until = Utc::now();
        // Saturating: an oversized window reaches back to the earliest
        // representable instant rather than overflowing the timestamp range.
        let from = until.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC);

        match self.ledger.count_between(principal, from, until).await {
            Ok(count) => count >= max_count,
            Err(error) => {
                warn!(
                    event_name = "admission.rate_limit.ledger_error",
                    principal = %principal.0,
                    error = %error,
                    "ledger query failed, admitting request"
                );
                false
            }
        }
    }
}

/// Appends one access record per admitted request, stamped at write time.
pub struct AccessRecorder {
    ledger: Arc<dyn AccessLedger>,
}

impl AccessRecorder {
    pub fn new(ledger: Arc<dyn AccessLedger>) -> Self {
        Self { ledger }
    }

    pub async fn record(
        &self,
        principal: &Principal,
        question: &str,
    ) -> Result<(), RepositoryError> {
        self.ledger.append(AccessRecord::new(principal.clone(), question)).await
    }
}
