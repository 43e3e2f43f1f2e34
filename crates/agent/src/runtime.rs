use std::sync::Arc;

use chrono::Duration as ChronoDuration;
use std::time::Duration;

use tracing::{info, warn};

use phoenix_core::{
    derive_session_id, is_feedback, keys, u64_setting, AnswerMode, Principal, RequestError,
    SettingsProvider,
};
use phoenix_db::AccessLedger;

use crate::admission::{AccessRecorder, RateLimiter};
use crate::delay::Pause;
use crate::dispatch::AgentDispatcher;

/// Returned instead of an answer when the trailing-window limit is hit.
pub const RATE_LIMITED_ANSWER: &str =
    "You have reached the question limit. Please wait a minute and try again.";

/// Acknowledgement for questions tagged with the feedback marker.
pub const FEEDBACK_ACK_ANSWER: &str = "Thanks for the feedback! The team reads every note.";

/// Entry point for one question. Stateless across requests beyond the access
/// ledger; each call resolves to exactly one terminal string: the rate-limit
/// message, the feedback acknowledgement, or the dispatcher's answer.
pub struct AskRuntime {
    settings: Arc<dyn SettingsProvider>,
    limiter: RateLimiter,
    recorder: AccessRecorder,
    dispatcher: AgentDispatcher,
    pause: Arc<dyn Pause>,
    limited_delay: Duration,
}

impl AskRuntime {
    pub fn new(
        settings: Arc<dyn SettingsProvider>,
        ledger: Arc<dyn AccessLedger>,
        dispatcher: AgentDispatcher,
        pause: Arc<dyn Pause>,
        limited_delay: Duration,
    ) -> Self {
        Self {
            settings,
            limiter: RateLimiter::new(ledger.clone()),
            recorder: AccessRecorder::new(ledger),
            dispatcher,
            pause,
            limited_delay,
        }
    }

    /// Admission, recording, classification, dispatch - in that order.
    /// Recording happens before classification, so feedback messages still
    /// consume ledger storage and count toward future windows.
    pub async fn ask(
        &self,
        principal: &Principal,
        question: &str,
        mode: AnswerMode,
    ) -> Result<String, RequestError> {
        if principal.0.trim().is_empty() {
            return Err(RequestError::EmptyPrincipal);
        }
        if question.trim().is_empty() {
            return Err(RequestError::EmptyQuestion);
        }

        let window_minutes = u64_setting(self.settings.as_ref(), keys::RATE_WINDOW_MINUTES);
        let max_count = u64_setting(self.settings.as_ref(), keys::RATE_MAX_COUNT);
        // Operator-supplied and unbounded; values past chrono's range saturate
        // to the widest representable window instead of panicking.
        let window = i64::try_from(window_minutes)
            .ok()
            .and_then(ChronoDuration::try_minutes)
            .unwrap_or(ChronoDuration::MAX);

        if self.limiter.is_limited(principal, window, max_count).await {
            info!(
                event_name = "ask.rate_limited",
                principal = %principal.0,
                window_minutes,
                max_count,
                "request rejected by rate limiter"
            );
            // Keep limited responses from returning instantly; a soft
            // property, not a security guarantee.
            self.pause.pause(self.limited_delay, self.limited_delay).await;
            return Ok(RATE_LIMITED_ANSWER.to_string());
        }

        if let Err(error) = self.recorder.record(principal, question).await {
            warn!(
                event_name = "ask.record_failed",
                principal = %principal.0,
                error = %error,
                "ledger write failed, continuing with dispatch"
            );
        }

        if is_feedback(question) {
            info!(
                event_name = "ask.feedback_received",
                principal = %principal.0,
                "feedback message acknowledged without dispatch"
            );
            return Ok(FEEDBACK_ACK_ANSWER.to_string());
        }

        let session_id = derive_session_id(principal);
        Ok(self.dispatcher.dispatch(question, &session_id, mode).await)
    }
}
