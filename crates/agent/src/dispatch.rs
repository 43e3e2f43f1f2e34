use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use phoenix_core::config::BackendConfig;
use phoenix_core::{flag_setting, keys, string_setting, AnswerMode, SettingsProvider};

use crate::backend::{AgentBackend, BackendError, InvokeRequest};
use crate::delay::Pause;

/// Returned when `BACKEND_ENABLED` is anything but TRUE, so the frontend and
/// load characteristics can be exercised without backend cost.
pub const PLACEHOLDER_ANSWER: &str = "The answer to your question is 42.";

/// The only text a caller ever sees for a backend failure; the original
/// cause goes to the server-side log instead.
pub const DISPATCH_ERROR_ANSWER: &str =
    "Something went wrong while answering your question. Please try again.";

/// Resolves a backend identity and mode-specific route, invokes the backend,
/// and reassembles the streamed response into one string. Infallible from the
/// caller's perspective: every path yields a plain answer string.
pub struct AgentDispatcher {
    backend: Arc<dyn AgentBackend>,
    settings: Arc<dyn SettingsProvider>,
    pause: Arc<dyn Pause>,
    request_timeout: Duration,
    disabled_delay_min: Duration,
    disabled_delay_max: Duration,
}

impl AgentDispatcher {
    pub fn new(
        backend: Arc<dyn AgentBackend>,
        settings: Arc<dyn SettingsProvider>,
        pause: Arc<dyn Pause>,
        config: &BackendConfig,
    ) -> Self {
        Self {
            backend,
            settings,
            pause,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            disabled_delay_min: Duration::from_millis(config.disabled_delay_min_ms),
            disabled_delay_max: Duration::from_millis(config.disabled_delay_max_ms),
        }
    }

    pub async fn dispatch(&self, question: &str, session_id: &str, mode: AnswerMode) -> String {
        if !flag_setting(self.settings.as_ref(), keys::BACKEND_ENABLED) {
            info!(
                event_name = "agent.dispatch.backend_disabled",
                mode = mode.as_str(),
                "backend disabled, returning placeholder answer"
            );
            self.pause.pause(self.disabled_delay_min, self.disabled_delay_max).await;
            return PLACEHOLDER_ANSWER.to_string();
        }

        let request = InvokeRequest {
            backend_id: string_setting(self.settings.as_ref(), keys::BACKEND_AGENT_ID),
            route_id: string_setting(self.settings.as_ref(), mode.alias_setting()),
            session_id: session_id.to_string(),
            input_text: question.to_string(),
        };

        info!(
            event_name = "agent.dispatch.invoke",
            backend_id = %request.backend_id,
            route_id = %request.route_id,
            mode = mode.as_str(),
            "invoking backend agent"
        );

        // The deadline covers the invoke and the whole stream drain. On
        // expiry the in-flight future is dropped, which closes the stream
        // instead of draining it.
        match tokio::time::timeout(self.request_timeout, self.invoke_and_drain(request)).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(cause)) => {
                error!(
                    event_name = "agent.dispatch.backend_error",
                    mode = mode.as_str(),
                    error = %cause,
                    "backend call failed, returning generic error answer"
                );
                DISPATCH_ERROR_ANSWER.to_string()
            }
            Err(_elapsed) => {
                error!(
                    event_name = "agent.dispatch.timeout",
                    mode = mode.as_str(),
                    timeout_secs = self.request_timeout.as_secs(),
                    "backend call exceeded the request deadline"
                );
                DISPATCH_ERROR_ANSWER.to_string()
            }
        }
    }

    async fn invoke_and_drain(&self, request: InvokeRequest) -> Result<String, BackendError> {
        let Some(mut stream) = self.backend.invoke(request).await? else {
            return Err(BackendError::MissingCompletion);
        };

        // Chunk boundaries may split multi-byte characters, so bytes are
        // accumulated raw and decoded once at end-of-stream.
        let mut completion: Vec<u8> = Vec::new();
        loop {
            match stream.next_chunk().await {
                Ok(Some(chunk)) => completion.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(cause) => {
                    stream.close().await;
                    return Err(cause);
                }
            }
        }

        Ok(String::from_utf8(completion)?)
    }
}
