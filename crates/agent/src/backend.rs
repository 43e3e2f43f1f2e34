use async_trait::async_trait;
use secrecy::ExposeSecret;
use thiserror::Error;

use phoenix_core::config::BackendConfig;

/// One streaming call to the backend agent. The route identifier selects the
/// configured agent variant for the caller's answer mode; the session id ties
/// a principal's turns together so the backend can keep conversation memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvokeRequest {
    pub backend_id: String,
    pub route_id: String,
    pub session_id: String,
    pub input_text: String,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend transport failure: {0}")]
    Transport(String),
    #[error("backend returned status {0}")]
    Status(u16),
    #[error("backend supplied no completion stream")]
    MissingCompletion,
    #[error("backend response was not valid utf-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
}

/// Lazy, finite, non-restartable sequence of response byte chunks. Consumers
/// must drain to end-of-stream or call `close` on early exit.
#[async_trait]
pub trait ChunkStream: Send {
    /// `Ok(None)` signals end-of-stream.
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, BackendError>;

    /// Releases the underlying connection. Further `next_chunk` calls return
    /// end-of-stream.
    async fn close(&mut self) {}
}

#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Opens one request/response-stream call. `Ok(None)` means the backend
    /// violated its contract and supplied no stream; callers treat that as a
    /// failed call, not a crash.
    async fn invoke(
        &self,
        request: InvokeRequest,
    ) -> Result<Option<Box<dyn ChunkStream>>, BackendError>;
}

/// HTTP client for the agent runtime service.
pub struct HttpAgentBackend {
    client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HttpAgentBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| BackendError::Transport(error.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bearer_token: config.api_key.as_ref().map(|key| key.expose_secret().to_string()),
        })
    }
}

#[async_trait]
impl AgentBackend for HttpAgentBackend {
    async fn invoke(
        &self,
        request: InvokeRequest,
    ) -> Result<Option<Box<dyn ChunkStream>>, BackendError> {
        let url = format!(
            "{}/agents/{}/aliases/{}/sessions/{}/text",
            self.base_url, request.backend_id, request.route_id, request.session_id
        );

        let mut builder =
            self.client.post(&url).json(&serde_json::json!({ "inputText": request.input_text }));
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response =
            builder.send().await.map_err(|error| BackendError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }

        Ok(Some(Box::new(HttpChunkStream { response: Some(response) })))
    }
}

struct HttpChunkStream {
    response: Option<reqwest::Response>,
}

#[async_trait]
impl ChunkStream for HttpChunkStream {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, BackendError> {
        let Some(response) = self.response.as_mut() else {
            return Ok(None);
        };

        match response.chunk().await {
            Ok(Some(bytes)) => Ok(Some(bytes.to_vec())),
            Ok(None) => {
                self.response = None;
                Ok(None)
            }
            Err(error) => {
                self.response = None;
                Err(BackendError::Transport(error.to_string()))
            }
        }
    }

    async fn close(&mut self) {
        // Dropping the response closes the connection without draining it.
        self.response = None;
    }
}
