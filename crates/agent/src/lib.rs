//! Request admission and agent dispatch for phoenix.
//!
//! This crate sits between an authenticated question and the conversational
//! backend agent:
//! 1. **Admission** (`admission`) - trailing-window rate limiting backed by
//!    the access ledger, failing open on ledger errors
//! 2. **Recording** (`admission`) - append-only access logging for audit and
//!    future rate-limit windows
//! 3. **Dispatch** (`dispatch`, `backend`) - mode-based route resolution,
//!    streamed-response reassembly, and deterministic fallback text when the
//!    backend is disabled or failing
//! 4. **Orchestration** (`runtime`) - the `ask` entry point that sequences
//!    the above and always yields exactly one answer string
//!
//! Every externally-visible failure past validation is a fixed string; raw
//! transport errors never cross this crate's boundary.

pub mod admission;
pub mod backend;
pub mod delay;
pub mod dispatch;
pub mod runtime;

pub use admission::{AccessRecorder, RateLimiter};
pub use backend::{AgentBackend, BackendError, ChunkStream, HttpAgentBackend, InvokeRequest};
pub use delay::{NoPause, Pause, RandomPause};
pub use dispatch::{AgentDispatcher, DISPATCH_ERROR_ANSWER, PLACEHOLDER_ANSWER};
pub use runtime::{AskRuntime, FEEDBACK_ACK_ANSWER, RATE_LIMITED_ANSWER};
