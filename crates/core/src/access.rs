use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::RequestError;

/// Questions beginning with this token (case-insensitive) are acknowledged
/// without ever reaching the backend agent.
pub const FEEDBACK_MARKER: &str = "#feedback";

/// Authenticated identity of the caller, as supplied by the identity layer.
/// The sole partition key for ledger records and rate-limit windows.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal(pub String);

/// Caller-selected response verbosity class. Each mode maps to its own
/// backend route setting; the question text itself is never altered by mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnswerMode {
    Simple,
    Verbose,
}

impl AnswerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "SIMPLE",
            Self::Verbose => "VERBOSE",
        }
    }

    /// Name of the setting holding this mode's backend route identifier.
    pub fn alias_setting(&self) -> &'static str {
        match self {
            Self::Simple => crate::settings::keys::BACKEND_SIMPLE_MODE_ALIAS_ID,
            Self::Verbose => crate::settings::keys::BACKEND_VERBOSE_MODE_ALIAS_ID,
        }
    }
}

impl std::str::FromStr for AnswerMode {
    type Err = RequestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SIMPLE" => Ok(Self::Simple),
            "VERBOSE" => Ok(Self::Verbose),
            other => Err(RequestError::UnknownMode(other.to_string())),
        }
    }
}

/// One admitted request, as persisted in the access ledger. Immutable once
/// written; retention is an operational concern outside this core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRecord {
    pub principal: Principal,
    pub asked_at: DateTime<Utc>,
    pub question: String,
}

impl AccessRecord {
    /// Stamps the record at the moment of creation, not at request receipt.
    pub fn new(principal: Principal, question: impl Into<String>) -> Self {
        Self { principal, asked_at: Utc::now(), question: question.into() }
    }
}

/// Fixed-width RFC 3339 rendering (microseconds, `Z` suffix) used for the
/// ledger sort key. Fixed width keeps string comparison chronological.
pub fn ledger_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// True when the question text starts with [`FEEDBACK_MARKER`], ignoring
/// ASCII case. Only the prefix counts; a marker later in the text does not.
pub fn is_feedback(question: &str) -> bool {
    question
        .get(..FEEDBACK_MARKER.len())
        .map(|prefix| prefix.eq_ignore_ascii_case(FEEDBACK_MARKER))
        .unwrap_or(false)
}

/// Stable backend session id for a principal. Deriving it from the identity
/// (rather than a per-page random id) is what lets the backend keep
/// multi-turn conversation memory per user.
pub fn derive_session_id(principal: &Principal) -> String {
    blake3::hash(principal.0.as_bytes()).to_hex().to_string()
}
