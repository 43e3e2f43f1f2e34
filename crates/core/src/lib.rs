//! Domain types and configuration for the phoenix ask pipeline.
//!
//! This crate carries everything the admission and dispatch layers agree on:
//! the principal identity, access records and their ledger timestamp format,
//! answer modes, feedback classification, the runtime settings vocabulary,
//! and the application configuration loader.

pub mod access;
pub mod config;
pub mod errors;
pub mod settings;

pub use access::{
    derive_session_id, is_feedback, ledger_timestamp, AccessRecord, AnswerMode, Principal,
    FEEDBACK_MARKER,
};
pub use errors::RequestError;
pub use settings::{
    flag_setting, keys, string_setting, u64_setting, EnvSettings, LayeredSettings,
    SettingsProvider, StaticSettings,
};

// Downstream crates decode ledger timestamps with the same chrono version.
pub use chrono;
