//! Runtime settings consumed per-request by the ask pipeline.
//!
//! Operators flip these to enable/disable the backend or tune rate limits
//! without a redeploy, so providers re-read their source on every `get` and
//! nothing here caches across requests. Absent or malformed values read as
//! empty string / zero / false, never an error.

use std::collections::HashMap;
use std::env;
use std::sync::RwLock;

/// The fixed vocabulary of setting names the pipeline reads.
pub mod keys {
    /// Identifier of the backend agent to invoke.
    pub const BACKEND_AGENT_ID: &str = "BACKEND_AGENT_ID";
    /// Route identifier for SIMPLE-mode questions.
    pub const BACKEND_SIMPLE_MODE_ALIAS_ID: &str = "BACKEND_SIMPLE_MODE_ALIAS_ID";
    /// Route identifier for VERBOSE-mode questions.
    pub const BACKEND_VERBOSE_MODE_ALIAS_ID: &str = "BACKEND_VERBOSE_MODE_ALIAS_ID";
    /// `TRUE` (any case) enables real backend calls; anything else means the
    /// dispatcher answers with the placeholder instead.
    pub const BACKEND_ENABLED: &str = "BACKEND_ENABLED";
    /// Trailing rate-limit window, in minutes.
    pub const RATE_WINDOW_MINUTES: &str = "RATE_WINDOW_MINUTES";
    /// Maximum admitted requests per principal within the window.
    pub const RATE_MAX_COUNT: &str = "RATE_MAX_COUNT";
}

/// Named-setting lookup. Implementations must be cheap enough to call on
/// every request.
pub trait SettingsProvider: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

/// Missing value reads as the empty string.
pub fn string_setting(provider: &dyn SettingsProvider, name: &str) -> String {
    provider.get(name).unwrap_or_default()
}

/// Missing or malformed value reads as zero.
pub fn u64_setting(provider: &dyn SettingsProvider, name: &str) -> u64 {
    provider.get(name).and_then(|value| value.trim().parse().ok()).unwrap_or(0)
}

/// True only for a literal `TRUE`, ignoring case and surrounding whitespace.
pub fn flag_setting(provider: &dyn SettingsProvider, name: &str) -> bool {
    provider.get(name).map(|value| value.trim().eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Map-backed provider. Seeded from the `[settings]` config table at
/// bootstrap; `set` lets operators (and tests) change values at runtime.
#[derive(Default)]
pub struct StaticSettings {
    values: RwLock<HashMap<String, String>>,
}

impl StaticSettings {
    pub fn from_map(values: HashMap<String, String>) -> Self {
        Self { values: RwLock::new(values) }
    }

    pub fn with(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        let mut values = match self.values.write() {
            Ok(values) => values,
            Err(poisoned) => poisoned.into_inner(),
        };
        values.insert(name.into(), value.into());
    }
}

impl SettingsProvider for StaticSettings {
    fn get(&self, name: &str) -> Option<String> {
        let values = match self.values.read() {
            Ok(values) => values,
            Err(poisoned) => poisoned.into_inner(),
        };
        values.get(name).cloned()
    }
}

/// Reads `<prefix><NAME>` from the process environment on every lookup.
pub struct EnvSettings {
    prefix: String,
}

impl EnvSettings {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self::new("PHOENIX_SETTING_")
    }
}

impl SettingsProvider for EnvSettings {
    fn get(&self, name: &str) -> Option<String> {
        env::var(format!("{}{name}", self.prefix)).ok()
    }
}

/// First provider with a value wins. Bootstrap layers environment settings
/// over the config-file seed.
pub struct LayeredSettings {
    providers: Vec<std::sync::Arc<dyn SettingsProvider>>,
}

impl LayeredSettings {
    pub fn new(providers: Vec<std::sync::Arc<dyn SettingsProvider>>) -> Self {
        Self { providers }
    }
}

impl SettingsProvider for LayeredSettings {
    fn get(&self, name: &str) -> Option<String> {
        self.providers.iter().find_map(|provider| provider.get(name))
    }
}
