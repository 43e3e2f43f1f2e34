use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use phoenix_agent::{
    AgentDispatcher, AskRuntime, BackendError, HttpAgentBackend, Pause, RandomPause,
};
use phoenix_core::config::{AppConfig, ConfigError, LoadOptions};
use phoenix_core::{EnvSettings, LayeredSettings, SettingsProvider, StaticSettings};
use phoenix_db::{connect_with_settings, migrations, DbPool, SqlAccessLedger};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub runtime: Arc<AskRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("backend client construction failed: {0}")]
    Backend(#[source] BackendError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    // Env-provided settings win over the config-file seed so operators can
    // flip BACKEND_ENABLED or retune limits without editing the file.
    let settings: Arc<dyn SettingsProvider> = Arc::new(LayeredSettings::new(vec![
        Arc::new(EnvSettings::default()),
        Arc::new(StaticSettings::from_map(config.settings.clone())),
    ]));

    let backend =
        Arc::new(HttpAgentBackend::new(&config.backend).map_err(BootstrapError::Backend)?);
    let pause: Arc<dyn Pause> = Arc::new(RandomPause);
    let dispatcher =
        AgentDispatcher::new(backend, settings.clone(), pause.clone(), &config.backend);

    let runtime = Arc::new(AskRuntime::new(
        settings,
        Arc::new(SqlAccessLedger::new(db_pool.clone())),
        dispatcher,
        pause,
        Duration::from_millis(config.server.limited_delay_ms),
    ));

    Ok(Application { config, db_pool, runtime })
}

#[cfg(test)]
mod tests {
    use phoenix_core::config::{ConfigOverrides, LoadOptions};

    use super::bootstrap;

    #[tokio::test]
    async fn bootstrap_applies_migrations_and_builds_the_runtime() {
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:?cache=shared".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await
        .expect("bootstrap should succeed with an in-memory database");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'access_log'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("access_log table should exist after bootstrap");
        assert_eq!(table_count, 1);

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_a_non_sqlite_database_url() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("postgres://nope".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("error").to_string();
        assert!(message.contains("database.url"));
    }
}
