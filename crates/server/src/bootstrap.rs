use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use haulaway_agent::{AgentRuntime, HttpLlmClient};
use haulaway_core::config::{AppConfig, ConfigError, LoadOptions};
use haulaway_core::pricing::DeterministicQuoteEngine;
use haulaway_db::{connect, migrations, DbPool, SqlConversationRepository, SqlJobRepository};
use haulaway_sms::{HttpSmsSender, ProviderNotifier};

use crate::webhook::WebhookState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub webhook: WebhookState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("llm client initialization failed: {0}")]
    LlmClient(anyhow::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let sender = Arc::new(HttpSmsSender::new(config.sms.clone()));
    let notifier =
        Arc::new(ProviderNotifier::new(sender.clone(), config.sms.provider_phone.clone()));
    let llm = HttpLlmClient::new(config.llm.clone()).map_err(BootstrapError::LlmClient)?;
    let agent = Arc::new(AgentRuntime::new(Arc::new(llm)));

    let webhook = WebhookState {
        conversations: Arc::new(SqlConversationRepository::new(db_pool.clone())),
        jobs: Arc::new(SqlJobRepository::new(db_pool.clone())),
        agent,
        engine: Arc::new(DeterministicQuoteEngine::default()),
        calendar: config.booking_calendar(),
        quiet_hours: config.quiet_hours(),
        sender,
        notifier,
        webhook_url: config.sms.webhook_url.clone(),
        webhook_secret: config.sms.webhook_secret.clone(),
    };

    Ok(Application { config, db_pool, webhook })
}

#[cfg(test)]
mod tests {
    use haulaway_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    #[tokio::test]
    async fn bootstrap_rejects_non_sqlite_database_urls() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("postgres://localhost/haulaway".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(result.is_err());
        let message = result.err().map(|error| error.to_string()).unwrap_or_default();
        assert!(message.contains("database.url"), "unexpected error: {message}");
    }

    #[tokio::test]
    async fn bootstrap_applies_migrations_and_wires_the_webhook_state() {
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:?cache=shared".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await
        .expect("bootstrap should succeed against in-memory sqlite");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('conversation_message', 'job_record')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("schema query should succeed after bootstrap");
        assert_eq!(table_count, 2, "bootstrap should create the conversation and job tables");

        assert!(app.webhook.webhook_secret.is_none());
        assert_eq!(app.webhook.calendar.windows().len(), 2);

        app.db_pool.close().await;
    }
}
