//! Engagement Review API
//!
//! Review and sign-off workflow for audit artifacts:
//! - One workflow record per reviewable item, advanced through guarded transitions
//! - An append-only history ledger of every transition
//! - Best-effort notifications to reviewers and submitters

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use domain::notification::NotificationSender;
use domain::review::{HistoryEntry, WorkflowRecord};
use domain::user::UserDirectory;
use infrastructure::{
    auth::{JwtConfig, JwtService},
    notification::{LogNotificationSender, NotificationDispatcher, WebhookNotificationSender},
    review::{StorageHistoryRepository, StorageWorkflowRepository},
    services::{ReviewService, ReviewServiceConfig},
    storage::{StorageFactory, HISTORY_TABLE, WORKFLOW_TABLE},
    user::{CachedUserDirectory, InMemoryUserDirectory, PostgresUserDirectory},
};
use tracing::info;

/// Wire storage, directory, notifications and the orchestrator from configuration
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage_config = config
        .storage
        .to_storage_config()
        .map_err(anyhow::Error::msg)?;
    let storage = StorageFactory::connect(&storage_config).await?;
    info!(backend = ?storage_config.storage_type(), "Storage initialized");

    let workflows = Arc::new(StorageWorkflowRepository::new(
        storage.create::<WorkflowRecord>(WORKFLOW_TABLE),
    ));
    let history = Arc::new(StorageHistoryRepository::new(
        storage.create::<HistoryEntry>(HISTORY_TABLE),
    ));

    let directory = create_directory(&storage, config);
    let notifier = NotificationDispatcher::new(create_notification_sender(config)?);

    let review_service = ReviewService::new(workflows, history, directory, notifier).with_config(
        ReviewServiceConfig {
            default_page_size: config.review.default_page_size,
            max_page_size: config.review.max_page_size,
            history_default_limit: config.review.history_default_limit,
        },
    );

    let mut jwt_config = JwtConfig::new(config.auth.jwt_secret.clone());
    if let Some(issuer) = &config.auth.issuer {
        jwt_config = jwt_config.with_issuer(issuer.clone());
    }

    Ok(AppState::new(
        Arc::new(review_service),
        Arc::new(JwtService::new(jwt_config)),
        storage,
    ))
}

fn create_directory(storage: &StorageFactory, config: &AppConfig) -> Arc<dyn UserDirectory> {
    let ttl = Duration::from_secs(config.directory.cache_ttl_secs);

    match storage.pool() {
        Some(pool) => Arc::new(CachedUserDirectory::new(
            PostgresUserDirectory::new(pool.clone()),
            ttl,
        )),
        None => Arc::new(CachedUserDirectory::new(InMemoryUserDirectory::new(), ttl)),
    }
}

fn create_notification_sender(config: &AppConfig) -> anyhow::Result<Arc<dyn NotificationSender>> {
    let settings = &config.notifications;

    match &settings.webhook_url {
        Some(url) => {
            info!(url = %url, signed = settings.webhook_secret.is_some(), "Webhook notifications enabled");
            Ok(Arc::new(WebhookNotificationSender::new(
                url.clone(),
                settings.webhook_secret.clone(),
                settings.timeout(),
            )?))
        }
        None => {
            info!("No notification webhook configured; notifications are logged only");
            Ok(Arc::new(LogNotificationSender))
        }
    }
}
