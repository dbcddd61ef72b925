//! Factory for assembling the application from configuration.

use std::sync::Arc;

use tracing::info;

use rota_clients::{ClientFactory, Collaborators};
use rota_core::config::RotaConfig;
use rota_core::error::RotaResult;
use rota_core::store::{RotationStore, SqliteRotationStore};
use rota_core::{IntentRouter, MessageHandler, NameResolver, Reminder, RotaRuntime, RotationEngine};

use crate::state::AppState;

/// Open the configured store.
pub fn create_store(config: &RotaConfig) -> RotaResult<Arc<dyn RotationStore>> {
    match config.store.db_path {
        Some(ref path) => {
            info!(path = %path.display(), "Opening rotation store");
            Ok(Arc::new(SqliteRotationStore::new(path)?))
        }
        None => {
            info!("Using in-memory rotation store");
            Ok(Arc::new(SqliteRotationStore::in_memory()?))
        }
    }
}

/// Build the application state over explicit collaborators.
///
/// Seeds the rotation from configuration when the store is empty.
pub async fn create_state_with(
    config: &RotaConfig,
    engine: Arc<RotationEngine>,
    collaborators: Collaborators,
) -> RotaResult<AppState> {
    let pairs = config.rotation.user_pairs();
    if !pairs.is_empty() {
        let first_due = config
            .rotation
            .first_due
            .unwrap_or_else(|| engine.current_week());
        engine.seed(&pairs, first_due).await?;
    }

    let resolver = NameResolver::new(collaborators.directory);
    let router = Arc::new(IntentRouter::new(
        engine.clone(),
        resolver,
        config.bot.bot_user_id.clone(),
    ));
    let handler = Arc::new(MessageHandler::new(
        collaborators.classifier,
        router,
        &config.bot.bot_user_id,
    ));
    let reminder = Arc::new(Reminder::new(
        engine.clone(),
        collaborators.sender.clone(),
        config.bot.reminder_channel.clone(),
    ));

    Ok(AppState::new(engine, handler, collaborators.sender, reminder))
}

/// Build the full application: store, HTTP clients, state, and background jobs.
///
/// The jobs are registered but not started.
pub async fn create_app(config: &RotaConfig) -> RotaResult<(AppState, RotaRuntime)> {
    let store = create_store(config)?;
    let engine = Arc::new(RotationEngine::new(store));
    let collaborators = ClientFactory::create(config)?;

    let state = create_state_with(config, engine.clone(), collaborators).await?;
    let runtime = RotaRuntime::new(config.schedule.clone(), engine, state.reminder.clone()).await?;

    Ok((state, runtime))
}
