//! Server state management.

use std::sync::Arc;

use rota_core::traits::MessageSender;
use rota_core::{MessageHandler, Reminder, RotaRuntime, RotationEngine};
use tokio::sync::Mutex;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RotationEngine>,
    pub handler: Arc<MessageHandler>,
    pub sender: Arc<dyn MessageSender>,
    pub reminder: Arc<Reminder>,
    runtime: Arc<Mutex<Option<RotaRuntime>>>,
}

impl AppState {
    /// Create state without background jobs.
    pub fn new(
        engine: Arc<RotationEngine>,
        handler: Arc<MessageHandler>,
        sender: Arc<dyn MessageSender>,
        reminder: Arc<Reminder>,
    ) -> Self {
        Self {
            engine,
            handler,
            sender,
            reminder,
            runtime: Arc::new(Mutex::new(None)),
        }
    }

    /// Attach the background runtime so it can be shut down with the server.
    pub fn with_runtime(self, runtime: RotaRuntime) -> Self {
        Self {
            runtime: Arc::new(Mutex::new(Some(runtime))),
            ..self
        }
    }

    /// Whether background jobs are attached and running.
    pub async fn jobs_running(&self) -> bool {
        match self.runtime.lock().await.as_ref() {
            Some(runtime) => runtime.is_running().await,
            None => false,
        }
    }

    /// Detach the runtime for shutdown.
    pub async fn take_runtime(&self) -> Option<RotaRuntime> {
        self.runtime.lock().await.take()
    }
}
