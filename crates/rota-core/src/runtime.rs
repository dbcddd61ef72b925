//! Background runtime for the periodic jobs.
//!
//! Owns a tokio-cron-scheduler with up to two jobs, both in the local time zone:
//! posting the weekly reminder and advancing the rotation. Job failures are logged
//! and never stop the scheduler.

use std::sync::Arc;

use chrono::Local;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::ScheduleConfig;
use crate::engine::RotationEngine;
use crate::error::{RotaError, RotaResult};
use crate::reminder::Reminder;

/// Background runtime managing the reminder and advance jobs.
///
/// # Example
///
/// ```ignore
/// use rota_core::{RotaRuntime, ScheduleConfig};
///
/// let mut runtime = RotaRuntime::new(ScheduleConfig::default(), engine, reminder).await?;
/// runtime.start().await?;
/// // ... application runs ...
/// runtime.shutdown().await?;
/// ```
pub struct RotaRuntime {
    scheduler: JobScheduler,
    engine: Arc<RotationEngine>,
    reminder: Arc<Reminder>,
    config: ScheduleConfig,
    job_ids: Vec<Uuid>,
    running: RwLock<bool>,
}

impl RotaRuntime {
    /// Create the runtime and register the enabled jobs.
    ///
    /// This does not start them; call `start()`.
    pub async fn new(
        config: ScheduleConfig,
        engine: Arc<RotationEngine>,
        reminder: Arc<Reminder>,
    ) -> RotaResult<Self> {
        debug!(
            reminder_enabled = config.enable_reminder,
            advance_enabled = config.enable_advance,
            "Creating RotaRuntime"
        );

        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| RotaError::internal(format!("Failed to create scheduler: {}", e)))?;

        let mut runtime = Self {
            scheduler,
            engine,
            reminder,
            config,
            job_ids: Vec::new(),
            running: RwLock::new(false),
        };

        if runtime.config.enable_reminder {
            let job = runtime.reminder_job()?;
            runtime.add_job(job).await?;
        }
        if runtime.config.enable_advance {
            let job = runtime.advance_job()?;
            runtime.add_job(job).await?;
        }

        Ok(runtime)
    }

    fn reminder_job(&self) -> RotaResult<Job> {
        let reminder = self.reminder.clone();
        Job::new_async_tz(self.config.reminder_cron.as_str(), Local, move |_uuid, _lock| {
            let reminder = reminder.clone();
            Box::pin(async move {
                debug!("Running scheduled reminder");
                if let Err(e) = reminder.post().await {
                    error!(error = %e, "Scheduled reminder failed");
                }
            })
        })
        .map_err(|e| {
            RotaError::Configuration(format!(
                "Invalid reminder cron '{}': {}",
                self.config.reminder_cron, e
            ))
        })
    }

    fn advance_job(&self) -> RotaResult<Job> {
        let engine = self.engine.clone();
        Job::new_async_tz(self.config.advance_cron.as_str(), Local, move |_uuid, _lock| {
            let engine = engine.clone();
            Box::pin(async move {
                let today = engine.today();
                debug!(today = %today, "Running scheduled advance");
                match engine.advance(today).await {
                    Ok(advanced) => info!(count = advanced.len(), "Scheduled advance completed"),
                    Err(e) => error!(error = %e, "Scheduled advance failed"),
                }
            })
        })
        .map_err(|e| {
            RotaError::Configuration(format!(
                "Invalid advance cron '{}': {}",
                self.config.advance_cron, e
            ))
        })
    }

    async fn add_job(&mut self, job: Job) -> RotaResult<()> {
        let job_id = self
            .scheduler
            .add(job)
            .await
            .map_err(|e| RotaError::internal(format!("Failed to add job: {}", e)))?;
        self.job_ids.push(job_id);
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> RotaResult<()> {
        let mut running = self.running.write().await;
        if !*running {
            self.scheduler
                .start()
                .await
                .map_err(|e| RotaError::internal(format!("Failed to start scheduler: {}", e)))?;
            *running = true;
            info!(
                jobs = self.job_ids.len(),
                reminder_cron = %self.config.reminder_cron,
                advance_cron = %self.config.advance_cron,
                "Rotation jobs started"
            );
        }
        Ok(())
    }

    /// Stop the scheduler.
    pub async fn shutdown(&mut self) -> RotaResult<()> {
        let mut running = self.running.write().await;
        if *running {
            self.scheduler
                .shutdown()
                .await
                .map_err(|e| RotaError::internal(format!("Failed to shutdown scheduler: {}", e)))?;
            *running = false;
            info!("Rotation jobs stopped");
        }
        Ok(())
    }

    /// Check if scheduler is running.
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Get the number of registered jobs.
    pub fn job_count(&self) -> usize {
        self.job_ids.len()
    }

    /// Run the advance job now, outside its schedule.
    pub async fn advance_now(&self) -> RotaResult<usize> {
        let today = self.engine.today();
        Ok(self.engine.advance(today).await?.len())
    }

    /// Post the reminder now, outside its schedule.
    pub async fn remind_now(&self) -> RotaResult<Option<String>> {
        self.reminder.post().await
    }

    /// Get the schedule configuration.
    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::FixedClock;
    use crate::store::SqliteRotationStore;
    use crate::traits::MockMessageSender;
    use chrono::NaiveDate;

    fn parts() -> (Arc<RotationEngine>, Arc<Reminder>) {
        let store = Arc::new(SqliteRotationStore::in_memory().unwrap());
        let clock = FixedClock(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        let engine = Arc::new(RotationEngine::with_clock(store, Arc::new(clock)));
        let reminder = Arc::new(Reminder::new(
            engine.clone(),
            Arc::new(MockMessageSender::new()),
            "C",
        ));
        (engine, reminder)
    }

    #[tokio::test]
    async fn test_runtime_registers_enabled_jobs() {
        let (engine, reminder) = parts();
        let runtime = RotaRuntime::new(ScheduleConfig::default(), engine, reminder)
            .await
            .unwrap();
        assert_eq!(runtime.job_count(), 2);
        assert!(!runtime.is_running().await);
    }

    #[tokio::test]
    async fn test_runtime_disabled_jobs() {
        let (engine, reminder) = parts();
        let config = ScheduleConfig {
            enable_reminder: false,
            enable_advance: false,
            ..Default::default()
        };
        let runtime = RotaRuntime::new(config, engine, reminder).await.unwrap();
        assert_eq!(runtime.job_count(), 0);
    }

    #[tokio::test]
    async fn test_runtime_rejects_bad_cron() {
        let (engine, reminder) = parts();
        let config = ScheduleConfig {
            reminder_cron: "every thursday".to_string(),
            ..Default::default()
        };
        let result = RotaRuntime::new(config, engine, reminder).await;
        assert!(matches!(result, Err(RotaError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_runtime_start_and_shutdown() {
        let (engine, reminder) = parts();
        let mut runtime = RotaRuntime::new(ScheduleConfig::default(), engine, reminder)
            .await
            .unwrap();

        runtime.start().await.unwrap();
        assert!(runtime.is_running().await);
        runtime.start().await.unwrap();

        runtime.shutdown().await.unwrap();
        assert!(!runtime.is_running().await);
    }

    #[tokio::test]
    async fn test_manual_triggers_on_empty_rotation() {
        let (engine, reminder) = parts();
        let runtime = RotaRuntime::new(ScheduleConfig::default(), engine, reminder)
            .await
            .unwrap();
        assert_eq!(runtime.advance_now().await.unwrap(), 0);
        assert!(runtime.remind_now().await.unwrap().is_none());
    }
}
