//! rota-core - Core library for rota.
//!
//! This crate provides the weekly dinner rotation: the assignment store, the
//! rotation engine, and the intent router that answers chat requests.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rota_core::{IntentRouter, NameResolver, RotationEngine, SqliteRotationStore};
//!
//! let store = Arc::new(SqliteRotationStore::new("rota.db")?);
//! let engine = Arc::new(RotationEngine::new(store));
//! let router = IntentRouter::new(engine.clone(), NameResolver::new(directory), "UBOT");
//!
//! // Who's up next?
//! let next = engine.get_next()?;
//!
//! // Roll whoever was due this week to the back of the rotation
//! engine.advance(engine.today()).await?;
//! ```

pub mod config;
pub mod dates;
pub mod engine;
pub mod error;
pub mod handler;
pub mod reminder;
pub mod resolver;
pub mod router;
pub mod runtime;
pub mod store;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{RotaConfig, ScheduleConfig};
pub use dates::{format_day, normalize, Clock, FixedClock, SystemClock, WeekAnchor};
pub use engine::RotationEngine;
pub use error::{ErrorCode, RotaError, RotaResult};
pub use handler::MessageHandler;
pub use reminder::Reminder;
pub use resolver::NameResolver;
pub use router::IntentRouter;
pub use runtime::RotaRuntime;
pub use store::{RotationStore, SqliteRotationStore};
pub use traits::{Classifier, MessageSender, UserDirectory};
pub use types::{
    mention, Assignment, Classification, DirectoryUser, InboundMessage, IntentKind,
    IntentRequest, UserPair,
};
