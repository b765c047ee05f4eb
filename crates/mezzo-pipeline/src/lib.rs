//! Transcoding orchestration.
//!
//! Ties the store, the worker client, and the lifecycle model together:
//! the [`Dispatcher`] submits jobs, the [`WebhookReceiver`] applies
//! completion callbacks exactly once, the [`TimeoutSweeper`] recovers
//! jobs whose callbacks never arrive, and the [`StateNotifier`] fans
//! lifecycle transitions out to in-process subscribers.
//!
//! Every mutation funnels through the store's conditional updates, so
//! concurrent dispatches, duplicate callbacks, and sweeper races resolve
//! to a single winner without any cross-component locking.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod notifier;
pub mod sweeper;
pub mod webhook;

pub use config::PipelineConfig;
pub use dispatcher::Dispatcher;
pub use error::{CallbackError, DispatchError};
pub use notifier::StateNotifier;
pub use sweeper::{SweepStats, TimeoutSweeper};
pub use webhook::{CallbackOutcome, WebhookReceiver};
