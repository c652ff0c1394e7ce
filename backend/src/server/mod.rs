//! Process assembly: configuration, dependency wiring, listeners and the
//! lifecycle coordinator that runs them.

pub mod app;
mod config;
mod dependencies;
mod lifecycle;
mod listener;
mod signals;

pub use app::{AppDependencies, build_app, build_docs_app};
pub use config::{ServiceSettings, SettingsError};
pub use dependencies::{ServiceGraph, StartupError};
pub use lifecycle::{LifecycleCoordinator, LifecycleError, ManagedTask, TaskError};
pub use listener::{HttpListener, IngestionTask, ShutdownError};
pub use signals::shutdown_signal;
