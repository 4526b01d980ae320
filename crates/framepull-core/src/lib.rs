//! Core types and configuration for framepull.
//!
//! This crate provides the platform-agnostic pieces shared by the harness:
//! credentials/configuration, the log level ordering, and the parameters
//! describing one pull session.

mod config;
mod level;
mod options;
mod state;

pub use config::{Config, ConfigManager};
pub use level::LogLevel;
pub use options::PullOptions;
pub use state::SessionState;

/// Application name
pub const APP_NAME: &str = "framepull";

/// Default log level for the tracing subscriber
pub const DEFAULT_LOG_LEVEL: &str = "info";
