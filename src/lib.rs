// Re-export from sub-crates
pub use framepull_core::{
    APP_NAME, Config, ConfigManager, DEFAULT_LOG_LEVEL, LogLevel, PullOptions, SessionState,
};
pub use framepull_engine::{AudioFrame, EngineError, FrameRequest, PullMode, RtcEngine, ToneEngine};

// App-specific modules
pub mod capture;
pub mod logger;
pub mod manager;

// Version from this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
