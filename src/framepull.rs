use std::thread::sleep;

use anyhow::{Context, Result};
use framepull::logger::AsyncLogger;
use framepull::manager::PullManager;
use framepull::{ConfigManager, DEFAULT_LOG_LEVEL, ToneEngine, VERSION};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize the tracing subscriber for harness internals
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("FRAMEPULL_LOG")
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
        )
        .init();

    // Load config
    let config_manager = ConfigManager::new()?;
    let config = config_manager.load()?;
    // save back the config to create the file if it doesn't exist
    config_manager.save(&config)?;

    info!(
        version = VERSION,
        config = %config_manager.config_path().display(),
        channel = %config.channel_id,
        user = config.user_id,
        "framepull starting"
    );

    // The logging service and pull manager are owned here; collaborators
    // get handles, not globals.
    let logger = AsyncLogger::new(config.log_level);
    let manager = PullManager::new(logger.clone(), config.output_dir())?;

    // The vendor SDK is not linked in; the built-in tone engine stands in
    // for it as the frame source.
    manager
        .start(ToneEngine::default(), config.pull)
        .context("Failed to start pull session")?;

    match config.run_duration() {
        Some(duration) => {
            info!(secs = duration.as_secs(), "pulling for fixed duration");
            sleep(duration);
        }
        None => {
            info!("pulling until Ctrl-C");
            wait_for_interrupt()?;
        }
    }

    manager.stop();
    logger.shutdown();
    info!("framepull done");
    Ok(())
}

fn wait_for_interrupt() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime
        .block_on(tokio::signal::ctrl_c())
        .context("Failed to wait for Ctrl-C")?;
    Ok(())
}
