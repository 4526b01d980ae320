//! Periodic frame pulling. A `PullManager` owns a single-worker tokio
//! runtime; each session is one task on it that ticks at the configured
//! interval, pulls a frame from the engine, and optionally appends it to a
//! WAV capture.
//!
//! The manager is an explicitly constructed service rather than a process
//! singleton; the entry point owns its lifecycle and injects the logger.

use std::path::PathBuf;

use framepull_core::{PullOptions, SessionState};
use framepull_engine::{EngineError, FrameRequest, PullMode, RtcEngine};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, trace};

use crate::capture::{FrameRecorder, RecorderError, capture_path};
use crate::logger::AsyncLogger;

#[derive(Debug, Error)]
pub enum ManagerError {
    /// Interval and sample rate must cover at least one sample per tick
    #[error("pull options must cover at least one sample per tick")]
    EmptyInterval,
    /// The capture file could not be created
    #[error("failed to create capture file: {0}")]
    Capture(#[from] RecorderError),
}

struct Session {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Pulls decoded audio frames from an [`RtcEngine`] on a timer.
///
/// At most one session runs at a time. Starting while a session is running
/// stops the previous session first, finalizing its capture file.
pub struct PullManager {
    runtime: Runtime,
    logger: AsyncLogger,
    output_dir: PathBuf,
    session: Mutex<Option<Session>>,
}

impl PullManager {
    /// Create a manager writing captures under `output_dir`.
    pub fn new(logger: AsyncLogger, output_dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        // Set up tokio runtime for the pull task
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;

        Ok(Self {
            runtime,
            logger,
            output_dir: output_dir.into(),
            session: Mutex::new(None),
        })
    }

    /// Start pulling mixed playback audio from the engine.
    pub fn start<E>(&self, engine: E, options: PullOptions) -> Result<(), ManagerError>
    where
        E: RtcEngine + 'static,
    {
        self.start_session(engine, PullMode::Mixed, options)
    }

    /// Start pulling through the plain call path. Identical to [`start`]
    /// apart from the mode tag forwarded to the engine.
    ///
    /// [`start`]: PullManager::start
    pub fn start_normal<E>(&self, engine: E, options: PullOptions) -> Result<(), ManagerError>
    where
        E: RtcEngine + 'static,
    {
        self.start_session(engine, PullMode::Normal, options)
    }

    fn start_session<E>(
        &self,
        engine: E,
        mode: PullMode,
        options: PullOptions,
    ) -> Result<(), ManagerError>
    where
        E: RtcEngine + 'static,
    {
        if options.interval_ms == 0 || options.samples_per_channel() == 0 {
            return Err(ManagerError::EmptyInterval);
        }

        let mut guard = self.session.lock();
        if let Some(previous) = guard.take() {
            self.logger.info("restarting pull session");
            self.halt(previous);
        }

        let recorder = if options.save_to_file {
            let path = capture_path(
                &self.output_dir,
                options.sample_rate,
                options.channel_count,
                mode,
            );
            Some(FrameRecorder::create(
                path,
                options.sample_rate,
                options.channel_count,
            )?)
        } else {
            None
        };

        self.logger.info(format!(
            "pull session started: engine={} mode={mode} interval={}ms rate={}Hz \
             channels={} save_to_file={}",
            engine.name(),
            options.interval_ms,
            options.sample_rate,
            options.channel_count,
            options.save_to_file,
        ));

        let (stop_tx, stop_rx) = watch::channel(false);
        let task = self.runtime.spawn(pull_loop(
            engine,
            mode,
            options,
            recorder,
            stop_rx,
            self.logger.clone(),
        ));

        *guard = Some(Session {
            stop: stop_tx,
            task,
        });
        Ok(())
    }

    /// Stop the running session, if any, and finalize its capture file.
    pub fn stop(&self) {
        let session = self.session.lock().take();
        if let Some(session) = session {
            self.halt(session);
        }
    }

    /// Whether a session is currently pulling.
    pub fn state(&self) -> SessionState {
        if self.session.lock().is_some() {
            SessionState::Running
        } else {
            SessionState::Idle
        }
    }

    fn halt(&self, session: Session) {
        session.stop.send(true).ok();
        if let Err(e) = self.runtime.block_on(session.task) {
            error!("pull task failed to join: {e}");
        }
    }
}

impl Drop for PullManager {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn pull_loop<E: RtcEngine>(
    mut engine: E,
    mode: PullMode,
    options: PullOptions,
    mut recorder: Option<FrameRecorder>,
    mut stop: watch::Receiver<bool>,
    logger: AsyncLogger,
) {
    let request = FrameRequest {
        mode,
        sample_rate: options.sample_rate,
        channels: options.channel_count,
        samples_per_channel: options.samples_per_channel(),
    };

    let mut ticker = tokio::time::interval(options.interval());
    // A slow pull shifts the schedule instead of causing a catch-up burst.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut frames: u64 = 0;
    let mut samples: u64 = 0;

    loop {
        tokio::select! {
            _ = stop.changed() => break,
            _ = ticker.tick() => {
                match engine.pull_frame(&request) {
                    Ok(frame) => {
                        frames += 1;
                        samples += frame.data.len() as u64;
                        trace!(frames, samples = frame.data.len(), "pulled frame");

                        let mut capture_failed = false;
                        if let Some(rec) = recorder.as_mut() {
                            if let Err(e) = rec.write_frame(&frame) {
                                logger.warning(format!(
                                    "capture write failed, continuing without file output: {e}"
                                ));
                                capture_failed = true;
                            }
                        }
                        if capture_failed {
                            recorder = None;
                        }
                    }
                    Err(EngineError::NoFrame) => {
                        debug!("engine had no frame buffered");
                    }
                    Err(e) => {
                        logger.warning(format!("pull failed: {e}"));
                    }
                }
            }
        }
    }

    if let Some(rec) = recorder.take() {
        match rec.finalize() {
            Ok(path) => logger.info(format!("capture written to {}", path.display())),
            Err(e) => logger.error(format!("failed to finalize capture: {e}")),
        }
    }

    logger.info(format!(
        "pull session stopped: mode={mode} frames={frames} samples={samples}"
    ));
}
