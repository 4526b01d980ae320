//! RTC engine abstraction for framepull.
//!
//! The real engine is an external, vendor-provided SDK that decodes remote
//! audio and hands it out on demand through a pull API. This crate defines
//! the seam the harness talks through, and ships a deterministic
//! tone-generating implementation so the harness and its tests run without
//! the vendor SDK present.

mod tone;

use std::fmt;
use std::time::Duration;

use thiserror::Error;
pub use tone::ToneEngine;

/// Errors an engine can report from a pull.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine has no decoded audio buffered yet. Not fatal; the caller
    /// skips the tick and pulls again on the next one.
    #[error("no frame available")]
    NoFrame,

    /// Vendor-side failure.
    #[error("engine failure: {0}")]
    Engine(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Which vendor call path a pull goes through.
///
/// The two start variants of the original harness differ only in this tag;
/// the engine binding decides what it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullMode {
    /// Mixed playback audio of all remote users
    Mixed,
    /// The plain pull path
    Normal,
}

impl PullMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PullMode::Mixed => "mixed",
            PullMode::Normal => "normal",
        }
    }
}

impl fmt::Display for PullMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One on-demand request for decoded audio.
#[derive(Debug, Clone)]
pub struct FrameRequest {
    pub mode: PullMode,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples_per_channel: u32,
}

/// One decoded PCM frame: 16-bit signed samples, interleaved by channel.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub data: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples_per_channel: u32,
}

impl AudioFrame {
    /// An all-zero frame matching the request's layout.
    pub fn silent(request: &FrameRequest) -> Self {
        Self {
            data: vec![0; request.samples_per_channel as usize * request.channels as usize],
            sample_rate: request.sample_rate,
            channels: request.channels,
            samples_per_channel: request.samples_per_channel,
        }
    }

    /// Wall-clock time covered by this frame.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(f64::from(self.samples_per_channel) / f64::from(self.sample_rate))
    }
}

/// Trait for sources of decoded audio frames.
///
/// Implement this to bind a real vendor SDK. Pulls are synchronous: the
/// vendor API is a thin buffer copy, and the harness drives it from its own
/// timer task.
pub trait RtcEngine: Send {
    /// Pull the next decoded frame in the requested layout.
    fn pull_frame(&mut self, request: &FrameRequest) -> Result<AudioFrame>;

    /// Returns the name of this engine for logging/debugging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_frame_layout() {
        let request = FrameRequest {
            mode: PullMode::Mixed,
            sample_rate: 16_000,
            channels: 2,
            samples_per_channel: 160,
        };
        let frame = AudioFrame::silent(&request);
        assert_eq!(frame.data.len(), 320);
        assert!(frame.data.iter().all(|&s| s == 0));
        assert_eq!(frame.duration(), Duration::from_millis(10));
    }
}
