//! Parameters for one pull session.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Parameters for a single pull session, passed per start call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PullOptions {
    /// Pull cadence in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Requested sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Requested channel count
    #[serde(default = "default_channel_count")]
    pub channel_count: u16,

    /// Whether pulled frames are persisted to a WAV file
    #[serde(default = "default_true")]
    pub save_to_file: bool,
}

fn default_interval_ms() -> u64 {
    10
}

fn default_sample_rate() -> u32 {
    16_000
}

fn default_channel_count() -> u16 {
    1
}

fn default_true() -> bool {
    true
}

impl Default for PullOptions {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            sample_rate: default_sample_rate(),
            channel_count: default_channel_count(),
            save_to_file: true,
        }
    }
}

impl PullOptions {
    /// The pull cadence as a Duration.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Samples per channel covered by one pull at this cadence. This is the
    /// sizing convention of the vendor pull API: one interval's worth of
    /// audio per request. Saturates at `u32::MAX` for oversized intervals
    /// rather than overflowing on absurd configured values.
    pub fn samples_per_channel(&self) -> u32 {
        let samples = u128::from(self.sample_rate) * u128::from(self.interval_ms) / 1000;
        samples.min(u128::from(u32::MAX)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = PullOptions::default();
        assert_eq!(options.interval_ms, 10);
        assert_eq!(options.sample_rate, 16_000);
        assert_eq!(options.channel_count, 1);
        assert!(options.save_to_file);
    }

    #[test]
    fn test_samples_per_channel() {
        let options = PullOptions {
            interval_ms: 10,
            sample_rate: 16_000,
            ..Default::default()
        };
        assert_eq!(options.samples_per_channel(), 160);

        let options = PullOptions {
            interval_ms: 20,
            sample_rate: 48_000,
            ..Default::default()
        };
        assert_eq!(options.samples_per_channel(), 960);
    }

    #[test]
    fn test_samples_per_channel_saturates_on_oversized_values() {
        let options = PullOptions {
            interval_ms: u64::MAX,
            sample_rate: u32::MAX,
            ..Default::default()
        };
        assert_eq!(options.samples_per_channel(), u32::MAX);
    }
}
