//! Built-in sine tone engine.

use std::f32::consts::TAU;

use tracing::debug;

use crate::{AudioFrame, FrameRequest, Result, RtcEngine};

/// Deterministic sine generator implementing [`RtcEngine`].
///
/// Stands in for the vendor SDK in the harness binary and in tests. The
/// phase carries over between pulls, so consecutive frames stitch into one
/// continuous tone regardless of the pull cadence.
pub struct ToneEngine {
    frequency_hz: f32,
    amplitude: f32,
    phase: f32,
}

impl ToneEngine {
    pub fn new(frequency_hz: f32, amplitude: f32) -> Self {
        Self {
            frequency_hz,
            amplitude: amplitude.clamp(0.0, 1.0),
            phase: 0.0,
        }
    }
}

impl Default for ToneEngine {
    /// 440 Hz at quarter amplitude.
    fn default() -> Self {
        Self::new(440.0, 0.25)
    }
}

impl RtcEngine for ToneEngine {
    fn pull_frame(&mut self, request: &FrameRequest) -> Result<AudioFrame> {
        let mut frame = AudioFrame::silent(request);
        let step = TAU * self.frequency_hz / request.sample_rate as f32;
        let scale = self.amplitude * f32::from(i16::MAX);

        for i in 0..request.samples_per_channel as usize {
            let sample = (self.phase.sin() * scale) as i16;
            for ch in 0..request.channels as usize {
                frame.data[i * request.channels as usize + ch] = sample;
            }
            self.phase += step;
            if self.phase >= TAU {
                self.phase -= TAU;
            }
        }

        debug!(
            samples = frame.data.len(),
            mode = %request.mode,
            "generated tone frame"
        );
        Ok(frame)
    }

    fn name(&self) -> &str {
        "tone"
    }
}
