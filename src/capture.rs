//! WAV persistence for pulled frames. One recorder per session, created when
//! the session asks for file output and finalized when the session stops so
//! the WAV header carries the real sample count.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use framepull_engine::{AudioFrame, PullMode};
use hound::{SampleFormat, WavSpec, WavWriter};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum RecorderError {
    /// Capture directory could not be created
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// WAV write failure
    #[error(transparent)]
    Wav(#[from] hound::Error),
}

type Result<T> = std::result::Result<T, RecorderError>;

/// Capture file path for a session: rate, layout, and pull mode in the name
/// plus a timestamp. Restarts within the same second get a numeric suffix
/// so repeated sessions never clobber each other.
pub fn capture_path(dir: &Path, sample_rate: u32, channels: u16, mode: PullMode) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let base = format!("pull_{sample_rate}hz_{channels}ch_{mode}_{stamp}");

    let mut path = dir.join(format!("{base}.wav"));
    let mut attempt = 1u32;
    while path.exists() {
        path = dir.join(format!("{base}_{attempt}.wav"));
        attempt += 1;
    }
    path
}

/// Writes pulled PCM frames to a 16-bit WAV file.
pub struct FrameRecorder {
    // Presence of the writer indicates the recorder has not been finalized.
    writer: Option<WavWriter<BufWriter<File>>>,
    path: PathBuf,
}

impl FrameRecorder {
    /// Create the capture file, making the parent directory if needed.
    pub fn create(path: impl Into<PathBuf>, sample_rate: u32, channels: u16) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::create(&path, spec)?;

        Ok(Self {
            writer: Some(writer),
            path,
        })
    }

    /// Append one frame's samples.
    pub fn write_frame(&mut self, frame: &AudioFrame) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            for &sample in &frame.data {
                writer.write_sample(sample)?;
            }
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Finalize the WAV framing. After this the file is complete on disk.
    pub fn finalize(mut self) -> Result<PathBuf> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
        }
        Ok(std::mem::take(&mut self.path))
    }
}

impl Drop for FrameRecorder {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                error!(path = %self.path.display(), "failed to finalize capture file: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use framepull_engine::{FrameRequest, PullMode, RtcEngine, ToneEngine};

    use super::*;

    #[test]
    fn test_capture_path_encodes_session() {
        let path = capture_path(Path::new("/tmp/captures"), 48_000, 2, PullMode::Normal);
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("pull_48000hz_2ch_normal_"));
        assert!(name.ends_with(".wav"));
    }

    #[test]
    fn test_capture_path_never_reuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();

        // Same second, same session parameters: the path must still differ.
        let first = capture_path(dir.path(), 16_000, 1, PullMode::Mixed);
        fs::write(&first, b"").unwrap();
        let second = capture_path(dir.path(), 16_000, 1, PullMode::Mixed);
        assert_ne!(first, second);

        fs::write(&second, b"").unwrap();
        let third = capture_path(dir.path(), 16_000, 1, PullMode::Mixed);
        assert_ne!(third, first);
        assert_ne!(third, second);
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.wav");

        let request = FrameRequest {
            mode: PullMode::Mixed,
            sample_rate: 16_000,
            channels: 1,
            samples_per_channel: 160,
        };
        let mut engine = ToneEngine::default();

        let mut recorder = FrameRecorder::create(&path, 16_000, 1).unwrap();
        let first = engine.pull_frame(&request).unwrap();
        recorder.write_frame(&first).unwrap();
        recorder
            .write_frame(&engine.pull_frame(&request).unwrap())
            .unwrap();
        let finalized = recorder.finalize().unwrap();
        assert_eq!(finalized, path);

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 320);
        assert_eq!(&samples[..160], &first.data[..]);
    }

    #[test]
    fn test_creates_missing_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("capture.wav");
        let recorder = FrameRecorder::create(&path, 16_000, 1).unwrap();
        drop(recorder);
        assert!(path.exists());
    }
}
