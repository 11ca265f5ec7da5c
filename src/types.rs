use std::path::PathBuf;

use candle_core::Tensor;

/// One retained manifest row: identifier, resolved audio path, and the
/// parsed per-unit annotation lists.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: String,
    pub audio_path: PathBuf,
    pub text_units: Vec<i64>,
    pub durations: Vec<i64>,
}

/// Channel-major acoustic feature matrix: `channels` rows of `frames`
/// values each, stored contiguously.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    channels: usize,
    frames: usize,
    data: Vec<f32>,
}

impl FeatureMatrix {
    pub fn new(channels: usize, frames: usize, data: Vec<f32>) -> Option<Self> {
        if data.len() != channels * frames {
            return None;
        }
        Some(Self {
            channels,
            frames,
            data,
        })
    }

    pub fn zeros(channels: usize, frames: usize) -> Self {
        Self {
            channels,
            frames,
            data: vec![0.0; channels * frames],
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels
    }

    pub fn frame_count(&self) -> usize {
        self.frames
    }

    pub fn channel(&self, c: usize) -> &[f32] {
        &self.data[c * self.frames..(c + 1) * self.frames]
    }

    /// Drop trailing frames so that `frame_count() == frames`. No-op when
    /// already at or below the target.
    pub fn truncate_frames(&mut self, frames: usize) {
        if frames >= self.frames {
            return;
        }
        let mut data = Vec::with_capacity(self.channels * frames);
        for c in 0..self.channels {
            data.extend_from_slice(&self.channel(c)[..frames]);
        }
        self.data = data;
        self.frames = frames;
    }

    /// Append zero frames so that `frame_count() == frames`. No-op when
    /// already at or above the target.
    pub fn pad_frames(&mut self, frames: usize) {
        if frames <= self.frames {
            return;
        }
        let mut data = vec![0.0; self.channels * frames];
        for c in 0..self.channels {
            data[c * frames..c * frames + self.frames].copy_from_slice(self.channel(c));
        }
        self.data = data;
        self.frames = frames;
    }
}

/// Mono waveform samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
}

impl Waveform {
    pub fn new(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn truncate(&mut self, samples: usize) {
        self.samples.truncate(samples);
    }

    pub fn pad(&mut self, samples: usize) {
        if samples > self.samples.len() {
            self.samples.resize(samples, 0.0);
        }
    }
}

/// A fetched example after the reconciler has forced the acoustic frame
/// count to agree with the duration annotation.
#[derive(Debug, Clone)]
pub struct ReconciledExample {
    pub text_units: Vec<i64>,
    pub durations: Vec<i64>,
    pub spec: FeatureMatrix,
    pub pitch: FeatureMatrix,
    pub wav: Waveform,
}

/// Zero-padded batch tensors plus per-example true lengths, sorted by
/// descending text-unit length.
#[derive(Debug)]
pub struct BatchTensors {
    /// `[batch, max_text_len]`, i64.
    pub text: Tensor,
    /// `[batch]`, i64.
    pub text_lengths: Tensor,
    /// `[batch, channels, max_spec_len]`, f32.
    pub spec: Tensor,
    /// `[batch]`, i64.
    pub spec_lengths: Tensor,
    /// `[batch, pitch_channels, max_pitch_len]`, f32.
    pub pitch: Tensor,
    /// `[batch]`, i64.
    pub pitch_lengths: Tensor,
    /// `[batch, 1, max_wav_len]`, f32.
    pub wav: Tensor,
    /// `[batch]`, i64.
    pub wav_lengths: Tensor,
    /// `[batch, max_duration_len]`, i64.
    pub durations: Tensor,
}
