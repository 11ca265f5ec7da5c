use std::cmp::Reverse;

use candle_core::{Device, Tensor};

use crate::error::DataError;
use crate::types::{BatchTensors, ReconciledExample};

/// Assembles reconciled examples of differing lengths into zero-padded
/// batch tensors, sorted by descending text-unit length so packed-sequence
/// consumers can rely on the ordering.
pub struct Collator {
    device: Device,
}

impl Collator {
    pub fn new(device: Device) -> Self {
        Self { device }
    }

    pub fn collate(&self, batch: &[ReconciledExample]) -> Result<BatchTensors, DataError> {
        if batch.is_empty() {
            return Err(DataError::invalid_input("cannot collate an empty batch"));
        }
        let spec_channels = batch[0].spec.channel_count();
        let pitch_channels = batch[0].pitch.channel_count();
        for example in batch {
            if example.spec.channel_count() != spec_channels
                || example.pitch.channel_count() != pitch_channels
            {
                return Err(DataError::invalid_input(
                    "feature channel counts differ across the batch",
                ));
            }
        }

        let b = batch.len();
        // stable sort: ties keep the caller's (manifest-relative) order
        let mut order: Vec<usize> = (0..b).collect();
        order.sort_by_key(|&i| Reverse(batch[i].text_units.len()));

        let max_text = field_max(batch, |e| e.text_units.len());
        let max_spec = field_max(batch, |e| e.spec.frame_count());
        let max_pitch = field_max(batch, |e| e.pitch.frame_count());
        let max_wav = field_max(batch, |e| e.wav.sample_count());
        let max_dur = field_max(batch, |e| e.durations.len());

        let mut text = vec![0i64; b * max_text];
        let mut spec = vec![0f32; b * spec_channels * max_spec];
        let mut pitch = vec![0f32; b * pitch_channels * max_pitch];
        let mut wav = vec![0f32; b * max_wav];
        let mut durations = vec![0i64; b * max_dur];
        let mut text_lengths = vec![0i64; b];
        let mut spec_lengths = vec![0i64; b];
        let mut pitch_lengths = vec![0i64; b];
        let mut wav_lengths = vec![0i64; b];

        for (row, &src) in order.iter().enumerate() {
            let example = &batch[src];

            let t = &example.text_units;
            text[row * max_text..row * max_text + t.len()].copy_from_slice(t);
            text_lengths[row] = t.len() as i64;

            for c in 0..spec_channels {
                let channel = example.spec.channel(c);
                let offset = (row * spec_channels + c) * max_spec;
                spec[offset..offset + channel.len()].copy_from_slice(channel);
            }
            spec_lengths[row] = example.spec.frame_count() as i64;

            for c in 0..pitch_channels {
                let channel = example.pitch.channel(c);
                let offset = (row * pitch_channels + c) * max_pitch;
                pitch[offset..offset + channel.len()].copy_from_slice(channel);
            }
            pitch_lengths[row] = example.pitch.frame_count() as i64;

            let samples = example.wav.samples();
            wav[row * max_wav..row * max_wav + samples.len()].copy_from_slice(samples);
            wav_lengths[row] = samples.len() as i64;

            let d = &example.durations;
            durations[row * max_dur..row * max_dur + d.len()].copy_from_slice(d);
        }

        Ok(BatchTensors {
            text: self.tensor_2d(text, b, max_text, "text")?,
            text_lengths: self.tensor_1d(text_lengths, "text lengths")?,
            spec: self.tensor_3d(spec, b, spec_channels, max_spec, "spec")?,
            spec_lengths: self.tensor_1d(spec_lengths, "spec lengths")?,
            pitch: self.tensor_3d(pitch, b, pitch_channels, max_pitch, "pitch")?,
            pitch_lengths: self.tensor_1d(pitch_lengths, "pitch lengths")?,
            wav: self.tensor_3d(wav, b, 1, max_wav, "wav")?,
            wav_lengths: self.tensor_1d(wav_lengths, "wav lengths")?,
            durations: self.tensor_2d(durations, b, max_dur, "durations")?,
        })
    }

    fn tensor_1d<T: candle_core::WithDType>(
        &self,
        data: Vec<T>,
        field: &'static str,
    ) -> Result<Tensor, DataError> {
        let len = data.len();
        Tensor::from_vec(data, len, &self.device).map_err(|e| DataError::runtime(field, e))
    }

    fn tensor_2d<T: candle_core::WithDType>(
        &self,
        data: Vec<T>,
        b: usize,
        len: usize,
        field: &'static str,
    ) -> Result<Tensor, DataError> {
        Tensor::from_vec(data, (b, len), &self.device).map_err(|e| DataError::runtime(field, e))
    }

    fn tensor_3d<T: candle_core::WithDType>(
        &self,
        data: Vec<T>,
        b: usize,
        channels: usize,
        len: usize,
        field: &'static str,
    ) -> Result<Tensor, DataError> {
        Tensor::from_vec(data, (b, channels, len), &self.device)
            .map_err(|e| DataError::runtime(field, e))
    }
}

fn field_max(batch: &[ReconciledExample], len: impl Fn(&ReconciledExample) -> usize) -> usize {
    batch.iter().map(len).max().unwrap_or(0)
}
