use candle_core::Device;

use crate::catalog::Catalog;
use crate::collate::Collator;
use crate::config::AudioDataConfig;
use crate::error::DataError;
use crate::pipeline::traits::FeatureExtractor;
use crate::reconcile::reconcile;
use crate::types::{BatchTensors, ReconciledExample};

/// Fetch-time glue: pulls features for a catalog entry, reconciles them
/// against the duration annotation, and collates sampler batches.
pub struct DatasetLoader {
    catalog: Catalog,
    extractor: Box<dyn FeatureExtractor>,
    config: AudioDataConfig,
    collator: Collator,
}

impl DatasetLoader {
    pub fn new(
        catalog: Catalog,
        extractor: Box<dyn FeatureExtractor>,
        config: AudioDataConfig,
        device: Device,
    ) -> Self {
        Self {
            catalog,
            extractor,
            config,
            collator: Collator::new(device),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Fetches and reconciles one example by catalog index.
    pub fn fetch(&self, index: usize) -> Result<ReconciledExample, DataError> {
        let entry = self.catalog.entry(index).ok_or_else(|| {
            DataError::invalid_input(format!(
                "catalog index {index} out of range ({} entries)",
                self.catalog.len()
            ))
        })?;

        let features = self.extractor.extract(&entry.audio_path)?;
        if features.sample_rate_hz != self.config.sampling_rate {
            return Err(DataError::invalid_input(format!(
                "'{}': extractor sample rate {} Hz does not match configured {} Hz",
                entry.id, features.sample_rate_hz, self.config.sampling_rate
            )));
        }

        let mut spec = features.spec;
        let mut wav = features.wav;
        reconcile(
            &entry.id,
            &mut spec,
            &mut wav,
            &entry.text_units,
            &entry.durations,
            self.config.hop_length,
        )?;

        Ok(ReconciledExample {
            text_units: entry.text_units.clone(),
            durations: entry.durations.clone(),
            spec,
            pitch: features.pitch,
            wav,
        })
    }

    /// Fetches every index of one sampler batch and collates the result.
    /// Any per-example failure aborts the whole batch; nothing is dropped
    /// silently.
    pub fn collate_indices(&self, indices: &[usize]) -> Result<BatchTensors, DataError> {
        let mut examples = Vec::with_capacity(indices.len());
        for &index in indices {
            examples.push(self.fetch(index)?);
        }
        self.collator.collate(&examples)
    }

    /// Fetches every catalog entry once so extractor-side caches end up
    /// populated before training starts.
    pub fn warm_up(&self) -> Result<(), DataError> {
        for index in 0..self.catalog.len() {
            self.fetch(index)?;
            if (index + 1) % 1000 == 0 {
                tracing::debug!(
                    fetched = index + 1,
                    total = self.catalog.len(),
                    "loader: warm-up progress"
                );
            }
        }
        Ok(())
    }
}
