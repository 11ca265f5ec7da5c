use std::path::Path;

use crate::error::DataError;
use crate::types::{FeatureMatrix, Waveform};

/// Features produced by the external extraction collaborator for one audio
/// file: acoustic matrix, pitch-derived matrix, decoded waveform, and the
/// rate the waveform was decoded at.
#[derive(Debug, Clone)]
pub struct ExtractedFeatures {
    pub spec: FeatureMatrix,
    pub pitch: FeatureMatrix,
    pub wav: Waveform,
    pub sample_rate_hz: u32,
}

/// External feature-extraction collaborator. Implementations own decoding,
/// spectrogram and pitch math, and any per-identifier caching; cached
/// entries must be invalidated by the implementor when source audio
/// changes. Invocations on distinct paths may run concurrently.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, audio_path: &Path) -> Result<ExtractedFeatures, DataError>;
}
