pub mod catalog;
pub mod collate;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod reconcile;
pub mod sampler;
pub mod types;

pub use catalog::Catalog;
pub use collate::Collator;
pub use config::AudioDataConfig;
pub use error::DataError;
pub use pipeline::loader::DatasetLoader;
pub use pipeline::traits::{ExtractedFeatures, FeatureExtractor};
pub use reconcile::reconcile;
pub use sampler::{DistributedBucketSampler, SamplerConfig};
pub use types::{BatchTensors, CatalogEntry, FeatureMatrix, ReconciledExample, Waveform};
