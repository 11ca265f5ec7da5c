use std::path::Path;

use crate::error::DataError;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AudioDataConfig {
    /// Directory holding `<id>.wav` files referenced by the manifest.
    pub data_path: String,
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: u32,
    #[serde(default = "default_filter_length")]
    pub filter_length: usize,
    #[serde(default = "default_hop_length")]
    pub hop_length: usize,
    #[serde(default = "default_win_length")]
    pub win_length: usize,
    #[serde(default = "default_min_text_len")]
    pub min_text_len: usize,
    #[serde(default = "default_max_text_len")]
    pub max_text_len: usize,
}

fn default_sampling_rate() -> u32 {
    AudioDataConfig::DEFAULT_SAMPLING_RATE_HZ
}
fn default_filter_length() -> usize {
    1024
}
fn default_hop_length() -> usize {
    256
}
fn default_win_length() -> usize {
    1024
}
fn default_min_text_len() -> usize {
    1
}
fn default_max_text_len() -> usize {
    190
}

impl AudioDataConfig {
    pub const DEFAULT_SAMPLING_RATE_HZ: u32 = 22_050;

    pub fn load(path: &Path) -> Result<Self, DataError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| DataError::io("read data config json", e))?;
        serde_json::from_str(&data).map_err(|e| DataError::json("parse data config json", e))
    }
}

impl Default for AudioDataConfig {
    fn default() -> Self {
        Self {
            data_path: String::new(),
            sampling_rate: default_sampling_rate(),
            filter_length: default_filter_length(),
            hop_length: default_hop_length(),
            win_length: default_win_length(),
            min_text_len: default_min_text_len(),
            max_text_len: default_max_text_len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_data_config_default() {
        let config = AudioDataConfig::default();
        assert!(config.data_path.is_empty());
        assert_eq!(config.sampling_rate, 22_050);
        assert_eq!(config.hop_length, 256);
        assert_eq!(config.min_text_len, 1);
        assert_eq!(config.max_text_len, 190);
    }

    #[test]
    fn audio_data_config_from_json_with_defaults() {
        let json = r#"{
            "data_path": "data/wavs",
            "hop_length": 512
        }"#;
        let config: AudioDataConfig = serde_json::from_str(json).expect("valid config json");
        assert_eq!(config.data_path, "data/wavs");
        assert_eq!(config.hop_length, 512);
        // unspecified fields fall back to defaults
        assert_eq!(config.sampling_rate, 22_050);
        assert_eq!(config.filter_length, 1024);
        assert_eq!(config.max_text_len, 190);
    }
}
