use std::path::Path;

use rand::prelude::SliceRandom;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::AudioDataConfig;
use crate::error::DataError;
use crate::types::CatalogEntry;

/// Fixed seed for the manifest row shuffle so repeated loads of the same
/// manifest produce the same entry order.
const MANIFEST_SHUFFLE_SEED: u64 = 1234;

/// Number of bytes per waveform sample in the on-disk audio files (mono,
/// 16-bit PCM). Used for the cheap frame-count estimate.
const BYTES_PER_SAMPLE: u64 = 2;

/// Immutable collection of retained examples plus their index-aligned
/// acoustic lengths in frames.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    lengths: Vec<usize>,
}

impl Catalog {
    /// Loads a manifest of `identifier|durations|text_units` rows, shuffles
    /// them reproducibly, filters by text-unit length, and estimates each
    /// retained example's acoustic length in frames from audio file size
    /// without decoding.
    pub fn load(manifest_path: &Path, config: &AudioDataConfig) -> Result<Self, DataError> {
        if config.hop_length == 0 {
            return Err(DataError::invalid_input("hop_length must be positive"));
        }
        let raw = std::fs::read_to_string(manifest_path)
            .map_err(|e| DataError::io("read manifest", e))?;

        let mut rows = Vec::new();
        for (line_idx, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            rows.push(parse_row(line_idx + 1, line)?);
        }

        let mut rng = StdRng::seed_from_u64(MANIFEST_SHUFFLE_SEED);
        rows.shuffle(&mut rng);

        let data_path = Path::new(&config.data_path);
        let mut entries = Vec::new();
        let mut lengths = Vec::new();
        let mut filtered_out = 0usize;
        for row in rows {
            let text_len = row.text_units.len();
            if text_len < config.min_text_len || text_len > config.max_text_len {
                filtered_out += 1;
                continue;
            }
            let audio_path = data_path.join(format!("{}.wav", row.id));
            let file_size = std::fs::metadata(&audio_path)
                .map_err(|e| DataError::io("read audio file metadata", e))?
                .len();
            // wav sample count ~= file_size / bytes-per-sample; one frame
            // spans hop_length samples.
            let frames = (file_size / (BYTES_PER_SAMPLE * config.hop_length as u64)) as usize;
            entries.push(CatalogEntry {
                id: row.id,
                audio_path,
                text_units: row.text_units,
                durations: row.durations,
            });
            lengths.push(frames);
        }

        tracing::debug!(
            retained = entries.len(),
            filtered_out,
            min_text_len = config.min_text_len,
            max_text_len = config.max_text_len,
            "catalog: loaded manifest"
        );

        Ok(Self { entries, lengths })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Acoustic length estimate in frames, index-aligned with `entries`.
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }
}

struct ManifestRow {
    id: String,
    text_units: Vec<i64>,
    durations: Vec<i64>,
}

fn parse_row(line: usize, raw: &str) -> Result<ManifestRow, DataError> {
    let fields: Vec<&str> = raw.split('|').collect();
    if fields.len() != 3 {
        return Err(DataError::manifest_format(
            line,
            format!("expected 3 '|'-separated fields, found {}", fields.len()),
        ));
    }
    let id = fields[0].trim();
    if id.is_empty() {
        return Err(DataError::manifest_format(line, "empty identifier"));
    }
    let durations = parse_int_list(line, fields[1], "duration annotation")?;
    if durations.iter().any(|&d| d < 0) {
        return Err(DataError::manifest_format(
            line,
            "negative value in duration annotation",
        ));
    }
    let text_units = parse_int_list(line, fields[2], "text units")?;
    Ok(ManifestRow {
        id: id.to_string(),
        text_units,
        durations,
    })
}

fn parse_int_list(line: usize, raw: &str, field: &str) -> Result<Vec<i64>, DataError> {
    raw.split_whitespace()
        .map(|tok| {
            tok.parse::<i64>().map_err(|_| {
                DataError::manifest_format(line, format!("non-integer token '{tok}' in {field}"))
            })
        })
        .collect()
}
