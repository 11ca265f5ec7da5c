use crate::error::DataError;
use crate::types::{FeatureMatrix, Waveform};

/// Extraction and annotation run as independent processes and may disagree
/// by one rounding frame; anything at or past this gap is a real mismatch.
const MAX_FRAME_MISMATCH: usize = 2;

/// Forces the acoustic matrix and waveform to agree with the duration
/// annotation's total frame count, truncating when the extractor produced
/// more frames and zero-padding when it produced fewer.
///
/// # Errors
///
/// `DataError::Alignment` when the frame gap is too large to absorb;
/// `DataError::InvariantViolation` when the post-reconciliation contract
/// does not hold (a logic bug upstream, fatal).
pub fn reconcile(
    id: &str,
    spec: &mut FeatureMatrix,
    wav: &mut Waveform,
    text_units: &[i64],
    durations: &[i64],
    hop_length: usize,
) -> Result<(), DataError> {
    if hop_length == 0 {
        return Err(DataError::invalid_input("hop_length must be positive"));
    }

    let target_frames: usize = durations.iter().map(|&d| d as usize).sum();
    let frames = spec.frame_count();
    if frames.abs_diff(target_frames) >= MAX_FRAME_MISMATCH {
        return Err(DataError::alignment(
            id,
            format!("extracted {frames} frames but durations sum to {target_frames}"),
        ));
    }

    let target_samples = target_frames * hop_length;
    if frames > target_frames {
        spec.truncate_frames(target_frames);
        wav.truncate(target_samples);
    } else if frames < target_frames {
        spec.pad_frames(target_frames);
        wav.pad(target_samples);
    }

    if text_units.len() != durations.len() {
        return Err(DataError::invariant(
            "reconcile",
            format!(
                "{} text units but {} durations for '{id}'",
                text_units.len(),
                durations.len()
            ),
        ));
    }
    if wav.sample_count() / hop_length != target_frames {
        return Err(DataError::invariant(
            "reconcile",
            format!(
                "waveform holds {} samples, expected {target_samples} for '{id}'",
                wav.sample_count()
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOP: usize = 4;

    fn spec_of(frames: usize) -> FeatureMatrix {
        FeatureMatrix::new(2, frames, (0..2 * frames).map(|v| v as f32 + 1.0).collect())
            .expect("consistent shape")
    }

    fn wav_of(samples: usize) -> Waveform {
        Waveform::new((0..samples).map(|v| v as f32 + 1.0).collect())
    }

    #[test]
    fn reconcile_truncates_when_one_frame_long() {
        // durations sum to 5, extractor produced 6 frames
        let mut spec = spec_of(6);
        let mut wav = wav_of(6 * HOP);
        reconcile("x", &mut spec, &mut wav, &[1, 2], &[2, 3], HOP).expect("reconcile");
        assert_eq!(spec.frame_count(), 5);
        assert_eq!(wav.sample_count(), 5 * HOP);
        // truncation keeps the prefix of every channel
        assert_eq!(spec.channel(0), &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(spec.channel(1), &[7.0, 8.0, 9.0, 10.0, 11.0]);
    }

    #[test]
    fn reconcile_pads_when_one_frame_short() {
        let mut spec = spec_of(4);
        let mut wav = wav_of(4 * HOP);
        reconcile("x", &mut spec, &mut wav, &[1, 2], &[2, 3], HOP).expect("reconcile");
        assert_eq!(spec.frame_count(), 5);
        assert_eq!(wav.sample_count(), 5 * HOP);
        assert_eq!(spec.channel(0), &[1.0, 2.0, 3.0, 4.0, 0.0]);
        assert_eq!(wav.samples()[4 * HOP..], [0.0; HOP]);
    }

    #[test]
    fn reconcile_is_identity_on_exact_match_and_idempotent() {
        let mut spec = spec_of(5);
        let mut wav = wav_of(5 * HOP);
        let before_spec = spec.clone();
        let before_wav = wav.clone();
        reconcile("x", &mut spec, &mut wav, &[1, 2], &[2, 3], HOP).expect("first");
        assert_eq!(spec, before_spec);
        assert_eq!(wav, before_wav);

        // a reconciled example is a fixed point
        let once_spec = spec.clone();
        let once_wav = wav.clone();
        reconcile("x", &mut spec, &mut wav, &[1, 2], &[2, 3], HOP).expect("second");
        assert_eq!(spec, once_spec);
        assert_eq!(wav, once_wav);
    }

    #[test]
    fn reconcile_rejects_two_frame_gap() {
        let mut spec = spec_of(7);
        let mut wav = wav_of(7 * HOP);
        let err = reconcile("bad", &mut spec, &mut wav, &[1, 2], &[2, 3], HOP).unwrap_err();
        assert!(matches!(err, DataError::Alignment { .. }));
    }

    #[test]
    fn reconcile_rejects_text_duration_count_mismatch() {
        let mut spec = spec_of(5);
        let mut wav = wav_of(5 * HOP);
        let err = reconcile("bad", &mut spec, &mut wav, &[1, 2, 3], &[2, 3], HOP).unwrap_err();
        assert!(matches!(err, DataError::InvariantViolation { .. }));
    }

    #[test]
    fn reconcile_rejects_waveform_shorter_than_annotation() {
        // 5 frames of spec but only 2 frames worth of samples
        let mut spec = spec_of(5);
        let mut wav = wav_of(2 * HOP);
        let err = reconcile("bad", &mut spec, &mut wav, &[1, 2], &[2, 3], HOP).unwrap_err();
        assert!(matches!(err, DataError::InvariantViolation { .. }));
    }
}
