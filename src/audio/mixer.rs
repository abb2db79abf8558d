// Channel mixdown for microphone-array recordings
//
// The robot records all of its microphones into one interleaved WAV.
// Speech services expect mono, so every frame is collapsed to the integer
// average of its channels.

use anyhow::{bail, Result};
use std::path::Path;
use tracing::{debug, info};

use super::file::{write_wav, AudioFile};

/// Average interleaved multi-channel samples down to one channel.
///
/// Each output sample is `floor(sum / channels)` over one frame. A trailing
/// partial frame is dropped.
pub fn downmix_to_mono(samples: &[i16], channels: u16) -> Result<Vec<i16>> {
    if channels == 0 {
        bail!("Cannot downmix audio with zero channels");
    }

    if channels == 1 {
        return Ok(samples.to_vec());
    }

    let width = channels as i32;
    let mono = samples
        .chunks_exact(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            sum.div_euclid(width) as i16
        })
        .collect();

    Ok(mono)
}

/// Rewrite a multi-channel WAV file as mono.
///
/// `input` and `output` may point at the same file; the input is fully read
/// before the output is created.
pub fn mix_file_to_mono(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    let audio = AudioFile::open(input)?;
    let mono = downmix_to_mono(&audio.samples, audio.channels)?;

    debug!(
        "Mixed {} channels down to mono ({} frames)",
        audio.channels,
        mono.len()
    );

    write_wav(output, &mono, audio.sample_rate, 1)?;

    info!("Wrote mono WAV: {}", output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_four_channels() {
        let samples = vec![
            100, 200, 300, 400, // frame 0
            -4, -4, -4, -4, // frame 1
            1, 1, 1, 2, // frame 2
        ];

        let mono = downmix_to_mono(&samples, 4).unwrap();
        assert_eq!(mono, vec![250, -4, 1]);
    }

    #[test]
    fn test_downmix_floors_negative_averages() {
        // -3 / 2 = -1.5 -> floor -> -2
        let mono = downmix_to_mono(&[-1, -2], 2).unwrap();
        assert_eq!(mono, vec![-2]);

        // 3 / 2 = 1.5 -> floor -> 1
        let mono = downmix_to_mono(&[1, 2], 2).unwrap();
        assert_eq!(mono, vec![1]);
    }

    #[test]
    fn test_downmix_does_not_overflow_at_extremes() {
        let samples = vec![i16::MAX, i16::MAX, i16::MIN, i16::MIN];
        let mono = downmix_to_mono(&samples, 2).unwrap();
        assert_eq!(mono, vec![i16::MAX, i16::MIN]);
    }

    #[test]
    fn test_downmix_drops_partial_frame() {
        let samples = vec![10, 20, 30, 40, 50];
        let mono = downmix_to_mono(&samples, 2).unwrap();
        assert_eq!(mono, vec![15, 35]);
    }

    #[test]
    fn test_downmix_mono_is_identity() {
        let samples = vec![5, -5, 7];
        assert_eq!(downmix_to_mono(&samples, 1).unwrap(), samples);
    }

    #[test]
    fn test_downmix_zero_channels_fails() {
        assert!(downmix_to_mono(&[1, 2, 3], 0).is_err());
    }

    #[test]
    fn test_mix_file_in_place() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("capture.wav");

        write_wav(&path, &[100, 300, -100, -300, 8, 8, 8, 8], 16000, 4)?;
        mix_file_to_mono(&path, &path)?;

        let audio = AudioFile::open(&path)?;
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.sample_rate, 16000);
        assert_eq!(audio.samples, vec![0, 8]);
        Ok(())
    }
}
