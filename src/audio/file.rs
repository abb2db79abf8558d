use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, warn};

/// A fully decoded 16-bit PCM WAV file
pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved samples
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;

        Self::decode(reader, path.display().to_string())
    }

    /// Decode WAV bytes received over the wire (TTS replies)
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self> {
        let reader = WavReader::new(Cursor::new(bytes)).context("Failed to parse WAV bytes")?;
        Self::decode(reader, "<memory>".to_string())
    }

    fn decode<R: Read>(reader: WavReader<R>, path: String) -> Result<Self> {
        let spec = reader.spec();
        if spec.bits_per_sample != 16 || spec.sample_format != SampleFormat::Int {
            bail!(
                "Only 16-bit PCM is supported, got {}-bit {:?}",
                spec.bits_per_sample,
                spec.sample_format
            );
        }

        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds =
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64);

        debug!(
            "Audio file loaded: {:.2}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path,
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Number of sample frames (one sample per channel)
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }
}

/// Playback length of a WAV file in seconds.
///
/// Unreadable files yield 0.0 so callers schedule nothing for them.
pub fn wav_duration(path: impl AsRef<Path>) -> f64 {
    let path = path.as_ref();
    match WavReader::open(path) {
        Ok(reader) => {
            let spec = reader.spec();
            if spec.sample_rate == 0 {
                return 0.0;
            }
            reader.duration() as f64 / spec.sample_rate as f64
        }
        Err(e) => {
            warn!("Failed to read WAV duration for {}: {}", path.display(), e);
            0.0
        }
    }
}

/// Write interleaved 16-bit samples as a PCM WAV file
pub fn write_wav(
    path: impl AsRef<Path>,
    samples: &[i16],
    sample_rate: u32,
    channels: u16,
) -> Result<()> {
    let path = path.as_ref();
    let bytes = encode_wav(samples, sample_rate, channels)?;

    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))
}

/// Encode interleaved 16-bit samples as in-memory WAV bytes
pub fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            WavWriter::new(&mut cursor, spec).context("Failed to start WAV encoder")?;
        for &sample in samples {
            writer
                .write_sample(sample)
                .context("Failed to write sample to WAV")?;
        }
        writer.finalize().context("Failed to finalize WAV bytes")?;
    }

    Ok(cursor.into_inner())
}
