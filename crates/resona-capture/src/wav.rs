//! WAV reading and writing for captured samples.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

fn mono_float_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    }
}

fn write_samples<W: Write + Seek>(
    mut writer: WavWriter<W>,
    samples: &[f32],
) -> Result<(), hound::Error> {
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize()
}

/// Write mono 32-bit float samples.
pub fn write_mono_wav(
    path: impl AsRef<Path>,
    samples: &[f32],
    sample_rate: u32,
) -> Result<(), hound::Error> {
    write_samples(WavWriter::create(path, mono_float_spec(sample_rate))?, samples)
}

/// Encode mono 32-bit float samples as an in-memory WAV file.
pub fn encode_mono_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let mut buf = Cursor::new(Vec::with_capacity(44 + samples.len() * 4));
    write_samples(WavWriter::new(&mut buf, mono_float_spec(sample_rate))?, samples)?;
    Ok(buf.into_inner())
}

/// Read a WAV file as mono f32, averaging channels, with its sample rate.
pub fn read_mono_wav(path: impl AsRef<Path>) -> Result<(Vec<f32>, u32), hound::Error> {
    mixdown(WavReader::open(path)?)
}

/// [`read_mono_wav`] over an in-memory WAV file.
pub fn decode_mono_wav(bytes: &[u8]) -> Result<(Vec<f32>, u32), hound::Error> {
    mixdown(WavReader::new(bytes)?)
}

fn mixdown<R: Read>(reader: WavReader<R>) -> Result<(Vec<f32>, u32), hound::Error> {
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    let mono = if channels > 1 {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        samples
    };
    Ok((mono, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ch.wav");
        let samples = vec![0.0, 0.5, -0.25, 1.0];
        write_mono_wav(&path, &samples, 44100).unwrap();
        let (read, rate) = read_mono_wav(&path).unwrap();
        assert_eq!(read, samples);
        assert_eq!(rate, 44100);
    }

    #[test]
    fn int_stereo_is_mixed_down() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for s in [16384i16, 0, -16384, -16384] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let (mono, _) = read_mono_wav(&path).unwrap();
        assert_eq!(mono, vec![0.25, -0.5]);
    }

    #[test]
    fn in_memory_round_trip() {
        let samples = vec![0.125, -0.75, 0.0];
        let bytes = encode_mono_wav(&samples, 96000).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(decode_mono_wav(&bytes).unwrap(), (samples, 96000));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode_mono_wav(b"not a wav file").is_err());
    }
}
