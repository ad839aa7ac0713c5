//! Recording archives.
//!
//! A session is saved as one ZIP file:
//!
//! ```text
//! session.zip
//! ├── metadata.json              version, capture parameters per channel
//! ├── channel_0_analysis.frd     analysed response
//! ├── channel_0_recorded.wav     raw samples (only when captured)
//! ├── channel_1_analysis.frd
//! └── ...
//! ```
//!
//! FRD entries keep full `f64` precision, so a saved result loads back equal.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use resona_analysis::{parse_frd, to_frd_string};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::ArchiveError;
use crate::recording::{CaptureMetadata, RecordingResult};
use crate::wav::{decode_mono_wav, encode_mono_wav};

/// Archive format version written by this build.
pub const ARCHIVE_VERSION: u32 = 1;

const METADATA_ENTRY: &str = "metadata.json";

#[derive(Debug, Serialize, Deserialize)]
struct ArchiveMetadata {
    version: u32,
    #[serde(default)]
    created_unix_secs: u64,
    channels: Vec<ChannelEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChannelEntry {
    channel: usize,
    metadata: CaptureMetadata,
    analysis_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recorded_file: Option<String>,
}

/// Recording results plus any raw samples, ready to save or just loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingArchive {
    /// Results ordered by channel.
    pub results: Vec<RecordingResult>,
    /// Raw samples keyed by channel.
    pub samples: BTreeMap<usize, Vec<f32>>,
}

impl RecordingArchive {
    /// Archive of `results` without raw samples.
    pub fn new(results: Vec<RecordingResult>) -> Self {
        Self {
            results,
            samples: BTreeMap::new(),
        }
    }

    /// Attach raw samples for `channel`.
    pub fn with_samples(mut self, channel: usize, samples: Vec<f32>) -> Self {
        self.samples.insert(channel, samples);
        self
    }

    /// Write the archive to the ZIP file at `path`, replacing it.
    ///
    /// Missing parent directories are created.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ArchiveError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ArchiveError::io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| ArchiveError::io(path, e))?;
        self.write_to(file)
            .map_err(|e| with_archive_path(e, path))?;

        tracing::info!(
            path = %path.display(),
            channels = self.results.len(),
            with_samples = self.samples.len(),
            "saved recording archive"
        );
        Ok(())
    }

    /// Read an archive from the ZIP file at `path`.
    ///
    /// Every entry is read and every response validated; nothing is returned
    /// unless all of them load.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
        let archive = Self::read_from(file).map_err(|e| with_archive_path(e, path))?;

        tracing::debug!(
            path = %path.display(),
            channels = archive.results.len(),
            "loaded recording archive"
        );
        Ok(archive)
    }

    /// Write the archive into any seekable sink.
    pub fn write_to<W: Write + Seek>(&self, sink: W) -> Result<(), ArchiveError> {
        let mut zip = ZipWriter::new(sink);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut channels = Vec::with_capacity(self.results.len());
        for result in &self.results {
            let n = result.channel;

            let analysis_file = format!("channel_{n}_analysis.frd");
            zip.start_file(analysis_file.as_str(), options)?;
            zip.write_all(to_frd_string(&result.response).as_bytes())
                .map_err(ZipError::Io)?;

            let recorded_file = match self.samples.get(&n) {
                Some(samples) => {
                    let name = format!("channel_{n}_recorded.wav");
                    let bytes = encode_mono_wav(samples, result.metadata.sample_rate)
                        .map_err(|e| ArchiveError::wav(name.as_str(), e))?;
                    zip.start_file(name.as_str(), options)?;
                    zip.write_all(&bytes).map_err(ZipError::Io)?;
                    Some(name)
                }
                None => None,
            };

            channels.push(ChannelEntry {
                channel: n,
                metadata: result.metadata.clone(),
                analysis_file,
                recorded_file,
            });
        }

        let metadata = ArchiveMetadata {
            version: ARCHIVE_VERSION,
            created_unix_secs: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            channels,
        };
        zip.start_file(METADATA_ENTRY, options)?;
        zip.write_all(serde_json::to_string_pretty(&metadata)?.as_bytes())
            .map_err(ZipError::Io)?;
        zip.finish()?;
        Ok(())
    }

    /// Read an archive from any seekable source.
    pub fn read_from<R: Read + Seek>(source: R) -> Result<Self, ArchiveError> {
        let mut zip = ZipArchive::new(source)?;

        let metadata: ArchiveMetadata =
            serde_json::from_slice(&read_entry(&mut zip, METADATA_ENTRY)?)?;
        if metadata.version != ARCHIVE_VERSION {
            return Err(ArchiveError::UnsupportedVersion {
                found: metadata.version,
                expected: ARCHIVE_VERSION,
            });
        }

        let mut archive = RecordingArchive::default();
        for entry in metadata.channels {
            let text = read_entry(&mut zip, &entry.analysis_file)?;
            let response = parse_frd(&String::from_utf8_lossy(&text))?;
            if let Some(name) = &entry.recorded_file {
                let (samples, _) = decode_mono_wav(&read_entry(&mut zip, name)?)
                    .map_err(|e| ArchiveError::wav(name.as_str(), e))?;
                archive.samples.insert(entry.channel, samples);
            }
            archive.results.push(RecordingResult {
                channel: entry.channel,
                response,
                metadata: entry.metadata,
            });
        }
        archive.results.sort_by_key(|r| r.channel);
        Ok(archive)
    }
}

fn read_entry<R: Read + Seek>(zip: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>, ArchiveError> {
    let mut file = match zip.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Err(ArchiveError::MissingEntry(name.to_string())),
        Err(e) => return Err(e.into()),
    };
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).map_err(ZipError::Io)?;
    Ok(buf)
}

/// Attach the archive path to container-level I/O failures.
fn with_archive_path(err: ArchiveError, path: &Path) -> ArchiveError {
    match err {
        ArchiveError::Zip(ZipError::Io(source)) => ArchiveError::io(path, source),
        other => other,
    }
}
