//! Installer download with progress reporting
//!
//! Streams the response body straight to the destination file, so the
//! payload is never held in memory as a whole. When the server declares a
//! content length the sink receives a monotonically increasing fraction that
//! ends at exactly 1.0; otherwise it only receives indeterminate progress and
//! a running byte count as status text.
//!
//! A failed download leaves the partially written file in place for
//! inspection.

use futures_util::StreamExt;
use reqwest::header::CONTENT_LENGTH;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

use crate::progress::{Progress, ProgressSink};
use sua_core::NetworkConfig;

/// Why a download failed
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Connection, timeout, DNS or transfer failure
    #[error("Network error while downloading {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("Server returned HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    /// Destination could not be written
    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result of a successful download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    /// Path the artifact was written to
    pub path: PathBuf,

    /// Bytes written
    pub bytes: u64,

    /// Size declared by the server, if any
    pub total: Option<u64>,
}

/// Artifact downloader
pub struct ArtifactDownloader {
    /// HTTP client
    client: reqwest::Client,

    /// Write buffer size
    chunk_size: usize,
}

impl ArtifactDownloader {
    /// Create a downloader honouring the configured timeouts
    pub fn new(network: &NetworkConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(network.user_agent.clone())
            .connect_timeout(Duration::from_secs(network.connect_timeout_secs))
            .read_timeout(Duration::from_secs(network.read_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            chunk_size: network.download_chunk_size.max(1),
        })
    }

    /// Download `url` to `destination`, reporting progress to `sink`
    pub async fn download(
        &self,
        url: &str,
        destination: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<DownloadReport, DownloadError> {
        info!("Downloading {} to {:?}", url, destination);
        sink.on_status("Connecting to server...");
        sink.on_progress(Progress::Indeterminate);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| DownloadError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Download of {} failed with status {}", url, status);
            return Err(DownloadError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Header rather than `content_length()`: the latter reports the size of
        // a decoded body, which is not what the server announced.
        let total = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|ct| ct.to_str().ok())
            .and_then(|ct| ct.parse::<u64>().ok())
            .filter(|len| *len > 0);

        match total {
            Some(len) => {
                debug!("Server reports {} ({} bytes)", human_readable_size(len), len);
                sink.on_status("Downloading...");
                sink.on_progress(Progress::Fraction(0.0));
            }
            None => sink.on_status("Downloading... (size unknown)"),
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::io(parent, e))?;
        }

        let file = File::create(destination)
            .await
            .map_err(|e| DownloadError::io(destination, e))?;
        let mut writer = BufWriter::with_capacity(self.chunk_size, file);

        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk: bytes::Bytes = chunk_result.map_err(|source| DownloadError::Network {
                url: url.to_string(),
                source,
            })?;
            if chunk.is_empty() {
                continue;
            }

            writer
                .write_all(&chunk)
                .await
                .map_err(|e| DownloadError::io(destination, e))?;

            downloaded += chunk.len() as u64;
            report_chunk(sink, downloaded, total);
        }

        writer
            .flush()
            .await
            .map_err(|e| DownloadError::io(destination, e))?;

        if let Some(len) = total {
            if downloaded != len {
                warn!(
                    "Downloaded {} bytes but server announced {}",
                    downloaded, len
                );
            }
        }

        sink.on_status("Download complete");
        info!(
            "Download completed: {:?} ({})",
            destination,
            human_readable_size(downloaded)
        );

        Ok(DownloadReport {
            path: destination.to_path_buf(),
            bytes: downloaded,
            total,
        })
    }
}

fn report_chunk(sink: &dyn ProgressSink, downloaded: u64, total: Option<u64>) {
    match total {
        Some(len) => {
            let fraction = (downloaded as f64 / len as f64).min(1.0);
            sink.on_progress(Progress::Fraction(fraction));
            sink.on_status(&format!("Downloading... {:.1}%", fraction * 100.0));
        }
        None => {
            sink.on_progress(Progress::Indeterminate);
            sink.on_status(&format!(
                "Downloading... (size unknown) {}",
                human_readable_size(downloaded)
            ));
        }
    }
}

/// Convert bytes to human-readable size
pub fn human_readable_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::testing::RecordingReporter;

    #[test]
    fn test_human_readable_size() {
        assert_eq!(human_readable_size(0), "0.00 B");
        assert_eq!(human_readable_size(1023), "1023.00 B");
        assert_eq!(human_readable_size(1024), "1.00 KB");
        assert_eq!(human_readable_size(1024 * 1024), "1.00 MB");
    }

    #[test]
    fn test_report_chunk_known_size() {
        let sink = RecordingReporter::default();
        report_chunk(&sink, 50, Some(200));
        report_chunk(&sink, 200, Some(200));
        assert_eq!(
            sink.progress_values(),
            vec![Progress::Fraction(0.25), Progress::Fraction(1.0)]
        );
    }

    #[test]
    fn test_report_chunk_unknown_size() {
        let sink = RecordingReporter::default();
        report_chunk(&sink, 50, None);
        assert_eq!(sink.progress_values(), vec![Progress::Indeterminate]);
    }

    #[test]
    fn test_downloader_creation() {
        let downloader = ArtifactDownloader::new(&NetworkConfig::default()).unwrap();
        assert_eq!(downloader.chunk_size, 8192);
    }
}
