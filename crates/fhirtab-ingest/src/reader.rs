//! Reads FHIR bundles from a source and feeds them to the transform stage.
//!
//! One source per run. Whatever happens, [`BundleReader::run`] terminates
//! the stream, so downstream stages never wait on a channel that will not
//! end.

use crate::source::BundleSource;
use fhirtab_common::queue::{QueueClosed, QueueSender};
use fhirtab_model::{Bundle, ModelError};
use futures::future::join_all;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// Default per-request timeout for HTTP fetches.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that abort ingestion outright. Failures scoped to a single file
/// or URL are counted in [`IngestSummary::failed`] instead.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GET {url} returned status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("{url} did not return a folder listing: {source}")]
    MalformedListing {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{location} is not a FHIR bundle: {source}")]
    InvalidBundle {
        location: String,
        #[source]
        source: ModelError,
    },

    #[error(transparent)]
    Queue(#[from] QueueClosed),

    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),
}

/// Counts for one ingest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Candidate files or URLs found at the source.
    pub discovered: usize,
    /// Bundles parsed and handed to the transform stage.
    pub enqueued: usize,
    /// Candidates that could not be read, fetched, or parsed.
    pub failed: usize,
}

impl IngestSummary {
    /// True when every discovered candidate made it onto the queue.
    pub fn complete(&self) -> bool {
        self.failed == 0
    }
}

// GitHub serves folder pages as JSON when asked; the file names sit under
// payload.tree.items.
#[derive(Debug, Deserialize)]
struct FolderListing {
    payload: ListingPayload,
}

#[derive(Debug, Deserialize)]
struct ListingPayload {
    tree: ListingTree,
}

#[derive(Debug, Deserialize)]
struct ListingTree {
    items: Vec<ListingItem>,
}

#[derive(Debug, Deserialize)]
struct ListingItem {
    name: String,
}

/// The ingest stage.
pub struct BundleReader {
    client: reqwest::Client,
}

impl BundleReader {
    /// Reader with [`DEFAULT_HTTP_TIMEOUT`].
    pub fn new() -> Result<Self, SourceError> {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    /// Reader with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SourceError::Client)?;
        Ok(Self { client })
    }

    /// Drain the source into the queue.
    ///
    /// The end-of-stream marker is delivered even when ingestion fails, so
    /// the consumer always sees the stream terminate.
    pub async fn run(
        &self,
        source: &BundleSource,
        queue: QueueSender<Bundle>,
    ) -> Result<IngestSummary, SourceError> {
        let outcome = match source {
            BundleSource::LocalDir(path) => self.read_local_dir(path, &queue).await,
            BundleSource::FileUrl(url) => self.read_file_url(url, &queue).await,
            BundleSource::FolderUrl(url) => self.read_folder_url(url, &queue).await,
        };

        if let Err(err) = queue.finish().await {
            warn!(error = %err, "transform stage hung up before end of stream");
        }

        match &outcome {
            Ok(summary) => info!(
                discovered = summary.discovered,
                enqueued = summary.enqueued,
                failed = summary.failed,
                "ingestion finished"
            ),
            Err(err) => error!(error = %err, "ingestion aborted"),
        }
        outcome
    }

    async fn read_local_dir(
        &self,
        dir: &Path,
        queue: &QueueSender<Bundle>,
    ) -> Result<IngestSummary, SourceError> {
        let map_io = |source| SourceError::Directory {
            path: dir.to_path_buf(),
            source,
        };

        let mut entries = tokio::fs::read_dir(dir).await.map_err(map_io)?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(map_io)? {
            let is_file = entry
                .file_type()
                .await
                .map(|ty| ty.is_file())
                .unwrap_or(false);
            if is_file {
                files.push(entry.path());
            }
        }
        // Name order keeps runs over the same directory deterministic.
        files.sort();

        info!(directory = %dir.display(), files = files.len(), "reading bundles from disk");
        let contents = join_all(files.iter().map(tokio::fs::read_to_string)).await;

        let mut summary = IngestSummary {
            discovered: files.len(),
            ..Default::default()
        };
        for (path, content) in files.iter().zip(contents) {
            let raw = match content {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(file = %path.display(), error = %err, "failed to read file");
                    summary.failed += 1;
                    continue;
                }
            };
            match Bundle::from_json(&raw) {
                Ok(bundle) => {
                    queue.enqueue(bundle).await?;
                    summary.enqueued += 1;
                }
                Err(err) => {
                    warn!(file = %path.display(), error = %err, "skipping non-bundle file");
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }

    async fn read_file_url(
        &self,
        url: &str,
        queue: &QueueSender<Bundle>,
    ) -> Result<IngestSummary, SourceError> {
        let mut summary = IngestSummary {
            discovered: 1,
            ..Default::default()
        };
        match self.fetch_bundle(url).await {
            Ok(bundle) => {
                queue.enqueue(bundle).await?;
                summary.enqueued = 1;
            }
            Err(err) => {
                error!(url = %url, error = %err, "failed to fetch bundle");
                summary.failed = 1;
            }
        }
        Ok(summary)
    }

    async fn read_folder_url(
        &self,
        base_url: &str,
        queue: &QueueSender<Bundle>,
    ) -> Result<IngestSummary, SourceError> {
        let listing = self.fetch_listing(base_url).await?;
        let base = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };

        // Folder pages link blobs under /tree/; raw content lives under /raw/.
        let file_urls: Vec<String> = listing
            .payload
            .tree
            .items
            .iter()
            .map(|item| format!("{base}{}", item.name).replace("/tree/", "/raw/"))
            .collect();

        info!(url = %base_url, files = file_urls.len(), "fetching listed bundles");
        let fetched = join_all(file_urls.iter().map(|url| self.fetch_bundle(url))).await;

        let mut summary = IngestSummary {
            discovered: file_urls.len(),
            ..Default::default()
        };
        for (url, result) in file_urls.iter().zip(fetched) {
            match result {
                Ok(bundle) => {
                    queue.enqueue(bundle).await?;
                    summary.enqueued += 1;
                }
                Err(err) => {
                    warn!(url = %url, error = %err, "skipping listed bundle");
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }

    async fn fetch_bundle(&self, url: &str) -> Result<Bundle, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| SourceError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let text = response.text().await.map_err(|source| SourceError::Http {
            url: url.to_string(),
            source,
        })?;
        Bundle::from_json(&text).map_err(|source| SourceError::InvalidBundle {
            location: url.to_string(),
            source,
        })
    }

    async fn fetch_listing(&self, url: &str) -> Result<FolderListing, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| SourceError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        response
            .json()
            .await
            .map_err(|source| SourceError::MalformedListing {
                url: url.to_string(),
                source,
            })
    }
}
