//! Resource fetching and the load pipeline
//!
//! A load is fetch (async I/O) followed by decode (blocking pool). Each load
//! carries the generation number it was issued under; the controller only
//! accepts the outcome whose generation is still current.

use crate::audio::{Track, TrackDecoder};
use crate::error::{Error, Result};
use futures::future::BoxFuture;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::debug;

/// Where encoded audio comes from
#[derive(Clone)]
pub enum Resource {
    /// `http://` or `https://` URL
    Url(String),
    /// Local file
    File(PathBuf),
    /// Encoded bytes already in memory, with an optional format hint
    Memory {
        bytes: Arc<[u8]>,
        hint: Option<String>,
    },
}

impl Resource {
    /// Interpret a user-supplied string: URLs stay URLs, `file://` and bare
    /// paths become files.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Resource::Url(trimmed.to_string())
        } else if let Some(path) = trimmed.strip_prefix("file://") {
            Resource::File(PathBuf::from(path))
        } else {
            Resource::File(PathBuf::from(trimmed))
        }
    }

    pub fn memory(bytes: impl Into<Arc<[u8]>>, hint: Option<&str>) -> Self {
        Resource::Memory {
            bytes: bytes.into(),
            hint: hint.map(str::to_string),
        }
    }

    /// File extension used as a decoder format hint
    pub fn hint(&self) -> Option<String> {
        match self {
            Resource::Url(url) => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                let last = path.rsplit('/').next().unwrap_or(path);
                extension_of(Path::new(last))
            }
            Resource::File(path) => extension_of(path),
            Resource::Memory { hint, .. } => hint.clone(),
        }
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Url(url) => write!(f, "{}", url),
            Resource::File(path) => write!(f, "{}", path.display()),
            Resource::Memory { bytes, .. } => write!(f, "<memory:{} bytes>", bytes.len()),
        }
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resource({})", self)
    }
}

/// Byte-fetching capability
pub trait Fetch: Send + Sync + 'static {
    fn fetch(&self, resource: &Resource) -> BoxFuture<'static, Result<Vec<u8>>>;
}

/// Default fetcher: reqwest for URLs, tokio::fs for files
#[derive(Debug, Clone, Default)]
pub struct ResourceFetcher {
    client: reqwest::Client,
}

impl ResourceFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Fetch for ResourceFetcher {
    fn fetch(&self, resource: &Resource) -> BoxFuture<'static, Result<Vec<u8>>> {
        match resource.clone() {
            Resource::Url(url) => {
                let client = self.client.clone();
                Box::pin(async move {
                    let response = client
                        .get(&url)
                        .send()
                        .await
                        .and_then(|r| r.error_for_status())
                        .map_err(|e| Error::Fetch(format!("{}: {}", url, e)))?;
                    let bytes = response
                        .bytes()
                        .await
                        .map_err(|e| Error::Fetch(format!("{}: {}", url, e)))?;
                    Ok(bytes.to_vec())
                })
            }
            Resource::File(path) => Box::pin(async move {
                tokio::fs::read(&path)
                    .await
                    .map_err(|e| Error::Fetch(format!("{}: {}", path.display(), e)))
            }),
            Resource::Memory { bytes, .. } => Box::pin(async move { Ok(bytes.to_vec()) }),
        }
    }
}

/// Result of one load, tagged with the generation it was issued under
#[derive(Debug)]
pub struct LoadOutcome {
    pub generation: u64,
    pub resource: Resource,
    pub result: Result<Track>,
}

/// Fetch then decode. Decoding runs on the blocking pool.
pub async fn fetch_and_decode(
    fetcher: Arc<dyn Fetch>,
    decoder: Arc<dyn TrackDecoder>,
    resource: &Resource,
) -> Result<Track> {
    let bytes = fetcher.fetch(resource).await?;
    debug!("Fetched {} bytes from {}", bytes.len(), resource);

    let hint = resource.hint();
    tokio::task::spawn_blocking(move || decoder.decode(bytes, hint.as_deref()))
        .await
        .map_err(|e| Error::Internal(format!("Decode task failed: {}", e)))?
}

/// Spawn a load task that reports on `outcomes`. The returned handle aborts it.
pub fn spawn_load(
    generation: u64,
    resource: Resource,
    fetcher: Arc<dyn Fetch>,
    decoder: Arc<dyn TrackDecoder>,
    outcomes: mpsc::UnboundedSender<LoadOutcome>,
) -> AbortHandle {
    let handle = tokio::spawn(async move {
        let result = fetch_and_decode(fetcher, decoder, &resource).await;
        // The controller may already be gone; nothing to report to then
        let _ = outcomes.send(LoadOutcome {
            generation,
            resource,
            result,
        });
    });
    handle.abort_handle()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resource_kinds() {
        assert!(matches!(
            Resource::parse("https://example.com/a.mp3"),
            Resource::Url(_)
        ));
        match Resource::parse("file:///music/song.flac") {
            Resource::File(path) => assert_eq!(path, PathBuf::from("/music/song.flac")),
            other => panic!("expected file, got {:?}", other),
        }
        assert!(matches!(
            Resource::parse("  relative/song.ogg "),
            Resource::File(_)
        ));
    }

    #[test]
    fn test_hint_from_url_ignores_query() {
        let resource = Resource::parse("http://host/media/Track.MP3?token=abc#t=1");
        assert_eq!(resource.hint().as_deref(), Some("mp3"));
    }

    #[test]
    fn test_hint_for_memory_and_extensionless() {
        assert_eq!(Resource::memory(vec![1u8, 2, 3], Some("wav")).hint().as_deref(), Some("wav"));
        assert_eq!(Resource::parse("/tmp/noext").hint(), None);
    }

    #[test]
    fn test_display_memory() {
        let resource = Resource::memory(vec![0u8; 12], None);
        assert_eq!(resource.to_string(), "<memory:12 bytes>");
    }

    #[tokio::test]
    async fn test_fetch_missing_file_is_fetch_error() {
        let fetcher = ResourceFetcher::new();
        let result = fetcher
            .fetch(&Resource::File(PathBuf::from("/nonexistent/monotrack/audio.wav")))
            .await;
        assert!(matches!(result, Err(Error::Fetch(_))));
    }

    #[tokio::test]
    async fn test_fetch_memory_passthrough() {
        let fetcher = ResourceFetcher::new();
        let bytes = fetcher
            .fetch(&Resource::memory(vec![9u8, 8, 7], None))
            .await
            .unwrap();
        assert_eq!(bytes, vec![9, 8, 7]);
    }
}
