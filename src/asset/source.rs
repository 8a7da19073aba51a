//! Where bundle bytes come from

use crate::error::LoadError;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Receives byte-count progress from a [`BundleSource`]
#[derive(Clone)]
pub struct ProgressSink {
    report: Arc<dyn Fn(f32) + Send + Sync>,
}

impl ProgressSink {
    pub fn new(report: impl Fn(f32) + Send + Sync + 'static) -> Self {
        Self {
            report: Arc::new(report),
        }
    }

    /// A sink that discards every report
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Report `loaded` of `total` bytes. Unknown totals report nothing.
    pub fn bytes(&self, loaded: u64, total: u64) {
        if total > 0 {
            self.fraction(loaded as f32 / total as f32);
        }
    }

    pub fn fraction(&self, value: f32) {
        (self.report)(value.clamp(0.0, 1.0));
    }
}

impl fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProgressSink")
    }
}

/// Retrieves the raw bytes of a bundle
#[async_trait]
pub trait BundleSource: Send + Sync {
    /// Fetch `bundle`, reporting progress as bytes arrive
    async fn fetch(&self, bundle: &str, progress: ProgressSink) -> Result<Vec<u8>, LoadError>;
}

impl fmt::Debug for dyn BundleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BundleSource")
    }
}

/// Reads bundles from a local directory
#[derive(Debug, Clone)]
pub struct FileBundleSource {
    base_path: PathBuf,
    chunk_size: usize,
}

impl FileBundleSource {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            chunk_size: 64 * 1024,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

#[async_trait]
impl BundleSource for FileBundleSource {
    async fn fetch(&self, bundle: &str, progress: ProgressSink) -> Result<Vec<u8>, LoadError> {
        let path = self.base_path.join(bundle);
        let mut file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| LoadError::network(format!("{}: {}", path.display(), e)))?;
        let total = file
            .metadata()
            .await
            .map_err(|e| LoadError::network(format!("{}: {}", path.display(), e)))?
            .len();
        debug!("Reading bundle {} ({} bytes)", path.display(), total);

        let mut bytes = Vec::with_capacity(total as usize);
        let mut chunk = vec![0u8; self.chunk_size];
        progress.bytes(0, total);
        loop {
            let read = file
                .read(&mut chunk)
                .await
                .map_err(|e| LoadError::network(format!("{}: {}", path.display(), e)))?;
            if read == 0 {
                break;
            }
            bytes.extend_from_slice(&chunk[..read]);
            progress.bytes(bytes.len() as u64, total);
        }
        Ok(bytes)
    }
}

/// Downloads bundles over HTTP(S) relative to a base URL
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpBundleSource {
    client: reqwest::Client,
    base_url: String,
}

#[cfg(feature = "http")]
impl HttpBundleSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl BundleSource for HttpBundleSource {
    async fn fetch(&self, bundle: &str, progress: ProgressSink) -> Result<Vec<u8>, LoadError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), bundle);
        let mut response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| LoadError::network(format!("{}: {}", url, e)))?;

        let total = response.content_length().unwrap_or(0);
        let mut bytes = Vec::with_capacity(total as usize);
        progress.bytes(0, total);
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| LoadError::network(format!("{}: {}", url, e)))?
        {
            bytes.extend_from_slice(&chunk);
            progress.bytes(bytes.len() as u64, total);
        }
        if total == 0 {
            progress.fraction(1.0);
        }
        Ok(bytes)
    }
}
