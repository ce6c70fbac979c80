//! Where the pattern library document comes from.
//!
//! The host picks a source at startup. Loading is blocking and never
//! happens on the per-frame path.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::library::PatternLibrary;

/// A provider of the pattern library document.
pub trait PatternSource {
    /// Short description for log messages.
    fn describe(&self) -> String;

    fn load(&self) -> Result<PatternLibrary>;
}

/// Reads a bundled JSON document from disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PatternSource for FileSource {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    fn load(&self) -> Result<PatternLibrary> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        PatternLibrary::from_json(&content)
            .with_context(|| format!("Failed to decode {}", self.path.display()))
    }
}

/// An in-memory library.
#[derive(Debug, Clone)]
pub struct StaticSource {
    library: PatternLibrary,
}

impl StaticSource {
    pub fn new(library: PatternLibrary) -> Self {
        Self { library }
    }

    pub fn builtin() -> Self {
        Self::new(PatternLibrary::builtin())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(PatternLibrary::from_json(json)?))
    }
}

impl PatternSource for StaticSource {
    fn describe(&self) -> String {
        format!("in-memory library ({} patterns)", self.library.len())
    }

    fn load(&self) -> Result<PatternLibrary> {
        Ok(self.library.clone())
    }
}

/// Fetches the document over HTTP.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    timeout: std::time::Duration,
}

#[cfg(feature = "http")]
impl HttpSource {
    pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(feature = "http")]
impl PatternSource for HttpSource {
    fn describe(&self) -> String {
        format!("url {}", self.url)
    }

    fn load(&self) -> Result<PatternLibrary> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let resp = client
            .get(&self.url)
            .send()
            .map_err(|e| anyhow::anyhow!("pattern request to {} failed: {e}", self.url))?;
        if !resp.status().is_success() {
            anyhow::bail!("pattern request failed with status: {}", resp.status());
        }
        let body = resp
            .text()
            .with_context(|| format!("Failed to read response from {}", self.url))?;
        PatternLibrary::from_json(&body)
    }
}
