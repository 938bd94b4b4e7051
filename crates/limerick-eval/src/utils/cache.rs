use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use tracing::trace;

use crate::GenerationOutput;

/// Key-value store for generation output, so a run can skip regeneration.
pub trait OutputCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<GenerationOutput>>;
    fn put(&self, key: &str, output: &GenerationOutput) -> Result<()>;
}

/// Process-local cache, mostly for tests.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, GenerationOutput>>,
}

impl MemoryCache {
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OutputCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<GenerationOutput>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory cache lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, output: &GenerationOutput) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory cache lock poisoned"))?;
        entries.insert(key.to_string(), output.clone());
        Ok(())
    }
}

/// One pretty-printed JSON file per key under a directory.
#[derive(Clone, Debug)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl OutputCache for DiskCache {
    #[tracing::instrument(name = "limerick.cache.get", level = "trace", skip(self))]
    fn get(&self, key: &str) -> Result<Option<GenerationOutput>> {
        let path = self.entry_path(key);
        if !path.exists() {
            trace!(hit = false, "cache lookup complete");
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading cache entry {}", path.display()))?;
        let output = serde_json::from_str(&raw)
            .with_context(|| format!("decoding cache entry {}", path.display()))?;
        trace!(hit = true, "cache lookup complete");
        Ok(Some(output))
    }

    #[tracing::instrument(name = "limerick.cache.put", level = "trace", skip(self, output))]
    fn put(&self, key: &str, output: &GenerationOutput) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating cache dir {}", self.dir.display()))?;
        let path = self.entry_path(key);
        fs::write(&path, serde_json::to_string_pretty(output)?)
            .with_context(|| format!("writing cache entry {}", path.display()))?;
        Ok(())
    }
}
