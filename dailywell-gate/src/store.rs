use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::warn;

use crate::decision::GateFlags;
use crate::error::StoreError;

pub type Result<T> = std::result::Result<T, StoreError>;

// ─── Fixed keys ───────────────────────────────────────────────

pub const KEY_LOCKED: &str = "gate.locked";
pub const KEY_PROBED: &str = "gate.probed";
pub const KEY_ONBOARDING_COMPLETED: &str = "onboarding.completed";

/// Durable boolean key-value state that survives process restarts.
///
/// Backends implement the three primitives; the launch-state accessors are
/// provided on top and apply the defaults for missing keys.
#[async_trait]
pub trait LaunchStore: Send + Sync {
    // ── Primitives ──

    async fn get_flag(&self, key: &str) -> Result<Option<bool>>;
    /// Write several keys as one update.
    async fn set_flags(&self, entries: &[(&str, bool)]) -> Result<()>;
    /// Remove every key.
    async fn clear(&self) -> Result<()>;

    // ── Gate ──

    async fn load_flags(&self) -> Result<GateFlags> {
        let defaults = GateFlags::default();
        Ok(GateFlags {
            locked: self.get_flag(KEY_LOCKED).await?.unwrap_or(defaults.locked),
            probed: self.get_flag(KEY_PROBED).await?.unwrap_or(defaults.probed),
        })
    }

    async fn save_flags(&self, flags: GateFlags) -> Result<()> {
        self.set_flags(&[(KEY_LOCKED, flags.locked), (KEY_PROBED, flags.probed)])
            .await
    }

    // ── Onboarding ──

    async fn onboarding_completed(&self) -> Result<bool> {
        Ok(self
            .get_flag(KEY_ONBOARDING_COMPLETED)
            .await?
            .unwrap_or(false))
    }

    async fn set_onboarding_completed(&self, completed: bool) -> Result<()> {
        self.set_flags(&[(KEY_ONBOARDING_COMPLETED, completed)])
            .await
    }
}

// ─── In-memory backend ────────────────────────────────────────

/// Process-local store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryLaunchStore {
    flags: Mutex<BTreeMap<String, bool>>,
}

impl MemoryLaunchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> BTreeMap<String, bool> {
        self.flags.lock().await.clone()
    }
}

#[async_trait]
impl LaunchStore for MemoryLaunchStore {
    async fn get_flag(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.flags.lock().await.get(key).copied())
    }

    async fn set_flags(&self, entries: &[(&str, bool)]) -> Result<()> {
        let mut flags = self.flags.lock().await;
        for (key, value) in entries {
            flags.insert((*key).to_string(), *value);
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.flags.lock().await.clear();
        Ok(())
    }
}

// ─── JSON file backend ────────────────────────────────────────

/// A flat JSON object on disk, e.g. `{"gate.locked": false, "gate.probed": true}`.
///
/// A missing file reads as empty. A corrupt file fails reads and is replaced
/// by the next write. Writes go to a sibling temp file and are renamed into
/// place.
#[derive(Debug)]
pub struct JsonFileLaunchStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileLaunchStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, bool>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, flags: &BTreeMap<String, bool>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let bytes = serde_json::to_vec_pretty(flags)?;
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl LaunchStore for JsonFileLaunchStore {
    async fn get_flag(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.read_all().await?.get(key).copied())
    }

    async fn set_flags(&self, entries: &[(&str, bool)]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        // An unreadable file would otherwise block every later write.
        let mut flags = match self.read_all().await {
            Ok(flags) => flags,
            Err(StoreError::Serialization(e)) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "discarding corrupt launch state"
                );
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        for (key, value) in entries {
            flags.insert((*key).to_string(), *value);
        }
        self.write_all(&flags).await
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
