//! Durable artifact storage

use crate::error::{ForgeError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// The two artifacts stored per model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Pipeline,
    Metadata,
}

impl ArtifactKind {
    fn file_suffix(&self) -> &'static str {
        match self {
            ArtifactKind::Pipeline => "pipeline.bin",
            ArtifactKind::Metadata => "meta.json",
        }
    }
}

/// Key-value storage for model artifacts.
///
/// Writes of a single artifact must be all-or-nothing: a reader sees either
/// the complete previous value (or nothing) or the complete new one.
pub trait ArtifactStore: Send + Sync {
    fn write(&self, key: &str, kind: ArtifactKind, bytes: &[u8]) -> Result<()>;

    /// `None` when the artifact does not exist
    fn read(&self, key: &str, kind: ArtifactKind) -> Result<Option<Vec<u8>>>;

    fn exists(&self, key: &str, kind: ArtifactKind) -> Result<bool> {
        Ok(self.read(key, kind)?.is_some())
    }

    /// Keys that have an artifact of `kind`
    fn keys(&self, kind: ArtifactKind) -> Result<Vec<String>>;
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Stores artifacts as `<root>/<key>.pipeline.bin` and `<root>/<key>.meta.json`
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str, kind: ArtifactKind) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{}.{}", key, kind.file_suffix())))
    }

    /// Write to a temporary sibling, sync, then rename over the target
    fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ForgeError::Data(format!("invalid artifact path {}", path.display())))?;
        let temp_path = path.with_file_name(format!(
            ".{}.{}.{}.tmp",
            file_name,
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let result = (|| {
            let mut file = File::create(&temp_path)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            drop(file);
            fs::rename(&temp_path, path)?;
            sync_dir(path.parent())
        })();
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result.map_err(ForgeError::from)
    }
}

impl ArtifactStore for FsArtifactStore {
    fn write(&self, key: &str, kind: ArtifactKind, bytes: &[u8]) -> Result<()> {
        let path = self.path(key, kind)?;
        Self::write_atomic(&path, bytes)
    }

    fn read(&self, key: &str, kind: ArtifactKind) -> Result<Option<Vec<u8>>> {
        let path = self.path(key, kind)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, key: &str, kind: ArtifactKind) -> Result<bool> {
        Ok(self.path(key, kind)?.is_file())
    }

    fn keys(&self, kind: ArtifactKind) -> Result<Vec<String>> {
        let suffix = format!(".{}", kind.file_suffix());
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with('.') {
                continue;
            }
            if let Some(key) = name.strip_suffix(&suffix) {
                keys.push(key.to_string());
            }
        }
        Ok(keys)
    }
}

/// In-process store, mainly for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: RwLock<HashMap<(String, ArtifactKind), Vec<u8>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn write(&self, key: &str, kind: ArtifactKind, bytes: &[u8]) -> Result<()> {
        validate_key(key)?;
        self.artifacts
            .write()
            .insert((key.to_string(), kind), bytes.to_vec());
        Ok(())
    }

    fn read(&self, key: &str, kind: ArtifactKind) -> Result<Option<Vec<u8>>> {
        Ok(self.artifacts.read().get(&(key.to_string(), kind)).cloned())
    }

    fn keys(&self, kind: ArtifactKind) -> Result<Vec<String>> {
        Ok(self
            .artifacts
            .read()
            .keys()
            .filter(|(_, k)| *k == kind)
            .map(|(key, _)| key.clone())
            .collect())
    }
}

/// Keys become file names, so only a conservative character set is allowed
/// Persist a rename by syncing the directory entry itself
#[cfg(unix)]
fn sync_dir(dir: Option<&Path>) -> std::io::Result<()> {
    match dir {
        Some(dir) => File::open(dir)?.sync_all(),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: Option<&Path>) -> std::io::Result<()> {
    Ok(())
}

fn validate_key(key: &str) -> Result<()> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(ForgeError::ModelNotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn exercise(store: &dyn ArtifactStore) {
        assert!(store.read("abc", ArtifactKind::Pipeline).unwrap().is_none());
        store.write("abc", ArtifactKind::Pipeline, b"bytes").unwrap();
        assert_eq!(
            store.read("abc", ArtifactKind::Pipeline).unwrap().unwrap(),
            b"bytes"
        );
        assert!(store.exists("abc", ArtifactKind::Pipeline).unwrap());
        assert!(!store.exists("abc", ArtifactKind::Metadata).unwrap());
        assert!(store.keys(ArtifactKind::Metadata).unwrap().is_empty());

        store.write("abc", ArtifactKind::Metadata, b"{}").unwrap();
        assert_eq!(store.keys(ArtifactKind::Metadata).unwrap(), vec!["abc"]);
    }

    #[test]
    fn test_memory_store() {
        exercise(&MemoryArtifactStore::new());
    }

    #[test]
    fn test_fs_store() {
        let dir = tempdir().unwrap();
        let store = FsArtifactStore::open(dir.path().join("models")).unwrap();
        exercise(&store);
        assert!(store.root().join("abc.pipeline.bin").is_file());
        assert!(store.root().join("abc.meta.json").is_file());
    }

    #[test]
    fn test_fs_overwrite_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = FsArtifactStore::open(dir.path()).unwrap();
        store.write("k", ArtifactKind::Pipeline, b"one").unwrap();
        store.write("k", ArtifactKind::Pipeline, b"two").unwrap();
        assert_eq!(store.read("k", ArtifactKind::Pipeline).unwrap().unwrap(), b"two");
        let names: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(names.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_sync() {
        let dir = tempdir().unwrap();
        assert!(sync_dir(Some(dir.path())).is_ok());
        assert!(sync_dir(None).is_ok());
        assert!(sync_dir(Some(&dir.path().join("missing"))).is_err());
    }

    #[test]
    fn test_path_like_keys_are_rejected() {
        let store = MemoryArtifactStore::new();
        assert!(store.write("../escape", ArtifactKind::Pipeline, b"x").is_err());
        let dir = tempdir().unwrap();
        let fs_store = FsArtifactStore::open(dir.path()).unwrap();
        assert!(fs_store.read("a/b", ArtifactKind::Metadata).is_err());
    }
}
