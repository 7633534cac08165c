//! Disk-backed KV store: one file per key, generation directories for
//! whole-collection swaps.
//!
//! ## Layout
//!
//! ```text
//! root/
//!   CURRENT            name of the live generation, e.g. "gen-000002"
//!   gen-000002/
//!     <hex(key)>.rec   one record per key
//! ```
//!
//! Single-key writes go to a temporary file in the live generation and are
//! renamed over the record, which is atomic on POSIX filesystems.
//! `replace_all` writes a complete new generation and then renames a new
//! `CURRENT` into place; the old generation is removed afterwards.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::RwLock;

use super::KvStore;
use crate::{Error, Result};

const CURRENT_FILE: &str = "CURRENT";
const GENERATION_PREFIX: &str = "gen-";
const RECORD_EXT: &str = "rec";

fn io_error(context: &str, path: &Path, e: &std::io::Error) -> Error {
    Error::PersistenceFailed(format!("{context} {}: {e}", path.display()))
}

fn generation_name(n: u64) -> String {
    format!("{GENERATION_PREFIX}{n:06}")
}

fn generation_number(name: &str) -> Option<u64> {
    name.strip_prefix(GENERATION_PREFIX)?.parse().ok()
}

fn encode_key(key: &str) -> String {
    use std::fmt::Write;
    key.bytes().fold(String::with_capacity(key.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

fn decode_key(stem: &str) -> Option<String> {
    if stem.len() % 2 != 0 {
        return None;
    }
    let bytes: Option<Vec<u8>> = (0..stem.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(stem.get(i..i + 2)?, 16).ok())
        .collect();
    String::from_utf8(bytes?).ok()
}

/// Persistent key-value store rooted at a directory.
#[derive(Debug)]
pub struct FileKvStore {
    root: PathBuf,
    live: RwLock<u64>,
}

impl FileKvStore {
    /// Open (or create) a store rooted at `root`.
    ///
    /// Leftover generations from an interrupted `replace_all` are removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceFailed`] if the directory cannot be created
    /// or the `CURRENT` pointer is unreadable or corrupt.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| io_error("failed to create store directory", &root, &e))?;

        let current_path = root.join(CURRENT_FILE);
        let live = match fs::read_to_string(&current_path).await {
            Ok(name) => generation_number(name.trim()).ok_or_else(|| {
                Error::PersistenceFailed(format!(
                    "corrupt generation pointer in {}: {name:?}",
                    current_path.display()
                ))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let dir = root.join(generation_name(0));
                fs::create_dir_all(&dir)
                    .await
                    .map_err(|e| io_error("failed to create generation", &dir, &e))?;
                write_atomic(&root, CURRENT_FILE, generation_name(0).as_bytes()).await?;
                0
            }
            Err(e) => return Err(io_error("failed to read", &current_path, &e)),
        };

        let live_dir = root.join(generation_name(live));
        fs::create_dir_all(&live_dir)
            .await
            .map_err(|e| io_error("failed to create generation", &live_dir, &e))?;

        let store = Self {
            root,
            live: RwLock::new(live),
        };
        store.remove_stale_generations(live).await;
        Ok(store)
    }

    /// Directory the store lives in.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn generation_dir(&self, generation: u64) -> PathBuf {
        self.root.join(generation_name(generation))
    }

    fn record_name(key: &str) -> String {
        format!("{}.{RECORD_EXT}", encode_key(key))
    }

    async fn remove_stale_generations(&self, live: u64) {
        let Ok(mut entries) = fs::read_dir(&self.root).await else {
            return;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            let Some(n) = name.to_str().and_then(generation_number) else {
                continue;
            };
            if n != live {
                if let Err(e) = fs::remove_dir_all(entry.path()).await {
                    tracing::warn!(path = %entry.path().display(), error = %e, "failed to remove stale generation");
                }
            }
        }
    }
}

async fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    let tmp = dir.join(format!(".{name}.{}.tmp", uuid::Uuid::new_v4().simple()));
    let target = dir.join(name);
    fs::write(&tmp, bytes)
        .await
        .map_err(|e| io_error("failed to write", &tmp, &e))?;
    if let Err(e) = fs::rename(&tmp, &target).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(io_error("failed to move record into place", &target, &e));
    }
    Ok(())
}

impl KvStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let live = self.live.read().await;
        let path = self.generation_dir(*live).join(Self::record_name(key));
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("failed to read", &path, &e)),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let live = self.live.read().await;
        write_atomic(&self.generation_dir(*live), &Self::record_name(key), &value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let live = self.live.read().await;
        let path = self.generation_dir(*live).join(Self::record_name(key));
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("failed to delete", &path, &e)),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let live = self.live.read().await;
        let path = self.generation_dir(*live).join(Self::record_name(key));
        fs::try_exists(&path)
            .await
            .map_err(|e| io_error("failed to stat", &path, &e))
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let live = self.live.read().await;
        let dir = self.generation_dir(*live);
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| io_error("failed to list", &dir, &e))?;
        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error("failed to list", &dir, &e))?
        {
            let path = entry.path();
            if path.extension().and_then(|x| x.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            if let Some(key) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(decode_key)
            {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn replace_all(&self, entries: Vec<(String, Vec<u8>)>) -> Result<()> {
        let mut live = self.live.write().await;
        let next = *live + 1;
        let next_dir = self.generation_dir(next);

        let staged: Result<()> = async {
            fs::create_dir_all(&next_dir)
                .await
                .map_err(|e| io_error("failed to create generation", &next_dir, &e))?;
            for (key, value) in &entries {
                write_atomic(&next_dir, &Self::record_name(key), value).await?;
            }
            write_atomic(&self.root, CURRENT_FILE, generation_name(next).as_bytes()).await
        }
        .await;

        if let Err(e) = staged {
            let _ = fs::remove_dir_all(&next_dir).await;
            return Err(e);
        }

        let previous = self.generation_dir(*live);
        *live = next;
        drop(live);

        if let Err(e) = fs::remove_dir_all(&previous).await {
            tracing::warn!(path = %previous.display(), error = %e, "failed to remove replaced generation");
        }
        Ok(())
    }
}
