//! JSON file store.
//!
//! The whole map lives in one JSON document. Every write goes to a temporary
//! file next to the target which is then renamed over it, so readers see
//! either the previous map or the new one.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, info};
use webminer_core_types::Script;

use crate::{errors::StoreError, map::save_into, map::ScriptMap, ScriptStore};

pub struct FileScriptStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileScriptStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<ScriptMap, StoreError> {
        let path = self.path.clone();
        run_blocking(move || read_map(&path)).await
    }

    async fn store(&self, map: ScriptMap) -> Result<(), StoreError> {
        let path = self.path.clone();
        run_blocking(move || write_map(&path, &map)).await
    }
}

async fn run_blocking<T, F>(job: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|err| StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, err)))?
}

fn read_map(path: &Path) -> Result<ScriptMap, StoreError> {
    match fs::read(path) {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(ScriptMap::new()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(ScriptMap::new()),
        Err(err) => Err(err.into()),
    }
}

fn write_map(path: &Path, map: &ScriptMap) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    serde_json::to_writer_pretty(tmp.as_file_mut(), map)?;
    tmp.as_file_mut().write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| StoreError::Io(err.error))?;
    debug!(path = %path.display(), scripts = map.len(), "Wrote script file");
    Ok(())
}

#[async_trait]
impl ScriptStore for FileScriptStore {
    async fn list_names(&self) -> Result<Vec<String>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_keys().collect())
    }

    async fn get(&self, name: &str) -> Result<Option<Script>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(name))
    }

    async fn save(&self, script: Script, original_name: Option<&str>) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        let name = script.name.trim().to_string();
        save_into(&mut map, script, original_name)?;
        self.store(map).await?;
        info!(script = %name, renamed_from = ?original_name.filter(|old| *old != name), "Saved script");
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        if map.remove(name).is_none() {
            return Ok(false);
        }
        self.store(map).await?;
        info!(script = name, "Removed script");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileScriptStore::new(dir.path().join("scripts.json"));
        assert!(store.list_names().await.unwrap().is_empty());
        assert!(store.get("A").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scripts.json");
        fs::write(&path, "{not json").unwrap();
        let store = FileScriptStore::new(&path);
        assert!(matches!(
            store.list_names().await.unwrap_err(),
            StoreError::Serde(_)
        ));
    }

    #[tokio::test]
    async fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/scripts.json");
        let store = FileScriptStore::new(&path);
        store
            .save(Script::new("A", "https://a.example"), None)
            .await
            .unwrap();
        assert!(path.exists());
    }
}
