//! In-process store

use async_trait::async_trait;
use parking_lot::Mutex;
use webminer_core_types::Script;

use crate::{errors::StoreError, map::save_into, map::ScriptMap, ScriptStore};

#[derive(Debug, Default)]
pub struct MemoryScriptStore {
    scripts: Mutex<ScriptMap>,
}

impl MemoryScriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scripts(scripts: impl IntoIterator<Item = Script>) -> Self {
        let map = scripts
            .into_iter()
            .map(|script| (script.name.clone(), script))
            .collect();
        Self {
            scripts: Mutex::new(map),
        }
    }
}

#[async_trait]
impl ScriptStore for MemoryScriptStore {
    async fn list_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.scripts.lock().keys().cloned().collect())
    }

    async fn get(&self, name: &str) -> Result<Option<Script>, StoreError> {
        Ok(self.scripts.lock().get(name).cloned())
    }

    async fn save(&self, script: Script, original_name: Option<&str>) -> Result<(), StoreError> {
        save_into(&mut self.scripts.lock(), script, original_name)
    }

    async fn remove(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.scripts.lock().remove(name).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_conflict_leaves_store_unchanged() {
        let store = MemoryScriptStore::with_scripts([
            Script::new("A", "https://a.example"),
            Script::new("B", "https://b.example"),
        ]);

        let result = tokio_test::block_on(store.save(Script::new("A", "https://b.example"), Some("B")));
        assert!(matches!(result, Err(StoreError::NameConflict(_))));
        assert_eq!(
            tokio_test::block_on(store.list_names()).unwrap(),
            vec!["A".to_string(), "B".to_string()]
        );
        let b = tokio_test::block_on(store.get("B")).unwrap().unwrap();
        assert_eq!(b.url, "https://b.example");
    }

    #[test]
    fn test_same_name_save_succeeds() {
        let store = MemoryScriptStore::with_scripts([Script::new("A", "https://a.example")]);
        tokio_test::block_on(store.save(Script::new("A", "https://a2.example"), Some("A"))).unwrap();
        let a = tokio_test::block_on(store.get("A")).unwrap().unwrap();
        assert_eq!(a.url, "https://a2.example");
    }

    #[test]
    fn test_remove() {
        let store = MemoryScriptStore::with_scripts([Script::new("A", "https://a.example")]);
        assert!(tokio_test::block_on(store.remove("A")).unwrap());
        assert!(!tokio_test::block_on(store.remove("A")).unwrap());
        assert!(tokio_test::block_on(store.get("A")).unwrap().is_none());
    }
}
