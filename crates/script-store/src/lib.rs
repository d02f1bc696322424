//! Script persistence.
//!
//! Scripts are kept in a map keyed by name. Saving is rename-aware: the
//! caller passes the name the script was loaded under, and the store moves
//! the entry in the same read-modify-write that checks for conflicts.

use async_trait::async_trait;
use webminer_core_types::Script;

pub mod errors;
pub mod file;
pub mod map;
pub mod memory;

pub use errors::StoreError;
pub use file::FileScriptStore;
pub use map::{save_into, ScriptMap};
pub use memory::MemoryScriptStore;

/// Name-keyed script storage
#[async_trait]
pub trait ScriptStore: Send + Sync {
    /// Stored names in ascending order
    async fn list_names(&self) -> Result<Vec<String>, StoreError>;

    async fn get(&self, name: &str) -> Result<Option<Script>, StoreError>;

    /// Save `script` under its name, replacing `original_name` when renamed.
    async fn save(&self, script: Script, original_name: Option<&str>) -> Result<(), StoreError>;

    /// Remove a script. Returns whether it existed.
    async fn remove(&self, name: &str) -> Result<bool, StoreError>;
}
