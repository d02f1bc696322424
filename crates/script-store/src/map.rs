//! Rename-aware save over a plain name → script map.

use std::collections::BTreeMap;

use tracing::debug;
use webminer_core_types::Script;

use crate::errors::StoreError;

pub type ScriptMap = BTreeMap<String, Script>;

/// Insert `script` under its name, dropping `original_name` when it differs.
///
/// Rejects the save when the name is taken by a script other than the one
/// being edited. `map` is only touched once every check passed.
pub fn save_into(
    map: &mut ScriptMap,
    script: Script,
    original_name: Option<&str>,
) -> Result<(), StoreError> {
    let mut script = script;
    let trimmed = script.name.trim().to_string();
    if trimmed.is_empty() {
        return Err(StoreError::EmptyName);
    }
    script.name = trimmed;
    let name = script.name.as_str();

    if map.contains_key(name) && original_name != Some(name) {
        return Err(StoreError::NameConflict(name.to_string()));
    }

    if let Some(old) = original_name.filter(|old| *old != name) {
        if map.remove(old).is_some() {
            debug!(from = old, to = name, "Renamed script");
        }
    }
    let key = name.to_string();
    map.insert(key, script);
    Ok(())
}
