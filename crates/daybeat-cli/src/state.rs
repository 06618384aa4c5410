//! JSON snapshot persistence for the CLI.
//!
//! One-shot commands load the snapshot, apply the change and write it
//! back; the watch loop writes once on exit. The file lives next to the
//! config at `<data_dir>/schedule.json` and a missing file means a
//! fresh, empty store.

use std::path::PathBuf;

use daybeat_core::config::data_dir;
use daybeat_core::{EntityStore, Snapshot};

pub fn state_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    Ok(data_dir()?.join("schedule.json"))
}

pub fn load_store() -> Result<EntityStore, Box<dyn std::error::Error>> {
    let path = state_path()?;
    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let snapshot: Snapshot = serde_json::from_str(&content)?;
            Ok(EntityStore::from_snapshot(snapshot))
        }
        Err(_) => Ok(EntityStore::new()),
    }
}

pub fn save_store(store: &EntityStore) -> Result<(), Box<dyn std::error::Error>> {
    save_snapshot(&store.snapshot())
}

pub fn save_snapshot(snapshot: &Snapshot) -> Result<(), Box<dyn std::error::Error>> {
    let path = state_path()?;
    std::fs::write(&path, serde_json::to_string_pretty(snapshot)?)?;
    Ok(())
}
