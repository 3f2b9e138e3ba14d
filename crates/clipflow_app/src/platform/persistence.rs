use clipflow_core::{HistoryEntry, HISTORY_CAPACITY};
use clipflow_engine::SlotStore;
use clipflow_logging::{clip_error, clip_info, clip_warn};
use serde::{Deserialize, Serialize};

pub(crate) const HISTORY_SLOT: &str = "history.ron";
pub(crate) const CREDENTIAL_SLOT: &str = "credential";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedEntry {
    title: String,
    filename: String,
    #[serde(default)]
    subtitle_filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedHistory {
    entries: Vec<PersistedEntry>,
}

/// Newest first, at most `HISTORY_CAPACITY` entries. Missing or unreadable
/// state loads as an empty history.
pub(crate) fn load_history(store: &SlotStore) -> Vec<HistoryEntry> {
    let content = match store.read(HISTORY_SLOT) {
        Ok(Some(text)) => text,
        Ok(None) => return Vec::new(),
        Err(err) => {
            clip_warn!("Failed to read history from {:?}: {}", store.dir(), err);
            return Vec::new();
        }
    };

    let state: PersistedHistory = match ron::from_str(&content) {
        Ok(state) => state,
        Err(err) => {
            clip_warn!("Failed to parse history in {:?}: {}", store.dir(), err);
            return Vec::new();
        }
    };

    let entries: Vec<HistoryEntry> = state
        .entries
        .into_iter()
        .take(HISTORY_CAPACITY)
        .map(|entry| HistoryEntry {
            title: entry.title,
            filename: entry.filename,
            subtitle_filename: entry.subtitle_filename,
        })
        .collect();

    clip_info!("Loaded {} history entries from {:?}", entries.len(), store.dir());
    entries
}

pub(crate) fn save_history(store: &SlotStore, entries: &[HistoryEntry]) {
    let state = PersistedHistory {
        entries: entries
            .iter()
            .map(|entry| PersistedEntry {
                title: entry.title.clone(),
                filename: entry.filename.clone(),
                subtitle_filename: entry.subtitle_filename.clone(),
            })
            .collect(),
    };

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&state, pretty) {
        Ok(text) => text,
        Err(err) => {
            clip_error!("Failed to serialize history: {}", err);
            return;
        }
    };

    if let Err(err) = store.write(HISTORY_SLOT, &content) {
        clip_error!("Failed to write history to {:?}: {}", store.dir(), err);
    }
}

pub(crate) fn load_credential(store: &SlotStore) -> Option<String> {
    match store.read(CREDENTIAL_SLOT) {
        Ok(value) => value
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty()),
        Err(err) => {
            clip_warn!("Failed to read saved credential: {}", err);
            None
        }
    }
}

/// Empty credentials are never written, so a saved key is not wiped by a
/// run without one.
pub(crate) fn save_credential(store: &SlotStore, credential: &str) {
    if credential.trim().is_empty() {
        return;
    }
    match store.write(CREDENTIAL_SLOT, credential) {
        Ok(()) => clip_info!("Saved credential ({} chars)", credential.len()),
        Err(err) => clip_error!("Failed to save credential: {}", err),
    }
}
