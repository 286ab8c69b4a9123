// ── File-backed state store ──

use std::path::PathBuf;

use netquota_core::{AccountingState, CoreError, StateStore};

use crate::{ConfigFile, save};

/// Persists accounting state into the config document it was loaded from.
///
/// Keeps the whole document in memory so that saving the state never drops
/// a setting (or an unknown key) from the file.
#[derive(Debug)]
pub struct JsonStateStore {
    path: PathBuf,
    document: ConfigFile,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>, document: ConfigFile) -> Self {
        Self {
            path: path.into(),
            document,
        }
    }
}

impl StateStore for JsonStateStore {
    fn save(&mut self, state: &AccountingState) -> Result<(), CoreError> {
        self.document.apply_state(state);
        save(&self.path, &self.document).map_err(|e| CoreError::Persistence {
            message: e.to_string(),
        })?;
        tracing::trace!(path = %self.path.display(), "state saved");
        Ok(())
    }
}
