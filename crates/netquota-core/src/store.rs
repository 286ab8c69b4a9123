// ── State persistence boundary ──

use crate::error::CoreError;
use crate::model::AccountingState;

/// Durable home of the [`AccountingState`].
///
/// Implementations must replace the stored state atomically: after a crash
/// the previous or the new state is on disk, never a mix.
pub trait StateStore: Send + Sync {
    fn save(&mut self, state: &AccountingState) -> Result<(), CoreError>;
}
