use crate::error::CatalogResult;
use crate::store::RecordStore;

/// Whole-state persistence for a [`RecordStore`].
///
/// Implementations write the entire store on every save; there is no
/// incremental persistence.
pub trait SnapshotRepository {
    /// Load the persisted store, reporting why loading failed.
    /// `Ok(None)` means nothing has been saved yet.
    fn try_load(&self) -> CatalogResult<Option<RecordStore>>;

    fn save(&self, store: &RecordStore) -> CatalogResult<()>;

    /// Load the persisted store, or `None` if it is missing or unreadable.
    /// Callers start from an empty store in that case.
    fn load(&self) -> Option<RecordStore> {
        self.try_load().ok().flatten()
    }

    fn load_or_default(&self) -> RecordStore {
        self.load().unwrap_or_default()
    }
}
