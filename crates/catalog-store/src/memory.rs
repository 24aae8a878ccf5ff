use std::cell::RefCell;

use catalog_core::{CatalogResult, RecordStore, Snapshot, SnapshotRepository};

/// Keeps the last saved snapshot in memory. Nothing touches disk.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    saved: RefCell<Option<Snapshot>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotRepository for MemoryRepository {
    fn try_load(&self) -> CatalogResult<Option<RecordStore>> {
        self.saved
            .borrow()
            .clone()
            .map(RecordStore::from_snapshot)
            .transpose()
    }

    fn save(&self, store: &RecordStore) -> CatalogResult<()> {
        *self.saved.borrow_mut() = Some(store.to_snapshot());
        Ok(())
    }
}
