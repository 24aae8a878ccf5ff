use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};
use crate::record::Record;
use crate::store::{RecordStore, Taxonomy};

/// Plain copy of a store's two collections, used for persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub records: Vec<Record>,
    pub taxonomy: Taxonomy,
}

impl RecordStore {
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            records: self.records().cloned().collect(),
            taxonomy: self.taxonomy().clone(),
        }
    }

    /// Rebuild a store. Fails if the snapshot lists an id twice.
    pub fn from_snapshot(snapshot: Snapshot) -> CatalogResult<Self> {
        let mut store = RecordStore::from_parts(Vec::new(), snapshot.taxonomy)?;
        for record in snapshot.records {
            let id = record.id().to_string();
            if !store.add_record(record) {
                return Err(CatalogError::InvalidArgument(format!(
                    "duplicate record id in snapshot: {id}"
                )));
            }
        }
        Ok(store)
    }
}

impl From<RecordStore> for Snapshot {
    fn from(store: RecordStore) -> Self {
        let (records, taxonomy) = store.into_parts();
        Self {
            records: records.into_values().collect(),
            taxonomy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordType;

    fn built_store() -> RecordStore {
        let mut store = RecordStore::new();
        store.add_subcategory("ART", "PAINTING");
        store.add_subcategory("ART", "SCULPTURE");
        store.add_category("EMPTY");
        store.add_record(Record::new("0001_2024", RecordType::Photo, "ART", "PAINTING", ["FAMOUS"]));
        store.add_record(Record::new("0002_2024", RecordType::Object, "Art", "Sculpture", ["BRONZE", "HEAVY"]));
        store.add_record(Record::new("0003_2024", RecordType::Article, "NEWS", "LOCAL", Vec::<String>::new()));
        store.edit_record(
            "0003_2024",
            Record::new("0003_2024", RecordType::Document, "NEWS", "LOCAL", ["ARCHIVED"]),
        );
        store.remove_record("0002_2024");
        store.edit_subcategory("ART", "SCULPTURE", "CERAMICS");
        store
    }

    #[test]
    fn test_snapshot_round_trip() {
        let store = built_store();
        let restored = RecordStore::from_snapshot(store.to_snapshot()).unwrap();
        assert_eq!(restored, store);
        assert_eq!(restored.to_string(), store.to_string());
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let store = built_store();
        let json = serde_json::to_string(&store.to_snapshot()).unwrap();
        let snapshot: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(RecordStore::from_snapshot(snapshot).unwrap(), store);
    }

    #[test]
    fn test_into_snapshot_matches_to_snapshot() {
        let store = built_store();
        let borrowed = store.to_snapshot();
        assert_eq!(Snapshot::from(store), borrowed);
    }

    #[test]
    fn test_from_snapshot_rejects_duplicate_ids() {
        let record = Record::new("0001_2024", RecordType::Photo, "ART", "PAINTING", ["A"]);
        let snapshot = Snapshot {
            records: vec![record.clone(), record],
            taxonomy: Taxonomy::new(),
        };
        assert!(matches!(
            RecordStore::from_snapshot(snapshot),
            Err(CatalogError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_empty_store_snapshot() {
        let snapshot = RecordStore::new().to_snapshot();
        assert!(snapshot.records.is_empty());
        assert!(snapshot.taxonomy.is_empty());
        assert!(RecordStore::from_snapshot(snapshot).unwrap().is_empty());
    }
}
