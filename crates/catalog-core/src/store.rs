//! In-memory record store and category taxonomy.
//!
//! The store owns two independent collections: records keyed by id, and a
//! category → subcategory-set taxonomy. Adding a record does not register its
//! category/subcategory, and removing taxonomy entries never touches records;
//! callers keep both sides in step.
//!
//! `RecordStore` has no internal locking. Mutation needs `&mut self`; wrap the
//! store in a `Mutex` or `RwLock` to share it between threads.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{CatalogError, CatalogResult};
use crate::record::Record;

/// Category name → subcategory names.
pub type Taxonomy = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    records: BTreeMap<String, Record>,
    taxonomy: Taxonomy,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from existing collections.
    ///
    /// Every record must be keyed under its own id.
    pub fn from_parts<R>(records: R, taxonomy: Taxonomy) -> CatalogResult<Self>
    where
        R: IntoIterator<Item = (String, Record)>,
    {
        let mut map = BTreeMap::new();
        for (key, record) in records {
            if key != record.id() {
                return Err(CatalogError::InvalidArgument(format!(
                    "record {} is keyed under {key}",
                    record.id()
                )));
            }
            map.insert(key, record);
        }
        Ok(Self {
            records: map,
            taxonomy,
        })
    }

    // --- Records: CRUD ---

    pub fn add_record(&mut self, record: Record) -> bool {
        if self.records.contains_key(record.id()) {
            return false;
        }
        self.records.insert(record.id().to_string(), record);
        true
    }

    /// Replace the record at `id`. The replacement must carry the same id.
    pub fn edit_record(&mut self, id: &str, record: Record) -> bool {
        if record.id() != id {
            return false;
        }
        match self.records.get_mut(id) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    pub fn remove_record(&mut self, id: &str) -> bool {
        self.records.remove(id).is_some()
    }

    pub fn remove_all_records_with_category(&mut self, category: &str) -> bool {
        self.remove_records_where(|r| r.has_category(category))
    }

    pub fn remove_all_records_with_subcategory(&mut self, subcategory: &str) -> bool {
        self.remove_records_where(|r| r.has_subcategory(subcategory))
    }

    pub fn remove_all_records_with_tag(&mut self, tag: &str) -> bool {
        self.remove_records_where(|r| r.has_tag(tag))
    }

    fn remove_records_where(&mut self, matches: impl Fn(&Record) -> bool) -> bool {
        let before = self.records.len();
        self.records.retain(|_, r| !matches(r));
        self.records.len() < before
    }

    // --- Records: queries ---

    pub fn find_record_with_id(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn find_records_with_category(&self, category: &str) -> Vec<&Record> {
        self.records_where(|r| r.has_category(category))
    }

    pub fn find_records_with_subcategory(
        &self,
        category: &str,
        subcategory: &str,
    ) -> Vec<&Record> {
        self.records_where(|r| r.has_category(category) && r.has_subcategory(subcategory))
    }

    pub fn find_records_with_tag(&self, tag: &str) -> Vec<&Record> {
        self.records_where(|r| r.has_tag(tag))
    }

    fn records_where(&self, matches: impl Fn(&Record) -> bool) -> Vec<&Record> {
        self.records.values().filter(|&r| matches(r)).collect()
    }

    /// All records, ordered by id.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Propose the next `NNNN_YYYY` id for `year`: one past the highest
    /// sequence number already used in that year. Sequences that cannot be
    /// incremented are ignored.
    pub fn next_id_for_year(&self, year: i32) -> String {
        let suffix = year.to_string();
        let next = self
            .records
            .keys()
            .filter_map(|id| {
                let (seq, y) = id.split_once('_')?;
                if y != suffix {
                    return None;
                }
                seq.parse::<u64>().ok()?.checked_add(1)
            })
            .max()
            .unwrap_or(1);
        format!("{next:04}_{year}")
    }

    // --- Taxonomy ---

    pub fn add_category(&mut self, category: &str) -> bool {
        if self.taxonomy.contains_key(category) {
            return false;
        }
        self.taxonomy.insert(category.to_string(), BTreeSet::new());
        true
    }

    pub fn add_subcategory(&mut self, category: &str, subcategory: &str) -> bool {
        self.taxonomy
            .entry(category.to_string())
            .or_default()
            .insert(subcategory.to_string())
    }

    /// Rename `category`, keeping its subcategories. An existing entry at
    /// `new_category` is overwritten, not merged.
    pub fn edit_category(&mut self, category: &str, new_category: &str) -> bool {
        match self.taxonomy.remove(category) {
            Some(subcategories) => {
                self.taxonomy.insert(new_category.to_string(), subcategories);
                true
            }
            None => false,
        }
    }

    pub fn edit_subcategory(
        &mut self,
        category: &str,
        subcategory: &str,
        new_subcategory: &str,
    ) -> bool {
        let Some(subcategories) = self.taxonomy.get_mut(category) else {
            return false;
        };
        if !subcategories.remove(subcategory) {
            return false;
        }
        subcategories.insert(new_subcategory.to_string());
        true
    }

    pub fn remove_category(&mut self, category: &str) -> bool {
        self.taxonomy.remove(category).is_some()
    }

    pub fn remove_subcategory(&mut self, category: &str, subcategory: &str) -> bool {
        self.taxonomy
            .get_mut(category)
            .is_some_and(|subcategories| subcategories.remove(subcategory))
    }

    pub fn contains_category(&self, category: &str) -> bool {
        self.taxonomy.contains_key(category)
    }

    pub fn contains_subcategory(&self, category: &str, subcategory: &str) -> bool {
        self.taxonomy
            .get(category)
            .is_some_and(|subcategories| subcategories.contains(subcategory))
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.taxonomy.keys().map(String::as_str)
    }

    pub fn subcategories(&self, category: &str) -> Option<&BTreeSet<String>> {
        self.taxonomy.get(category)
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub(crate) fn into_parts(self) -> (BTreeMap<String, Record>, Taxonomy) {
        (self.records, self.taxonomy)
    }
}

impl fmt::Display for RecordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "records ({}):", self.records.len())?;
        for record in self.records.values() {
            writeln!(f, "  {record}")?;
        }
        writeln!(f, "taxonomy ({}):", self.taxonomy.len())?;
        for (category, subcategories) in &self.taxonomy {
            let subs: Vec<&str> = subcategories.iter().map(String::as_str).collect();
            writeln!(f, "  {category}: [{}]", subs.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordType;

    fn make_record(id: &str, category: &str, subcategory: &str, tags: &[&str]) -> Record {
        Record::new(id, RecordType::Photo, category, subcategory, tags.iter().copied())
    }

    fn sample_store() -> RecordStore {
        let mut store = RecordStore::new();
        store.add_record(make_record("0001_2024", "Books", "Novels", &["URGENT", "SIGNED"]));
        store.add_record(make_record("0002_2024", "books", "Poetry", &["OLD"]));
        store.add_record(make_record("0003_2024", "Art", "Painting", &["URGENT"]));
        store.add_record(make_record("0001_2023", "Art", "novels", &[]));
        store
    }

    fn ids(records: &[&Record]) -> Vec<String> {
        records.iter().map(|r| r.id().to_string()).collect()
    }

    // === Records ===

    #[test]
    fn test_add_record_rejects_duplicate_id() {
        let mut store = RecordStore::new();
        let original = make_record("0001_2024", "ART", "PAINTING", &["FAMOUS"]);
        assert!(store.add_record(original.clone()));
        assert!(!store.add_record(make_record("0001_2024", "NEWS", "LOCAL", &[])));
        assert_eq!(store.len(), 1);
        assert_eq!(store.find_record_with_id("0001_2024"), Some(&original));
    }

    #[test]
    fn test_identical_fields_distinct_ids() {
        let mut store = RecordStore::new();
        assert!(store.add_record(make_record("a", "X", "Y", &["T"])));
        assert!(store.add_record(make_record("b", "X", "Y", &["T"])));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_edit_record_replaces() {
        let mut store = sample_store();
        let edited = make_record("0002_2024", "Books", "Essays", &[]);
        assert!(store.edit_record("0002_2024", edited.clone()));
        assert_eq!(store.find_record_with_id("0002_2024"), Some(&edited));
    }

    #[test]
    fn test_edit_record_identity_guard() {
        let mut store = sample_store();
        let before = store.clone();
        assert!(!store.edit_record("0002_2024", make_record("0003_2024", "X", "Y", &[])));
        assert!(!store.edit_record("9999_2024", make_record("0002_2024", "X", "Y", &[])));
        assert_eq!(store, before);
    }

    #[test]
    fn test_edit_record_missing() {
        let mut store = RecordStore::new();
        assert!(!store.edit_record("0001_2024", make_record("0001_2024", "X", "Y", &[])));
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_record_idempotent() {
        let mut store = sample_store();
        assert!(store.remove_record("0001_2024"));
        assert!(!store.remove_record("0001_2024"));
        assert!(!store.remove_record("never_there"));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_find_by_id_is_exact() {
        let store = sample_store();
        assert!(store.find_record_with_id("0001_2024").is_some());
        assert!(store.find_record_with_id("0001_2024 ").is_none());
        assert!(store.find_record_with_id("0001_2025").is_none());
    }

    #[test]
    fn test_find_by_category_ignores_case() {
        let store = sample_store();
        let upper = store.find_records_with_category("Books");
        let lower = store.find_records_with_category("books");
        assert_eq!(upper, lower);
        assert_eq!(ids(&upper), vec!["0001_2024", "0002_2024"]);
        assert!(store.find_records_with_category("Music").is_empty());
    }

    #[test]
    fn test_find_by_subcategory_requires_both() {
        let store = sample_store();
        assert_eq!(
            ids(&store.find_records_with_subcategory("BOOKS", "NOVELS")),
            vec!["0001_2024"]
        );
        assert_eq!(
            ids(&store.find_records_with_subcategory("art", "Novels")),
            vec!["0001_2023"]
        );
        assert!(store.find_records_with_subcategory("Books", "Painting").is_empty());
    }

    #[test]
    fn test_find_by_tag_ignores_case() {
        let store = sample_store();
        assert_eq!(
            ids(&store.find_records_with_tag("urgent")),
            vec!["0001_2024", "0003_2024"]
        );
        assert_eq!(store.find_records_with_tag("URGENT"), store.find_records_with_tag("Urgent"));
    }

    #[test]
    fn test_remove_all_with_tag() {
        let mut store = sample_store();
        assert!(store.remove_all_records_with_tag("URGENT"));
        assert!(store.find_records_with_tag("urgent").is_empty());
        assert!(store.find_record_with_id("0002_2024").is_some());
        assert!(store.find_record_with_id("0001_2023").is_some());
        assert_eq!(store.len(), 2);
        assert!(!store.remove_all_records_with_tag("URGENT"));
    }

    #[test]
    fn test_remove_all_with_category() {
        let mut store = sample_store();
        store.add_category("Books");
        assert!(store.remove_all_records_with_category("BOOKS"));
        assert_eq!(store.len(), 2);
        assert!(store.contains_category("Books"));
        assert!(!store.remove_all_records_with_category("Books"));
    }

    #[test]
    fn test_remove_all_with_subcategory_across_categories() {
        let mut store = sample_store();
        assert!(store.remove_all_records_with_subcategory("novels"));
        let left: Vec<&str> = store.records().map(Record::id).collect();
        assert_eq!(left, vec!["0002_2024", "0003_2024"]);
    }

    #[test]
    fn test_next_id_for_year() {
        let store = sample_store();
        assert_eq!(store.next_id_for_year(2024), "0004_2024");
        assert_eq!(store.next_id_for_year(2023), "0002_2023");
        assert_eq!(store.next_id_for_year(2025), "0001_2025");

        let mut odd = RecordStore::new();
        odd.add_record(make_record("misc", "X", "Y", &[]));
        odd.add_record(make_record("abc_2025", "X", "Y", &[]));
        assert_eq!(odd.next_id_for_year(2025), "0001_2025");
    }

    #[test]
    fn test_next_id_for_year_large_sequences() {
        let mut store = RecordStore::new();
        store.add_record(make_record("4294967295_2024", "X", "Y", &[]));
        assert_eq!(store.next_id_for_year(2024), "4294967296_2024");

        let mut store = RecordStore::new();
        store.add_record(make_record("18446744073709551615_2024", "X", "Y", &[]));
        store.add_record(make_record("0003_2024", "X", "Y", &[]));
        assert_eq!(store.next_id_for_year(2024), "0004_2024");

        let mut store = RecordStore::new();
        store.add_record(make_record("99999999999999999999999_2024", "X", "Y", &[]));
        assert_eq!(store.next_id_for_year(2024), "0001_2024");
    }

    // === Taxonomy ===

    #[test]
    fn test_add_category() {
        let mut store = RecordStore::new();
        assert!(store.add_category("ART"));
        assert!(!store.add_category("ART"));
        assert!(store.contains_category("ART"));
        assert!(store.subcategories("ART").unwrap().is_empty());
    }

    #[test]
    fn test_add_subcategory_creates_category() {
        let mut store = RecordStore::new();
        assert!(store.add_subcategory("ART", "PAINTING"));
        assert!(!store.add_subcategory("ART", "PAINTING"));
        assert!(store.add_subcategory("ART", "SCULPTURE"));
        assert!(store.contains_category("ART"));
        assert!(store.contains_subcategory("ART", "SCULPTURE"));
        assert!(!store.contains_subcategory("MUSIC", "PAINTING"));
    }

    #[test]
    fn test_edit_category_carries_subcategories() {
        let mut store = RecordStore::new();
        store.add_subcategory("ART", "PAINTING");
        assert!(store.edit_category("ART", "FINE ART"));
        assert!(!store.contains_category("ART"));
        assert!(store.contains_subcategory("FINE ART", "PAINTING"));
        assert!(!store.edit_category("ART", "OTHER"));
    }

    #[test]
    fn test_edit_category_overwrites_target() {
        let mut store = RecordStore::new();
        store.add_subcategory("ART", "PAINTING");
        store.add_subcategory("CRAFT", "POTTERY");
        assert!(store.edit_category("ART", "CRAFT"));
        assert!(store.contains_subcategory("CRAFT", "PAINTING"));
        assert!(!store.contains_subcategory("CRAFT", "POTTERY"));
        assert_eq!(store.categories().count(), 1);
    }

    #[test]
    fn test_edit_subcategory() {
        let mut store = RecordStore::new();
        store.add_subcategory("ART", "PAINTING");
        assert!(store.edit_subcategory("ART", "PAINTING", "OIL"));
        assert!(store.contains_subcategory("ART", "OIL"));
        assert!(!store.contains_subcategory("ART", "PAINTING"));
        assert!(!store.edit_subcategory("ART", "PAINTING", "WATERCOLOR"));
        assert!(!store.edit_subcategory("MUSIC", "OIL", "JAZZ"));
        assert!(!store.contains_subcategory("ART", "WATERCOLOR"));
    }

    #[test]
    fn test_remove_taxonomy_entries() {
        let mut store = RecordStore::new();
        store.add_subcategory("ART", "PAINTING");
        assert!(store.remove_subcategory("ART", "PAINTING"));
        assert!(!store.remove_subcategory("ART", "PAINTING"));
        assert!(!store.remove_subcategory("MUSIC", "JAZZ"));
        assert!(store.contains_category("ART"));
        assert!(store.remove_category("ART"));
        assert!(!store.remove_category("ART"));
    }

    #[test]
    fn test_taxonomy_removal_does_not_cascade() {
        let mut store = RecordStore::new();
        assert!(store.add_category("ART"));
        assert!(store.add_subcategory("ART", "PAINTING"));
        let record = make_record("0001_2024", "ART", "PAINTING", &["FAMOUS"]);
        assert!(store.add_record(record.clone()));
        assert_eq!(store.find_records_with_subcategory("ART", "PAINTING"), vec![&record]);

        assert!(store.remove_category("ART"));
        assert_eq!(store.find_records_with_subcategory("ART", "PAINTING"), vec![&record]);
    }

    #[test]
    fn test_add_record_does_not_register_taxonomy() {
        let mut store = RecordStore::new();
        store.add_record(make_record("0001_2024", "ART", "PAINTING", &[]));
        assert!(!store.contains_category("ART"));
    }

    // === Construction & equality ===

    #[test]
    fn test_from_parts_copies_input() {
        let record = make_record("0001_2024", "ART", "PAINTING", &[]);
        let mut taxonomy = Taxonomy::new();
        taxonomy.entry("ART".into()).or_default().insert("PAINTING".into());

        let store =
            RecordStore::from_parts([("0001_2024".to_string(), record)], taxonomy.clone()).unwrap();
        taxonomy.get_mut("ART").unwrap().insert("SCULPTURE".into());

        assert!(!store.contains_subcategory("ART", "SCULPTURE"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_from_parts_rejects_mismatched_key() {
        let record = make_record("0001_2024", "ART", "PAINTING", &[]);
        let result = RecordStore::from_parts([("0002_2024".to_string(), record)], Taxonomy::new());
        assert!(matches!(result, Err(CatalogError::InvalidArgument(_))));
    }

    #[test]
    fn test_structural_equality_and_display() {
        let mut a = RecordStore::new();
        let mut b = RecordStore::new();
        a.add_record(make_record("2", "X", "Y", &[]));
        a.add_record(make_record("1", "X", "Y", &["T"]));
        a.add_subcategory("X", "Y");
        b.add_subcategory("X", "Y");
        b.add_record(make_record("1", "X", "Y", &["T"]));
        b.add_record(make_record("2", "X", "Y", &[]));

        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());

        b.add_category("Z");
        assert_ne!(a, b);
        assert_ne!(a.to_string(), b.to_string());
    }
}
