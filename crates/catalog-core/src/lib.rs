pub mod csv;
pub mod error;
pub mod record;
pub mod repository;
pub mod snapshot;
pub mod store;
pub mod validation;

pub use csv::{ImportOptions, ImportPolicy, ImportReport};
pub use error::{CatalogError, CatalogResult};
pub use record::{Record, RecordBuilder, RecordType};
pub use repository::SnapshotRepository;
pub use snapshot::Snapshot;
pub use store::{RecordStore, Taxonomy};
