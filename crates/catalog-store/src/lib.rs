pub mod file;
pub mod memory;

pub use file::{FileRepository, StateFile, STATE_FILE_VERSION};
pub use memory::MemoryRepository;
