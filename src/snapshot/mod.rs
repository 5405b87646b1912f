pub mod analytics;
pub mod assembler;
pub mod document;
pub mod store;

pub use assembler::{PersistedSnapshot, SnapshotAssembler};
pub use document::SnapshotDocument;
pub use store::SnapshotStore;
