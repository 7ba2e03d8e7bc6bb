//! Locally persisted derived stores.
//!
//! These hold per-user state (labels, flags, view parameters) that lives
//! alongside the fetched directory data but is never sent to the
//! backend. Persistence goes through a [`KvStorage`] backend: file-based
//! in production, in-memory in tests. Writes are synchronous and
//! best-effort; a failed write is logged and the in-memory state stays
//! authoritative for the session.

pub mod flags;
pub mod labels;
pub mod params;
pub mod storage;

pub use flags::FlaggedStore;
pub use labels::{Label, LabelsStore};
pub use params::{HashParams, QueryParamStore};
pub use storage::{FileStorage, KvStorage, MemoryStorage};
