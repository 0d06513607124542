//! Durable, namespaced storage for [`addrfix_core::StoreRecord`]s.
//!
//! The store mirrors browser `localStorage`: string keys, string values, and
//! a backend that may refuse writes (quota) or hand back unparseable data.
//! [`PersistenceStore`] contains every such failure so callers only ever see
//! "no record" or "write skipped".

pub mod backend;
pub mod error;
pub mod file;
pub mod key;
pub mod store;

pub use backend::{MemoryBackend, StorageBackend};
pub use error::StoreError;
pub use file::FileBackend;
pub use key::{parse_record_key, record_key};
pub use store::PersistenceStore;
