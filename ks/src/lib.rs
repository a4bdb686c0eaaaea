//! keystore: whole-record string storage for cadence
//!
//! Each key maps to one JSON document on disk. A write swaps the entire
//! document in via rename; readers see either the old record or the new
//! one. There is no locking, so two writers race and the later rename wins.
//!
//! ```text
//! <store_path>/
//! ├── mono_user.json
//! └── mono_plans.json
//! ```
//!
//! ```ignore
//! use keystore::{FileStore, KeyValueStore};
//!
//! let store = FileStore::open("/tmp/cadence")?;
//! store.set("mono_user", r#"{"name":"Ada"}"#)?;
//! assert!(store.get("mono_user")?.is_some());
//! ```

pub mod cli;
pub mod config;
mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore, validate_key};

/// Extension given to every record file
pub const VALUE_EXTENSION: &str = "json";
