//! Expiring key-value storage for the GX toolkit.
//!
//! [`ExpiringStore`] wraps a plain, synchronous, string-keyed [`Backend`]
//! that knows nothing about time, and layers optional per-entry expiration
//! and soft capacity warnings on top of it.
//!
//! # Backends
//!
//! All backends implement the [`Backend`] trait:
//!
//! - [`MemoryBackend`]: `BTreeMap`-based, session-scoped
//! - [`FileBackend`]: durable, one JSON document per namespace
//!
//! # Design Rules
//!
//! 1. Expiration is lazy: an expired entry stays in the backend until a read
//!    observes it, at which point it is purged.
//! 2. Writes overwrite unconditionally; there is no merge.
//! 3. Write-path failures reach the caller. Read-path corruption degrades to
//!    "not found" and is logged.
//! 4. Capacity warnings are advisory and never fail an operation.
//! 5. Collaborators (backend, clock, diagnostic sink) are injected once at
//!    construction; nothing probes global state per call.

pub mod backend;
pub mod config;
pub mod diagnostics;
pub mod entry;
pub mod error;
pub mod factory;
pub mod file;
pub mod memory;
pub mod store;

// Re-export primary types at crate root for ergonomic imports.
pub use backend::Backend;
pub use config::StoreConfig;
pub use diagnostics::{DiagnosticSink, NullSink, RecordingSink, TracingSink};
pub use entry::{BatchItem, Expiry, StoredEntry};
pub use error::{StoreError, StoreResult};
pub use factory::{defaults, BackendProbe, FileProbe, MemoryProbe, Scope, StoreFactory};
pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use store::{ExpiringStore, ExpiringStoreBuilder};
