//! Foundation types for the GX toolkit.
//!
//! Every other GX crate depends on `gx-types` for its notion of time and for
//! inspecting the JSON payloads that flow through the store.
//!
//! # Key Types
//!
//! - [`Timestamp`]: Wall-clock milliseconds since the UNIX epoch
//! - [`Clock`]: Injected time source ([`SystemClock`], [`ManualClock`])
//! - [`ValueKind`]: Structural kind of a JSON value, with [`get_type`] and
//!   the `is_*` predicates

pub mod clock;
pub mod error;
pub mod kind;
pub mod temporal;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::TypeError;
pub use kind::{
    get_type, is_array, is_boolean, is_null, is_number, is_object, is_string, ValueKind,
};
pub use temporal::Timestamp;
