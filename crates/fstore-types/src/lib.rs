//! Foundation types for fstore.
//!
//! Every other fstore crate depends on `fstore-types`.
//!
//! # Key Types
//!
//! - [`EntryName`] -- Derived, fixed-length name of an entry's backing file
//! - [`Timestamp`] -- Absolute expiration instant with second granularity

pub mod error;
pub mod name;
pub mod temporal;

pub use error::TypeError;
pub use name::EntryName;
pub use temporal::Timestamp;
