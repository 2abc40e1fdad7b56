//! Keyed filename derivation for fstore.
//!
//! A store never writes a caller's key to disk. Instead each logical key is
//! run through HMAC-SHA256 keyed with a secret derived from the store's
//! directory path, and the hex digest becomes the file name. This keeps file
//! names fixed-length and traversal-free, and scopes them to one directory.
//!
//! All crypto operations wrap established libraries -- no custom cryptography.

pub mod deriver;

pub use deriver::{DirectoryKey, KeyDeriver};
