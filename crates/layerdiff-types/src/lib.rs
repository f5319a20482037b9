//! Value model for layerdiff.
//!
//! Every other layerdiff crate depends on `layerdiff-types`. It defines the
//! tree that gets diffed and the pure classification helpers the engine's
//! filters are built on.
//!
//! # Key Types
//!
//! - [`Value`] -- JSON-compatible tree node, plus timestamps and binary buffers
//! - [`ValueKind`] -- classification of a value
//! - [`BinaryBuffer`] / [`ElementType`] -- fixed-element-width byte buffers
//! - [`same_value`] / [`deep_equal`] -- identity and structural comparison

pub mod binary;
pub mod error;
pub mod json;
pub mod value;

pub use binary::{BinaryBuffer, ElementType};
pub use error::TypeError;
pub use json::{decode_bytes, encode_bytes};
pub use value::{deep_equal, same_value, Value, ValueKind};
