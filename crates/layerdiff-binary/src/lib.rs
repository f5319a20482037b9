//! Binary delta codec for layerdiff.
//!
//! Finds changed byte runs and length changes between two fixed-format
//! buffers, builds a compact patch, and applies or inverts it. Correctness
//! first: O(n) scan, no compression, intended for small and moderate buffers
//! (thumbnails, palettes, parameter blobs).
//!
//! # Key Types
//!
//! - [`BinaryPatch`] / [`BinaryOp`] -- the recorded edits
//! - [`Direction`] -- forward (patch) or backward (unpatch) application
//! - [`diff_bytes`] / [`apply`] -- compute and apply a patch

pub mod error;
pub mod patch;

pub use error::{BinaryError, BinaryResult};
pub use patch::{apply, diff_bytes, BinaryOp, BinaryPatch, Direction};
