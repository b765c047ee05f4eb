//! Durable store abstraction for media items and transcoding jobs.
//!
//! This crate provides:
//! - `MediaStore` / `JobStore` traits over a keyed-table backend
//! - Conditional (compare-and-set) updates as the sole serialization point
//! - An in-memory implementation for tests and local development

pub mod error;
pub mod memory;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use store::{JobStore, MediaStore, MediaUpdate};
