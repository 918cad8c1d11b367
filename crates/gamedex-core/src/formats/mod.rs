//! # Formats
//!
//! Byte-level encodings of catalog data.

pub mod persistence;

pub use persistence::{
    CatalogSnapshot, MAX_SNAPSHOT_SIZE, SnapshotHeader, snapshot_from_bytes, snapshot_to_bytes,
};
