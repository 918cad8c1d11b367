//! # Catalog
//!
//! The store the app layer holds: one type over either backend.
//!
//! - `InMemory`: `MemoryCatalog` (fast, volatile)
//! - `Persistent`: `RedbCatalog` (disk-backed, ACID)

use crate::formats::CatalogSnapshot;
use crate::guard::Dependency;
use crate::resource::Resource;
use crate::store::{CatalogStore, MemoryCatalog, RedbCatalog};
use crate::{CatalogError, GameId};
use std::path::Path;

/// Storage backend of a catalog.
#[derive(Debug)]
pub enum StorageBackend {
    InMemory(MemoryCatalog),
    Persistent(RedbCatalog),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryCatalog::new())
    }
}

// NOTE: no Clone. A redb handle cannot be duplicated.

/// A catalog over one storage backend.
#[derive(Debug, Default)]
pub struct Catalog {
    backend: StorageBackend,
}

impl Catalog {
    /// Create an empty in-memory catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or create) a persistent catalog at `path`.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        Ok(Self {
            backend: StorageBackend::Persistent(RedbCatalog::open(path)?),
        })
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    /// Capture every record.
    pub fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        CatalogSnapshot::capture(self)
    }

    /// Write a snapshot's records into this catalog.
    pub fn restore(&mut self, snapshot: CatalogSnapshot) -> Result<(), CatalogError> {
        snapshot.restore_into(self)
    }
}

impl CatalogStore for Catalog {
    fn get<R: Resource>(&self, id: u64) -> Result<Option<R>, CatalogError> {
        match &self.backend {
            StorageBackend::InMemory(store) => store.get(id),
            StorageBackend::Persistent(store) => store.get(id),
        }
    }

    fn list<R: Resource>(&self) -> Result<Vec<R>, CatalogError> {
        match &self.backend {
            StorageBackend::InMemory(store) => store.list(),
            StorageBackend::Persistent(store) => store.list(),
        }
    }

    fn count<R: Resource>(&self) -> Result<usize, CatalogError> {
        match &self.backend {
            StorageBackend::InMemory(store) => store.count::<R>(),
            StorageBackend::Persistent(store) => store.count::<R>(),
        }
    }

    fn find_by_key<R: Resource>(&self, key: &str) -> Result<Option<u64>, CatalogError> {
        match &self.backend {
            StorageBackend::InMemory(store) => store.find_by_key::<R>(key),
            StorageBackend::Persistent(store) => store.find_by_key::<R>(key),
        }
    }

    fn insert<R: Resource>(&mut self, record: R) -> Result<R, CatalogError> {
        match &mut self.backend {
            StorageBackend::InMemory(store) => store.insert(record),
            StorageBackend::Persistent(store) => store.insert(record),
        }
    }

    fn replace<R: Resource>(&mut self, record: R) -> Result<(), CatalogError> {
        match &mut self.backend {
            StorageBackend::InMemory(store) => store.replace(record),
            StorageBackend::Persistent(store) => store.replace(record),
        }
    }

    fn remove<R: Resource>(&mut self, id: u64) -> Result<bool, CatalogError> {
        match &mut self.backend {
            StorageBackend::InMemory(store) => store.remove::<R>(id),
            StorageBackend::Persistent(store) => store.remove::<R>(id),
        }
    }

    fn dependents(&self, dependency: Dependency, id: u64) -> Result<usize, CatalogError> {
        match &self.backend {
            StorageBackend::InMemory(store) => store.dependents(dependency, id),
            StorageBackend::Persistent(store) => store.dependents(dependency, id),
        }
    }

    fn detach_genres(&mut self, game: GameId) -> Result<(), CatalogError> {
        match &mut self.backend {
            StorageBackend::InMemory(store) => store.detach_genres(game),
            StorageBackend::Persistent(store) => store.detach_genres(game),
        }
    }
}
