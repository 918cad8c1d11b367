//! # In-Memory Catalog
//!
//! Arena storage: one `BTreeMap` per record kind, a business-key index per
//! kind, and two link sets mirroring the game references. All structures
//! use `BTreeMap`/`BTreeSet` for deterministic ordering.

use super::{CatalogStore, GameLinks};
use crate::guard::Dependency;
use crate::resource::Resource;
use crate::{CatalogError, GameId, Record, ResourceKind};
use std::collections::{BTreeMap, BTreeSet};

/// Rows of one record kind.
#[derive(Debug, Clone, Default)]
struct Table {
    rows: BTreeMap<u64, Record>,
    keys: BTreeMap<String, u64>,
    /// Highest identifier ever handed out or written.
    last_id: u64,
}

/// Volatile catalog held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    tables: BTreeMap<ResourceKind, Table>,
    /// (developer, game)
    developer_links: BTreeSet<(u64, u64)>,
    /// (genre, game)
    genre_links: BTreeSet<(u64, u64)>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn link(&mut self, links: &GameLinks) {
        if let Some(developer) = links.developer {
            self.developer_links.insert((developer, links.game));
        }
        for &genre in &links.genres {
            self.genre_links.insert((genre, links.game));
        }
    }

    fn unlink(&mut self, links: &GameLinks) {
        if let Some(developer) = links.developer {
            self.developer_links.remove(&(developer, links.game));
        }
        for &genre in &links.genres {
            self.genre_links.remove(&(genre, links.game));
        }
    }
}

impl CatalogStore for MemoryCatalog {
    fn get<R: Resource>(&self, id: u64) -> Result<Option<R>, CatalogError> {
        Ok(self
            .tables
            .get(&R::KIND)
            .and_then(|table| table.rows.get(&id))
            .and_then(R::from_record_ref)
            .cloned())
    }

    fn list<R: Resource>(&self) -> Result<Vec<R>, CatalogError> {
        Ok(self
            .tables
            .get(&R::KIND)
            .map(|table| {
                table
                    .rows
                    .values()
                    .filter_map(R::from_record_ref)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn count<R: Resource>(&self) -> Result<usize, CatalogError> {
        Ok(self.tables.get(&R::KIND).map_or(0, |table| table.rows.len()))
    }

    fn find_by_key<R: Resource>(&self, key: &str) -> Result<Option<u64>, CatalogError> {
        Ok(self
            .tables
            .get(&R::KIND)
            .and_then(|table| table.keys.get(key))
            .copied())
    }

    fn insert<R: Resource>(&mut self, mut record: R) -> Result<R, CatalogError> {
        let table = self.tables.entry(R::KIND).or_default();
        if table.keys.contains_key(record.business_key()) {
            return Err(CatalogError::duplicate_key(R::KIND, record.business_key()));
        }

        table.last_id = table.last_id.saturating_add(1);
        let id = table.last_id;
        record.set_id(id);

        table.keys.insert(record.business_key().to_string(), id);
        let envelope = record.clone().into_record();
        let links = GameLinks::of(&envelope);
        table.rows.insert(id, envelope);

        if let Some(links) = links {
            self.link(&links);
        }
        Ok(record)
    }

    fn replace<R: Resource>(&mut self, record: R) -> Result<(), CatalogError> {
        let id = record.id();
        let key = record.business_key().to_string();

        let table = self.tables.entry(R::KIND).or_default();
        if let Some(&holder) = table.keys.get(&key)
            && holder != id
        {
            return Err(CatalogError::duplicate_key(R::KIND, &key));
        }

        let envelope = record.into_record();
        let links = GameLinks::of(&envelope);
        let previous = table.rows.insert(id, envelope);

        if let Some(old) = previous.as_ref().and_then(R::from_record_ref)
            && old.business_key() != key
        {
            table.keys.remove(old.business_key());
        }
        table.keys.insert(key, id);
        table.last_id = table.last_id.max(id);

        if let Some(old_links) = previous.as_ref().and_then(GameLinks::of) {
            self.unlink(&old_links);
        }
        if let Some(links) = links {
            self.link(&links);
        }
        Ok(())
    }

    fn remove<R: Resource>(&mut self, id: u64) -> Result<bool, CatalogError> {
        let Some(table) = self.tables.get_mut(&R::KIND) else {
            return Ok(false);
        };
        let Some(previous) = table.rows.remove(&id) else {
            return Ok(false);
        };
        if let Some(old) = R::from_record_ref(&previous) {
            table.keys.remove(old.business_key());
        }
        if let Some(links) = GameLinks::of(&previous) {
            self.unlink(&links);
        }
        Ok(true)
    }

    fn dependents(&self, dependency: Dependency, id: u64) -> Result<usize, CatalogError> {
        let links = match dependency {
            Dependency::GameDeveloper => &self.developer_links,
            Dependency::GameGenre => &self.genre_links,
        };
        Ok(links.range((id, 0)..=(id, u64::MAX)).count())
    }

    fn detach_genres(&mut self, game: GameId) -> Result<(), CatalogError> {
        let Some(Record::Game(stored)) = self
            .tables
            .get_mut(&ResourceKind::Game)
            .and_then(|table| table.rows.get_mut(&game.0))
        else {
            return Ok(());
        };

        let genres = std::mem::take(&mut stored.genres);
        for genre in genres {
            self.genre_links.remove(&(genre.0, game.0));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
