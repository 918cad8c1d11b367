//! # redb-backed Catalog Storage
//!
//! A disk-backed catalog store using the redb embedded database.
//!
//! Every mutating operation runs in a single write transaction, so a
//! record, its key index entry and its links are committed together:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)

use super::{CatalogStore, GameLinks};
use crate::guard::Dependency;
use crate::resource::Resource;
use crate::{CatalogError, Game, GameId, ResourceKind};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;

/// Table for games: GameId(u64) -> postcard bytes
const GAMES: TableDefinition<u64, &[u8]> = TableDefinition::new("games");

/// Table for genres: GenreId(u64) -> postcard bytes
const GENRES: TableDefinition<u64, &[u8]> = TableDefinition::new("genres");

/// Table for developers: DeveloperId(u64) -> postcard bytes
const DEVELOPERS: TableDefinition<u64, &[u8]> = TableDefinition::new("developers");

/// Business-key index: (kind, key) -> record id
const KEYS: TableDefinition<(&str, &str), u64> = TableDefinition::new("keys");

/// Reverse links: (developer_id, game_id)
const DEVELOPER_LINKS: TableDefinition<(u64, u64), ()> = TableDefinition::new("developer_links");

/// Reverse links: (genre_id, game_id)
const GENRE_LINKS: TableDefinition<(u64, u64), ()> = TableDefinition::new("genre_links");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const fn rows(kind: ResourceKind) -> TableDefinition<'static, u64, &'static [u8]> {
    match kind {
        ResourceKind::Game => GAMES,
        ResourceKind::Genre => GENRES,
        ResourceKind::Developer => DEVELOPERS,
    }
}

const fn last_id_key(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Game => "last_game_id",
        ResourceKind::Genre => "last_genre_id",
        ResourceKind::Developer => "last_developer_id",
    }
}

fn storage(e: impl std::fmt::Display) -> CatalogError {
    CatalogError::Storage(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CatalogError> {
    postcard::to_allocvec(value).map_err(|e| CatalogError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CatalogError> {
    postcard::from_bytes(bytes).map_err(|e| CatalogError::Serialization(e.to_string()))
}

/// Add or remove the link rows of a game inside an open write transaction.
fn write_links(txn: &WriteTransaction, links: &GameLinks, add: bool) -> Result<(), CatalogError> {
    if let Some(developer) = links.developer {
        let mut table = txn.open_table(DEVELOPER_LINKS).map_err(storage)?;
        if add {
            table.insert((developer, links.game), ()).map_err(storage)?;
        } else {
            table.remove((developer, links.game)).map_err(storage)?;
        }
    }
    if !links.genres.is_empty() {
        let mut table = txn.open_table(GENRE_LINKS).map_err(storage)?;
        for &genre in &links.genres {
            if add {
                table.insert((genre, links.game), ()).map_err(storage)?;
            } else {
                table.remove((genre, links.game)).map_err(storage)?;
            }
        }
    }
    Ok(())
}

/// A disk-backed catalog using redb.
///
/// The highest identifier per kind is cached in memory and mirrored in
/// the metadata table, so identifiers are never reused across restarts.
pub struct RedbCatalog {
    /// The redb database handle.
    db: Database,
    /// Highest identifier handed out per kind.
    last_ids: BTreeMap<ResourceKind, u64>,
}

impl std::fmt::Debug for RedbCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbCatalog")
            .field("last_ids", &self.last_ids)
            .finish_non_exhaustive()
    }
}

impl RedbCatalog {
    /// Open or create a catalog database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let db = Database::create(path.as_ref()).map_err(storage)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(storage)?;
            for kind in [
                ResourceKind::Game,
                ResourceKind::Genre,
                ResourceKind::Developer,
            ] {
                let _ = write_txn.open_table(rows(kind)).map_err(storage)?;
            }
            let _ = write_txn.open_table(KEYS).map_err(storage)?;
            let _ = write_txn.open_table(DEVELOPER_LINKS).map_err(storage)?;
            let _ = write_txn.open_table(GENRE_LINKS).map_err(storage)?;
            let _ = write_txn.open_table(METADATA).map_err(storage)?;
            write_txn.commit().map_err(storage)?;
        }

        let mut last_ids = BTreeMap::new();
        {
            let read_txn = db.begin_read().map_err(storage)?;
            let table = read_txn.open_table(METADATA).map_err(storage)?;
            for kind in [
                ResourceKind::Game,
                ResourceKind::Genre,
                ResourceKind::Developer,
            ] {
                let last = table
                    .get(last_id_key(kind))
                    .map_err(storage)?
                    .map(|v| v.value())
                    .unwrap_or(0);
                last_ids.insert(kind, last);
            }
        }

        Ok(Self { db, last_ids })
    }

    fn last_id(&self, kind: ResourceKind) -> u64 {
        self.last_ids.get(&kind).copied().unwrap_or(0)
    }
}

// =============================================================================
// CATALOGSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl CatalogStore for RedbCatalog {
    fn get<R: Resource>(&self, id: u64) -> Result<Option<R>, CatalogError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let table = read_txn.open_table(rows(R::KIND)).map_err(storage)?;

        match table.get(id).map_err(storage)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    fn list<R: Resource>(&self) -> Result<Vec<R>, CatalogError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let table = read_txn.open_table(rows(R::KIND)).map_err(storage)?;

        let mut records = Vec::new();
        for entry in table.iter().map_err(storage)? {
            let (_id, data) = entry.map_err(storage)?;
            records.push(decode(data.value())?);
        }
        Ok(records)
    }

    fn count<R: Resource>(&self) -> Result<usize, CatalogError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let table = read_txn.open_table(rows(R::KIND)).map_err(storage)?;
        let count = table.len().map_err(storage)?;
        Ok(count as usize)
    }

    fn find_by_key<R: Resource>(&self, key: &str) -> Result<Option<u64>, CatalogError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let table = read_txn.open_table(KEYS).map_err(storage)?;
        Ok(table
            .get((R::KIND.path(), key))
            .map_err(storage)?
            .map(|v| v.value()))
    }

    fn insert<R: Resource>(&mut self, mut record: R) -> Result<R, CatalogError> {
        let id = self.last_id(R::KIND).saturating_add(1);
        record.set_id(id);
        let bytes = encode(&record)?;
        let links = GameLinks::of(&record.clone().into_record());

        let write_txn = self.db.begin_write().map_err(storage)?;
        {
            let mut keys = write_txn.open_table(KEYS).map_err(storage)?;
            let index_key = (R::KIND.path(), record.business_key());
            if keys.get(index_key).map_err(storage)?.is_some() {
                return Err(CatalogError::duplicate_key(R::KIND, record.business_key()));
            }
            keys.insert(index_key, id).map_err(storage)?;
        }
        {
            let mut table = write_txn.open_table(rows(R::KIND)).map_err(storage)?;
            table.insert(id, bytes.as_slice()).map_err(storage)?;
        }
        {
            let mut meta = write_txn.open_table(METADATA).map_err(storage)?;
            meta.insert(last_id_key(R::KIND), id).map_err(storage)?;
        }
        if let Some(links) = &links {
            write_links(&write_txn, links, true)?;
        }
        write_txn.commit().map_err(storage)?;

        self.last_ids.insert(R::KIND, id);
        Ok(record)
    }

    fn replace<R: Resource>(&mut self, record: R) -> Result<(), CatalogError> {
        let id = record.id();
        let bytes = encode(&record)?;
        let key = record.business_key().to_string();
        let links = GameLinks::of(&record.into_record());

        let write_txn = self.db.begin_write().map_err(storage)?;
        {
            let keys = write_txn.open_table(KEYS).map_err(storage)?;
            let holder = keys
                .get((R::KIND.path(), key.as_str()))
                .map_err(storage)?
                .map(|v| v.value());
            if let Some(holder) = holder
                && holder != id
            {
                return Err(CatalogError::duplicate_key(R::KIND, &key));
            }
        }

        let previous: Option<R> = {
            let mut table = write_txn.open_table(rows(R::KIND)).map_err(storage)?;
            let old = table.insert(id, bytes.as_slice()).map_err(storage)?;
            match old {
                Some(data) => Some(decode(data.value())?),
                None => None,
            }
        };

        {
            let mut keys = write_txn.open_table(KEYS).map_err(storage)?;
            if let Some(old) = &previous
                && old.business_key() != key
            {
                keys.remove((R::KIND.path(), old.business_key()))
                    .map_err(storage)?;
            }
            keys.insert((R::KIND.path(), key.as_str()), id)
                .map_err(storage)?;
        }

        if let Some(old_links) = previous
            .map(|old| old.into_record())
            .as_ref()
            .and_then(GameLinks::of)
        {
            write_links(&write_txn, &old_links, false)?;
        }
        if let Some(links) = &links {
            write_links(&write_txn, links, true)?;
        }

        let last = self.last_id(R::KIND).max(id);
        {
            let mut meta = write_txn.open_table(METADATA).map_err(storage)?;
            meta.insert(last_id_key(R::KIND), last).map_err(storage)?;
        }
        write_txn.commit().map_err(storage)?;

        self.last_ids.insert(R::KIND, last);
        Ok(())
    }

    fn remove<R: Resource>(&mut self, id: u64) -> Result<bool, CatalogError> {
        let write_txn = self.db.begin_write().map_err(storage)?;

        let previous: Option<R> = {
            let mut table = write_txn.open_table(rows(R::KIND)).map_err(storage)?;
            let old = table.remove(id).map_err(storage)?;
            match old {
                Some(data) => Some(decode(data.value())?),
                None => None,
            }
        };
        let Some(previous) = previous else {
            return Ok(false);
        };

        {
            let mut keys = write_txn.open_table(KEYS).map_err(storage)?;
            keys.remove((R::KIND.path(), previous.business_key()))
                .map_err(storage)?;
        }
        if let Some(links) = GameLinks::of(&previous.into_record()) {
            write_links(&write_txn, &links, false)?;
        }
        write_txn.commit().map_err(storage)?;
        Ok(true)
    }

    fn dependents(&self, dependency: Dependency, id: u64) -> Result<usize, CatalogError> {
        let definition = match dependency {
            Dependency::GameDeveloper => DEVELOPER_LINKS,
            Dependency::GameGenre => GENRE_LINKS,
        };
        let read_txn = self.db.begin_read().map_err(storage)?;
        let table = read_txn.open_table(definition).map_err(storage)?;

        let mut count = 0usize;
        for entry in table
            .range((id, 0u64)..=(id, u64::MAX))
            .map_err(storage)?
        {
            entry.map_err(storage)?;
            count = count.saturating_add(1);
        }
        Ok(count)
    }

    fn detach_genres(&mut self, game: GameId) -> Result<(), CatalogError> {
        let write_txn = self.db.begin_write().map_err(storage)?;

        let detached = {
            let mut table = write_txn.open_table(GAMES).map_err(storage)?;
            let stored: Option<Game> = match table.get(game.0).map_err(storage)? {
                Some(data) => Some(decode(data.value())?),
                None => None,
            };
            let Some(mut stored) = stored else {
                return Ok(());
            };
            let genres: Vec<u64> = std::mem::take(&mut stored.genres)
                .into_iter()
                .map(|g| g.0)
                .collect();
            let bytes = encode(&stored)?;
            table.insert(game.0, bytes.as_slice()).map_err(storage)?;
            genres
        };

        let links = GameLinks {
            game: game.0,
            developer: None,
            genres: detached,
        };
        write_links(&write_txn, &links, false)?;
        write_txn.commit().map_err(storage)?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
