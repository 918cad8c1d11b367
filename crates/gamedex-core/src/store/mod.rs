//! # Entity Store
//!
//! The `CatalogStore` trait is the single seam between the catalog logic
//! and where records live. Two backends implement it:
//! - `MemoryCatalog`: BTreeMap arenas (fast, volatile)
//! - `RedbCatalog`: redb tables (ACID, persistent)
//!
//! Both backends keep a business-key index and the reverse links from
//! developers and genres to the games that reference them.

mod memory;
mod redb_catalog;

pub use memory::MemoryCatalog;
pub use redb_catalog::RedbCatalog;

use crate::guard::Dependency;
use crate::resource::Resource;
use crate::{CatalogError, GameId, Record};

/// Storage operations the catalog needs.
///
/// All fallible operations return `Result<T, CatalogError>` so in-memory
/// and persistent backends can be used uniformly.
pub trait CatalogStore {
    /// Fetch a record by identifier.
    fn get<R: Resource>(&self, id: u64) -> Result<Option<R>, CatalogError>;

    /// Whether a record with this identifier exists.
    fn contains<R: Resource>(&self, id: u64) -> Result<bool, CatalogError> {
        Ok(self.get::<R>(id)?.is_some())
    }

    /// Every record of a kind, in identifier order.
    fn list<R: Resource>(&self) -> Result<Vec<R>, CatalogError>;

    /// Number of records of a kind.
    fn count<R: Resource>(&self) -> Result<usize, CatalogError>;

    /// Identifier of the record holding this exact business key, if any.
    fn find_by_key<R: Resource>(&self, key: &str) -> Result<Option<u64>, CatalogError>;

    /// Store a new record under a freshly assigned identifier.
    ///
    /// Identifiers start at 1 and are never reused.
    /// Returns `Conflict` if the business key is already held.
    fn insert<R: Resource>(&mut self, record: R) -> Result<R, CatalogError>;

    /// Write a record at its own identifier, creating or overwriting it.
    ///
    /// Returns `Conflict` if another record holds the business key.
    fn replace<R: Resource>(&mut self, record: R) -> Result<(), CatalogError>;

    /// Remove a record. Returns `false` if it did not exist.
    fn remove<R: Resource>(&mut self, id: u64) -> Result<bool, CatalogError>;

    /// Number of games that depend on the given developer or genre.
    fn dependents(&self, dependency: Dependency, id: u64) -> Result<usize, CatalogError>;

    /// Drop every genre link of a game.
    fn detach_genres(&mut self, game: GameId) -> Result<(), CatalogError>;
}

/// The references a stored game holds, as raw identifiers.
pub(crate) struct GameLinks {
    pub(crate) game: u64,
    pub(crate) developer: Option<u64>,
    pub(crate) genres: Vec<u64>,
}

impl GameLinks {
    /// Links of a record, or `None` for kinds that hold no references.
    pub(crate) fn of(record: &Record) -> Option<Self> {
        match record {
            Record::Game(game) => Some(Self {
                game: game.id.0,
                developer: game.developer.map(|d| d.0),
                genres: game.genres.iter().map(|g| g.0).collect(),
            }),
            _ => None,
        }
    }
}
