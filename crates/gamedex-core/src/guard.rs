//! # Relationship Guard
//!
//! Decides whether a record may be deleted.
//!
//! - Developers and genres cannot be removed while any game references them.
//! - A game can always be removed; its genre links are cleared first.

use crate::resource::Resource;
use crate::store::CatalogStore;
use crate::{CatalogError, GameId};

/// A kind of reference a game holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    /// Game -> developer (many-to-one).
    GameDeveloper,
    /// Game <-> genre (many-to-many).
    GameGenre,
}

/// What deleting a record of some kind requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteRule {
    /// Refuse while any game holds this reference to the record.
    RefuseWhileReferenced(Dependency),
    /// Drop the record's own genre links, then delete.
    DetachGenres,
}

/// Stateless gate consulted by the orchestrator before a removal.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationshipGuard;

impl RelationshipGuard {
    /// Number of games blocking removal of record `id` of kind `R`.
    pub fn dependents<R: Resource, S: CatalogStore>(
        store: &S,
        id: u64,
    ) -> Result<usize, CatalogError> {
        match R::DELETE_RULE {
            DeleteRule::RefuseWhileReferenced(dependency) => store.dependents(dependency, id),
            DeleteRule::DetachGenres => Ok(0),
        }
    }

    /// Fail with `Conflict` if the record still has dependents.
    pub fn check<R: Resource, S: CatalogStore>(store: &S, id: u64) -> Result<(), CatalogError> {
        let count = Self::dependents::<R, S>(store, id)?;
        if count > 0 {
            return Err(CatalogError::Conflict(format!(
                "Cannot delete {} with id {}: {} game(s) still reference it.",
                R::KIND,
                id,
                count
            )));
        }
        Ok(())
    }

    /// Check the rule and perform any link cleanup it calls for.
    ///
    /// On `Ok`, the record can be removed from the store.
    pub fn prepare_removal<R: Resource, S: CatalogStore>(
        store: &mut S,
        id: u64,
    ) -> Result<(), CatalogError> {
        match R::DELETE_RULE {
            DeleteRule::RefuseWhileReferenced(_) => Self::check::<R, S>(store, id),
            DeleteRule::DetachGenres => store.detach_genres(GameId(id)),
        }
    }
}
