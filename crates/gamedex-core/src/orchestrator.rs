//! # Mutation Orchestrator
//!
//! One code path for create, update and delete across every record kind,
//! parameterized by the [`Resource`] descriptor.
//!
//! ## Creation State Machine
//!
//! ```text
//! New ─┬─> Replayed    (token already recorded: stored reply returned as is)
//!      ├─> Conflicted  (business key taken: 409, recorded under the token)
//!      ├─> Rejected    (reference does not resolve: 400, never recorded)
//!      └─> Created     (persisted: 201 + location, recorded under the token)
//! ```
//!
//! Every state is terminal. Nothing is retried.

use crate::guard::RelationshipGuard;
use crate::idempotency::{IdempotencyStore, Reply, normalize_token};
use crate::resource::Resource;
use crate::store::CatalogStore;
use crate::CatalogError;

/// Terminal state of a creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationState {
    Replayed,
    Conflicted,
    Rejected,
    Created,
}

impl CreationState {
    /// Lower-case label used in log events.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Replayed => "replayed",
            Self::Conflicted => "conflicted",
            Self::Rejected => "rejected",
            Self::Created => "created",
        }
    }
}

/// Outcome of a creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creation {
    pub state: CreationState,
    pub reply: Reply,
}

/// Fetch one record or fail with `NotFound`.
pub fn fetch<R: Resource, S: CatalogStore>(store: &S, id: u64) -> Result<R, CatalogError> {
    store.get::<R>(id)?.ok_or(CatalogError::NotFound { kind: R::KIND, id })
}

/// Runs mutations against a store, consulting an idempotency cache for
/// creations.
pub struct Orchestrator<'a, S: CatalogStore> {
    store: &'a mut S,
    idempotency: &'a dyn IdempotencyStore,
}

impl<'a, S: CatalogStore> Orchestrator<'a, S> {
    pub fn new(store: &'a mut S, idempotency: &'a dyn IdempotencyStore) -> Self {
        Self { store, idempotency }
    }

    /// Create a record from a draft.
    ///
    /// `token` is the raw idempotency token; missing or blank disables
    /// replay for this request. `location_base` is the collection path the
    /// new identifier is appended to.
    ///
    /// Only unexpected failures are returned as `Err`; every expected
    /// outcome is a [`Creation`] carrying its rendered reply.
    pub fn create<R: Resource>(
        &mut self,
        draft: R::Draft,
        token: Option<&str>,
        location_base: &str,
    ) -> Result<Creation, CatalogError> {
        let token = normalize_token(token);

        if let Some(reply) = token.and_then(|t| self.idempotency.lookup(t)) {
            return Ok(Creation {
                state: CreationState::Replayed,
                reply,
            });
        }

        if self.store.find_by_key::<R>(R::draft_key(&draft))?.is_some() {
            let conflict = CatalogError::duplicate_key(R::KIND, R::draft_key(&draft));
            return self.conflicted(&conflict, token);
        }

        let record = match R::build(draft, &*self.store) {
            Ok(record) => record,
            Err(err @ CatalogError::BadRequest(_)) => {
                return Ok(Creation {
                    state: CreationState::Rejected,
                    reply: Reply::error(err.status(), &err.to_string())?,
                });
            }
            Err(err) => return Err(err),
        };

        let stored = match self.store.insert(record) {
            Ok(stored) => stored,
            // lost a race against a concurrent creation with the same key
            Err(conflict @ CatalogError::Conflict(_)) => return self.conflicted(&conflict, token),
            Err(err) => return Err(err),
        };

        let reply = Reply::json(201, &stored)?
            .with_location(format!("{}/{}", location_base, stored.id()));
        self.remember(token, &reply);
        Ok(Creation {
            state: CreationState::Created,
            reply,
        })
    }

    /// Replace a record's fields from a draft.
    ///
    /// References are resolved before anything changes; a failed update
    /// leaves the stored record as it was.
    pub fn update<R: Resource>(&mut self, id: u64, draft: R::Draft) -> Result<R, CatalogError> {
        let mut record = fetch::<R, S>(&*self.store, id)?;
        record.apply(draft, &*self.store)?;
        self.store.replace(record.clone())?;
        Ok(record)
    }

    /// Delete a record after the relationship guard allows it.
    pub fn delete<R: Resource>(&mut self, id: u64) -> Result<(), CatalogError> {
        if !self.store.contains::<R>(id)? {
            return Err(CatalogError::NotFound { kind: R::KIND, id });
        }
        RelationshipGuard::prepare_removal::<R, S>(&mut *self.store, id)?;
        self.store.remove::<R>(id)?;
        Ok(())
    }

    fn conflicted(
        &self,
        conflict: &CatalogError,
        token: Option<&str>,
    ) -> Result<Creation, CatalogError> {
        let reply = Reply::error(conflict.status(), &conflict.to_string())?;
        self.remember(token, &reply);
        Ok(Creation {
            state: CreationState::Conflicted,
            reply,
        })
    }

    fn remember(&self, token: Option<&str>, reply: &Reply) {
        if let Some(token) = token {
            self.idempotency.record(token, reply);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
