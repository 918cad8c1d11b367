//! # gamedex-core
//!
//! The catalog engine for gamedex - THE LOGIC.
//!
//! This crate holds the request-mutation control layer of the catalog:
//! - the idempotency cache guarding creation requests
//! - the search/sort/paginate engine shared by every record kind
//! - the relationship guard that keeps deletes from orphaning games
//! - the orchestrator tying them to an entity store
//!
//! ## Architectural Constraints
//!
//! - Synchronous and pure: NO async, NO network, NO logging dependency
//! - Every record kind goes through the same generic code path, described
//!   by a [`Resource`] implementation
//! - Records reference each other by identifier only

// =============================================================================
// MODULES
// =============================================================================

pub mod catalog;
pub mod formats;
pub mod guard;
pub mod idempotency;
pub mod orchestrator;
pub mod primitives;
pub mod resource;
pub mod search;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AgeRating, CatalogError, Developer, DeveloperDraft, DeveloperId, Game, GameDraft, GameId,
    Genre, GenreDraft, GenreId, Record, ResourceKind, TechnicalSheet,
};

// =============================================================================
// RE-EXPORTS: Catalog Engine
// =============================================================================

pub use catalog::{Catalog, StorageBackend};
pub use guard::{DeleteRule, Dependency, RelationshipGuard};
pub use idempotency::{IdempotencyStore, MemoryIdempotencyStore, Reply, normalize_token};
pub use orchestrator::{Creation, CreationState, Orchestrator, fetch};
pub use resource::Resource;
pub use search::{Needle, Page, SearchParams, SearchRequest, SortDirection, search};
pub use store::{CatalogStore, MemoryCatalog, RedbCatalog};
pub use validation::Validate;

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{CatalogSnapshot, SnapshotHeader, snapshot_from_bytes, snapshot_to_bytes};
