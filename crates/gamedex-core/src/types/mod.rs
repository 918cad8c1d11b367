//! # Core Type Definitions
//!
//! This module contains all record types for the gamedex catalog:
//! - Identifiers (`GameId`, `GenreId`, `DeveloperId`)
//! - Records (`Game`, `Genre`, `Developer`, `TechnicalSheet`)
//! - Write inputs (`GameDraft`, `GenreDraft`, `DeveloperDraft`)
//! - Error types (`CatalogError`)
//!
//! ## Arena Model
//!
//! Records never hold each other. A `Game` points at its developer and
//! genres by identifier only; the store keeps the reverse links so the
//! relationship guard can count dependents without walking object graphs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a game record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameId(pub u64);

/// Identifier of a genre record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GenreId(pub u64);

/// Identifier of a developer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeveloperId(pub u64);

// =============================================================================
// RESOURCE KIND
// =============================================================================

/// The three record kinds the catalog serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Game,
    Genre,
    Developer,
}

impl ResourceKind {
    /// Path segment the kind is served under (`/games`, ...).
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Game => "games",
            Self::Genre => "genres",
            Self::Developer => "developers",
        }
    }

    /// Capitalized label used at the start of messages.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Game => "Game",
            Self::Genre => "Genre",
            Self::Developer => "Developer",
        }
    }

    /// Name of the business-key field, as it appears in messages.
    #[must_use]
    pub const fn key_field(self) -> &'static str {
        match self {
            Self::Game => "title",
            Self::Genre | Self::Developer => "name",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Game => "game",
            Self::Genre => "genre",
            Self::Developer => "developer",
        };
        f.write_str(label)
    }
}

// =============================================================================
// AGE RATING
// =============================================================================

/// Minimum recommended audience for a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeRating {
    #[serde(rename = "FREE")]
    Free,
    #[serde(rename = "NOT_UNDER_10")]
    NotUnder10,
    #[serde(rename = "NOT_UNDER_12")]
    NotUnder12,
    #[serde(rename = "NOT_UNDER_14")]
    NotUnder14,
    #[serde(rename = "NOT_UNDER_16")]
    NotUnder16,
    #[serde(rename = "NOT_UNDER_18")]
    NotUnder18,
}

// =============================================================================
// RECORDS
// =============================================================================

/// A game in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    /// Business key: unique across all games.
    pub title: String,
    pub description: String,
    pub release_year: i32,
    pub age_rating: AgeRating,
    #[serde(rename = "developerId")]
    pub developer: Option<DeveloperId>,
    #[serde(rename = "genreIds")]
    pub genres: BTreeSet<GenreId>,
}

/// A genre games can be filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genre {
    pub id: GenreId,
    /// Business key: unique across all genres.
    pub name: String,
    pub description: Option<String>,
}

/// Owned, one-to-one detail sheet of a developer.
///
/// Lives and dies with its developer; there is no way to address it alone.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalSheet {
    pub history: Option<String>,
    pub notable_games: Option<String>,
    pub awards: Option<String>,
}

impl TechnicalSheet {
    /// True when no field carries any text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [&self.history, &self.notable_games, &self.awards]
            .iter()
            .all(|field| field.as_deref().is_none_or(|s| s.trim().is_empty()))
    }
}

/// A studio that makes games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Developer {
    pub id: DeveloperId,
    /// Business key: unique across all developers.
    pub name: String,
    pub founded_on: NaiveDate,
    pub country: String,
    pub technical_sheet: Option<TechnicalSheet>,
}

// =============================================================================
// DRAFTS (write inputs)
// =============================================================================

/// Input for creating or replacing a game.
///
/// References are raw identifiers; they are resolved against the store
/// before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDraft {
    pub title: String,
    pub description: String,
    pub release_year: i32,
    pub age_rating: AgeRating,
    #[serde(default)]
    pub developer_id: Option<u64>,
    #[serde(default)]
    pub genre_ids: Vec<u64>,
}

/// Input for creating or replacing a genre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Input for creating or replacing a developer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperDraft {
    pub name: String,
    pub founded_on: NaiveDate,
    pub country: String,
    #[serde(default)]
    pub technical_sheet: Option<TechnicalSheet>,
}

// =============================================================================
// RECORD (storage envelope)
// =============================================================================

/// Any record, tagged with its kind. Used by storage backends that keep
/// heterogeneous rows in one structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    Game(Game),
    Genre(Genre),
    Developer(Developer),
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the catalog.
///
/// - No silent failures
/// - Every variant maps to exactly one HTTP status through [`CatalogError::status`]
/// - `Storage`, `Serialization` and `Io` are "unexpected": their detail is
///   for logs only and never reaches a client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// No record of this kind has the identifier.
    #[error("{} with id {id} not found", .kind.title())]
    NotFound { kind: ResourceKind, id: u64 },

    /// Duplicate business key, or a delete blocked by dependents.
    #[error("{0}")]
    Conflict(String),

    /// A referenced identifier does not resolve.
    #[error("{0}")]
    BadRequest(String),

    /// The field pre-check rejected the input.
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// The storage backend failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A record or snapshot could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred outside the store (files, config, sockets).
    #[error("I/O error: {0}")]
    Io(String),
}

impl CatalogError {
    /// Conflict for a business key that is already taken.
    #[must_use]
    pub fn duplicate_key(kind: ResourceKind, key: &str) -> Self {
        Self::Conflict(format!(
            "A {} with the {} '{}' is already registered.",
            kind,
            kind.key_field(),
            key
        ))
    }

    /// Bad request for a reference that does not resolve.
    #[must_use]
    pub fn unresolved(kind: ResourceKind, id: u64) -> Self {
        Self::BadRequest(format!("{} with id {} does not exist", kind.title(), id))
    }

    /// HTTP status code this error is answered with.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Conflict(_) => 409,
            Self::BadRequest(_) | Self::Invalid(_) => 400,
            Self::Storage(_) | Self::Serialization(_) | Self::Io(_) => 500,
        }
    }

    /// True for failures whose detail must not be shown to clients.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        self.status() >= 500
    }
}

// =============================================================================
// TESTS
// =============================================================================
