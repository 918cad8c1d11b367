//! # Catalog Primitives
//!
//! Hardcoded runtime constants for the gamedex catalog.
//!
//! These limits are compiled into the binary and are immutable at runtime.
//! They are shared by the field pre-check, the search engine and the
//! snapshot format.

/// Magic bytes for the gamedex snapshot header.
///
/// - File Header = Magic Bytes ("GDEX") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"GDEX";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot layout.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// SEARCH LIMITS
// =============================================================================

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Largest page a single search call may return.
///
/// Requests above this are clamped, not rejected.
pub const MAX_PAGE_SIZE: usize = 100;

/// Sort key every kind accepts, and the fallback for unknown keys.
pub const IDENTIFIER_SORT: &str = "id";

// =============================================================================
// FIELD LIMITS
// =============================================================================

/// Maximum length of a game title, in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length of a game description, in characters.
pub const MAX_GAME_DESCRIPTION_LENGTH: usize = 2000;

/// Earliest release year accepted for a game.
pub const MIN_RELEASE_YEAR: i32 = 1950;

/// Genre names must be between these lengths (inclusive).
pub const GENRE_NAME_LENGTH: (usize, usize) = (2, 50);

/// Maximum length of a genre description.
pub const MAX_GENRE_DESCRIPTION_LENGTH: usize = 200;

/// Developer names must be between these lengths (inclusive).
pub const DEVELOPER_NAME_LENGTH: (usize, usize) = (2, 100);

/// Maximum length of a developer's country of origin.
pub const MAX_COUNTRY_LENGTH: usize = 80;

/// Maximum length of a technical sheet's history text.
pub const MAX_HISTORY_LENGTH: usize = 2000;

/// Maximum length of a technical sheet's notable games text.
pub const MAX_NOTABLE_GAMES_LENGTH: usize = 200;
