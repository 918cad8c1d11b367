//! # Snapshot Format
//!
//! Binary serialization of a whole catalog, used for export and import.
//! File I/O stays in the app layer.
//!
//! Format: Header (5 bytes) + postcard-serialized snapshot.
//! - 4 bytes: Magic ("GDEX")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is parsed.

use crate::store::CatalogStore;
use crate::{CatalogError, Developer, Game, Genre, primitives};
use serde::{Deserialize, Serialize};

/// Maximum accepted snapshot size.
///
/// Checked before deserialization so a corrupt or hostile file cannot
/// force a huge allocation.
pub const MAX_SNAPSHOT_SIZE: usize = 256 * 1024 * 1024; // 256 MB

const HEADER_LEN: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// Header at the start of every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Header for the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Check magic bytes and version.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(CatalogError::Serialization(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(CatalogError::Serialization(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CatalogError> {
        if bytes.len() < HEADER_LEN {
            return Err(CatalogError::Serialization(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Every record of a catalog, in identifier order per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub developers: Vec<Developer>,
    pub genres: Vec<Genre>,
    pub games: Vec<Game>,
}

impl CatalogSnapshot {
    /// Read every record out of a store.
    pub fn capture<S: CatalogStore>(store: &S) -> Result<Self, CatalogError> {
        Ok(Self {
            developers: store.list()?,
            genres: store.list()?,
            games: store.list()?,
        })
    }

    /// Write every record into an empty store at its original identifier.
    ///
    /// A store that already holds records is refused before anything is
    /// written, since restored ids would overwrite its rows. Developers and
    /// genres go first so game links point at stored rows.
    pub fn restore_into<S: CatalogStore>(self, store: &mut S) -> Result<(), CatalogError> {
        let existing =
            store.count::<Developer>()? + store.count::<Genre>()? + store.count::<Game>()?;
        if existing > 0 {
            return Err(CatalogError::Conflict(format!(
                "Cannot restore into a catalog that already holds {} records",
                existing
            )));
        }

        for developer in self.developers {
            store.replace(developer)?;
        }
        for genre in self.genres {
            store.replace(genre)?;
        }
        for game in self.games {
            store.replace(game)?;
        }
        Ok(())
    }

    /// Total number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.developers.len() + self.genres.len() + self.games.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a snapshot to bytes (header + payload).
pub fn snapshot_to_bytes(snapshot: &CatalogSnapshot) -> Result<Vec<u8>, CatalogError> {
    let payload =
        postcard::to_stdvec(snapshot).map_err(|e| CatalogError::Serialization(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_LEN + payload.len());
    result.extend_from_slice(&SnapshotHeader::new().to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Deserialize a snapshot from bytes.
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<CatalogSnapshot, CatalogError> {
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(CatalogError::Serialization(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }

    let header = SnapshotHeader::from_bytes(bytes)?;
    header.validate()?;

    postcard::from_bytes(&bytes[HEADER_LEN..]).map_err(|e| {
        CatalogError::Serialization(format!("Failed to deserialize snapshot: {}", e))
    })
}

// =============================================================================
// TESTS
// =============================================================================
