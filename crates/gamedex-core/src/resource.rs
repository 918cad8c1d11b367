//! # Resource Descriptors
//!
//! One trait describes everything the generic machinery needs to know
//! about a record kind: its business key, which fields it can be sorted
//! and searched by, how a draft becomes a record, and what deleting it
//! requires. The search engine, the relationship guard and the
//! orchestrator are written once against [`Resource`].

use crate::guard::{DeleteRule, Dependency};
use crate::search::Needle;
use crate::store::CatalogStore;
use crate::validation::Validate;
use crate::{
    CatalogError, Developer, DeveloperDraft, DeveloperId, Game, GameDraft, GameId, Genre,
    GenreDraft, GenreId, Record, ResourceKind,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Descriptor of a catalog record kind.
pub trait Resource: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Write input accepted for this kind.
    type Draft: Validate + DeserializeOwned + Send + 'static;

    /// Which kind this is.
    const KIND: ResourceKind;

    /// Sort keys accepted by search, as they appear on the wire.
    /// Must contain [`crate::primitives::IDENTIFIER_SORT`].
    const SORT_FIELDS: &'static [&'static str];

    /// What must happen before a record of this kind is removed.
    const DELETE_RULE: DeleteRule;

    /// Raw identifier of the record.
    fn id(&self) -> u64;

    /// Overwrite the identifier (used by stores when assigning one).
    fn set_id(&mut self, id: u64);

    /// The unique business key of the record.
    fn business_key(&self) -> &str;

    /// The business key a draft would claim.
    fn draft_key(draft: &Self::Draft) -> &str;

    /// Whether the record matches a search needle.
    fn matches(&self, needle: &Needle) -> bool;

    /// Compare two records on one whitelisted sort field.
    ///
    /// Unknown fields compare by identifier.
    fn compare_by(&self, other: &Self, field: &str) -> Ordering;

    /// Turn a draft into a new record (identifier 0), resolving references.
    fn build<S: CatalogStore>(draft: Self::Draft, store: &S) -> Result<Self, CatalogError>;

    /// Overwrite this record from a draft.
    ///
    /// All references are resolved before any field changes, so a failed
    /// apply leaves the record untouched.
    fn apply<S: CatalogStore>(&mut self, draft: Self::Draft, store: &S)
    -> Result<(), CatalogError>;

    /// Wrap into the storage envelope.
    fn into_record(self) -> Record;

    /// Unwrap from the storage envelope, if it holds this kind.
    fn from_record(record: Record) -> Option<Self>;

    /// Borrowing form of [`Resource::from_record`].
    fn from_record_ref(record: &Record) -> Option<&Self>;
}

// =============================================================================
// REFERENCE RESOLUTION
// =============================================================================

fn resolve_developer<S: CatalogStore>(
    store: &S,
    id: Option<u64>,
) -> Result<Option<DeveloperId>, CatalogError> {
    let Some(id) = id else {
        return Ok(None);
    };
    if store.contains::<Developer>(id)? {
        Ok(Some(DeveloperId(id)))
    } else {
        Err(CatalogError::unresolved(ResourceKind::Developer, id))
    }
}

fn resolve_genres<S: CatalogStore>(
    store: &S,
    ids: &[u64],
) -> Result<BTreeSet<GenreId>, CatalogError> {
    let mut resolved = BTreeSet::new();
    for &id in ids {
        if !store.contains::<Genre>(id)? {
            return Err(CatalogError::unresolved(ResourceKind::Genre, id));
        }
        resolved.insert(GenreId(id));
    }
    Ok(resolved)
}

fn contains_lowered(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

// =============================================================================
// GAME
// =============================================================================

impl Resource for Game {
    type Draft = GameDraft;

    const KIND: ResourceKind = ResourceKind::Game;
    const SORT_FIELDS: &'static [&'static str] = &["id", "title", "releaseYear"];
    const DELETE_RULE: DeleteRule = DeleteRule::DetachGenres;

    fn id(&self) -> u64 {
        self.id.0
    }

    fn set_id(&mut self, id: u64) {
        self.id = GameId(id);
    }

    fn business_key(&self) -> &str {
        &self.title
    }

    fn draft_key(draft: &GameDraft) -> &str {
        &draft.title
    }

    /// A numeric needle matches the release year exactly and nothing else;
    /// any other needle is a title substring.
    fn matches(&self, needle: &Needle) -> bool {
        match needle.number() {
            Some(year) => self.release_year == year,
            None => contains_lowered(&self.title, needle.lowered()),
        }
    }

    fn compare_by(&self, other: &Self, field: &str) -> Ordering {
        match field {
            "title" => self.title.cmp(&other.title),
            "releaseYear" => self.release_year.cmp(&other.release_year),
            _ => self.id.cmp(&other.id),
        }
    }

    fn build<S: CatalogStore>(draft: GameDraft, store: &S) -> Result<Self, CatalogError> {
        let developer = resolve_developer(store, draft.developer_id)?;
        let genres = resolve_genres(store, &draft.genre_ids)?;
        Ok(Self {
            id: GameId(0),
            title: draft.title,
            description: draft.description,
            release_year: draft.release_year,
            age_rating: draft.age_rating,
            developer,
            genres,
        })
    }

    fn apply<S: CatalogStore>(&mut self, draft: GameDraft, store: &S) -> Result<(), CatalogError> {
        let developer = resolve_developer(store, draft.developer_id)?;
        let genres = resolve_genres(store, &draft.genre_ids)?;
        self.title = draft.title;
        self.description = draft.description;
        self.release_year = draft.release_year;
        self.age_rating = draft.age_rating;
        self.developer = developer;
        self.genres = genres;
        Ok(())
    }

    fn into_record(self) -> Record {
        Record::Game(self)
    }

    fn from_record(record: Record) -> Option<Self> {
        match record {
            Record::Game(game) => Some(game),
            _ => None,
        }
    }

    fn from_record_ref(record: &Record) -> Option<&Self> {
        match record {
            Record::Game(game) => Some(game),
            _ => None,
        }
    }
}

// =============================================================================
// GENRE
// =============================================================================

impl Resource for Genre {
    type Draft = GenreDraft;

    const KIND: ResourceKind = ResourceKind::Genre;
    const SORT_FIELDS: &'static [&'static str] = &["id", "name", "description"];
    const DELETE_RULE: DeleteRule = DeleteRule::RefuseWhileReferenced(Dependency::GameGenre);

    fn id(&self) -> u64 {
        self.id.0
    }

    fn set_id(&mut self, id: u64) {
        self.id = GenreId(id);
    }

    fn business_key(&self) -> &str {
        &self.name
    }

    fn draft_key(draft: &GenreDraft) -> &str {
        &draft.name
    }

    fn matches(&self, needle: &Needle) -> bool {
        contains_lowered(&self.name, needle.lowered())
            || self
                .description
                .as_deref()
                .is_some_and(|d| contains_lowered(d, needle.lowered()))
    }

    fn compare_by(&self, other: &Self, field: &str) -> Ordering {
        match field {
            "name" => self.name.cmp(&other.name),
            "description" => self.description.cmp(&other.description),
            _ => self.id.cmp(&other.id),
        }
    }

    fn build<S: CatalogStore>(draft: GenreDraft, _store: &S) -> Result<Self, CatalogError> {
        Ok(Self {
            id: GenreId(0),
            name: draft.name,
            description: draft.description,
        })
    }

    fn apply<S: CatalogStore>(
        &mut self,
        draft: GenreDraft,
        _store: &S,
    ) -> Result<(), CatalogError> {
        self.name = draft.name;
        self.description = draft.description;
        Ok(())
    }

    fn into_record(self) -> Record {
        Record::Genre(self)
    }

    fn from_record(record: Record) -> Option<Self> {
        match record {
            Record::Genre(genre) => Some(genre),
            _ => None,
        }
    }

    fn from_record_ref(record: &Record) -> Option<&Self> {
        match record {
            Record::Genre(genre) => Some(genre),
            _ => None,
        }
    }
}

// =============================================================================
// DEVELOPER
// =============================================================================

impl Resource for Developer {
    type Draft = DeveloperDraft;

    const KIND: ResourceKind = ResourceKind::Developer;
    const SORT_FIELDS: &'static [&'static str] = &["id", "name", "country"];
    const DELETE_RULE: DeleteRule = DeleteRule::RefuseWhileReferenced(Dependency::GameDeveloper);

    fn id(&self) -> u64 {
        self.id.0
    }

    fn set_id(&mut self, id: u64) {
        self.id = DeveloperId(id);
    }

    fn business_key(&self) -> &str {
        &self.name
    }

    fn draft_key(draft: &DeveloperDraft) -> &str {
        &draft.name
    }

    fn matches(&self, needle: &Needle) -> bool {
        contains_lowered(&self.name, needle.lowered())
            || contains_lowered(&self.country, needle.lowered())
    }

    fn compare_by(&self, other: &Self, field: &str) -> Ordering {
        match field {
            "name" => self.name.cmp(&other.name),
            "country" => self.country.cmp(&other.country),
            _ => self.id.cmp(&other.id),
        }
    }

    fn build<S: CatalogStore>(draft: DeveloperDraft, _store: &S) -> Result<Self, CatalogError> {
        Ok(Self {
            id: DeveloperId(0),
            name: draft.name,
            founded_on: draft.founded_on,
            country: draft.country,
            technical_sheet: draft.technical_sheet.filter(|sheet| !sheet.is_empty()),
        })
    }

    /// The technical sheet is created when absent, overwritten field by
    /// field when present, and dropped when the draft carries none (or an
    /// empty one).
    fn apply<S: CatalogStore>(
        &mut self,
        draft: DeveloperDraft,
        _store: &S,
    ) -> Result<(), CatalogError> {
        self.name = draft.name;
        self.founded_on = draft.founded_on;
        self.country = draft.country;

        match (
            draft.technical_sheet.filter(|s| !s.is_empty()),
            self.technical_sheet.as_mut(),
        ) {
            (Some(incoming), Some(existing)) => {
                existing.history = incoming.history;
                existing.notable_games = incoming.notable_games;
                existing.awards = incoming.awards;
            }
            (Some(incoming), None) => self.technical_sheet = Some(incoming),
            (None, _) => self.technical_sheet = None,
        }
        Ok(())
    }

    fn into_record(self) -> Record {
        Record::Developer(self)
    }

    fn from_record(record: Record) -> Option<Self> {
        match record {
            Record::Developer(developer) => Some(developer),
            _ => None,
        }
    }

    fn from_record_ref(record: &Record) -> Option<&Self> {
        match record {
            Record::Developer(developer) => Some(developer),
            _ => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::IDENTIFIER_SORT;
    use crate::store::MemoryCatalog;
    use crate::{AgeRating, TechnicalSheet};
    use chrono::NaiveDate;

    fn founded() -> NaiveDate {
        NaiveDate::from_ymd_opt(2004, 5, 1).expect("date")
    }

    fn game_draft(developer_id: Option<u64>, genre_ids: Vec<u64>) -> GameDraft {
        GameDraft {
            title: "Ashfall".to_string(),
            description: "Volcano survival".to_string(),
            release_year: 2021,
            age_rating: AgeRating::NotUnder16,
            developer_id,
            genre_ids,
        }
    }

    #[test]
    fn every_kind_sorts_by_identifier() {
        assert!(Game::SORT_FIELDS.contains(&IDENTIFIER_SORT));
        assert!(Genre::SORT_FIELDS.contains(&IDENTIFIER_SORT));
        assert!(Developer::SORT_FIELDS.contains(&IDENTIFIER_SORT));
    }

    #[test]
    fn game_numeric_needle_matches_year_only() {
        let store = MemoryCatalog::new();
        let game = Game::build(game_draft(None, vec![]), &store).expect("build");

        assert!(game.matches(&Needle::new("2021")));
        assert!(!game.matches(&Needle::new("2020")));
        assert!(game.matches(&Needle::new("ASH")));
        assert!(!game.matches(&Needle::new("lava")));
    }

    #[test]
    fn game_build_rejects_unknown_developer() {
        let store = MemoryCatalog::new();
        let err = Game::build(game_draft(Some(7), vec![]), &store).expect_err("unresolved");
        assert_eq!(err, CatalogError::unresolved(ResourceKind::Developer, 7));
    }

    #[test]
    fn game_apply_is_all_or_nothing() {
        let mut store = MemoryCatalog::new();
        let genre = store
            .insert(
                Genre::build(
                    GenreDraft {
                        name: "Survival".to_string(),
                        description: None,
                    },
                    &store,
                )
                .expect("build"),
            )
            .expect("insert");

        let mut game = Game::build(game_draft(None, vec![genre.id.0]), &store).expect("build");
        let before = game.clone();

        let mut update = game_draft(None, vec![genre.id.0, 99]);
        update.title = "Renamed".to_string();
        let err = game.apply(update, &store).expect_err("unknown genre");

        assert_eq!(err, CatalogError::unresolved(ResourceKind::Genre, 99));
        assert_eq!(game, before);
    }

    #[test]
    fn developer_sheet_lifecycle() {
        let store = MemoryCatalog::new();
        let draft = DeveloperDraft {
            name: "Lumen Works".to_string(),
            founded_on: founded(),
            country: "Portugal".to_string(),
            technical_sheet: None,
        };
        let mut developer = Developer::build(draft.clone(), &store).expect("build");
        assert!(developer.technical_sheet.is_none());

        let sheet = TechnicalSheet {
            history: Some("Founded by two friends".to_string()),
            notable_games: None,
            awards: None,
        };
        let mut with_sheet = draft.clone();
        with_sheet.technical_sheet = Some(sheet.clone());
        developer.apply(with_sheet, &store).expect("create sheet");
        assert_eq!(developer.technical_sheet, Some(sheet));

        let mut overwrite = draft.clone();
        overwrite.technical_sheet = Some(TechnicalSheet {
            history: None,
            notable_games: Some("Glowline".to_string()),
            awards: None,
        });
        developer.apply(overwrite, &store).expect("overwrite sheet");
        let stored = developer.technical_sheet.clone().expect("sheet");
        assert_eq!(stored.history, None);
        assert_eq!(stored.notable_games.as_deref(), Some("Glowline"));

        let mut empty = draft;
        empty.technical_sheet = Some(TechnicalSheet::default());
        developer.apply(empty, &store).expect("remove sheet");
        assert!(developer.technical_sheet.is_none());
    }

    #[test]
    fn genre_matches_description_too() {
        let genre = Genre {
            id: GenreId(1),
            name: "Roguelike".to_string(),
            description: Some("Permadeath dungeon runs".to_string()),
        };
        assert!(genre.matches(&Needle::new("dungeon")));
        assert!(genre.matches(&Needle::new("rogue")));
        assert!(!genre.matches(&Needle::new("racing")));
    }

    #[test]
    fn developer_matches_name_or_country() {
        let store = MemoryCatalog::new();
        let developer = Developer::build(
            DeveloperDraft {
                name: "Lumen Works".to_string(),
                founded_on: founded(),
                country: "Portugal".to_string(),
                technical_sheet: None,
            },
            &store,
        )
        .expect("build");

        assert!(developer.matches(&Needle::new("lumen")));
        assert!(developer.matches(&Needle::new("PORTU")));
        assert!(!developer.matches(&Needle::new("spain")));
        // founding year is not searchable
        assert!(!developer.matches(&Needle::new("2004")));
    }

    #[test]
    fn unknown_sort_field_compares_ids() {
        let a = Genre {
            id: GenreId(1),
            name: "Zeta".to_string(),
            description: None,
        };
        let b = Genre {
            id: GenreId(2),
            name: "Alpha".to_string(),
            description: None,
        };
        assert_eq!(a.compare_by(&b, "bogus"), Ordering::Less);
        assert_eq!(a.compare_by(&b, "name"), Ordering::Greater);
    }
}
