//! # Field Pre-Check
//!
//! Shape validation of write inputs, run at the API boundary before the
//! orchestrator sees a draft. A draft that fails here never reaches the
//! idempotency store or the entity store.
//!
//! Lengths are counted in characters, not bytes.

use crate::primitives::{
    DEVELOPER_NAME_LENGTH, GENRE_NAME_LENGTH, MAX_COUNTRY_LENGTH, MAX_GAME_DESCRIPTION_LENGTH,
    MAX_GENRE_DESCRIPTION_LENGTH, MAX_HISTORY_LENGTH, MAX_NOTABLE_GAMES_LENGTH, MAX_TITLE_LENGTH,
    MIN_RELEASE_YEAR,
};
use crate::{CatalogError, DeveloperDraft, GameDraft, GenreDraft, TechnicalSheet};
use chrono::{NaiveDate, Utc};

/// A write input that can be checked before it is processed.
pub trait Validate {
    /// Check the input against field rules, using `today` for date rules.
    fn validate_on(&self, today: NaiveDate) -> Result<(), CatalogError>;

    /// Check the input against field rules as of the current UTC date.
    fn validate(&self) -> Result<(), CatalogError> {
        self.validate_on(Utc::now().date_naive())
    }
}

fn required(field: &str, value: &str) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::Invalid(format!("{} must not be blank", field)));
    }
    Ok(())
}

fn at_most(field: &str, value: &str, max: usize) -> Result<(), CatalogError> {
    let len = value.chars().count();
    if len > max {
        return Err(CatalogError::Invalid(format!(
            "{} is {} characters long, maximum is {}",
            field, len, max
        )));
    }
    Ok(())
}

fn between(field: &str, value: &str, (min, max): (usize, usize)) -> Result<(), CatalogError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(CatalogError::Invalid(format!(
            "{} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(())
}

fn optional_at_most(field: &str, value: Option<&str>, max: usize) -> Result<(), CatalogError> {
    value.map_or(Ok(()), |v| at_most(field, v, max))
}

impl Validate for GameDraft {
    fn validate_on(&self, _today: NaiveDate) -> Result<(), CatalogError> {
        required("title", &self.title)?;
        at_most("title", &self.title, MAX_TITLE_LENGTH)?;
        required("description", &self.description)?;
        at_most("description", &self.description, MAX_GAME_DESCRIPTION_LENGTH)?;
        if self.release_year < MIN_RELEASE_YEAR {
            return Err(CatalogError::Invalid(format!(
                "releaseYear {} is before {}",
                self.release_year, MIN_RELEASE_YEAR
            )));
        }
        Ok(())
    }
}

impl Validate for GenreDraft {
    fn validate_on(&self, _today: NaiveDate) -> Result<(), CatalogError> {
        required("name", &self.name)?;
        between("name", &self.name, GENRE_NAME_LENGTH)?;
        optional_at_most(
            "description",
            self.description.as_deref(),
            MAX_GENRE_DESCRIPTION_LENGTH,
        )
    }
}

impl Validate for TechnicalSheet {
    fn validate_on(&self, _today: NaiveDate) -> Result<(), CatalogError> {
        optional_at_most("history", self.history.as_deref(), MAX_HISTORY_LENGTH)?;
        optional_at_most(
            "notableGames",
            self.notable_games.as_deref(),
            MAX_NOTABLE_GAMES_LENGTH,
        )
    }
}

impl Validate for DeveloperDraft {
    fn validate_on(&self, today: NaiveDate) -> Result<(), CatalogError> {
        required("name", &self.name)?;
        between("name", &self.name, DEVELOPER_NAME_LENGTH)?;
        if self.founded_on >= today {
            return Err(CatalogError::Invalid(format!(
                "foundedOn {} must be in the past",
                self.founded_on
            )));
        }
        required("country", &self.country)?;
        at_most("country", &self.country, MAX_COUNTRY_LENGTH)?;
        match &self.technical_sheet {
            Some(sheet) => sheet.validate_on(today),
            None => Ok(()),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
