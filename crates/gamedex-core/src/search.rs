//! # Search-Paginate Engine
//!
//! One engine serves every record kind: filter by a free-text needle,
//! order by a whitelisted field, slice one page.
//!
//! ## Normalization
//!
//! Nothing the caller sends is rejected here:
//! - a blank query selects every record
//! - an unknown sort field falls back to the identifier
//! - any direction other than `desc` (case-insensitive) is ascending
//! - a negative page becomes 0, the page size is clamped to
//!   `1..=MAX_PAGE_SIZE`

use crate::primitives::{DEFAULT_PAGE_SIZE, IDENTIFIER_SORT, MAX_PAGE_SIZE};
use crate::resource::Resource;
use crate::store::CatalogStore;
use crate::CatalogError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// =============================================================================
// INPUT
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse a direction, defaulting to ascending.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(value) if value.trim().eq_ignore_ascii_case("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }

    /// Wire form of the direction.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw search parameters as they arrive in a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

/// A normalized search, ready to run against one record kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// The query as given, or `None` when it was missing or blank.
    pub query: Option<String>,
    /// A field from the kind's whitelist.
    pub sort: &'static str,
    pub direction: SortDirection,
    pub page: usize,
    pub size: usize,
}

impl SearchRequest {
    /// Normalize raw parameters for record kind `R`.
    #[must_use]
    pub fn resolve<R: Resource>(params: &SearchParams) -> Self {
        let query = params
            .q
            .as_ref()
            .filter(|q| !q.trim().is_empty())
            .cloned();

        let sort = params
            .sort
            .as_deref()
            .and_then(|raw| R::SORT_FIELDS.iter().find(|field| **field == raw))
            .copied()
            .unwrap_or(IDENTIFIER_SORT);

        let page = params.page.unwrap_or(0).max(0) as usize;
        let size = params
            .size
            .map_or(DEFAULT_PAGE_SIZE, |s| s.clamp(1, MAX_PAGE_SIZE as i64) as usize);

        Self {
            query,
            sort,
            direction: SortDirection::parse(params.direction.as_deref()),
            page,
            size,
        }
    }
}

/// A prepared search needle.
///
/// Matching is case-insensitive; the numeric form is kept for kinds that
/// match numbers exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Needle {
    lowered: String,
    number: Option<i32>,
}

impl Needle {
    /// Prepare a needle from a raw query.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self {
            lowered: raw.to_lowercase(),
            number: raw.parse().ok(),
        }
    }

    /// The query in lower case.
    #[must_use]
    pub fn lowered(&self) -> &str {
        &self.lowered
    }

    /// The query as an integer, if it parses as one.
    #[must_use]
    pub fn number(&self) -> Option<i32> {
        self.number
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<R> {
    pub items: Vec<R>,
    /// Number of records matching the query, across all pages.
    pub total: usize,
    pub total_pages: usize,
    pub has_more: bool,
    /// URL of the following page, or an empty string on the last page.
    pub next_page: String,
}

// =============================================================================
// ENGINE
// =============================================================================

/// Run a search over every record of kind `R`.
///
/// `next_base` is the absolute search URL the next-page link is built on
/// (for example `http://localhost:8080/v1/games/search`).
pub fn search<R: Resource, S: CatalogStore>(
    store: &S,
    request: &SearchRequest,
    next_base: &str,
) -> Result<Page<R>, CatalogError> {
    let mut matches = store.list::<R>()?;
    if let Some(query) = &request.query {
        let needle = Needle::new(query);
        matches.retain(|record| record.matches(&needle));
    }

    matches.sort_by(|a, b| order(a, b, request.sort, request.direction));

    let total = matches.len();
    let total_pages = total.div_ceil(request.size);
    let has_more = request.page.saturating_add(1) < total_pages;

    let items = matches
        .into_iter()
        .skip(request.page.saturating_mul(request.size))
        .take(request.size)
        .collect();

    let next_page = if has_more {
        next_page_url(next_base, request)
    } else {
        String::new()
    };

    Ok(Page {
        items,
        total,
        total_pages,
        has_more,
        next_page,
    })
}

/// Order by the sort field, then by ascending identifier for ties.
fn order<R: Resource>(a: &R, b: &R, field: &str, direction: SortDirection) -> Ordering {
    let primary = a.compare_by(b, field);
    let primary = match direction {
        SortDirection::Asc => primary,
        SortDirection::Desc => primary.reverse(),
    };
    primary.then_with(|| a.id().cmp(&b.id()))
}

fn next_page_url(base: &str, request: &SearchRequest) -> String {
    format!(
        "{}?q={}&page={}&size={}&sort={}&direction={}",
        base,
        urlencoding::encode(request.query.as_deref().unwrap_or("")),
        request.page.saturating_add(1),
        request.size,
        request.sort,
        request.direction
    )
}

// =============================================================================
// TESTS
// =============================================================================
