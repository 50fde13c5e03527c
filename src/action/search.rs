//! Search action and its parameter set.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    ActionKind, Ticket, ValidationError, check_enumerated, decode, json_type, whitelisted_fields,
};
use crate::request::{Request, SearchRequest};

const FIELDS: &[&str] = &[
    "name",
    "date",
    "id",
    "author",
    "genreInclude",
    "genreExclude",
    "sort",
    "sortOrder",
    "language",
    "status",
];

/// Result ordering key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Most recently updated.
    #[default]
    Date,
    /// Most popular.
    Top,
    /// Most recently added.
    New,
    /// Alphabetical by title.
    Alpha,
}

impl SortKey {
    /// Every accepted value, in wire form.
    pub const VALUES: &'static [&'static str] = &["date", "top", "new", "alpha"];

    /// Returns the wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Top => "top",
            Self::New => "new",
            Self::Alpha => "alpha",
        }
    }
}

/// Result ordering direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Dsc,
}

impl SortOrder {
    /// Every accepted value, in wire form.
    pub const VALUES: &'static [&'static str] = &["asc", "dsc"];

    /// Returns the wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Dsc => "dsc",
        }
    }
}

/// Publication state filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationStatus {
    /// Still publishing.
    Ongoing,
    /// Finished.
    Completed,
}

impl PublicationStatus {
    /// Every accepted value, in wire form.
    pub const VALUES: &'static [&'static str] = &["ongoing", "completed"];

    /// Returns the wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
        }
    }
}

/// Inclusive publication date window. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateRange {
    /// Earliest date, `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    /// Latest date, `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

/// Parameters of a catalogue search, with defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SearchParams {
    /// Title substring.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Publication window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateRange>,
    /// Adapter-specific identifier lookup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Author name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Genres every result must carry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre_include: Option<Vec<String>>,
    /// Genres no result may carry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre_exclude: Option<Vec<String>>,
    /// Ordering key.
    pub sort: SortKey,
    /// Ordering direction.
    pub sort_order: SortOrder,
    /// Result language.
    pub language: String,
    /// Accepted publication states.
    pub status: Vec<PublicationStatus>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            name: None,
            date: None,
            id: None,
            author: None,
            genre_include: None,
            genre_exclude: None,
            sort: SortKey::Date,
            sort_order: SortOrder::Dsc,
            language: "en".to_string(),
            status: vec![PublicationStatus::Ongoing, PublicationStatus::Completed],
        }
    }
}

impl SearchParams {
    /// Default parameters filtered by title.
    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// A catalogue query against one adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchAction {
    params: SearchParams,
}

impl SearchAction {
    /// Wraps already-typed parameters.
    #[must_use]
    pub fn new(params: SearchParams) -> Self {
        Self { params }
    }

    /// Builds a search from an untyped, camelCase field map.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for unknown keys, a `sort`, `sortOrder`
    /// or `status` value outside its allowed set, or badly typed values.
    pub fn from_fields(fields: &Value) -> Result<Self, ValidationError> {
        let action = ActionKind::Search;
        let map = whitelisted_fields(action, fields, FIELDS)?;

        check_enumerated(action, &map, "sort", SortKey::VALUES)?;
        check_enumerated(action, &map, "sortOrder", SortOrder::VALUES)?;
        if let Some(status) = map.get("status") {
            let Value::Array(entries) = status else {
                return Err(ValidationError::InvalidType {
                    action,
                    reason: format!("field 'status' must be an array, got {}", json_type(status)),
                });
            };
            for entry in entries {
                if !entry
                    .as_str()
                    .is_some_and(|s| PublicationStatus::VALUES.contains(&s))
                {
                    return Err(ValidationError::invalid_value(
                        action,
                        "status",
                        entry,
                        PublicationStatus::VALUES,
                    ));
                }
            }
        }

        decode(action, map).map(Self::new)
    }

    /// Returns the parameters.
    #[must_use]
    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Expands into exactly one search request carrying the full parameters.
    #[must_use]
    pub fn to_requests(&self, ticket: Ticket) -> Vec<Request> {
        vec![Request::Search(SearchRequest {
            ticket,
            params: self.params.clone(),
        })]
    }
}
