//! Validated user intents and their expansion into requests.
//!
//! An [`Action`] is what a caller submits to a pipeline. Construction
//! validates every field; a constructed action is always well formed. The
//! pipeline later expands each action into one or more [`Request`]s via
//! [`Action::to_requests`].

mod download;
mod error;
mod search;

pub use download::{Conversion, DownloadAction};
pub use error::ValidationError;
pub use search::{DateRange, PublicationStatus, SearchAction, SearchParams, SortKey, SortOrder};

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::queue::Priority;
use crate::request::Request;

/// Lane used for search actions.
pub const SEARCH_ACTION_PRIORITY: Priority = 0;

/// Lane used for download actions.
pub const DOWNLOAD_ACTION_PRIORITY: Priority = 2;

static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

/// Correlates an action with every request and result it gives rise to.
///
/// Tickets are unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ticket(u64);

impl Ticket {
    /// Allocates a fresh ticket.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_TICKET.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ticket-{}", self.0)
    }
}

/// Discriminant of an [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// See [`SearchAction`].
    Search,
    /// See [`DownloadAction`].
    Download,
}

impl ActionKind {
    /// Returns the lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Download => "download",
        }
    }

    /// Returns the fixed lane for actions of this kind.
    #[must_use]
    pub fn priority(self) -> Priority {
        match self {
            Self::Search => SEARCH_ACTION_PRIORITY,
            Self::Download => DOWNLOAD_ACTION_PRIORITY,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "search" => Ok(Self::Search),
            "download" => Ok(Self::Download),
            other => Err(format!("unknown action kind '{other}'")),
        }
    }
}

/// A validated user intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Query an adapter's catalogue.
    Search(SearchAction),
    /// Fetch one chapter of one manga.
    Download(DownloadAction),
}

impl Action {
    /// Builds an action of `kind` from an untyped field map.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the map carries unknown keys,
    /// out-of-domain values, wrongly typed values or lacks required fields.
    pub fn from_fields(kind: ActionKind, fields: &Value) -> Result<Self, ValidationError> {
        match kind {
            ActionKind::Search => SearchAction::from_fields(fields).map(Self::Search),
            ActionKind::Download => DownloadAction::from_fields(fields).map(Self::Download),
        }
    }

    /// Returns the discriminant.
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Search(_) => ActionKind::Search,
            Self::Download(_) => ActionKind::Download,
        }
    }

    /// Returns the lane this action is queued in.
    #[must_use]
    pub fn priority(&self) -> Priority {
        self.kind().priority()
    }

    /// Expands the action into the requests that carry it out.
    #[must_use]
    pub fn to_requests(&self, ticket: Ticket) -> Vec<Request> {
        match self {
            Self::Search(action) => action.to_requests(ticket),
            Self::Download(action) => action.to_requests(ticket),
        }
    }
}

impl From<SearchAction> for Action {
    fn from(action: SearchAction) -> Self {
        Self::Search(action)
    }
}

impl From<DownloadAction> for Action {
    fn from(action: DownloadAction) -> Self {
        Self::Download(action)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Checks keys against `allowed` and returns the map with null entries
/// dropped, so that explicit nulls fall back to defaults.
fn whitelisted_fields(
    action: ActionKind,
    fields: &Value,
    allowed: &[&str],
) -> Result<Map<String, Value>, ValidationError> {
    let Value::Object(map) = fields else {
        return Err(ValidationError::NotAnObject {
            action,
            found: json_type(fields),
        });
    };

    if let Some(field) = map.keys().find(|key| !allowed.contains(&key.as_str())) {
        return Err(ValidationError::unknown_field(action, field, allowed));
    }

    Ok(map
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect())
}

fn check_enumerated(
    action: ActionKind,
    map: &Map<String, Value>,
    field: &'static str,
    allowed: &[&str],
) -> Result<(), ValidationError> {
    let Some(value) = map.get(field) else {
        return Ok(());
    };
    match value.as_str() {
        Some(text) if allowed.contains(&text) => Ok(()),
        Some(_) => Err(ValidationError::invalid_value(action, field, value, allowed)),
        None => Err(ValidationError::InvalidType {
            action,
            reason: format!("field '{field}' must be a string, got {}", json_type(value)),
        }),
    }
}

fn decode<T: DeserializeOwned>(
    action: ActionKind,
    map: Map<String, Value>,
) -> Result<T, ValidationError> {
    serde_json::from_value(Value::Object(map)).map_err(|e| ValidationError::InvalidType {
        action,
        reason: e.to_string(),
    })
}
