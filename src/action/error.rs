//! Validation errors raised while constructing actions.

use thiserror::Error;

use super::ActionKind;

/// Errors raised synchronously when an action is built from caller input.
///
/// A failed construction never produces an action, so nothing is enqueued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The input is not a field map.
    #[error("{action} action fields must be an object, got {found}")]
    NotAnObject {
        /// Action being constructed.
        action: ActionKind,
        /// JSON type that was supplied instead.
        found: &'static str,
    },

    /// A field outside the action's whitelist was supplied.
    #[error(
        "{action} action does not accept field '{field}'\n  Suggestion: Check the spelling; allowed fields: {allowed}"
    )]
    UnknownField {
        /// Action being constructed.
        action: ActionKind,
        /// The rejected key.
        field: String,
        /// Comma-separated whitelist.
        allowed: String,
    },

    /// An enumerated field holds a value outside its allowed set.
    #[error(
        "invalid value {value} for {action} field '{field}'\n  Suggestion: Use one of: {allowed}"
    )]
    InvalidValue {
        /// Action being constructed.
        action: ActionKind,
        /// Field holding the bad value.
        field: &'static str,
        /// The rejected value, rendered as JSON.
        value: String,
        /// Pipe-separated allowed values.
        allowed: String,
    },

    /// A required field is absent.
    #[error("{action} action is missing required field '{field}'")]
    MissingField {
        /// Action being constructed.
        action: ActionKind,
        /// The absent field.
        field: &'static str,
    },

    /// A field has the wrong shape (e.g. a string where a number is expected).
    #[error("invalid {action} action fields: {reason}")]
    InvalidType {
        /// Action being constructed.
        action: ActionKind,
        /// Decoder message.
        reason: String,
    },
}

impl ValidationError {
    pub(crate) fn unknown_field(action: ActionKind, field: &str, allowed: &[&str]) -> Self {
        Self::UnknownField {
            action,
            field: field.to_string(),
            allowed: allowed.join(", "),
        }
    }

    pub(crate) fn invalid_value(
        action: ActionKind,
        field: &'static str,
        value: &serde_json::Value,
        allowed: &[&str],
    ) -> Self {
        Self::InvalidValue {
            action,
            field,
            value: value.to_string(),
            allowed: allowed.join("|"),
        }
    }
}
