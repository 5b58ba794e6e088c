//! Error types.
//!
//! Errors raised by the filter/category/deck core always propagate to the
//! caller. Only the inventory loader recovers from per-card failures, and it
//! does so by recording a warning and skipping the card.

use thiserror::Error;

/// Errors from building, parsing or decoding filters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Field code not present in the attribute registry.
    #[error("unknown filter field code \"{0}\"")]
    UnknownField(String),

    /// Text grammar violation (unbalanced delimiters, stray text, ...).
    #[error("malformed filter string \"{input}\": {reason}")]
    MalformedFilterString { input: String, reason: String },

    /// Operand text that does not parse for the field's value type.
    #[error("invalid operand \"{value}\" for {attribute}: {reason}")]
    InvalidOperand {
        attribute: String,
        value: String,
        reason: String,
    },

    /// Mode that is not legal for the field's value type.
    #[error("mode \"{mode}\" is not valid for {attribute}")]
    InvalidContainmentMode { attribute: String, mode: String },

    /// A group must always have at least one child.
    #[error("filter groups must contain at least one filter")]
    EmptyGroup,

    /// Structured form is missing a key or has the wrong shape.
    #[error("malformed filter object: {0}")]
    MalformedFilterJson(String),
}

impl FilterError {
    pub(crate) fn malformed(input: &str, reason: impl Into<String>) -> Self {
        Self::MalformedFilterString {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn operand(
        attribute: impl std::fmt::Display,
        value: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidOperand {
            attribute: attribute.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors from deck and category operations and deck files.
#[derive(Debug, Error)]
pub enum DeckError {
    /// Another category in the same deck already uses the name.
    #[error("a category named \"{0}\" already exists")]
    DuplicateCategoryName(String),

    /// No category with that name exists in the deck.
    #[error("no category named \"{0}\"")]
    CategoryNotFound(String),

    /// A deck file referenced a card id the inventory does not know.
    #[error("unknown card id \"{0}\"")]
    UnknownCard(String),

    /// A deck file gave a card no copies, or more than a deck can count.
    #[error("invalid copy count for \"{card}\": {reason}")]
    InvalidCount { card: String, reason: String },

    /// Line-oriented deck file could not be read.
    #[error("malformed deck file at line {line}: {reason}")]
    MalformedDeckFile { line: usize, reason: String },

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("deck JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("deck I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort an inventory load entirely.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("inventory I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("inventory JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("inventory cache error: {0}")]
    Cache(#[from] bincode::Error),

    /// The dump is valid JSON but not shaped like a card database.
    #[error("inventory data missing: {0}")]
    MissingData(String),

    /// The background loader thread panicked.
    #[error("inventory loader thread panicked")]
    WorkerPanicked,
}

/// Result type for filter operations.
pub type FilterResult<T> = std::result::Result<T, FilterError>;

/// Result type for deck operations.
pub type DeckResult<T> = std::result::Result<T, DeckError>;
