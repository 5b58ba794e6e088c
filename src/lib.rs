//! # deck-editor
//!
//! Card filter engine and deck/category model for a card-game deck editor.
//!
//! ## Design Principles
//!
//! 1. **Cards Are Immutable**: Cards are built once when the inventory loads
//!    and shared as `Arc<Card>`. Derived text (normalized names, rules text
//!    with `~`) is computed eagerly.
//!
//! 2. **Typed Failures**: Filter parsing and deck editing never fall back to
//!    a default. Only the inventory loader recovers from bad input, by
//!    skipping the record and recording a warning.
//!
//! 3. **Derived State Stays Current**: A deck keeps each category's view and
//!    its card-to-category index in step with every mutation.
//!
//! ## Architecture
//!
//! - **Filters**: A sum type of leaves (one field, one mode, one operand) and
//!   AND/OR groups, with a bracketed text grammar and a JSON encoding that
//!   both round-trip.
//!
//! - **Persistent Data Structures**: Deck entries and category state use
//!   `im` collections, so a deck clone is a cheap undo snapshot.
//!
//! ## Modules
//!
//! - `cards`: Card model, inventory, background loader, binary cache
//! - `filter`: Field registry, filter tree, text and JSON codecs
//! - `deck`: Deck, categories, deck files, legality, sample hands
//! - `error`: Error types

pub mod cards;
pub mod deck;
pub mod error;
pub mod filter;

// Re-export commonly used types
pub use crate::cards::{
    CancelToken, Card, CardId, CardLayout, ColorSet, Expansion, Face, Inventory, InventoryIndex,
    InventoryLoader, Legality, LoadEvent, LoadOutcome, LoaderConfig, ManaCost, ManaType, Rarity,
};

pub use crate::filter::{
    CardAttribute, Comparator, Containment, Filter, FilterGroup, FilterLeaf, GroupMode, Mode, Operand,
};

pub use crate::deck::{
    check_legality, Category, CategoryColor, CategorySpec, CategoryView, Deck, DeckFile, FormatConstraints,
    SampleHand,
};

pub use crate::error::{DeckError, DeckResult, FilterError, FilterResult, LoadError};
