//! Decks, categories, and deck files.
//!
//! ## Key Types
//!
//! - `Deck`: Ordered card entries with categories and a card-to-category index
//! - `Category` / `CategoryView`: A filter with whitelist and blacklist overrides
//! - `CategorySpec`: Detached category definition for presets and files
//! - `DeckFile`: JSON deck document (main deck, sideboard, notes)
//! - `FormatConstraints`: Deck-construction rules checked by `check_legality`
//! - `SampleHand`: Seeded opening-hand drawer

pub mod category;
#[allow(clippy::module_inception)]
pub mod deck;
pub mod hand;
pub mod io;
pub mod legality;

pub use category::{Category, CategoryColor, CategoryId, CategorySpec, CategoryView};
pub use deck::{Deck, Entry};
pub use hand::{SampleHand, HAND_SIZE};
pub use io::{DeckFile, DeckRecord, EntryRecord};
pub use legality::{check_legality, FormatConstraints, LegalityProblem, LegalityReport, FORMAT_NAMES};
