//! Format deck-construction rules and legality checking.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::deck::Deck;
use crate::cards::Legality;

/// Formats with built-in construction rules, sorted.
pub const FORMAT_NAMES: [&str; 13] = [
    "brawl",
    "commander",
    "duel",
    "future",
    "historic",
    "legacy",
    "modern",
    "oldschool",
    "pauper",
    "penny",
    "pioneer",
    "standard",
    "vintage",
];

/// Deck-construction rules of one format.
///
/// The default is ordinary constructed play: at least 60 cards and at most
/// 4 copies of each card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConstraints {
    pub deck_size: u32,
    /// The deck must have exactly `deck_size` cards rather than at least.
    pub exact_size: bool,
    pub max_copies: u32,
    pub has_commander: bool,
}

impl Default for FormatConstraints {
    fn default() -> Self {
        Self::CONSTRUCTED
    }
}

impl FormatConstraints {
    pub const CONSTRUCTED: Self = Self::new(60, false, 4, false);

    /// Singleton formats with a commander.
    pub const SINGLETON: Self = Self::new(100, true, 1, true);

    #[must_use]
    pub const fn new(deck_size: u32, exact_size: bool, max_copies: u32, has_commander: bool) -> Self {
        Self {
            deck_size,
            exact_size,
            max_copies,
            has_commander,
        }
    }

    /// Built-in rules for a format name (case-insensitive).
    #[must_use]
    pub fn for_format(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "brawl" => Some(Self::new(60, true, 1, true)),
            "commander" | "duel" => Some(Self::SINGLETON),
            other if FORMAT_NAMES.contains(&other) => Some(Self::CONSTRUCTED),
            _ => None,
        }
    }

    /// The built-in table, keyed by format name.
    #[must_use]
    pub fn table() -> BTreeMap<String, Self> {
        FORMAT_NAMES
            .iter()
            .filter_map(|&name| Self::for_format(name).map(|c| (name.to_string(), c)))
            .collect()
    }
}

/// One reason a deck is not legal in a format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LegalityProblem {
    TooFewCards { have: u32, need: u32 },
    WrongDeckSize { have: u32, need: u32 },
    TooManyCopies { card: String, count: u32, max: u32 },
    Restricted { card: String, count: u32 },
    Banned { card: String },
    NotLegal { card: String },
}

impl fmt::Display for LegalityProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewCards { have, need } => write!(f, "deck has {have} cards, needs at least {need}"),
            Self::WrongDeckSize { have, need } => write!(f, "deck has {have} cards, needs exactly {need}"),
            Self::TooManyCopies { card, count, max } => {
                write!(f, "{card}: {count} copies, at most {max} allowed")
            }
            Self::Restricted { card, count } => write!(f, "{card} is restricted, deck has {count} copies"),
            Self::Banned { card } => write!(f, "{card} is banned"),
            Self::NotLegal { card } => write!(f, "{card} is not legal"),
        }
    }
}

/// Result of checking a deck against one format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegalityReport {
    pub format: String,
    pub problems: Vec<LegalityProblem>,
}

impl LegalityReport {
    #[must_use]
    pub fn is_legal(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Check a deck against a format's card legality and construction rules.
#[must_use]
pub fn check_legality(deck: &Deck, format: &str, constraints: &FormatConstraints) -> LegalityReport {
    let mut problems = Vec::new();

    let total = deck.total();
    if constraints.exact_size && total != constraints.deck_size {
        problems.push(LegalityProblem::WrongDeckSize {
            have: total,
            need: constraints.deck_size,
        });
    } else if total < constraints.deck_size {
        problems.push(LegalityProblem::TooFewCards {
            have: total,
            need: constraints.deck_size,
        });
    }

    for entry in deck.entries() {
        let card = entry.card();
        let name = card.unified_name();
        let count = entry.count();
        match card.legality_in(format) {
            Legality::Banned => problems.push(LegalityProblem::Banned { card: name }),
            Legality::NotLegal => problems.push(LegalityProblem::NotLegal { card: name }),
            Legality::Restricted if count > 1 => {
                problems.push(LegalityProblem::Restricted { card: name, count });
            }
            Legality::Restricted => {}
            Legality::Legal => {
                if count > constraints.max_copies && !card.ignores_count_restriction() {
                    problems.push(LegalityProblem::TooManyCopies {
                        card: name,
                        count,
                        max: constraints.max_copies,
                    });
                }
            }
        }
    }

    tracing::debug!(format, problems = problems.len(), "Checked deck legality");
    LegalityReport {
        format: format.to_string(),
        problems,
    }
}
