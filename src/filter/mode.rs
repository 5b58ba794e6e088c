//! Comparison modes for filter leaves and combinators for groups.
//!
//! Set-valued fields use a [`Containment`]; numeric fields use a
//! [`Comparator`] or one of the existence tests. Every mode has a short code
//! used by both the text grammar and the structured encoding.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a set-valued field is compared against an operand set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Containment {
    /// Non-empty intersection.
    AnyOf,
    /// Operand is a subset of the card's value.
    AllOf,
    /// Empty intersection.
    NoneOf,
    /// Set equality.
    Exactly,
}

impl Containment {
    pub const ALL: [Containment; 4] = [
        Containment::AnyOf,
        Containment::AllOf,
        Containment::NoneOf,
        Containment::Exactly,
    ];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Containment::AnyOf => "a",
            Containment::AllOf => "c",
            Containment::NoneOf => "n",
            Containment::Exactly => "e",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Containment::AnyOf => "contains any of",
            Containment::AllOf => "contains all of",
            Containment::NoneOf => "contains none of",
            Containment::Exactly => "contains exactly",
        }
    }

    /// Compare two collections treated as sets.
    pub fn test<T: PartialEq>(self, have: &[T], want: &[T]) -> bool {
        match self {
            Containment::AnyOf => want.iter().any(|w| have.contains(w)),
            Containment::AllOf => want.iter().all(|w| have.contains(w)),
            Containment::NoneOf => !want.iter().any(|w| have.contains(w)),
            Containment::Exactly => {
                want.iter().all(|w| have.contains(w)) && have.iter().all(|h| want.contains(h))
            }
        }
    }
}

/// Numeric comparison: `card_value <op> operand`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Ne,
}

impl Comparator {
    pub const ALL: [Comparator; 6] = [
        Comparator::Lt,
        Comparator::Le,
        Comparator::Eq,
        Comparator::Ge,
        Comparator::Gt,
        Comparator::Ne,
    ];

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Eq => "=",
            Comparator::Ge => ">=",
            Comparator::Gt => ">",
            Comparator::Ne => "!=",
        }
    }

    #[must_use]
    pub fn test(self, value: f64, operand: f64) -> bool {
        const EPSILON: f64 = 1e-9;
        let equal = (value - operand).abs() < EPSILON;
        match self {
            Comparator::Lt => value < operand && !equal,
            Comparator::Le => value < operand || equal,
            Comparator::Eq => equal,
            Comparator::Ge => value > operand || equal,
            Comparator::Gt => value > operand && !equal,
            Comparator::Ne => !equal,
        }
    }
}

/// The comparison a leaf applies to its field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Set containment (text words, types, colors, symbols, formats, ...).
    Contains(Containment),
    /// Numeric comparison.
    Compare(Comparator),
    /// The numeric value does not exist (e.g. power of a non-creature).
    Missing,
    /// The numeric value is variable (`*`, `X`).
    Variable,
    /// Pseudo-attributes that take no mode.
    Unconditional,
}

impl Mode {
    /// Every mode, longest codes first so prefix matching is unambiguous.
    const BY_CODE_LENGTH: [Mode; 12] = [
        Mode::Compare(Comparator::Le),
        Mode::Compare(Comparator::Ge),
        Mode::Compare(Comparator::Ne),
        Mode::Compare(Comparator::Lt),
        Mode::Compare(Comparator::Gt),
        Mode::Compare(Comparator::Eq),
        Mode::Contains(Containment::AnyOf),
        Mode::Contains(Containment::AllOf),
        Mode::Contains(Containment::NoneOf),
        Mode::Contains(Containment::Exactly),
        Mode::Missing,
        Mode::Variable,
    ];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Mode::Contains(c) => c.code(),
            Mode::Compare(c) => c.symbol(),
            Mode::Missing => "?",
            Mode::Variable => "*",
            Mode::Unconditional => "",
        }
    }

    /// Look up a mode by its exact code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::BY_CODE_LENGTH.into_iter().find(|m| m.code() == code)
    }

    /// Split a mode code off the front of `text`.
    ///
    /// `encode` maps a code to the form it takes inside `text` (the text
    /// grammar escapes `<` and `>`).
    pub(crate) fn split_prefix<'a>(
        text: &'a str,
        encode: impl Fn(&str) -> String,
    ) -> Option<(Mode, &'a str)> {
        Self::BY_CODE_LENGTH.into_iter().find_map(|mode| {
            let code = encode(mode.code());
            text.strip_prefix(code.as_str()).map(|rest| (mode, rest))
        })
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Contains(c) => f.write_str(c.description()),
            Mode::Compare(c) => f.write_str(c.symbol()),
            Mode::Missing => f.write_str("does not exist"),
            Mode::Variable => f.write_str("is variable"),
            Mode::Unconditional => Ok(()),
        }
    }
}

/// How a group combines its children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupMode {
    /// Every child must match.
    #[default]
    And,
    /// At least one child must match.
    Or,
}

impl GroupMode {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            GroupMode::And => "AND",
            GroupMode::Or => "OR",
        }
    }

    /// Parse a keyword (case-insensitive).
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        if keyword.eq_ignore_ascii_case("AND") {
            Some(GroupMode::And)
        } else if keyword.eq_ignore_ascii_case("OR") {
            Some(GroupMode::Or)
        } else {
            None
        }
    }
}

impl fmt::Display for GroupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GroupMode::And => "all of",
            GroupMode::Or => "any of",
        })
    }
}
