//! Typed filter operands.
//!
//! The operand a leaf carries depends on the [`ValueKind`] of its field:
//! text searches, mana costs, numbers, color sets, option sets, rarities and
//! format sets. Every operand knows how to write itself into the filter
//! grammar and how to parse itself back.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use regex::{Regex, RegexBuilder};

use super::attribute::{CardAttribute, ValueKind};
use super::escape::{self, ELEMENT, GRAMMAR};
use super::mode::{Containment, Mode};
use crate::cards::{normalize, Card, ColorSet, Legality, ManaCost, Rarity};
use crate::error::{FilterError, FilterResult};

/// A text search: words and `"quoted phrases"`, or a `/regular expression/`.
///
/// Words match on word boundaries against normalized card text. The exact
/// mode compares the whole field. Equality and hashing use the source text.
#[derive(Clone, Debug)]
pub struct TextOperand {
    text: String,
    matcher: TextMatcher,
}

#[derive(Clone, Debug)]
enum TextMatcher {
    Words { words: Vec<String>, exact: String },
    Pattern { search: Regex, whole: Regex },
}

impl TextOperand {
    /// Build a text operand. Fails only when a `/regex/` does not compile.
    pub fn new(text: impl Into<String>) -> Result<Self, String> {
        let text = text.into();
        let matcher = match Self::pattern(&text) {
            Some(pattern) => TextMatcher::Pattern {
                search: compile(pattern)?,
                whole: compile(&format!("^(?:{pattern})$"))?,
            },
            None => TextMatcher::Words {
                words: split_words(&text),
                exact: normalize(text.trim()),
            },
        };
        Ok(Self { text, matcher })
    }

    fn pattern(text: &str) -> Option<&str> {
        let trimmed = text.trim();
        if trimmed.len() >= 2 && trimmed.starts_with('/') && trimmed.ends_with('/') {
            Some(&trimmed[1..trimmed.len() - 1])
        } else {
            None
        }
    }

    /// Source text as entered.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_regex(&self) -> bool {
        matches!(self.matcher, TextMatcher::Pattern { .. })
    }

    /// Test one normalized field value.
    pub(crate) fn test(&self, containment: Containment, field: &str) -> bool {
        match &self.matcher {
            TextMatcher::Pattern { search, whole } => match containment {
                Containment::AnyOf | Containment::AllOf => search.is_match(field),
                Containment::NoneOf => !search.is_match(field),
                Containment::Exactly => whole.is_match(field),
            },
            TextMatcher::Words { words, exact } => match containment {
                Containment::AnyOf => words.iter().any(|w| contains_word(field, w)),
                Containment::AllOf => words.iter().all(|w| contains_word(field, w)),
                Containment::NoneOf => !words.iter().any(|w| contains_word(field, w)),
                Containment::Exactly => field == exact,
            },
        }
    }
}

impl PartialEq for TextOperand {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for TextOperand {}

impl Hash for TextOperand {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

fn compile(pattern: &str) -> Result<Regex, String> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| e.to_string())
}

/// Split search text into normalized words and quoted phrases.
fn split_words(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    let mut words = Vec::new();
    let mut rest = normalized.as_str();
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        if let Some(quoted) = rest.strip_prefix('"') {
            let end = quoted.find('"').unwrap_or(quoted.len());
            let phrase = quoted[..end].trim();
            if !phrase.is_empty() {
                words.push(phrase.to_string());
            }
            rest = quoted.get(end + 1..).unwrap_or("");
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            words.push(rest[..end].to_string());
            rest = &rest[end..];
        }
    }
    words
}

/// Whether `word` occurs in `field` without letters or digits on either side.
fn contains_word(field: &str, word: &str) -> bool {
    field.match_indices(word).any(|(i, _)| {
        let before = field[..i].chars().next_back();
        let after = field[i + word.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// A color set, optionally requiring the card to be multicolored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ColorOperand {
    pub colors: ColorSet,
    pub multicolored: bool,
}

impl ColorOperand {
    #[must_use]
    pub fn new(colors: ColorSet, multicolored: bool) -> Self {
        Self {
            colors,
            multicolored,
        }
    }

    pub(crate) fn test(self, containment: Containment, have: ColorSet) -> bool {
        let contained = match containment {
            Containment::AnyOf => have.intersects(self.colors),
            Containment::AllOf => self.colors.is_subset(have),
            Containment::NoneOf => !have.intersects(self.colors),
            Containment::Exactly => have == self.colors,
        };
        contained && (!self.multicolored || have.len() > 1)
    }
}

/// A set of formats, optionally testing for restricted status only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LegalityOperand {
    formats: BTreeSet<String>,
    restricted: bool,
}

impl LegalityOperand {
    /// Format names are trimmed and lowercased; empty names are dropped.
    pub fn new<S: AsRef<str>>(formats: impl IntoIterator<Item = S>, restricted: bool) -> Self {
        Self {
            formats: formats
                .into_iter()
                .map(|f| f.as_ref().trim().to_lowercase())
                .filter(|f| !f.is_empty())
                .collect(),
            restricted,
        }
    }

    #[must_use]
    pub fn formats(&self) -> &BTreeSet<String> {
        &self.formats
    }

    /// Whether only restricted status counts as a match.
    #[must_use]
    pub fn restricted(&self) -> bool {
        self.restricted
    }

    pub(crate) fn test(&self, containment: Containment, card: &Card) -> bool {
        let have: Vec<&str> = card
            .legality()
            .iter()
            .filter(|(_, legality)| {
                if self.restricted {
                    **legality == Legality::Restricted
                } else {
                    legality.is_legal()
                }
            })
            .map(|(format, _)| format.as_str())
            .collect();
        let want: Vec<&str> = self.formats.iter().map(String::as_str).collect();
        containment.test(&have, &want)
    }
}

/// Normalize option values: trimmed, empty values dropped.
pub(crate) fn option_set<S: AsRef<str>>(values: impl IntoIterator<Item = S>) -> BTreeSet<String> {
    values
        .into_iter()
        .map(|v| v.as_ref().trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// The value a leaf compares its field against.
#[derive(Clone, Debug)]
pub enum Operand {
    /// No operand (existence tests and pseudo-attributes).
    None,
    Text(TextOperand),
    ManaCost(ManaCost),
    Number(f64),
    Colors(ColorOperand),
    Options(BTreeSet<String>),
    Rarities(BTreeSet<Rarity>),
    Legality(LegalityOperand),
}

impl Operand {
    /// A numeric operand. Rejects NaN and infinities.
    pub fn number(value: f64) -> Result<Self, String> {
        if value.is_finite() {
            // -0.0 and 0.0 must compare and hash the same
            Ok(Operand::Number(if value == 0.0 { 0.0 } else { value }))
        } else {
            Err(format!("{value} is not a finite number"))
        }
    }

    /// Whether this operand has the right shape for a field and mode.
    pub(crate) fn fits(&self, attribute: CardAttribute, mode: Mode) -> bool {
        match (attribute.kind(), self) {
            (ValueKind::Vacuous, Operand::None) => true,
            (ValueKind::Number, Operand::None) => matches!(mode, Mode::Missing | Mode::Variable),
            (ValueKind::Number, Operand::Number(_)) => matches!(mode, Mode::Compare(_)),
            (ValueKind::Text, Operand::Text(_))
            | (ValueKind::ManaCost, Operand::ManaCost(_))
            | (ValueKind::Colors, Operand::Colors(_))
            | (ValueKind::Options, Operand::Options(_))
            | (ValueKind::Rarity, Operand::Rarities(_))
            | (ValueKind::Legality, Operand::Legality(_)) => true,
            _ => false,
        }
    }

    /// Why the operand could not be written and read back as itself, if so.
    ///
    /// Numbers must be finite and not `-0`; option values must be trimmed
    /// and non-empty, the form [`option_set`] produces.
    pub(crate) fn noncanonical(&self) -> Option<String> {
        match self {
            Operand::Number(value) if !value.is_finite() => Some(format!("{value} is not a finite number")),
            Operand::Number(value) if *value == 0.0 && value.is_sign_negative() => {
                Some("-0 is not a valid number, use 0".to_string())
            }
            Operand::Options(values) => values
                .iter()
                .find(|v| v.is_empty() || v.trim() != v.as_str())
                .map(|v| format!("option \"{v}\" is empty or has surrounding whitespace")),
            _ => None,
        }
    }

    /// Starting operand for a freshly created leaf.
    #[must_use]
    pub fn default_for(attribute: CardAttribute, mode: Mode) -> Self {
        match attribute.kind() {
            ValueKind::Text => Operand::Text(TextOperand {
                text: String::new(),
                matcher: TextMatcher::Words {
                    words: Vec::new(),
                    exact: String::new(),
                },
            }),
            ValueKind::ManaCost => Operand::ManaCost(ManaCost::empty()),
            ValueKind::Number if matches!(mode, Mode::Compare(_)) => Operand::Number(0.0),
            ValueKind::Number | ValueKind::Vacuous => Operand::None,
            ValueKind::Colors => Operand::Colors(ColorOperand::default()),
            ValueKind::Options => Operand::Options(BTreeSet::new()),
            ValueKind::Rarity => Operand::Rarities(BTreeSet::new()),
            ValueKind::Legality => Operand::Legality(LegalityOperand::default()),
        }
    }

    /// Append the grammar form of the operand (already escaped).
    pub(crate) fn write_grammar(&self, out: &mut String) {
        match self {
            Operand::None => {}
            Operand::Text(text) => {
                out.push(' ');
                out.push_str(&escape::escape(text.text(), GRAMMAR));
            }
            Operand::ManaCost(cost) => out.push_str(&escape::escape(&cost.to_string(), GRAMMAR)),
            Operand::Number(value) => out.push_str(&value.to_string()),
            Operand::Colors(colors) => {
                out.push('{');
                out.push_str(&colors.colors.to_string());
                out.push('}');
                if colors.multicolored {
                    out.push('M');
                }
            }
            Operand::Options(values) => write_set(out, values.iter().map(String::as_str)),
            Operand::Rarities(values) => write_set(out, values.iter().map(|r| r.name())),
            Operand::Legality(legality) => {
                write_set(out, legality.formats.iter().map(String::as_str));
                if legality.restricted {
                    out.push('r');
                }
            }
        }
    }

    /// Parse the grammar form of an operand for a field and mode.
    pub(crate) fn parse_grammar(attribute: CardAttribute, mode: Mode, raw: &str) -> FilterResult<Self> {
        let invalid = |reason: String| FilterError::operand(attribute.code(), &escape::unescape(raw), reason);
        match attribute.kind() {
            ValueKind::Vacuous => no_operand(raw).map_err(invalid),
            ValueKind::Number if matches!(mode, Mode::Missing | Mode::Variable) => {
                no_operand(raw).map_err(invalid)
            }
            ValueKind::Number => escape::unescape(raw)
                .trim()
                .parse::<f64>()
                .map_err(|e| e.to_string())
                .and_then(Operand::number)
                .map_err(invalid),
            ValueKind::Text => {
                let text = raw.strip_prefix(' ').unwrap_or(raw);
                TextOperand::new(escape::unescape(text))
                    .map(Operand::Text)
                    .map_err(invalid)
            }
            ValueKind::ManaCost => ManaCost::parse(&escape::unescape(raw))
                .map(Operand::ManaCost)
                .map_err(invalid),
            ValueKind::Colors => {
                let (inner, suffix) = braced(raw).map_err(invalid)?;
                let colors = ColorSet::from_str(&escape::unescape(inner)).map_err(invalid)?;
                let multicolored = flag(suffix, "M").map_err(invalid)?;
                Ok(Operand::Colors(ColorOperand::new(colors, multicolored)))
            }
            ValueKind::Options => {
                let (inner, suffix) = braced(raw).map_err(invalid)?;
                flag(suffix, "").map_err(invalid)?;
                Ok(Operand::Options(option_set(elements(inner))))
            }
            ValueKind::Rarity => {
                let (inner, suffix) = braced(raw).map_err(invalid)?;
                flag(suffix, "").map_err(invalid)?;
                let rarities = elements(inner)
                    .iter()
                    .map(|r| Rarity::from_str(r))
                    .collect::<Result<BTreeSet<_>, _>>()
                    .map_err(invalid)?;
                Ok(Operand::Rarities(rarities))
            }
            ValueKind::Legality => {
                let (inner, suffix) = braced(raw).map_err(invalid)?;
                let restricted = flag(suffix, "r").map_err(invalid)?;
                Ok(Operand::Legality(LegalityOperand::new(elements(inner), restricted)))
            }
        }
    }
}

fn no_operand(raw: &str) -> Result<Operand, String> {
    if raw.trim().is_empty() {
        Ok(Operand::None)
    } else {
        Err("this mode takes no operand".to_string())
    }
}

fn write_set<'a>(out: &mut String, values: impl Iterator<Item = &'a str>) {
    out.push('{');
    let escaped: Vec<String> = values.map(|v| escape::escape(v, ELEMENT)).collect();
    out.push_str(&escaped.join(","));
    out.push('}');
}

/// Split `{inner}suffix` at the first unescaped closing brace.
fn braced(raw: &str) -> Result<(&str, &str), String> {
    let body = raw
        .trim_start()
        .strip_prefix('{')
        .ok_or_else(|| "expected '{'".to_string())?;
    let end = escape::find_unescaped(body, '}').ok_or_else(|| "expected '}'".to_string())?;
    Ok((&body[..end], &body[end + 1..]))
}

/// Unescaped, trimmed, non-empty elements of a set body.
fn elements(inner: &str) -> Vec<String> {
    escape::split_unescaped(inner, ',')
        .into_iter()
        .map(|e| escape::unescape(e).trim().to_string())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Interpret the text after a set as an optional one-word flag.
fn flag(suffix: &str, expected: &str) -> Result<bool, String> {
    let suffix = suffix.trim();
    if suffix.is_empty() {
        Ok(false)
    } else if !expected.is_empty() && suffix == expected {
        Ok(true)
    } else {
        Err(format!("unexpected \"{suffix}\" after set"))
    }
}

impl PartialEq for Operand {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Operand::None, Operand::None) => true,
            (Operand::Text(a), Operand::Text(b)) => a == b,
            (Operand::ManaCost(a), Operand::ManaCost(b)) => a == b,
            (Operand::Number(a), Operand::Number(b)) => a.to_bits() == b.to_bits(),
            (Operand::Colors(a), Operand::Colors(b)) => a == b,
            (Operand::Options(a), Operand::Options(b)) => a == b,
            (Operand::Rarities(a), Operand::Rarities(b)) => a == b,
            (Operand::Legality(a), Operand::Legality(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Operand {}

impl Hash for Operand {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Operand::None => {}
            Operand::Text(t) => t.hash(state),
            Operand::ManaCost(c) => c.hash(state),
            Operand::Number(n) => n.to_bits().hash(state),
            Operand::Colors(c) => c.hash(state),
            Operand::Options(o) => o.hash(state),
            Operand::Rarities(r) => r.hash(state),
            Operand::Legality(l) => l.hash(state),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |items: Vec<&str>| items.join(", ");
        match self {
            Operand::None => Ok(()),
            Operand::Text(t) => f.write_str(t.text()),
            Operand::ManaCost(c) => write!(f, "{c}"),
            Operand::Number(n) => write!(f, "{n}"),
            Operand::Colors(c) if c.multicolored => write!(f, "{{{}}} (multicolored)", c.colors),
            Operand::Colors(c) => write!(f, "{{{}}}", c.colors),
            Operand::Options(o) => f.write_str(&join(o.iter().map(String::as_str).collect())),
            Operand::Rarities(r) => f.write_str(&join(r.iter().map(|r| r.name()).collect())),
            Operand::Legality(l) if l.restricted => {
                write!(f, "{} (restricted)", join(l.formats.iter().map(String::as_str).collect()))
            }
            Operand::Legality(l) => f.write_str(&join(l.formats.iter().map(String::as_str).collect())),
        }
    }
}
