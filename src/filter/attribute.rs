//! The registry of filterable card fields.
//!
//! Each [`CardAttribute`] knows its stable code in the filter grammar, the
//! kind of value it holds, which modes are legal for it and how to read its
//! value(s) off a [`Card`]. Per-face fields yield one value per face; card
//! level fields (mana value, color identity, expansion, block, rarity,
//! legality) yield exactly one.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use super::mode::{Containment, Mode};
use crate::cards::{normalize, Card, ColorSet, InventoryIndex, ManaCost, StatValue};
use crate::error::{FilterError, FilterResult};

/// Shape of the value a field holds, which determines its operand type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Free text searched by words, phrases or a regular expression.
    Text,
    /// A mana cost compared as a multiset of symbols.
    ManaCost,
    /// A number compared with a [`Comparator`](super::Comparator).
    Number,
    /// A set of colors.
    Colors,
    /// A set of strings from an open vocabulary (types, expansions, ...).
    Options,
    /// A rarity from the fixed vocabulary.
    Rarity,
    /// Formats a card is legal in.
    Legality,
    /// Matches every card or no card.
    Vacuous,
}

/// A filterable card field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CardAttribute {
    Name,
    ManaCost,
    ManaValue,
    Color,
    ColorIdentity,
    TypeLine,
    Supertype,
    CardType,
    Subtype,
    Expansion,
    Block,
    Rarity,
    RulesText,
    FlavorText,
    Power,
    Toughness,
    Loyalty,
    Artist,
    CardNumber,
    Legality,
    /// Matches every card.
    Any,
    /// Matches no card.
    Nothing,
}

/// A numeric value read off a card.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NumberValue {
    pub value: f64,
    /// Whether the printed value is variable (`*`, `X`).
    pub variable: bool,
}

impl NumberValue {
    fn fixed(value: f64) -> Self {
        Self {
            value,
            variable: false,
        }
    }

    fn stat(stat: &StatValue) -> Self {
        Self {
            value: stat.value,
            variable: stat.is_variable(),
        }
    }
}

impl CardAttribute {
    /// Every field, in the order they are offered to the user.
    pub const ALL: [CardAttribute; 22] = [
        CardAttribute::Name,
        CardAttribute::ManaCost,
        CardAttribute::ManaValue,
        CardAttribute::Color,
        CardAttribute::ColorIdentity,
        CardAttribute::TypeLine,
        CardAttribute::Supertype,
        CardAttribute::CardType,
        CardAttribute::Subtype,
        CardAttribute::Expansion,
        CardAttribute::Block,
        CardAttribute::Rarity,
        CardAttribute::RulesText,
        CardAttribute::FlavorText,
        CardAttribute::Power,
        CardAttribute::Toughness,
        CardAttribute::Loyalty,
        CardAttribute::Artist,
        CardAttribute::CardNumber,
        CardAttribute::Legality,
        CardAttribute::Any,
        CardAttribute::Nothing,
    ];

    /// Stable code used in the filter grammar and in saved decks.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            CardAttribute::Name => "n",
            CardAttribute::ManaCost => "m",
            CardAttribute::ManaValue => "cmc",
            CardAttribute::Color => "c",
            CardAttribute::ColorIdentity => "ci",
            CardAttribute::TypeLine => "type",
            CardAttribute::Supertype => "super",
            CardAttribute::CardType => "cardtype",
            CardAttribute::Subtype => "sub",
            CardAttribute::Expansion => "x",
            CardAttribute::Block => "b",
            CardAttribute::Rarity => "r",
            CardAttribute::RulesText => "o",
            CardAttribute::FlavorText => "f",
            CardAttribute::Power => "p",
            CardAttribute::Toughness => "t",
            CardAttribute::Loyalty => "l",
            CardAttribute::Artist => "a",
            CardAttribute::CardNumber => "#",
            CardAttribute::Legality => "legal",
            CardAttribute::Any => "*",
            CardAttribute::Nothing => "0",
        }
    }

    /// Human-readable field name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            CardAttribute::Name => "Name",
            CardAttribute::ManaCost => "Mana Cost",
            CardAttribute::ManaValue => "Mana Value",
            CardAttribute::Color => "Color",
            CardAttribute::ColorIdentity => "Color Identity",
            CardAttribute::TypeLine => "Type Line",
            CardAttribute::Supertype => "Supertype",
            CardAttribute::CardType => "Card Type",
            CardAttribute::Subtype => "Subtype",
            CardAttribute::Expansion => "Expansion",
            CardAttribute::Block => "Block",
            CardAttribute::Rarity => "Rarity",
            CardAttribute::RulesText => "Rules Text",
            CardAttribute::FlavorText => "Flavor Text",
            CardAttribute::Power => "Power",
            CardAttribute::Toughness => "Toughness",
            CardAttribute::Loyalty => "Loyalty",
            CardAttribute::Artist => "Artist",
            CardAttribute::CardNumber => "Card Number",
            CardAttribute::Legality => "Format Legality",
            CardAttribute::Any => "<Any Card>",
            CardAttribute::Nothing => "<No Card>",
        }
    }

    /// Look up a field by code (case-insensitive).
    pub fn from_code(code: &str) -> FilterResult<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|a| a.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| FilterError::UnknownField(code.to_string()))
    }

    #[must_use]
    pub const fn kind(self) -> ValueKind {
        match self {
            CardAttribute::Name
            | CardAttribute::TypeLine
            | CardAttribute::RulesText
            | CardAttribute::FlavorText
            | CardAttribute::Artist => ValueKind::Text,
            CardAttribute::ManaCost => ValueKind::ManaCost,
            CardAttribute::ManaValue
            | CardAttribute::Power
            | CardAttribute::Toughness
            | CardAttribute::Loyalty
            | CardAttribute::CardNumber => ValueKind::Number,
            CardAttribute::Color | CardAttribute::ColorIdentity => ValueKind::Colors,
            CardAttribute::Supertype
            | CardAttribute::CardType
            | CardAttribute::Subtype
            | CardAttribute::Expansion
            | CardAttribute::Block => ValueKind::Options,
            CardAttribute::Rarity => ValueKind::Rarity,
            CardAttribute::Legality => ValueKind::Legality,
            CardAttribute::Any | CardAttribute::Nothing => ValueKind::Vacuous,
        }
    }

    /// Whether the field can be absent or variable (power, toughness, loyalty).
    #[must_use]
    pub const fn is_stat(self) -> bool {
        matches!(
            self,
            CardAttribute::Power | CardAttribute::Toughness | CardAttribute::Loyalty
        )
    }

    /// Whether a mode is legal for this field.
    #[must_use]
    pub fn allows(self, mode: Mode) -> bool {
        match (self.kind(), mode) {
            (ValueKind::Vacuous, mode) => mode == Mode::Unconditional,
            (ValueKind::Number, Mode::Compare(_)) => true,
            (ValueKind::Number, Mode::Missing | Mode::Variable) => self.is_stat(),
            (ValueKind::Number, _) => false,
            (_, mode) => matches!(mode, Mode::Contains(_)),
        }
    }

    /// Every mode legal for this field.
    #[must_use]
    pub fn modes(self) -> Vec<Mode> {
        let mut modes: Vec<Mode> = match self.kind() {
            ValueKind::Vacuous => vec![Mode::Unconditional],
            ValueKind::Number => super::Comparator::ALL.into_iter().map(Mode::Compare).collect(),
            _ => Containment::ALL.into_iter().map(Mode::Contains).collect(),
        };
        if self.is_stat() {
            modes.extend([Mode::Missing, Mode::Variable]);
        }
        modes
    }

    /// Known values for option-style fields, taken from the inventory.
    ///
    /// Rarity has a fixed vocabulary ([`Rarity::ALL`](crate::cards::Rarity::ALL))
    /// and returns `None` like every non-option field.
    #[must_use]
    pub fn options(self, index: &InventoryIndex) -> Option<&[String]> {
        match self {
            CardAttribute::Supertype => Some(&index.supertypes),
            CardAttribute::CardType => Some(&index.types),
            CardAttribute::Subtype => Some(&index.subtypes),
            CardAttribute::Expansion => Some(&index.expansion_names),
            CardAttribute::Block => Some(&index.blocks),
            CardAttribute::Legality => Some(&index.formats),
            _ => None,
        }
    }

    /// Normalized text of each face.
    pub(crate) fn text_values(self, card: &Card) -> SmallVec<[Cow<'_, str>; 2]> {
        card.faces()
            .iter()
            .map(|face| match self {
                CardAttribute::Name => Cow::Borrowed(face.normalized_name()),
                CardAttribute::RulesText => Cow::Borrowed(face.normalized_rules_text()),
                CardAttribute::FlavorText => Cow::Borrowed(face.normalized_flavor_text()),
                CardAttribute::TypeLine => Cow::Owned(normalize(&face.type_line)),
                CardAttribute::Artist => Cow::Owned(normalize(&face.artist)),
                _ => Cow::Borrowed(""),
            })
            .collect()
    }

    /// Numeric value of each face, `None` where the face has no such value.
    pub(crate) fn number_values(self, card: &Card) -> SmallVec<[Option<NumberValue>; 2]> {
        match self {
            CardAttribute::ManaValue => smallvec![Some(NumberValue::fixed(card.mana_value()))],
            CardAttribute::Power => card
                .faces()
                .iter()
                .map(|f| f.power.as_ref().map(NumberValue::stat))
                .collect(),
            CardAttribute::Toughness => card
                .faces()
                .iter()
                .map(|f| f.toughness.as_ref().map(NumberValue::stat))
                .collect(),
            CardAttribute::Loyalty => card
                .faces()
                .iter()
                .map(|f| f.loyalty.as_ref().map(NumberValue::stat))
                .collect(),
            CardAttribute::CardNumber => card
                .faces()
                .iter()
                .map(|f| f.collector_number().map(NumberValue::fixed))
                .collect(),
            _ => SmallVec::new(),
        }
    }

    /// Colors of each face, or the card's color identity.
    pub(crate) fn color_values(self, card: &Card) -> SmallVec<[ColorSet; 2]> {
        match self {
            CardAttribute::ColorIdentity => smallvec![card.color_identity()],
            _ => card.faces().iter().map(|f| f.colors).collect(),
        }
    }

    /// Mana cost of each face.
    pub(crate) fn mana_values(self, card: &Card) -> SmallVec<[&ManaCost; 2]> {
        card.faces().iter().map(|f| &f.mana_cost).collect()
    }

    /// Lowercased option values of each face (or of the card).
    pub(crate) fn option_values(self, card: &Card) -> SmallVec<[Vec<String>; 2]> {
        let lower = |set: &std::collections::BTreeSet<String>| -> Vec<String> {
            set.iter().map(|s| s.to_lowercase()).collect()
        };
        match self {
            CardAttribute::Supertype => card.faces().iter().map(|f| lower(&f.supertypes)).collect(),
            CardAttribute::CardType => card.faces().iter().map(|f| lower(&f.types)).collect(),
            CardAttribute::Subtype => card.faces().iter().map(|f| lower(&f.subtypes)).collect(),
            CardAttribute::Expansion => smallvec![vec![card.expansion().name.to_lowercase()]],
            CardAttribute::Block => smallvec![vec![card.expansion().block.to_lowercase()]],
            _ => SmallVec::new(),
        }
    }
}

impl fmt::Display for CardAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CardAttribute {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardId, Expansion, Face, Rarity};
    use crate::filter::Comparator;

    #[test]
    fn test_codes_are_unique_and_stable() {
        let codes: Vec<_> = CardAttribute::ALL.iter().map(|a| a.code()).collect();
        let mut unique = codes.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), codes.len());

        assert_eq!(CardAttribute::from_code("n").unwrap(), CardAttribute::Name);
        assert_eq!(CardAttribute::from_code("CMC").unwrap(), CardAttribute::ManaValue);
        assert_eq!(CardAttribute::from_code("#").unwrap(), CardAttribute::CardNumber);
        assert_eq!(CardAttribute::from_code("legal").unwrap(), CardAttribute::Legality);
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(
            CardAttribute::from_code("zzz"),
            Err(FilterError::UnknownField("zzz".to_string()))
        );
    }

    #[test]
    fn test_allowed_modes() {
        let ge = Mode::Compare(Comparator::Ge);
        let any = Mode::Contains(Containment::AnyOf);
        assert!(CardAttribute::ManaValue.allows(ge));
        assert!(!CardAttribute::ManaValue.allows(any));
        assert!(!CardAttribute::ManaValue.allows(Mode::Missing));
        assert!(CardAttribute::Power.allows(Mode::Missing));
        assert!(CardAttribute::Power.allows(Mode::Variable));
        assert!(CardAttribute::Name.allows(any));
        assert!(!CardAttribute::Name.allows(ge));
        assert!(CardAttribute::Any.allows(Mode::Unconditional));
        assert!(!CardAttribute::Rarity.allows(Mode::Unconditional));

        assert_eq!(CardAttribute::Loyalty.modes().len(), 8);
        assert_eq!(CardAttribute::Subtype.modes().len(), 4);
    }

    #[test]
    fn test_options_come_from_index() {
        let index = InventoryIndex {
            subtypes: vec!["Goblin".into(), "Wizard".into()],
            ..InventoryIndex::default()
        };
        assert_eq!(
            CardAttribute::Subtype.options(&index),
            Some(&["Goblin".to_string(), "Wizard".to_string()][..])
        );
        assert_eq!(CardAttribute::Rarity.options(&index), None);
    }

    #[test]
    fn test_per_face_values() {
        let card = Card::new(
            CardId::new("fi"),
            Expansion::new("Apocalypse", "APC"),
            Rarity::Uncommon,
            vec![
                Face::new("Fire").with_types(["Instant"]),
                Face::new("Ice").with_types(["Instant"]).with_stats("*", "2"),
            ],
        );
        assert_eq!(CardAttribute::Name.text_values(&card).len(), 2);
        let power = CardAttribute::Power.number_values(&card);
        assert_eq!(power[0], None);
        assert!(power[1].unwrap().variable);
        assert_eq!(CardAttribute::ManaValue.number_values(&card).len(), 1);
        assert_eq!(
            CardAttribute::Expansion.option_values(&card)[0],
            vec!["apocalypse".to_string()]
        );
    }
}
