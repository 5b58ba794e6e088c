//! Card characteristics with a fixed vocabulary.
//!
//! ## Types
//!
//! - `ManaType` / `ColorSet`: the five colors and sets of them
//! - `Rarity`: printed rarity
//! - `Legality`: status of a card in one format
//! - `StatValue`: power, toughness or loyalty (possibly variable, like `*` or `X`)
//! - `CardLayout`: how the faces of a card are printed
//! - `Expansion`: the set a card was printed in

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the five colors of mana.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ManaType {
    White,
    Blue,
    Black,
    Red,
    Green,
}

impl ManaType {
    /// All colors in WUBRG order.
    pub const ALL: [ManaType; 5] = [
        ManaType::White,
        ManaType::Blue,
        ManaType::Black,
        ManaType::Red,
        ManaType::Green,
    ];

    /// Single-letter abbreviation.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            ManaType::White => 'W',
            ManaType::Blue => 'U',
            ManaType::Black => 'B',
            ManaType::Red => 'R',
            ManaType::Green => 'G',
        }
    }

    /// Parse a single-letter abbreviation (case-insensitive).
    #[must_use]
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'W' => Some(ManaType::White),
            'U' => Some(ManaType::Blue),
            'B' => Some(ManaType::Black),
            'R' => Some(ManaType::Red),
            'G' => Some(ManaType::Green),
            _ => None,
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl FromStr for ManaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_letter(c),
            _ => match s.trim().to_ascii_lowercase().as_str() {
                "white" => Some(ManaType::White),
                "blue" => Some(ManaType::Blue),
                "black" => Some(ManaType::Black),
                "red" => Some(ManaType::Red),
                "green" => Some(ManaType::Green),
                _ => None,
            },
        }
        .ok_or_else(|| format!("unknown color \"{s}\""))
    }
}

/// A set of colors stored as a bitmask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorSet(u8);

impl ColorSet {
    /// The empty (colorless) set.
    pub const COLORLESS: ColorSet = ColorSet(0);

    /// Create a set from colors.
    pub fn new(colors: impl IntoIterator<Item = ManaType>) -> Self {
        colors.into_iter().fold(Self::COLORLESS, |set, c| set.with(c))
    }

    /// Add a color (builder pattern).
    #[must_use]
    pub const fn with(self, color: ManaType) -> Self {
        Self(self.0 | color.bit())
    }

    #[must_use]
    pub const fn contains(self, color: ManaType) -> bool {
        self.0 & color.bit() != 0
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn union(self, other: ColorSet) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn intersects(self, other: ColorSet) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub const fn is_subset(self, other: ColorSet) -> bool {
        self.0 & !other.0 == 0
    }

    /// Iterate over the colors in WUBRG order.
    pub fn iter(self) -> impl Iterator<Item = ManaType> {
        ManaType::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl FromIterator<ManaType> for ColorSet {
    fn from_iter<I: IntoIterator<Item = ManaType>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl fmt::Display for ColorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for color in self.iter() {
            write!(f, "{}", color.letter())?;
        }
        Ok(())
    }
}

impl FromStr for ColorSet {
    type Err = String;

    /// Parse a run of color letters such as `WUR`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| ManaType::from_letter(c).ok_or_else(|| format!("unknown color letter '{c}'")))
            .collect()
    }
}

/// Printed rarity of a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    BasicLand,
    Common,
    Uncommon,
    Rare,
    MythicRare,
    Special,
}

impl Rarity {
    pub const ALL: [Rarity; 6] = [
        Rarity::BasicLand,
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::MythicRare,
        Rarity::Special,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Rarity::BasicLand => "Basic Land",
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::MythicRare => "Mythic Rare",
            Rarity::Special => "Special",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Rarity {
    type Err = String;

    /// Accepts full names, database spellings (`mythic`, `bonus`) and
    /// single-letter abbreviations.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "basic land" | "basic" | "l" => Ok(Rarity::BasicLand),
            "common" | "c" => Ok(Rarity::Common),
            "uncommon" | "u" => Ok(Rarity::Uncommon),
            "rare" | "r" => Ok(Rarity::Rare),
            "mythic rare" | "mythic" | "m" => Ok(Rarity::MythicRare),
            "special" | "timeshifted" | "bonus" | "s" => Ok(Rarity::Special),
            _ => Err(format!("unknown rarity \"{s}\"")),
        }
    }
}

/// Legality of a card in a single format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Legality {
    /// Not legal in the format.
    Banned,
    /// Normal number of copies allowed.
    Legal,
    /// Only one copy allowed.
    Restricted,
    /// Neither banned nor legal (rotated, never printed in the format).
    NotLegal,
}

impl Legality {
    /// Whether the card may appear in a deck at all.
    #[must_use]
    pub const fn is_legal(self) -> bool {
        matches!(self, Legality::Legal | Legality::Restricted)
    }
}

impl fmt::Display for Legality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Legality::Banned => "Banned",
            Legality::Legal => "Legal",
            Legality::Restricted => "Restricted",
            Legality::NotLegal => "Not Legal",
        })
    }
}

impl FromStr for Legality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "banned" => Ok(Legality::Banned),
            "legal" => Ok(Legality::Legal),
            "restricted" => Ok(Legality::Restricted),
            "not legal" | "not_legal" | "illegal" => Ok(Legality::NotLegal),
            _ => Err(format!("unknown legality \"{s}\"")),
        }
    }
}

/// A power, toughness or loyalty value.
///
/// Keeps the printed text (`1+*`, `X`) alongside the numeric part so that
/// variable stats can still be compared (`*` counts as 0).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatValue {
    /// Printed text.
    pub text: String,
    /// Numeric part, with variable components counted as 0.
    pub value: f64,
}

impl StatValue {
    /// Parse printed stat text. Never fails; unparseable text counts as 0.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let value = Self::numeric_part(&text);
        Self { text, value }
    }

    /// Whether the stat contains a variable component (`*`, `X`).
    #[must_use]
    pub fn is_variable(&self) -> bool {
        self.text.contains(['*', 'X', 'x', '?'])
    }

    fn numeric_part(text: &str) -> f64 {
        let cleaned = text.replace('½', ".5");
        let mut total = 0.0;
        for term in cleaned.split(['+', '-']) {
            if let Ok(v) = term.trim().parse::<f64>() {
                total += v;
            }
        }
        if cleaned.trim_start().starts_with('-') {
            -total
        } else {
            total
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// How a card's faces are printed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardLayout {
    Normal,
    Split,
    Aftermath,
    Adventure,
    Flip,
    Transform,
    ModalDfc,
    Meld,
    Leveler,
    Saga,
    Class,
    Planar,
    Scheme,
    Vanguard,
}

impl CardLayout {
    /// Whether cards with this layout have more than one face.
    #[must_use]
    pub const fn is_multi_faced(self) -> bool {
        matches!(
            self,
            CardLayout::Split
                | CardLayout::Aftermath
                | CardLayout::Adventure
                | CardLayout::Flip
                | CardLayout::Transform
                | CardLayout::ModalDfc
                | CardLayout::Meld
        )
    }
}

impl FromStr for CardLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match key.as_str() {
            "normal" => Ok(CardLayout::Normal),
            "split" => Ok(CardLayout::Split),
            "aftermath" => Ok(CardLayout::Aftermath),
            "adventure" => Ok(CardLayout::Adventure),
            "flip" => Ok(CardLayout::Flip),
            "transform" | "doublefaced" => Ok(CardLayout::Transform),
            "modaldfc" => Ok(CardLayout::ModalDfc),
            "meld" => Ok(CardLayout::Meld),
            "leveler" => Ok(CardLayout::Leveler),
            "saga" => Ok(CardLayout::Saga),
            "class" => Ok(CardLayout::Class),
            "planar" => Ok(CardLayout::Planar),
            "scheme" => Ok(CardLayout::Scheme),
            "vanguard" => Ok(CardLayout::Vanguard),
            _ => Err(format!("unknown layout \"{s}\"")),
        }
    }
}

/// Block name used for expansions that are not part of a block.
pub const NO_BLOCK: &str = "<No Block>";

/// An expansion (set) that cards are printed in.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Expansion {
    /// Full set name.
    pub name: String,
    /// Block name, or [`NO_BLOCK`].
    pub block: String,
    /// Set code (e.g. `M10`).
    pub code: String,
    /// Release date as `YYYY-MM-DD`.
    pub release_date: String,
}

impl Expansion {
    /// Create a new expansion that is not part of a block.
    #[must_use]
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            block: NO_BLOCK.to_string(),
            code: code.into(),
            release_date: String::new(),
        }
    }

    /// Set the block (builder pattern).
    #[must_use]
    pub fn with_block(mut self, block: impl Into<String>) -> Self {
        self.block = block.into();
        self
    }

    /// Set the release date (builder pattern).
    #[must_use]
    pub fn with_release_date(mut self, date: impl Into<String>) -> Self {
        self.release_date = date.into();
        self
    }
}

impl fmt::Display for Expansion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
