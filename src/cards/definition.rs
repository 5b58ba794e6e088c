//! Card definitions - immutable card records.
//!
//! A `Card` is created once when the inventory loads and is never mutated
//! afterwards. Multi-faced cards (split, flip, transform, ...) carry one
//! `Face` per face; card-wide characteristics (mana value, color identity,
//! expansion, rarity, legality) live on the `Card` itself.
//!
//! Derived text (normalized name and rules text) is computed eagerly in
//! [`Card::new`], so accessors never allocate.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::attributes::{CardLayout, ColorSet, Expansion, Legality, Rarity, StatValue};
use super::mana::ManaCost;

/// Separator between face names in a card's unified name.
pub const FACE_SEPARATOR: &str = " // ";

/// Placeholder for a card's own name in normalized rules text.
pub const THIS: &str = "~";

/// Stable unique identifier for a card printing (Scryfall-style id).
///
/// This identifies a printing in the inventory; it is unrelated to how
/// many copies a deck holds.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub String);

impl CardId {
    /// Create a new card ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw ID text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One face of a card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub name: String,
    pub mana_cost: ManaCost,
    pub colors: ColorSet,
    pub supertypes: BTreeSet<String>,
    pub types: BTreeSet<String>,
    pub subtypes: BTreeSet<String>,
    /// Printed type line; built from the type sets when left empty.
    pub type_line: String,
    pub rules_text: String,
    pub flavor_text: String,
    pub power: Option<StatValue>,
    pub toughness: Option<StatValue>,
    pub loyalty: Option<StatValue>,
    pub artist: String,
    /// Collector number, which may carry a letter suffix (`123a`).
    pub number: String,

    normalized_name: String,
    normalized_rules: String,
    normalized_flavor: String,
}

impl Face {
    /// Create a face with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mana_cost: ManaCost::empty(),
            colors: ColorSet::COLORLESS,
            supertypes: BTreeSet::new(),
            types: BTreeSet::new(),
            subtypes: BTreeSet::new(),
            type_line: String::new(),
            rules_text: String::new(),
            flavor_text: String::new(),
            power: None,
            toughness: None,
            loyalty: None,
            artist: String::new(),
            number: String::new(),
            normalized_name: String::new(),
            normalized_rules: String::new(),
            normalized_flavor: String::new(),
        }
    }

    /// Set the mana cost; colors default to the cost's colors.
    #[must_use]
    pub fn with_mana_cost(mut self, cost: ManaCost) -> Self {
        if self.colors.is_empty() {
            self.colors = cost.colors();
        }
        self.mana_cost = cost;
        self
    }

    #[must_use]
    pub fn with_colors(mut self, colors: ColorSet) -> Self {
        self.colors = colors;
        self
    }

    #[must_use]
    pub fn with_supertypes<S: Into<String>>(mut self, supertypes: impl IntoIterator<Item = S>) -> Self {
        self.supertypes = supertypes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_types<S: Into<String>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_subtypes<S: Into<String>>(mut self, subtypes: impl IntoIterator<Item = S>) -> Self {
        self.subtypes = subtypes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_type_line(mut self, line: impl Into<String>) -> Self {
        self.type_line = line.into();
        self
    }

    #[must_use]
    pub fn with_rules_text(mut self, text: impl Into<String>) -> Self {
        self.rules_text = text.into();
        self
    }

    #[must_use]
    pub fn with_flavor_text(mut self, text: impl Into<String>) -> Self {
        self.flavor_text = text.into();
        self
    }

    /// Set power and toughness from their printed text.
    #[must_use]
    pub fn with_stats(mut self, power: &str, toughness: &str) -> Self {
        self.power = Some(StatValue::new(power));
        self.toughness = Some(StatValue::new(toughness));
        self
    }

    #[must_use]
    pub fn with_loyalty(mut self, loyalty: &str) -> Self {
        self.loyalty = Some(StatValue::new(loyalty));
        self
    }

    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    #[must_use]
    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = number.into();
        self
    }

    /// Lowercased, ASCII-normalized name.
    #[must_use]
    pub fn normalized_name(&self) -> &str {
        &self.normalized_name
    }

    /// Lowercased, ASCII-normalized rules text with the card's name replaced by `~`.
    #[must_use]
    pub fn normalized_rules_text(&self) -> &str {
        &self.normalized_rules
    }

    #[must_use]
    pub fn normalized_flavor_text(&self) -> &str {
        &self.normalized_flavor
    }

    /// Numeric part of the collector number (`123a` -> 123).
    #[must_use]
    pub fn collector_number(&self) -> Option<f64> {
        let digits: String = self.number.chars().take_while(char::is_ascii_digit).collect();
        digits.parse().ok()
    }

    fn finish(&mut self, legendary: bool) {
        if self.type_line.is_empty() {
            self.type_line = build_type_line(&self.supertypes, &self.types, &self.subtypes);
        }
        self.normalized_name = normalize(&self.name);
        self.normalized_flavor = normalize(&self.flavor_text);

        let mut rules = normalize(&self.rules_text);
        if !self.normalized_name.is_empty() {
            rules = rules.replace(&self.normalized_name, THIS);
            if legendary {
                let short = legend_short_name(&self.normalized_name);
                if !short.is_empty() {
                    rules = rules.replace(short, THIS);
                }
            }
        }
        self.normalized_rules = rules;
    }
}

/// An immutable card record.
///
/// Equality and hashing use only the [`CardId`].
///
/// ## Example
///
/// ```
/// use deck_editor::cards::{Card, CardId, Expansion, Face, ManaCost, Rarity};
///
/// let bolt = Card::new(
///     CardId::new("bolt-m10"),
///     Expansion::new("Magic 2010", "M10"),
///     Rarity::Common,
///     vec![Face::new("Lightning Bolt")
///         .with_mana_cost(ManaCost::parse("{R}").unwrap())
///         .with_types(["Instant"])
///         .with_rules_text("Lightning Bolt deals 3 damage to any target.")],
/// );
///
/// assert_eq!(bolt.mana_value(), 1.0);
/// assert_eq!(bolt.faces()[0].normalized_rules_text(), "~ deals 3 damage to any target.");
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Card {
    id: CardId,
    layout: CardLayout,
    faces: SmallVec<[Face; 2]>,
    mana_value: f64,
    color_identity: ColorSet,
    expansion: Arc<Expansion>,
    rarity: Rarity,
    legality: BTreeMap<String, Legality>,
    multiverse_id: Option<u32>,
    is_land: bool,
    ignores_count_restriction: bool,
}

impl Card {
    /// Create a card from its faces.
    ///
    /// Mana value defaults to the sum of the faces' costs and color identity
    /// to the union of their colors; override with the builder methods.
    ///
    /// Panics if `faces` is empty.
    #[must_use]
    pub fn new(id: CardId, expansion: impl Into<Arc<Expansion>>, rarity: Rarity, faces: Vec<Face>) -> Self {
        assert!(!faces.is_empty(), "a card needs at least one face");
        let mut faces: SmallVec<[Face; 2]> = faces.into_iter().collect();
        for face in &mut faces {
            let legendary = face.supertypes.iter().any(|s| s.eq_ignore_ascii_case("legendary"));
            face.finish(legendary);
        }

        let mana_value = faces.iter().map(|f| f.mana_cost.mana_value()).sum();
        let color_identity = faces.iter().fold(ColorSet::COLORLESS, |set, f| {
            set.union(f.colors).union(f.mana_cost.colors())
        });
        let is_land = faces
            .iter()
            .any(|f| f.types.iter().any(|t| t.eq_ignore_ascii_case("land")));
        let ignores_count_restriction = faces.iter().any(|f| {
            f.supertypes.iter().any(|s| s.eq_ignore_ascii_case("basic"))
                || f.rules_text.to_lowercase().contains("a deck can have any number")
        });
        let layout = if faces.len() > 1 {
            CardLayout::Split
        } else {
            CardLayout::Normal
        };

        Self {
            id,
            layout,
            faces,
            mana_value,
            color_identity,
            expansion: expansion.into(),
            rarity,
            legality: BTreeMap::new(),
            multiverse_id: None,
            is_land,
            ignores_count_restriction,
        }
    }

    #[must_use]
    pub fn with_layout(mut self, layout: CardLayout) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_mana_value(mut self, mana_value: f64) -> Self {
        self.mana_value = mana_value;
        self
    }

    #[must_use]
    pub fn with_color_identity(mut self, identity: ColorSet) -> Self {
        self.color_identity = identity;
        self
    }

    /// Set legality in one format (builder pattern).
    #[must_use]
    pub fn with_legality(mut self, format: impl Into<String>, legality: Legality) -> Self {
        self.legality.insert(format.into().to_ascii_lowercase(), legality);
        self
    }

    #[must_use]
    pub fn with_multiverse_id(mut self, id: u32) -> Self {
        self.multiverse_id = Some(id);
        self
    }

    #[must_use]
    pub fn id(&self) -> &CardId {
        &self.id
    }

    #[must_use]
    pub fn layout(&self) -> CardLayout {
        self.layout
    }

    #[must_use]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Face names joined by ` // `.
    #[must_use]
    pub fn unified_name(&self) -> String {
        self.faces
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join(FACE_SEPARATOR)
    }

    #[must_use]
    pub fn mana_value(&self) -> f64 {
        self.mana_value
    }

    /// Union of all faces' colors.
    #[must_use]
    pub fn colors(&self) -> ColorSet {
        self.faces
            .iter()
            .fold(ColorSet::COLORLESS, |set, f| set.union(f.colors))
    }

    #[must_use]
    pub fn color_identity(&self) -> ColorSet {
        self.color_identity
    }

    #[must_use]
    pub fn expansion(&self) -> &Expansion {
        &self.expansion
    }

    #[must_use]
    pub fn rarity(&self) -> Rarity {
        self.rarity
    }

    #[must_use]
    pub fn legality(&self) -> &BTreeMap<String, Legality> {
        &self.legality
    }

    /// Legality in a format; formats the card has no entry for are not legal.
    #[must_use]
    pub fn legality_in(&self, format: &str) -> Legality {
        self.legality
            .get(&format.to_ascii_lowercase())
            .copied()
            .unwrap_or(Legality::NotLegal)
    }

    /// Formats in which the card is legal or restricted.
    pub fn legal_in(&self) -> impl Iterator<Item = &str> {
        self.legality
            .iter()
            .filter(|(_, l)| l.is_legal())
            .map(|(f, _)| f.as_str())
    }

    #[must_use]
    pub fn multiverse_id(&self) -> Option<u32> {
        self.multiverse_id
    }

    /// Whether any face has the Land type.
    #[must_use]
    pub fn is_land(&self) -> bool {
        self.is_land
    }

    /// Whether any face has the given card type (case-insensitive).
    #[must_use]
    pub fn type_contains(&self, card_type: &str) -> bool {
        self.faces
            .iter()
            .any(|f| f.types.iter().any(|t| t.eq_ignore_ascii_case(card_type)))
    }

    /// Basic lands and cards that say "a deck can have any number".
    #[must_use]
    pub fn ignores_count_restriction(&self) -> bool {
        self.ignores_count_restriction
    }
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Card {}

impl Hash for Card {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.unified_name())
    }
}

/// Lowercase and replace typographic characters with ASCII equivalents.
#[must_use]
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2012}'..='\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            'Æ' | 'æ' => out.push_str("ae"),
            'á' | 'à' | 'â' | 'ä' => out.push('a'),
            'é' | 'è' | 'ê' => out.push('e'),
            'í' => out.push('i'),
            'ó' | 'ö' => out.push('o'),
            'ú' | 'û' | 'ü' => out.push('u'),
            _ => out.extend(c.to_lowercase()),
        }
    }
    out
}

/// Shortened name legendary cards use to refer to themselves
/// ("Isamaru, Hound of Konda" -> "isamaru").
fn legend_short_name(name: &str) -> &str {
    if let Some(comma) = name.find(',') {
        return name[..comma].trim();
    }
    match name.find("the ") {
        Some(0) => name,
        Some(i) => name[..i].trim(),
        None => match name.find(" of ") {
            Some(i) => name[..i].trim(),
            None => name,
        },
    }
}

fn build_type_line(
    supertypes: &BTreeSet<String>,
    types: &BTreeSet<String>,
    subtypes: &BTreeSet<String>,
) -> String {
    let front: Vec<&str> = supertypes
        .iter()
        .chain(types.iter())
        .map(String::as_str)
        .collect();
    let mut line = front.join(" ");
    if !subtypes.is_empty() {
        let back: Vec<&str> = subtypes.iter().map(String::as_str).collect();
        line.push_str(" \u{2014} ");
        line.push_str(&back.join(" "));
    }
    line
}
