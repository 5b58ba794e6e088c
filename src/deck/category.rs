//! Deck categories.
//!
//! A category is a named view of a deck: a [`Filter`] plus a whitelist of
//! cards forced in and a blacklist of cards forced out. Categories are owned
//! by their [`Deck`](super::Deck); [`CategorySpec`] is the detached form used
//! for presets and files, and [`CategoryView`] is a borrowed view of a live
//! category together with its deck.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use im::{HashSet, Vector};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::deck::{saturating_sum, Deck};
use crate::cards::{Card, CardId};
use crate::filter::Filter;

/// Identifier of a category within one deck.
///
/// Ids are handed out in creation order and never reused, so iterating
/// categories by id gives creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryId(pub u32);

/// Display color of a category, written as `#RRGGBB`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CategoryColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl CategoryColor {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for CategoryColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for CategoryColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("expected a #RRGGBB color, got \"{s}\""));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl Serialize for CategoryColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CategoryColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Detached category definition.
///
/// This is the structured form stored in deck files and preset libraries:
/// `{"name", "filter", "whitelist": [ids], "blacklist": [ids], "color"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub name: String,
    pub filter: Filter,
    #[serde(default)]
    pub whitelist: Vec<CardId>,
    #[serde(default)]
    pub blacklist: Vec<CardId>,
    #[serde(default)]
    pub color: CategoryColor,
}

impl CategorySpec {
    /// Create a definition with empty whitelist and blacklist.
    #[must_use]
    pub fn new(name: impl Into<String>, filter: Filter) -> Self {
        Self {
            name: name.into(),
            filter,
            whitelist: Vec::new(),
            blacklist: Vec::new(),
            color: CategoryColor::default(),
        }
    }

    #[must_use]
    pub fn with_whitelist(mut self, ids: impl IntoIterator<Item = CardId>) -> Self {
        self.whitelist = ids.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_blacklist(mut self, ids: impl IntoIterator<Item = CardId>) -> Self {
        self.blacklist = ids.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: CategoryColor) -> Self {
        self.color = color;
        self
    }
}

/// A category owned by a deck.
#[derive(Clone, Debug)]
pub struct Category {
    pub(crate) id: CategoryId,
    pub(crate) name: String,
    pub(crate) color: CategoryColor,
    pub(crate) filter: Filter,
    pub(crate) whitelist: HashSet<CardId>,
    pub(crate) blacklist: HashSet<CardId>,
    /// Ids of included deck cards, in deck order.
    pub(crate) filtrate: Vector<CardId>,
}

impl Category {
    /// Build from a definition. A card listed in both lists stays blacklisted.
    pub(crate) fn from_spec(id: CategoryId, spec: CategorySpec) -> Self {
        let blacklist: HashSet<CardId> = spec.blacklist.into_iter().collect();
        let whitelist = spec
            .whitelist
            .into_iter()
            .filter(|card| !blacklist.contains(card))
            .collect();
        Self {
            id,
            name: spec.name,
            color: spec.color,
            filter: spec.filter,
            whitelist,
            blacklist,
            filtrate: Vector::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> CategoryId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn color(&self) -> CategoryColor {
        self.color
    }

    #[must_use]
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    #[must_use]
    pub fn whitelist(&self) -> &HashSet<CardId> {
        &self.whitelist
    }

    #[must_use]
    pub fn blacklist(&self) -> &HashSet<CardId> {
        &self.blacklist
    }

    /// Effective membership: not blacklisted, and matched or whitelisted.
    #[must_use]
    pub fn includes(&self, card: &Card) -> bool {
        !self.blacklist.contains(card.id())
            && (self.whitelist.contains(card.id()) || self.filter.matches(card))
    }

    /// Force a card in. Returns whether either list changed.
    pub(crate) fn include(&mut self, card: &Card) -> bool {
        let mut changed = self.blacklist.remove(card.id()).is_some();
        if !self.filter.matches(card) {
            changed |= self.whitelist.insert(card.id().clone()).is_none();
        }
        changed
    }

    /// Force a card out. Returns whether either list changed.
    pub(crate) fn exclude(&mut self, card: &Card) -> bool {
        let mut changed = self.whitelist.remove(card.id()).is_some();
        if self.filter.matches(card) {
            changed |= self.blacklist.insert(card.id().clone()).is_none();
        }
        changed
    }

    /// Drop every trace of a card that left the deck.
    pub(crate) fn forget(&mut self, id: &CardId) {
        self.whitelist.remove(id);
        self.blacklist.remove(id);
        if let Some(i) = self.filtrate.index_of(id) {
            self.filtrate.remove(i);
        }
    }

    /// Detach into a definition.
    #[must_use]
    pub fn to_spec(&self) -> CategorySpec {
        let mut whitelist: Vec<CardId> = self.whitelist.iter().cloned().collect();
        let mut blacklist: Vec<CardId> = self.blacklist.iter().cloned().collect();
        whitelist.sort();
        blacklist.sort();
        CategorySpec {
            name: self.name.clone(),
            filter: self.filter.clone(),
            whitelist,
            blacklist,
            color: self.color,
        }
    }
}

/// A category seen through its deck.
///
/// Counts and cards come from the deck's entries; only cards the category
/// includes are visible.
#[derive(Clone, Copy)]
pub struct CategoryView<'a> {
    deck: &'a Deck,
    category: &'a Category,
}

impl<'a> CategoryView<'a> {
    pub(crate) fn new(deck: &'a Deck, category: &'a Category) -> Self {
        Self { deck, category }
    }

    #[must_use]
    pub fn category(&self) -> &'a Category {
        self.category
    }

    #[must_use]
    pub fn id(&self) -> CategoryId {
        self.category.id
    }

    #[must_use]
    pub fn name(&self) -> &'a str {
        &self.category.name
    }

    #[must_use]
    pub fn color(&self) -> CategoryColor {
        self.category.color
    }

    #[must_use]
    pub fn filter(&self) -> &'a Filter {
        &self.category.filter
    }

    #[must_use]
    pub fn includes(&self, card: &Card) -> bool {
        self.category.includes(card)
    }

    /// Number of distinct cards in the view.
    #[must_use]
    pub fn size(&self) -> usize {
        self.category.filtrate.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.category.filtrate.is_empty()
    }

    /// Number of copies of all cards in the view.
    #[must_use]
    pub fn total(&self) -> u32 {
        saturating_sum(self.category.filtrate.iter().map(|id| self.deck.count(id)))
    }

    /// Card at a position of the view.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'a Arc<Card>> {
        let id = self.category.filtrate.get(index)?;
        self.deck.card(id)
    }

    #[must_use]
    pub fn index_of(&self, id: &CardId) -> Option<usize> {
        self.category.filtrate.index_of(id)
    }

    #[must_use]
    pub fn contains(&self, id: &CardId) -> bool {
        self.category.filtrate.contains(id)
    }

    /// Copies of a card in the view; 0 when the category excludes it.
    #[must_use]
    pub fn count(&self, id: &CardId) -> u32 {
        if self.contains(id) {
            self.deck.count(id)
        } else {
            0
        }
    }

    /// Cards in the view, in deck order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Arc<Card>> + 'a {
        let deck = self.deck;
        self.category.filtrate.iter().filter_map(move |id| deck.card(id))
    }
}

impl fmt::Debug for CategoryView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryView")
            .field("name", &self.category.name)
            .field("size", &self.size())
            .finish()
    }
}
