//! The card inventory.
//!
//! `Inventory` stores every card known to the editor and provides lookup by
//! `CardId`, predicate search and filter search. Its `InventoryIndex` holds
//! the sorted lists of expansion names, blocks, formats and observed type
//! values; it is built once when the inventory is created and is read-only
//! afterwards.

use std::collections::BTreeSet;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::definition::{Card, CardId};
use super::attributes::Expansion;
use crate::filter::Filter;

/// Sorted value lists observed in an inventory.
///
/// Used to auto-complete and validate option-style filter operands.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InventoryIndex {
    pub expansions: Vec<Expansion>,
    pub expansion_names: Vec<String>,
    pub blocks: Vec<String>,
    pub supertypes: Vec<String>,
    pub types: Vec<String>,
    pub subtypes: Vec<String>,
    pub formats: Vec<String>,
}

impl InventoryIndex {
    /// Collect the index from a set of cards.
    pub fn build<'a>(cards: impl IntoIterator<Item = &'a Card>) -> Self {
        let mut expansions = BTreeSet::new();
        let mut blocks = BTreeSet::new();
        let mut supertypes = BTreeSet::new();
        let mut types = BTreeSet::new();
        let mut subtypes = BTreeSet::new();
        let mut formats = BTreeSet::new();

        for card in cards {
            expansions.insert(card.expansion().clone());
            blocks.insert(card.expansion().block.clone());
            formats.extend(card.legality().keys().cloned());
            for face in card.faces() {
                supertypes.extend(face.supertypes.iter().cloned());
                types.extend(face.types.iter().cloned());
                subtypes.extend(face.subtypes.iter().cloned());
            }
        }

        let mut expansion_names: Vec<String> = expansions.iter().map(|e| e.name.clone()).collect();
        expansion_names.sort();
        expansion_names.dedup();

        Self {
            expansions: expansions.into_iter().collect(),
            expansion_names,
            blocks: blocks.into_iter().collect(),
            supertypes: supertypes.into_iter().collect(),
            types: types.into_iter().collect(),
            subtypes: subtypes.into_iter().collect(),
            formats: formats.into_iter().collect(),
        }
    }
}

/// All cards known to the editor.
///
/// ## Example
///
/// ```
/// use deck_editor::cards::{Card, CardId, Expansion, Face, Inventory, Rarity};
///
/// let card = Card::new(CardId::new("a"), Expansion::new("Alpha", "LEA"), Rarity::Rare, vec![Face::new("Mox Pearl")]);
/// let inventory = Inventory::new(vec![card]);
///
/// assert_eq!(inventory.get(&CardId::new("a")).unwrap().unified_name(), "Mox Pearl");
/// assert_eq!(inventory.index().expansion_names, vec!["Alpha".to_string()]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Inventory {
    cards: Vec<Arc<Card>>,
    by_id: FxHashMap<CardId, usize>,
    index: InventoryIndex,
}

impl Inventory {
    /// Create an inventory. Later cards with an already-seen id are dropped.
    #[must_use]
    pub fn new(cards: Vec<Card>) -> Self {
        let mut unique = Vec::with_capacity(cards.len());
        let mut by_id = FxHashMap::default();
        for card in cards {
            if by_id.contains_key(card.id()) {
                continue;
            }
            by_id.insert(card.id().clone(), unique.len());
            unique.push(Arc::new(card));
        }
        let index = InventoryIndex::build(unique.iter().map(|c| c.as_ref()));
        Self {
            cards: unique,
            by_id,
            index,
        }
    }

    /// Get a card by ID.
    #[must_use]
    pub fn get(&self, id: &CardId) -> Option<&Arc<Card>> {
        self.by_id.get(id).map(|&i| &self.cards[i])
    }

    /// Get the card at a position in inventory order.
    #[must_use]
    pub fn get_at(&self, index: usize) -> Option<&Arc<Card>> {
        self.cards.get(index)
    }

    #[must_use]
    pub fn contains(&self, id: &CardId) -> bool {
        self.by_id.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterate over all cards in inventory order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Card>> {
        self.cards.iter()
    }

    /// Value lists for operand auto-completion.
    #[must_use]
    pub fn index(&self) -> &InventoryIndex {
        &self.index
    }

    /// Find cards matching a predicate.
    pub fn find<F>(&self, predicate: F) -> impl Iterator<Item = &Arc<Card>>
    where
        F: Fn(&Card) -> bool,
    {
        self.cards.iter().filter(move |c| predicate(c))
    }

    /// Find cards matching a filter.
    pub fn filter<'a>(&'a self, filter: &'a Filter) -> impl Iterator<Item = &'a Arc<Card>> + 'a {
        self.cards.iter().filter(move |c| filter.matches(c))
    }
}

impl FromIterator<Card> for Inventory {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Face, Legality, Rarity};

    fn card(id: &str, name: &str, set: &str, types: &[&str]) -> Card {
        Card::new(
            CardId::new(id),
            Expansion::new(set, &set[..3]).with_block("Core"),
            Rarity::Common,
            vec![Face::new(name).with_types(types.iter().copied())],
        )
        .with_legality("modern", Legality::Legal)
    }

    #[test]
    fn test_lookup() {
        let inventory = Inventory::new(vec![
            card("1", "Goblin", "Alpha", &["Creature"]),
            card("2", "Bolt", "Beta", &["Instant"]),
        ]);

        assert_eq!(inventory.len(), 2);
        assert!(inventory.contains(&CardId::new("1")));
        assert!(inventory.get(&CardId::new("99")).is_none());
        assert_eq!(inventory.get_at(1).unwrap().unified_name(), "Bolt");
    }

    #[test]
    fn test_duplicate_ids_dropped() {
        let inventory = Inventory::new(vec![
            card("1", "First", "Alpha", &["Creature"]),
            card("1", "Second", "Alpha", &["Creature"]),
        ]);
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory.get(&CardId::new("1")).unwrap().unified_name(), "First");
    }

    #[test]
    fn test_index() {
        let inventory = Inventory::new(vec![
            card("1", "Goblin", "Beta", &["Creature"]),
            card("2", "Bolt", "Alpha", &["Instant"]),
            card("3", "Orc", "Alpha", &["Creature"]),
        ]);
        let index = inventory.index();
        assert_eq!(index.expansion_names, vec!["Alpha", "Beta"]);
        assert_eq!(index.types, vec!["Creature", "Instant"]);
        assert_eq!(index.blocks, vec!["Core"]);
        assert_eq!(index.formats, vec!["modern"]);
    }

    #[test]
    fn test_find_with_predicate() {
        let inventory = Inventory::new(vec![
            card("1", "Goblin", "Alpha", &["Creature"]),
            card("2", "Bolt", "Alpha", &["Instant"]),
        ]);
        let creatures: Vec<_> = inventory.find(|c| c.type_contains("creature")).collect();
        assert_eq!(creatures.len(), 1);
        assert_eq!(creatures[0].unified_name(), "Goblin");
    }
}
