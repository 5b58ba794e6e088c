//! The deck: card entries plus categories.
//!
//! ## Key Types
//!
//! - `Entry`: A card and its number of copies (always at least one)
//! - `Deck`: Ordered entries, categories, and the card-to-category index
//!
//! Every mutation keeps two derived structures current: each category's
//! filtrate (the ids of included deck cards, in deck order) and the reverse
//! index from each deck card to the categories that include it. For every
//! card in the deck, its index row is exactly the set of categories whose
//! `includes` holds.
//!
//! All collections are persistent (`im`), so cloning a deck for an undo
//! snapshot shares structure with the original.

use std::sync::Arc;

use im::{HashMap, OrdSet, Vector};

use super::category::{Category, CategoryColor, CategoryId, CategorySpec, CategoryView};
use crate::cards::{Card, CardId};
use crate::error::{DeckError, DeckResult};
use crate::filter::Filter;

/// A card in a deck and how many copies of it there are.
#[derive(Clone, Debug)]
pub struct Entry {
    card: Arc<Card>,
    count: u32,
}

impl Entry {
    #[must_use]
    pub fn card(&self) -> &Arc<Card> {
        &self.card
    }

    #[must_use]
    pub fn id(&self) -> &CardId {
        self.card.id()
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }
}

/// A deck list with categories.
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use deck_editor::cards::{Card, CardId, Expansion, Face, Rarity};
/// use deck_editor::deck::{CategorySpec, Deck};
/// use deck_editor::filter::{CardAttribute, Containment, Filter};
///
/// let forest = Arc::new(Card::new(
///     CardId::new("forest"),
///     Expansion::new("Alpha", "LEA"),
///     Rarity::BasicLand,
///     vec![Face::new("Forest").with_supertypes(["Basic"]).with_types(["Land"])],
/// ));
///
/// let mut deck = Deck::new();
/// let lands = Filter::options(CardAttribute::CardType, Containment::AnyOf, ["Land"]).unwrap();
/// deck.add_category(CategorySpec::new("Lands", lands)).unwrap();
/// deck.add(&forest, 4);
///
/// assert_eq!(deck.land(), 4);
/// assert_eq!(deck.category("Lands").unwrap().total(), 4);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Deck {
    entries: Vector<Entry>,
    /// In creation order.
    categories: Vector<Category>,
    memberships: HashMap<CardId, OrdSet<CategoryId>>,
    /// Position of each card in `entries`.
    positions: HashMap<CardId, usize>,
    next_category: u32,
}

impl Deck {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, id: &CardId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    fn category_index(&self, name: &str) -> DeckResult<usize> {
        self.categories
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| DeckError::CategoryNotFound(name.to_string()))
    }

    /// Add copies of a card. Returns false (and does nothing) when `n` is 0
    /// or the card's count would overflow.
    pub fn add(&mut self, card: &Arc<Card>, n: u32) -> bool {
        if n == 0 {
            return false;
        }
        match self.position(card.id()) {
            Some(i) => {
                let Some(count) = self.entries[i].count.checked_add(n) else {
                    tracing::debug!(card = %card.id(), copies = n, "Refused add, count would overflow");
                    return false;
                };
                self.entries[i].count = count;
            }
            None => {
                self.positions.insert(card.id().clone(), self.entries.len());
                self.entries.push_back(Entry {
                    card: Arc::clone(card),
                    count: n,
                });
                let mut row = OrdSet::new();
                for category in self.categories.iter_mut() {
                    if category.includes(card) {
                        category.filtrate.push_back(card.id().clone());
                        row.insert(category.id);
                    }
                }
                self.memberships.insert(card.id().clone(), row);
            }
        }
        tracing::trace!(card = %card.id(), copies = n, "Added to deck");
        true
    }

    /// Add `n` copies of each card. Returns whether the deck changed.
    pub fn add_all<'a>(&mut self, cards: impl IntoIterator<Item = &'a Arc<Card>>, n: u32) -> bool {
        let mut changed = false;
        for card in cards {
            changed |= self.add(card, n);
        }
        changed
    }

    /// Remove up to `n` copies of a card. Returns the number actually removed.
    pub fn remove(&mut self, id: &CardId, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        let Some(i) = self.position(id) else {
            return 0;
        };
        let count = self.entries[i].count;
        let removed = n.min(count);
        if removed == count {
            self.entries.remove(i);
            self.positions.remove(id);
            for (j, entry) in self.entries.iter().enumerate().skip(i) {
                self.positions.insert(entry.card.id().clone(), j);
            }
            self.memberships.remove(id);
            for category in self.categories.iter_mut() {
                category.forget(id);
            }
        } else {
            self.entries[i].count -= removed;
        }
        tracing::trace!(card = %id, copies = removed, "Removed from deck");
        removed
    }

    /// Set the number of copies of a card, adding or removing its entry as
    /// needed. Returns whether the count changed.
    pub fn set_count(&mut self, card: &Arc<Card>, n: u32) -> bool {
        let Some(i) = self.position(card.id()) else {
            return self.add(card, n);
        };
        let count = self.entries[i].count;
        if count == n {
            false
        } else if n == 0 {
            self.remove(card.id(), count);
            true
        } else {
            self.entries[i].count = n;
            true
        }
    }

    /// [`Deck::set_count`] for the entry at `index`. False when out of range.
    pub fn set_count_at(&mut self, index: usize, n: u32) -> bool {
        match self.get(index).cloned() {
            Some(card) => self.set_count(&card, n),
            None => false,
        }
    }

    /// Remove every card and every category.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.categories.clear();
        self.memberships.clear();
        self.positions.clear();
    }

    #[must_use]
    pub fn count(&self, id: &CardId) -> u32 {
        self.entry(id).map_or(0, Entry::count)
    }

    #[must_use]
    pub fn count_at(&self, index: usize) -> u32 {
        self.entries.get(index).map_or(0, Entry::count)
    }

    /// Card at a position in the deck list.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<Card>> {
        self.entries.get(index).map(Entry::card)
    }

    /// Card with the given id, if it is in the deck.
    #[must_use]
    pub fn card(&self, id: &CardId) -> Option<&Arc<Card>> {
        self.entry(id).map(Entry::card)
    }

    #[must_use]
    pub fn entry(&self, id: &CardId) -> Option<&Entry> {
        self.position(id).and_then(|i| self.entries.get(i))
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn index_of(&self, id: &CardId) -> Option<usize> {
        self.position(id)
    }

    #[must_use]
    pub fn contains(&self, id: &CardId) -> bool {
        self.position(id).is_some()
    }

    /// Number of distinct cards.
    #[must_use]
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of copies of all cards, saturating at `u32::MAX`.
    #[must_use]
    pub fn total(&self) -> u32 {
        saturating_sum(self.entries.iter().map(Entry::count))
    }

    /// Number of copies of land cards.
    #[must_use]
    pub fn land(&self) -> u32 {
        saturating_sum(self.entries.iter().filter(|e| e.card.is_land()).map(Entry::count))
    }

    #[must_use]
    pub fn nonland(&self) -> u32 {
        saturating_sum(self.entries.iter().filter(|e| !e.card.is_land()).map(Entry::count))
    }

    /// Cards in deck order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Card>> {
        self.entries.iter().map(Entry::card)
    }

    /// Add a category and compute its view of the current entries.
    pub fn add_category(&mut self, spec: CategorySpec) -> DeckResult<CategoryId> {
        if self.contains_category(&spec.name) {
            return Err(DeckError::DuplicateCategoryName(spec.name));
        }
        let id = CategoryId(self.next_category);
        self.next_category += 1;
        self.categories.push_back(Category::from_spec(id, spec));
        let index = self.categories.len() - 1;
        self.refresh(index);
        tracing::debug!(
            category = %self.categories[index].name,
            cards = self.categories[index].filtrate.len(),
            "Added category"
        );
        Ok(id)
    }

    /// Remove a category. Returns false when no category has the name.
    pub fn remove_category(&mut self, name: &str) -> bool {
        let Ok(index) = self.category_index(name) else {
            return false;
        };
        let category = self.categories.remove(index);
        let ids: Vec<CardId> = self.memberships.keys().cloned().collect();
        for id in ids {
            if let Some(row) = self.memberships.get_mut(&id) {
                row.remove(&category.id);
            }
        }
        tracing::debug!(category = %name, "Removed category");
        true
    }

    #[must_use]
    pub fn contains_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.name == name)
    }

    /// Look up a category by name; `None` means no such category.
    #[must_use]
    pub fn category(&self, name: &str) -> Option<CategoryView<'_>> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| CategoryView::new(self, c))
    }

    #[must_use]
    pub fn category_by_id(&self, id: CategoryId) -> Option<CategoryView<'_>> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| CategoryView::new(self, c))
    }

    /// Categories in creation order.
    pub fn categories(&self) -> impl Iterator<Item = CategoryView<'_>> {
        self.categories.iter().map(move |c| CategoryView::new(self, c))
    }

    #[must_use]
    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    /// Categories that include a deck card; empty for cards not in the deck.
    #[must_use]
    pub fn categories_of(&self, id: &CardId) -> Vec<CategoryView<'_>> {
        self.memberships
            .get(id)
            .map(|row| row.iter().filter_map(|&c| self.category_by_id(c)).collect())
            .unwrap_or_default()
    }

    /// Force a card into a category. Returns whether the category changed.
    pub fn include(&mut self, category: &str, card: &Card) -> DeckResult<bool> {
        let index = self.category_index(category)?;
        let changed = self.categories[index].include(card);
        if changed {
            self.refresh(index);
            tracing::trace!(category, card = %card.id(), "Included card");
        }
        Ok(changed)
    }

    /// Force a card out of a category. Returns whether the category changed.
    pub fn exclude(&mut self, category: &str, card: &Card) -> DeckResult<bool> {
        let index = self.category_index(category)?;
        let changed = self.categories[index].exclude(card);
        if changed {
            self.refresh(index);
            tracing::trace!(category, card = %card.id(), "Excluded card");
        }
        Ok(changed)
    }

    /// Rename a category and replace its filter.
    ///
    /// Fails with [`DeckError::DuplicateCategoryName`] if another category
    /// already uses `new_name`. Returns whether anything changed.
    pub fn edit_category(&mut self, name: &str, new_name: &str, filter: Filter) -> DeckResult<bool> {
        let index = self.category_index(name)?;
        if new_name != name && self.contains_category(new_name) {
            return Err(DeckError::DuplicateCategoryName(new_name.to_string()));
        }
        let category = &mut self.categories[index];
        if category.name == new_name && category.filter == filter {
            return Ok(false);
        }
        category.name = new_name.to_string();
        category.filter = filter;
        self.refresh(index);
        tracing::debug!(category = %name, new_name, "Edited category");
        Ok(true)
    }

    /// Rename a category, keeping its filter.
    pub fn rename_category(&mut self, name: &str, new_name: &str) -> DeckResult<bool> {
        let index = self.category_index(name)?;
        let filter = self.categories[index].filter.clone();
        self.edit_category(name, new_name, filter)
    }

    pub fn set_category_color(&mut self, name: &str, color: CategoryColor) -> DeckResult<bool> {
        let index = self.category_index(name)?;
        let category = &mut self.categories[index];
        let changed = category.color != color;
        category.color = color;
        Ok(changed)
    }

    /// Recompute one category's filtrate and its column of the index.
    fn refresh(&mut self, index: usize) {
        let category = &mut self.categories[index];
        let mut filtrate = Vector::new();
        for entry in self.entries.iter() {
            let id = entry.card.id();
            let included = category.includes(&entry.card);
            if included {
                filtrate.push_back(id.clone());
            }
            if let Some(row) = self.memberships.get_mut(id) {
                if included {
                    row.insert(category.id);
                } else {
                    row.remove(&category.id);
                }
            }
        }
        category.filtrate = filtrate;
    }
}

/// Sum of copy counts, saturating at `u32::MAX`.
pub(crate) fn saturating_sum(counts: impl Iterator<Item = u32>) -> u32 {
    counts.fold(0, u32::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Expansion, Face, Rarity};
    use crate::filter::{CardAttribute, Containment};

    fn card(id: &str, types: &[&str]) -> Arc<Card> {
        Arc::new(Card::new(
            CardId::new(id),
            Expansion::new("Alpha", "LEA"),
            Rarity::Common,
            vec![Face::new(id).with_types(types.iter().copied())],
        ))
    }

    fn type_filter(card_type: &str) -> Filter {
        Filter::options(CardAttribute::CardType, Containment::AnyOf, [card_type]).unwrap()
    }

    fn assert_index_consistent(deck: &Deck) {
        for card in deck.iter() {
            let indexed: Vec<CategoryId> = deck.categories_of(card.id()).iter().map(|c| c.id()).collect();
            let expected: Vec<CategoryId> = deck
                .categories()
                .filter(|c| c.includes(card))
                .map(|c| c.id())
                .collect();
            assert_eq!(indexed, expected, "index row for {}", card.id());
            for view in deck.categories() {
                assert_eq!(view.contains(card.id()), view.includes(card));
            }
        }
    }

    #[test]
    fn test_add_then_remove() {
        let swamp = card("swamp", &["Land"]);
        let mut deck = Deck::new();
        assert!(deck.add(&swamp, 4));
        assert_eq!(deck.remove(swamp.id(), 1), 1);
        assert_eq!(deck.count(swamp.id()), 3);
        assert_eq!(deck.land(), 3);

        assert_eq!(deck.remove(swamp.id(), 5), 3);
        assert!(!deck.contains(swamp.id()));
        assert_eq!(deck.total(), 0);
    }

    #[test]
    fn test_zero_counts_are_no_ops() {
        let bear = card("bear", &["Creature"]);
        let mut deck = Deck::new();
        assert!(!deck.add(&bear, 0));
        assert!(deck.is_empty());
        assert_eq!(deck.remove(bear.id(), 0), 0);
        assert_eq!(deck.remove(&CardId::new("nope"), 3), 0);
    }

    #[test]
    fn test_set_count() {
        let bear = card("bear", &["Creature"]);
        let mut deck = Deck::new();
        assert!(deck.set_count(&bear, 2));
        assert!(!deck.set_count(&bear, 2));
        assert!(deck.set_count_at(0, 5));
        assert_eq!(deck.count_at(0), 5);
        assert!(deck.set_count(&bear, 0));
        assert!(deck.is_empty());
        assert!(!deck.set_count_at(0, 1));
    }

    #[test]
    fn test_positions() {
        let a = card("a", &["Creature"]);
        let b = card("b", &["Land"]);
        let mut deck = Deck::new();
        deck.add_all([&a, &b], 2);
        assert_eq!(deck.index_of(b.id()), Some(1));
        assert_eq!(deck.get(0).map(|c| c.id().clone()), Some(a.id().clone()));
        assert_eq!(deck.nonland(), 2);
        assert_eq!(deck.size(), 2);
    }

    #[test]
    fn test_whitelisted_card_leaves_with_deck() {
        let forest = card("forest", &["Land"]);
        let bear = card("bear", &["Creature"]);
        let mut deck = Deck::new();
        deck.add_all([&forest, &bear], 1);
        deck.add_category(CategorySpec::new("Lands", type_filter("Land"))).unwrap();

        assert!(deck.include("Lands", &bear).unwrap());
        let lands = deck.category("Lands").unwrap();
        assert!(lands.includes(&bear));
        assert_eq!(lands.size(), 2);
        assert_index_consistent(&deck);

        deck.remove(bear.id(), 1);
        let lands = deck.category("Lands").unwrap();
        assert!(!lands.contains(bear.id()));
        assert!(lands.category().whitelist().is_empty());
        assert_index_consistent(&deck);
    }

    #[test]
    fn test_rename_rules() {
        let mut deck = Deck::new();
        deck.add_category(CategorySpec::new("Lands", type_filter("Land"))).unwrap();
        deck.add_category(CategorySpec::new("Creatures", type_filter("Creature"))).unwrap();

        assert!(matches!(
            deck.rename_category("Lands", "Creatures"),
            Err(DeckError::DuplicateCategoryName(_))
        ));
        assert!(!deck.rename_category("Lands", "Lands").unwrap());
        assert!(deck.rename_category("Lands", "Mana").unwrap());
        assert!(deck.category("Lands").is_none());
        assert!(matches!(
            deck.rename_category("Lands", "X"),
            Err(DeckError::CategoryNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_category() {
        let mut deck = Deck::new();
        deck.add_category(CategorySpec::new("All", Filter::everything())).unwrap();
        assert!(matches!(
            deck.add_category(CategorySpec::new("All", Filter::nothing())),
            Err(DeckError::DuplicateCategoryName(_))
        ));
    }

    #[test]
    fn test_index_follows_every_mutation() {
        let forest = card("forest", &["Land"]);
        let bear = card("bear", &["Creature"]);
        let dryad = card("dryad", &["Land", "Creature"]);
        let mut deck = Deck::new();
        deck.add(&forest, 1);
        deck.add_category(CategorySpec::new("Lands", type_filter("Land"))).unwrap();
        deck.add(&bear, 2);
        deck.add_category(CategorySpec::new("Creatures", type_filter("Creature"))).unwrap();
        deck.add(&dryad, 1);
        assert_index_consistent(&deck);
        assert_eq!(deck.categories_of(dryad.id()).len(), 2);

        deck.exclude("Lands", &dryad).unwrap();
        assert_index_consistent(&deck);
        deck.edit_category("Creatures", "Beasts", type_filter("Land")).unwrap();
        assert_index_consistent(&deck);
        assert!(deck.remove_category("Lands"));
        assert!(!deck.remove_category("Lands"));
        assert_index_consistent(&deck);
        deck.remove(forest.id(), 1);
        assert_index_consistent(&deck);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let bear = card("bear", &["Creature"]);
        let mut deck = Deck::new();
        deck.add(&bear, 1);
        let snapshot = deck.clone();
        deck.add(&bear, 3);
        deck.add_category(CategorySpec::new("All", Filter::everything())).unwrap();
        assert_eq!(snapshot.total(), 1);
        assert_eq!(snapshot.category_count(), 0);
    }

    #[test]
    fn test_add_refuses_overflow() {
        let swamp = card("swamp", &["Land"]);
        let island = card("island", &["Land"]);
        let mut deck = Deck::new();
        assert!(deck.add(&swamp, u32::MAX));
        assert!(!deck.add(&swamp, 1));
        assert_eq!(deck.count(swamp.id()), u32::MAX);

        deck.add(&island, 5);
        deck.add_category(CategorySpec::new("Lands", type_filter("Land"))).unwrap();
        assert_eq!(deck.total(), u32::MAX);
        assert_eq!(deck.land(), u32::MAX);
        assert_eq!(deck.nonland(), 0);
        assert_eq!(deck.category("Lands").unwrap().total(), u32::MAX);
    }

    #[test]
    fn test_positions_follow_removal() {
        let cards: Vec<Arc<Card>> = ["a", "b", "c", "d"].iter().map(|id| card(id, &["Land"])).collect();
        let mut deck = Deck::new();
        deck.add_all(&cards, 2);
        deck.remove(cards[1].id(), 2);
        assert_eq!(deck.index_of(cards[0].id()), Some(0));
        assert_eq!(deck.index_of(cards[1].id()), None);
        assert_eq!(deck.index_of(cards[2].id()), Some(1));
        assert_eq!(deck.index_of(cards[3].id()), Some(2));
        for (i, card) in deck.iter().enumerate() {
            assert_eq!(deck.index_of(card.id()), Some(i));
            assert_eq!(deck.entry(card.id()).map(Entry::count), Some(2));
        }

        deck.add(&cards[1], 1);
        assert_eq!(deck.index_of(cards[1].id()), Some(3));
        deck.clear();
        assert!(!deck.contains(cards[0].id()));
    }
}
