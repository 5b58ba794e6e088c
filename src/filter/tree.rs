//! The filter tree.
//!
//! A [`Filter`] is either a [`FilterLeaf`] or a [`FilterGroup`] combining
//! child filters with AND/OR. Groups always hold at least one child; every
//! way of building or editing a group enforces that.
//!
//! `Filter` owns all of its data, so `clone()` produces a deep copy that
//! shares nothing mutable with the original.

use std::collections::BTreeSet;

use super::attribute::CardAttribute;
use super::leaf::FilterLeaf;
use super::mode::{Comparator, Containment, GroupMode, Mode};
use super::operand::{option_set, ColorOperand, LegalityOperand, Operand, TextOperand};
use crate::cards::{Card, ColorSet, InventoryIndex, ManaCost, Rarity};
use crate::error::{FilterError, FilterResult};

/// A group of filters combined with AND or OR.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FilterGroup {
    mode: GroupMode,
    children: Vec<Filter>,
}

impl FilterGroup {
    /// Create a group. Fails with [`FilterError::EmptyGroup`] if `children`
    /// is empty.
    pub fn new(mode: GroupMode, children: Vec<Filter>) -> FilterResult<Self> {
        if children.is_empty() {
            return Err(FilterError::EmptyGroup);
        }
        Ok(Self { mode, children })
    }

    #[must_use]
    pub fn mode(&self) -> GroupMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: GroupMode) {
        self.mode = mode;
    }

    #[must_use]
    pub fn children(&self) -> &[Filter] {
        &self.children
    }

    /// Mutable access to the children. The slice cannot change the count.
    pub fn children_mut(&mut self) -> &mut [Filter] {
        &mut self.children
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Append a child.
    pub fn push(&mut self, child: Filter) {
        self.children.push(child);
    }

    /// Remove and return the child at `index`.
    ///
    /// The last remaining child cannot be removed.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove(&mut self, index: usize) -> FilterResult<Filter> {
        if self.children.len() <= 1 {
            return Err(FilterError::EmptyGroup);
        }
        Ok(self.children.remove(index))
    }

    /// Replace the child at `index` with a new group containing it.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn wrap(&mut self, index: usize, mode: GroupMode) {
        let child = std::mem::replace(&mut self.children[index], Filter::nothing());
        self.children[index] = Filter::Group(FilterGroup {
            mode,
            children: vec![child],
        });
    }

    /// Short-circuit AND/OR over the children.
    #[must_use]
    pub fn matches(&self, card: &Card) -> bool {
        match self.mode {
            GroupMode::And => self.children.iter().all(|c| c.matches(card)),
            GroupMode::Or => self.children.iter().any(|c| c.matches(card)),
        }
    }
}

/// A predicate over cards.
///
/// ## Example
///
/// ```
/// use deck_editor::filter::{CardAttribute, Comparator, Containment, Filter};
///
/// let filter = Filter::options(CardAttribute::CardType, Containment::AnyOf, ["Creature"])
///     .unwrap()
///     .and(Filter::number(CardAttribute::ManaValue, Comparator::Le, 2.0).unwrap());
///
/// let text = filter.to_string();
/// assert_eq!(text, r"<AND <cardtype:a{Creature}> <cmc:\<=2>>");
/// assert_eq!(text.parse::<Filter>().unwrap(), filter);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Filter {
    Leaf(FilterLeaf),
    Group(FilterGroup),
}

impl Filter {
    /// Build a leaf filter from its parts.
    pub fn leaf(attribute: CardAttribute, mode: Mode, operand: Operand) -> FilterResult<Self> {
        FilterLeaf::new(attribute, mode, operand).map(Filter::Leaf)
    }

    /// Matches every card.
    #[must_use]
    pub fn everything() -> Self {
        Filter::Leaf(FilterLeaf::default_for(CardAttribute::Any))
    }

    /// Matches no card.
    #[must_use]
    pub fn nothing() -> Self {
        Filter::Leaf(FilterLeaf::default_for(CardAttribute::Nothing))
    }

    /// Search a text field for words, `"phrases"` or a `/regex/`.
    pub fn text(attribute: CardAttribute, containment: Containment, text: &str) -> FilterResult<Self> {
        let operand = TextOperand::new(text).map_err(|e| FilterError::operand(attribute.code(), text, e))?;
        Self::leaf(attribute, Mode::Contains(containment), Operand::Text(operand))
    }

    /// Test an option-style field (types, expansion, block).
    pub fn options<S: AsRef<str>>(
        attribute: CardAttribute,
        containment: Containment,
        values: impl IntoIterator<Item = S>,
    ) -> FilterResult<Self> {
        Self::leaf(
            attribute,
            Mode::Contains(containment),
            Operand::Options(option_set(values)),
        )
    }

    /// Test the card's rarity.
    #[must_use]
    pub fn rarity(containment: Containment, rarities: impl IntoIterator<Item = Rarity>) -> Self {
        Filter::Leaf(FilterLeaf::from_parts(
            CardAttribute::Rarity,
            Mode::Contains(containment),
            Operand::Rarities(rarities.into_iter().collect::<BTreeSet<_>>()),
        ))
    }

    /// Test colors or color identity.
    pub fn colors(
        attribute: CardAttribute,
        containment: Containment,
        colors: ColorSet,
        multicolored: bool,
    ) -> FilterResult<Self> {
        Self::leaf(
            attribute,
            Mode::Contains(containment),
            Operand::Colors(ColorOperand::new(colors, multicolored)),
        )
    }

    /// Test the mana cost of each face.
    #[must_use]
    pub fn mana_cost(containment: Containment, cost: ManaCost) -> Self {
        Filter::Leaf(FilterLeaf::from_parts(
            CardAttribute::ManaCost,
            Mode::Contains(containment),
            Operand::ManaCost(cost),
        ))
    }

    /// Compare a numeric field.
    pub fn number(attribute: CardAttribute, comparator: Comparator, value: f64) -> FilterResult<Self> {
        let operand =
            Operand::number(value).map_err(|e| FilterError::operand(attribute.code(), &value.to_string(), e))?;
        Self::leaf(attribute, Mode::Compare(comparator), operand)
    }

    /// Power, toughness or loyalty is absent on some face.
    pub fn missing(attribute: CardAttribute) -> FilterResult<Self> {
        Self::leaf(attribute, Mode::Missing, Operand::None)
    }

    /// Power, toughness or loyalty is variable on some face.
    pub fn variable(attribute: CardAttribute) -> FilterResult<Self> {
        Self::leaf(attribute, Mode::Variable, Operand::None)
    }

    /// Test the formats the card is legal (or restricted) in.
    #[must_use]
    pub fn legality<S: AsRef<str>>(
        containment: Containment,
        formats: impl IntoIterator<Item = S>,
        restricted: bool,
    ) -> Self {
        Filter::Leaf(FilterLeaf::from_parts(
            CardAttribute::Legality,
            Mode::Contains(containment),
            Operand::Legality(LegalityOperand::new(formats, restricted)),
        ))
    }

    /// Create an AND group.
    pub fn all_of(children: impl IntoIterator<Item = Filter>) -> FilterResult<Self> {
        FilterGroup::new(GroupMode::And, children.into_iter().collect()).map(Filter::Group)
    }

    /// Create an OR group.
    pub fn any_of(children: impl IntoIterator<Item = Filter>) -> FilterResult<Self> {
        FilterGroup::new(GroupMode::Or, children.into_iter().collect()).map(Filter::Group)
    }

    /// Add another filter with AND.
    #[must_use]
    pub fn and(self, other: Filter) -> Self {
        self.combine(GroupMode::And, other)
    }

    /// Add another filter with OR.
    #[must_use]
    pub fn or(self, other: Filter) -> Self {
        self.combine(GroupMode::Or, other)
    }

    fn combine(self, mode: GroupMode, other: Filter) -> Self {
        match self {
            Filter::Group(mut group) if group.mode == mode => {
                group.children.push(other);
                Filter::Group(group)
            }
            _ => Filter::Group(FilterGroup {
                mode,
                children: vec![self, other],
            }),
        }
    }

    /// Whether a card satisfies the filter.
    #[must_use]
    pub fn matches(&self, card: &Card) -> bool {
        match self {
            Filter::Leaf(leaf) => leaf.matches(card),
            Filter::Group(group) => group.matches(card),
        }
    }

    #[must_use]
    pub fn as_leaf(&self) -> Option<&FilterLeaf> {
        match self {
            Filter::Leaf(leaf) => Some(leaf),
            Filter::Group(_) => None,
        }
    }

    #[must_use]
    pub fn as_group(&self) -> Option<&FilterGroup> {
        match self {
            Filter::Group(group) => Some(group),
            Filter::Leaf(_) => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut FilterGroup> {
        match self {
            Filter::Group(group) => Some(group),
            Filter::Leaf(_) => None,
        }
    }

    pub fn as_leaf_mut(&mut self) -> Option<&mut FilterLeaf> {
        match self {
            Filter::Leaf(leaf) => Some(leaf),
            Filter::Group(_) => None,
        }
    }

    /// All leaves, depth first.
    #[must_use]
    pub fn leaves(&self) -> Vec<&FilterLeaf> {
        let mut leaves = Vec::new();
        let mut stack = vec![self];
        while let Some(filter) = stack.pop() {
            match filter {
                Filter::Leaf(leaf) => leaves.push(leaf),
                Filter::Group(group) => stack.extend(group.children.iter().rev()),
            }
        }
        leaves
    }

    /// Operand values the inventory has never seen, such as a misspelled
    /// subtype or a format no card is listed in.
    #[must_use]
    pub fn unknown_operands(&self, index: &InventoryIndex) -> Vec<(CardAttribute, String)> {
        let mut unknown = Vec::new();
        for leaf in self.leaves() {
            let Some(known) = leaf.attribute().options(index) else {
                continue;
            };
            let is_known = |value: &str| known.iter().any(|k| k.eq_ignore_ascii_case(value));
            let values: Vec<&str> = match leaf.operand() {
                Operand::Options(values) => values.iter().map(String::as_str).collect(),
                Operand::Legality(legality) => legality.formats().iter().map(String::as_str).collect(),
                _ => Vec::new(),
            };
            unknown.extend(
                values
                    .into_iter()
                    .filter(|v| !is_known(v))
                    .map(|v| (leaf.attribute(), v.to_string())),
            );
        }
        unknown
    }
}

impl Default for Filter {
    /// Matches every card, like a freshly created category.
    fn default() -> Self {
        Self::everything()
    }
}

impl From<FilterLeaf> for Filter {
    fn from(leaf: FilterLeaf) -> Self {
        Filter::Leaf(leaf)
    }
}

impl From<FilterGroup> for Filter {
    fn from(group: FilterGroup) -> Self {
        Filter::Group(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardId, Expansion, Face};

    fn goblin() -> Card {
        Card::new(
            CardId::new("gob"),
            Expansion::new("Onslaught", "ONS"),
            Rarity::Common,
            vec![Face::new("Goblin Piledriver")
                .with_mana_cost(ManaCost::parse("{1}{R}").unwrap())
                .with_types(["Creature"])
                .with_subtypes(["Goblin", "Warrior"])
                .with_stats("1", "2")],
        )
    }

    fn creature() -> Filter {
        Filter::options(CardAttribute::CardType, Containment::AnyOf, ["Creature"]).unwrap()
    }

    fn land() -> Filter {
        Filter::options(CardAttribute::CardType, Containment::AnyOf, ["Land"]).unwrap()
    }

    #[test]
    fn test_groups_short_circuit() {
        let card = goblin();
        assert!(creature().and(Filter::everything()).matches(&card));
        assert!(!creature().and(land()).matches(&card));
        assert!(land().or(creature()).matches(&card));
        assert!(!land().or(Filter::nothing()).matches(&card));
    }

    #[test]
    fn test_empty_group_rejected() {
        assert_eq!(Filter::all_of([]), Err(FilterError::EmptyGroup));
        assert_eq!(FilterGroup::new(GroupMode::Or, vec![]), Err(FilterError::EmptyGroup));
    }

    #[test]
    fn test_single_child_group_forwards() {
        let group = Filter::any_of([creature()]).unwrap();
        assert!(group.matches(&goblin()));
    }

    #[test]
    fn test_remove_never_empties() {
        let mut filter = creature().and(land());
        let group = filter.as_group_mut().unwrap();
        assert_eq!(group.remove(1).unwrap(), land());
        assert_eq!(group.remove(0), Err(FilterError::EmptyGroup));
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_and_chains_flatten() {
        let filter = creature().and(land()).and(Filter::everything());
        assert_eq!(filter.as_group().unwrap().len(), 3);
        let mixed = creature().and(land()).or(Filter::everything());
        assert_eq!(mixed.as_group().unwrap().len(), 2);
    }

    #[test]
    fn test_wrap() {
        let mut filter = creature().and(land());
        let group = filter.as_group_mut().unwrap();
        group.wrap(1, GroupMode::Or);
        group.set_mode(GroupMode::Or);
        let inner = group.children()[1].as_group().unwrap();
        assert_eq!(inner.mode(), GroupMode::Or);
        assert_eq!(inner.children(), &[land()]);
        assert!(filter.matches(&goblin()));
    }

    #[test]
    fn test_clone_is_independent() {
        let original = Filter::number(CardAttribute::ManaValue, Comparator::Eq, 2.0).unwrap();
        let mut copy = original.clone();
        copy.as_leaf_mut()
            .unwrap()
            .set_operand(Operand::Number(5.0))
            .unwrap();
        assert!(original.matches(&goblin()));
        assert!(!copy.matches(&goblin()));
        assert_ne!(original, copy);
    }

    #[test]
    fn test_typed_constructors_validate() {
        assert!(Filter::number(CardAttribute::Name, Comparator::Eq, 1.0).is_err());
        assert!(Filter::number(CardAttribute::Power, Comparator::Eq, f64::NAN).is_err());
        assert!(Filter::missing(CardAttribute::ManaValue).is_err());
        assert!(Filter::variable(CardAttribute::Toughness).is_ok());
        assert!(Filter::text(CardAttribute::RulesText, Containment::AnyOf, "/[/").is_err());
        assert!(Filter::colors(CardAttribute::Rarity, Containment::AnyOf, ColorSet::COLORLESS, false).is_err());
    }

    #[test]
    fn test_unknown_operands() {
        let index = InventoryIndex {
            subtypes: vec!["Goblin".into()],
            formats: vec!["modern".into()],
            ..InventoryIndex::default()
        };
        let filter = Filter::options(CardAttribute::Subtype, Containment::AnyOf, ["goblin", "Gobiln"])
            .unwrap()
            .and(Filter::legality(Containment::AnyOf, ["modern", "extended"], false));
        assert_eq!(
            filter.unknown_operands(&index),
            vec![
                (CardAttribute::Subtype, "Gobiln".to_string()),
                (CardAttribute::Legality, "extended".to_string()),
            ]
        );
    }

    #[test]
    fn test_leaves_in_order() {
        let filter = creature().and(land().or(Filter::everything()));
        let attrs: Vec<_> = filter.leaves().iter().map(|l| l.attribute()).collect();
        assert_eq!(
            attrs,
            vec![CardAttribute::CardType, CardAttribute::CardType, CardAttribute::Any]
        );
    }
}
