//! Sample opening hands.
//!
//! `SampleHand` expands a deck into one card per copy, shuffles it with a
//! seeded ChaCha8 generator and deals from the top. The same deck and seed
//! always give the same sequence of hands.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::deck::Deck;
use crate::cards::Card;

/// Opening hand size.
pub const HAND_SIZE: usize = 7;

/// A shuffled library and the cards drawn from it.
#[derive(Clone, Debug)]
pub struct SampleHand {
    library: Vec<Arc<Card>>,
    drawn: usize,
    hand_size: usize,
    rng: ChaCha8Rng,
}

impl SampleHand {
    #[must_use]
    pub fn new(deck: &Deck, seed: u64) -> Self {
        let library = deck
            .entries()
            .flat_map(|e| std::iter::repeat(e.card()).take(e.count() as usize))
            .cloned()
            .collect();
        Self {
            library,
            drawn: 0,
            hand_size: HAND_SIZE,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Shuffle everything back and draw a new hand of `size` cards.
    pub fn new_hand(&mut self, size: usize) -> &[Arc<Card>] {
        self.library.shuffle(&mut self.rng);
        self.hand_size = size;
        self.drawn = size.min(self.library.len());
        self.hand()
    }

    /// Shuffle and draw a hand one card smaller than the last.
    pub fn mulligan(&mut self) -> &[Arc<Card>] {
        let size = self.hand_size.saturating_sub(1);
        self.new_hand(size)
    }

    /// Draw one more card. `None` once the library is empty.
    pub fn draw(&mut self) -> Option<&Arc<Card>> {
        if self.drawn < self.library.len() {
            self.drawn += 1;
            self.library.get(self.drawn - 1)
        } else {
            None
        }
    }

    /// Cards drawn so far, in draw order.
    #[must_use]
    pub fn hand(&self) -> &[Arc<Card>] {
        &self.library[..self.drawn]
    }

    /// Cards left in the library.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.library.len() - self.drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardId, Expansion, Face, Rarity};

    fn deck() -> Deck {
        let mut deck = Deck::new();
        for (name, copies) in [("a", 4), ("b", 4), ("c", 2)] {
            let card = Arc::new(Card::new(
                CardId::new(name),
                Expansion::new("Alpha", "LEA"),
                Rarity::Common,
                vec![Face::new(name)],
            ));
            deck.add(&card, copies);
        }
        deck
    }

    fn ids(cards: &[Arc<Card>]) -> Vec<String> {
        cards.iter().map(|c| c.id().to_string()).collect()
    }

    #[test]
    fn test_same_seed_same_hand() {
        let deck = deck();
        let mut first = SampleHand::new(&deck, 7);
        let mut second = SampleHand::new(&deck, 7);
        assert_eq!(ids(first.new_hand(HAND_SIZE)), ids(second.new_hand(HAND_SIZE)));
        assert_eq!(first.remaining(), 3);
    }

    #[test]
    fn test_draw_until_empty() {
        let mut hand = SampleHand::new(&deck(), 1);
        hand.new_hand(HAND_SIZE);
        for _ in 0..3 {
            assert!(hand.draw().is_some());
        }
        assert!(hand.draw().is_none());
        assert_eq!(hand.hand().len(), 10);
    }

    #[test]
    fn test_mulligan_shrinks() {
        let mut hand = SampleHand::new(&deck(), 3);
        assert_eq!(hand.new_hand(HAND_SIZE).len(), 7);
        assert_eq!(hand.mulligan().len(), 6);
        assert_eq!(hand.mulligan().len(), 5);
        assert_eq!(hand.new_hand(20).len(), 10);
    }
}
