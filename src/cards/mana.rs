//! Mana costs.
//!
//! A `ManaCost` is an ordered list of `ManaSymbol`s parsed from text such as
//! `{2}{W/U}{R}`. Filters compare costs as multisets of symbols.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::attributes::{ColorSet, ManaType};

/// One mana symbol, stored as its canonical (uppercase) text without braces.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ManaSymbol(String);

impl ManaSymbol {
    /// Parse the inside of a `{...}` symbol.
    pub fn parse(text: &str) -> Result<Self, String> {
        let upper = text.trim().to_ascii_uppercase();
        if upper.is_empty() {
            return Err("empty mana symbol".to_string());
        }
        for part in upper.split('/') {
            let valid = match part {
                "" => false,
                "W" | "U" | "B" | "R" | "G" | "C" | "S" | "X" | "Y" | "Z" | "P" | "T" | "Q" | "E" => true,
                "∞" | "½" => true,
                "HW" | "HU" | "HB" | "HR" | "HG" => true,
                digits => digits.chars().all(|c| c.is_ascii_digit()),
            };
            if !valid {
                return Err(format!("invalid mana symbol {{{text}}}"));
            }
        }
        Ok(Self(upper))
    }

    /// Symbol text without braces.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Contribution of this symbol to mana value.
    #[must_use]
    pub fn value(&self) -> f64 {
        if let Ok(n) = self.0.parse::<f64>() {
            return n;
        }
        match self.0.as_str() {
            "X" | "Y" | "Z" | "T" | "Q" | "E" => 0.0,
            "∞" => f64::INFINITY,
            "½" | "HW" | "HU" | "HB" | "HR" | "HG" => 0.5,
            s if s.contains('/') => s
                .split('/')
                .filter_map(|p| p.parse::<f64>().ok())
                .fold(1.0, f64::max),
            _ => 1.0,
        }
    }

    /// Colors this symbol can be paid with.
    #[must_use]
    pub fn colors(&self) -> ColorSet {
        self.0
            .chars()
            .filter(|c| *c != 'P')
            .filter_map(ManaType::from_letter)
            .collect()
    }
}

impl fmt::Display for ManaSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0)
    }
}

/// A mana cost: an ordered sequence of symbols.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManaCost {
    symbols: SmallVec<[ManaSymbol; 4]>,
}

impl ManaCost {
    /// The empty cost (lands, cards without a cost).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse `{2}{R}{R}`-style text. Whitespace between symbols is ignored.
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut symbols = SmallVec::new();
        let mut rest = text.trim();
        while !rest.is_empty() {
            let Some(body) = rest.strip_prefix('{') else {
                return Err(format!("expected '{{' in mana cost \"{text}\""));
            };
            let end = body
                .find('}')
                .ok_or_else(|| format!("unclosed symbol in mana cost \"{text}\""))?;
            symbols.push(ManaSymbol::parse(&body[..end])?);
            rest = body[end + 1..].trim_start();
        }
        Ok(Self { symbols })
    }

    #[must_use]
    pub fn symbols(&self) -> &[ManaSymbol] {
        &self.symbols
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Total mana value of the cost.
    #[must_use]
    pub fn mana_value(&self) -> f64 {
        self.symbols.iter().map(ManaSymbol::value).sum()
    }

    /// Colors appearing in the cost.
    #[must_use]
    pub fn colors(&self) -> ColorSet {
        self.symbols
            .iter()
            .fold(ColorSet::COLORLESS, |set, s| set.union(s.colors()))
    }

    /// Number of occurrences of a symbol.
    #[must_use]
    pub fn count(&self, symbol: &ManaSymbol) -> usize {
        self.symbols.iter().filter(|s| *s == symbol).count()
    }

    /// Symbols sorted, for order-insensitive comparison.
    #[must_use]
    pub fn sorted_symbols(&self) -> Vec<&ManaSymbol> {
        let mut sorted: Vec<_> = self.symbols.iter().collect();
        sorted.sort();
        sorted
    }
}

impl fmt::Display for ManaCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.symbols {
            write!(f, "{symbol}")?;
        }
        Ok(())
    }
}

impl FromStr for ManaCost {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cost() {
        let cost = ManaCost::parse("{2}{R}{R}").unwrap();
        assert_eq!(cost.symbols().len(), 3);
        assert_eq!(cost.mana_value(), 4.0);
        assert_eq!(cost.colors(), ColorSet::new([ManaType::Red]));
        assert_eq!(cost.to_string(), "{2}{R}{R}");
    }

    #[test]
    fn test_hybrid_and_phyrexian() {
        let cost = ManaCost::parse("{2/W}{G/U}{B/P}").unwrap();
        assert_eq!(cost.mana_value(), 4.0);
        assert_eq!(
            cost.colors(),
            ColorSet::new([ManaType::White, ManaType::Green, ManaType::Blue, ManaType::Black])
        );
    }

    #[test]
    fn test_variable_cost() {
        let cost = ManaCost::parse("{x}{R}").unwrap();
        assert_eq!(cost.mana_value(), 1.0);
        assert_eq!(cost.symbols()[0].as_str(), "X");
    }

    #[test]
    fn test_parse_errors() {
        assert!(ManaCost::parse("2R").is_err());
        assert!(ManaCost::parse("{2").is_err());
        assert!(ManaCost::parse("{Q/K}").is_err());
        assert!(ManaCost::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_count() {
        let cost = ManaCost::parse("{U}{U}{1}").unwrap();
        let blue = ManaSymbol::parse("u").unwrap();
        assert_eq!(cost.count(&blue), 2);
    }
}
