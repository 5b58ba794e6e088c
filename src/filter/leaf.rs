//! Leaf filters: one field, one mode, one operand.

use super::attribute::{CardAttribute, ValueKind};
use super::escape::{self, GRAMMAR};
use super::mode::{Containment, Mode};
use super::operand::Operand;
use crate::cards::{Card, ManaCost};
use crate::error::{FilterError, FilterResult};

/// A filter testing one card field.
///
/// The field is fixed at construction; the mode and operand can be changed
/// afterwards but are validated against the field every time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FilterLeaf {
    attribute: CardAttribute,
    mode: Mode,
    operand: Operand,
}

impl FilterLeaf {
    /// Create a leaf, checking that the mode and operand suit the field.
    pub fn new(attribute: CardAttribute, mode: Mode, operand: Operand) -> FilterResult<Self> {
        check(attribute, mode, &operand)?;
        Ok(Self {
            attribute,
            mode,
            operand,
        })
    }

    /// Assemble a leaf whose parts are valid by construction.
    pub(crate) fn from_parts(attribute: CardAttribute, mode: Mode, operand: Operand) -> Self {
        debug_assert!(check(attribute, mode, &operand).is_ok());
        Self {
            attribute,
            mode,
            operand,
        }
    }

    /// A leaf with the field's first legal mode and an empty operand.
    #[must_use]
    pub fn default_for(attribute: CardAttribute) -> Self {
        let mode = match attribute.kind() {
            ValueKind::Vacuous => Mode::Unconditional,
            ValueKind::Number => Mode::Compare(super::Comparator::Ge),
            _ => Mode::Contains(Containment::AnyOf),
        };
        Self {
            attribute,
            mode,
            operand: Operand::default_for(attribute, mode),
        }
    }

    #[must_use]
    pub fn attribute(&self) -> CardAttribute {
        self.attribute
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    /// Replace the operand, keeping the mode.
    pub fn set_operand(&mut self, operand: Operand) -> FilterResult<()> {
        self.set(self.mode, operand)
    }

    /// Replace mode and operand together. Leaves the leaf unchanged on error.
    pub fn set(&mut self, mode: Mode, operand: Operand) -> FilterResult<()> {
        check(self.attribute, mode, &operand)?;
        self.mode = mode;
        self.operand = operand;
        Ok(())
    }

    /// Whether a card matches. Per-face fields match if any face does.
    #[must_use]
    pub fn matches(&self, card: &Card) -> bool {
        let attribute = self.attribute;
        match (self.mode, &self.operand) {
            (Mode::Unconditional, _) => attribute == CardAttribute::Any,
            (Mode::Missing, _) => attribute.number_values(card).iter().any(Option::is_none),
            (Mode::Variable, _) => attribute
                .number_values(card)
                .iter()
                .flatten()
                .any(|v| v.variable),
            (Mode::Compare(comparator), Operand::Number(operand)) => attribute
                .number_values(card)
                .iter()
                .flatten()
                .any(|v| comparator.test(v.value, *operand)),
            (Mode::Contains(c), Operand::Text(text)) => attribute
                .text_values(card)
                .iter()
                .any(|field| text.test(c, field)),
            (Mode::Contains(c), Operand::ManaCost(cost)) => attribute
                .mana_values(card)
                .iter()
                .any(|have| cost_contains(c, have, cost)),
            (Mode::Contains(c), Operand::Colors(colors)) => attribute
                .color_values(card)
                .iter()
                .any(|&have| colors.test(c, have)),
            (Mode::Contains(c), Operand::Options(options)) => {
                let want: Vec<String> = options.iter().map(|o| o.to_lowercase()).collect();
                attribute
                    .option_values(card)
                    .iter()
                    .any(|have| c.test(have, &want))
            }
            (Mode::Contains(c), Operand::Rarities(rarities)) => {
                let want: Vec<_> = rarities.iter().copied().collect();
                c.test(&[card.rarity()], &want)
            }
            (Mode::Contains(c), Operand::Legality(legality)) => legality.test(c, card),
            _ => false,
        }
    }

    /// Append `<code:MODEoperand>` (or `<code>` for pseudo-attributes).
    pub(crate) fn write_grammar(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.attribute.code());
        if self.attribute.kind() != ValueKind::Vacuous {
            out.push(':');
            out.push_str(&escape::escape(self.mode.code(), GRAMMAR));
            self.operand.write_grammar(out);
        }
        out.push('>');
    }

    /// Parse the text between a leaf's brackets.
    pub(crate) fn parse_grammar(body: &str, input: &str) -> FilterResult<Self> {
        let (code, content) = match escape::find_unescaped(body, ':') {
            Some(i) => (&body[..i], Some(&body[i + 1..])),
            None => (body, None),
        };
        let attribute = CardAttribute::from_code(&escape::unescape(code))?;

        if attribute.kind() == ValueKind::Vacuous {
            return match content.map(str::trim) {
                None | Some("") => Self::new(attribute, Mode::Unconditional, Operand::None),
                Some(_) => Err(FilterError::malformed(
                    input,
                    format!("field \"{}\" takes no mode or operand", attribute.code()),
                )),
            };
        }

        let content = content.ok_or_else(|| {
            FilterError::malformed(input, format!("expected ':' after field code in \"{body}\""))
        })?;
        let (mode, rest) = Mode::split_prefix(content, |code| escape::escape(code, GRAMMAR))
            .ok_or_else(|| FilterError::malformed(input, format!("missing mode in \"{body}\"")))?;
        if !attribute.allows(mode) {
            return Err(invalid_mode(attribute, mode));
        }
        let operand = Operand::parse_grammar(attribute, mode, rest)?;
        Self::new(attribute, mode, operand)
    }
}

fn invalid_mode(attribute: CardAttribute, mode: Mode) -> FilterError {
    FilterError::InvalidContainmentMode {
        attribute: attribute.code().to_string(),
        mode: mode.code().to_string(),
    }
}

fn check(attribute: CardAttribute, mode: Mode, operand: &Operand) -> FilterResult<()> {
    if !attribute.allows(mode) {
        return Err(invalid_mode(attribute, mode));
    }
    if !operand.fits(attribute, mode) {
        return Err(FilterError::operand(
            attribute.code(),
            &operand.to_string(),
            format!("operand does not suit mode \"{}\"", mode.code()),
        ));
    }
    if let Some(reason) = operand.noncanonical() {
        return Err(FilterError::operand(attribute.code(), &operand.to_string(), reason));
    }
    Ok(())
}

/// Compare mana costs as multisets of symbols.
fn cost_contains(containment: Containment, have: &ManaCost, want: &ManaCost) -> bool {
    match containment {
        Containment::AnyOf => want.symbols().iter().any(|s| have.count(s) > 0),
        Containment::AllOf => want.symbols().iter().all(|s| have.count(s) >= want.count(s)),
        Containment::NoneOf => !want.symbols().iter().any(|s| have.count(s) > 0),
        Containment::Exactly => have.sorted_symbols() == want.sorted_symbols(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardId, ColorSet, Expansion, Face, Legality, ManaType, Rarity};
    use crate::filter::operand::{ColorOperand, LegalityOperand, TextOperand};
    use crate::filter::Comparator;

    fn bear() -> Card {
        Card::new(
            CardId::new("bear"),
            Expansion::new("Alpha", "LEA"),
            Rarity::Common,
            vec![Face::new("Grizzly Bears")
                .with_mana_cost(ManaCost::parse("{1}{G}").unwrap())
                .with_types(["Creature"])
                .with_subtypes(["Bear"])
                .with_stats("2", "2")],
        )
        .with_legality("vintage", Legality::Legal)
    }

    fn dryad() -> Card {
        Card::new(
            CardId::new("dryad"),
            Expansion::new("Future Sight", "FUT"),
            Rarity::Rare,
            vec![Face::new("Dryad Arbor")
                .with_colors(ColorSet::new([ManaType::Green]))
                .with_types(["Land", "Creature"])
                .with_stats("1", "1")],
        )
    }

    fn leaf(attribute: CardAttribute, mode: Mode, operand: Operand) -> FilterLeaf {
        FilterLeaf::new(attribute, mode, operand).unwrap()
    }

    #[test]
    fn test_number_leaf() {
        let cmc = leaf(CardAttribute::ManaValue, Mode::Compare(Comparator::Ge), Operand::Number(2.0));
        assert!(cmc.matches(&bear()));
        assert!(!cmc.matches(&dryad()));
    }

    #[test]
    fn test_missing_value_fails_comparisons() {
        let loyalty = leaf(CardAttribute::Loyalty, Mode::Compare(Comparator::Ge), Operand::Number(0.0));
        assert!(!loyalty.matches(&bear()));
        let missing = leaf(CardAttribute::Loyalty, Mode::Missing, Operand::None);
        assert!(missing.matches(&bear()));
    }

    #[test]
    fn test_options_case_insensitive() {
        let lands = leaf(
            CardAttribute::CardType,
            Mode::Contains(Containment::AnyOf),
            Operand::Options(["land".to_string()].into()),
        );
        assert!(lands.matches(&dryad()));
        assert!(!lands.matches(&bear()));
    }

    #[test]
    fn test_mana_cost_multiset() {
        let gg = leaf(
            CardAttribute::ManaCost,
            Mode::Contains(Containment::AllOf),
            Operand::ManaCost(ManaCost::parse("{G}{G}").unwrap()),
        );
        assert!(!gg.matches(&bear()));
        let exact = leaf(
            CardAttribute::ManaCost,
            Mode::Contains(Containment::Exactly),
            Operand::ManaCost(ManaCost::parse("{G}{1}").unwrap()),
        );
        assert!(exact.matches(&bear()));
    }

    #[test]
    fn test_text_colors_rarity_legality() {
        let name = leaf(
            CardAttribute::Name,
            Mode::Contains(Containment::AnyOf),
            Operand::Text(TextOperand::new("bears").unwrap()),
        );
        assert!(name.matches(&bear()));

        let green = leaf(
            CardAttribute::Color,
            Mode::Contains(Containment::Exactly),
            Operand::Colors(ColorOperand::new(ColorSet::new([ManaType::Green]), false)),
        );
        assert!(green.matches(&bear()));
        assert!(green.matches(&dryad()));

        let rare = leaf(
            CardAttribute::Rarity,
            Mode::Contains(Containment::AnyOf),
            Operand::Rarities([Rarity::Rare].into()),
        );
        assert!(rare.matches(&dryad()));
        assert!(!rare.matches(&bear()));

        let vintage = leaf(
            CardAttribute::Legality,
            Mode::Contains(Containment::AllOf),
            Operand::Legality(LegalityOperand::new(["vintage"], false)),
        );
        assert!(vintage.matches(&bear()));
        assert!(!vintage.matches(&dryad()));
    }

    #[test]
    fn test_validation() {
        let err = FilterLeaf::new(
            CardAttribute::ManaValue,
            Mode::Contains(Containment::AnyOf),
            Operand::Number(1.0),
        )
        .unwrap_err();
        assert!(matches!(err, FilterError::InvalidContainmentMode { .. }));

        let err = FilterLeaf::new(CardAttribute::Name, Mode::Contains(Containment::AnyOf), Operand::Number(1.0))
            .unwrap_err();
        assert!(matches!(err, FilterError::InvalidOperand { .. }));
    }

    #[test]
    fn test_set_keeps_leaf_on_error() {
        let mut cmc = leaf(CardAttribute::ManaValue, Mode::Compare(Comparator::Eq), Operand::Number(3.0));
        assert!(cmc.set(Mode::Missing, Operand::None).is_err());
        assert_eq!(cmc.mode(), Mode::Compare(Comparator::Eq));
        cmc.set_operand(Operand::Number(4.0)).unwrap();
        assert_eq!(cmc.operand(), &Operand::Number(4.0));
    }

    #[test]
    fn test_grammar() {
        let cmc = leaf(CardAttribute::ManaValue, Mode::Compare(Comparator::Ge), Operand::Number(3.0));
        let mut out = String::new();
        cmc.write_grammar(&mut out);
        assert_eq!(out, r"<cmc:\>=3>");
        assert_eq!(FilterLeaf::parse_grammar(r"cmc:\>=3", &out).unwrap(), cmc);

        assert!(matches!(
            FilterLeaf::parse_grammar("cmc:c3", "<cmc:c3>"),
            Err(FilterError::InvalidContainmentMode { .. })
        ));
        assert!(matches!(
            FilterLeaf::parse_grammar("zz:c x", "<zz:c x>"),
            Err(FilterError::UnknownField(_))
        ));
        assert!(FilterLeaf::parse_grammar("*", "<*>").unwrap().matches(&bear()));
        assert!(!FilterLeaf::parse_grammar("0", "<0>").unwrap().matches(&bear()));
    }

    #[test]
    fn test_default_leaves_are_valid() {
        for attribute in CardAttribute::ALL {
            let leaf = FilterLeaf::default_for(attribute);
            assert!(FilterLeaf::new(attribute, leaf.mode(), leaf.operand().clone()).is_ok());
        }
    }

    #[test]
    fn test_rejects_operands_that_cannot_round_trip() {
        let cmc = |value: f64| {
            FilterLeaf::new(CardAttribute::ManaValue, Mode::Compare(Comparator::Eq), Operand::Number(value))
        };
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -0.0] {
            assert!(matches!(cmc(value), Err(FilterError::InvalidOperand { .. })), "{value}");
        }
        assert!(cmc(0.0).is_ok());

        let subtype = |values: &[&str]| {
            FilterLeaf::new(
                CardAttribute::Subtype,
                Mode::Contains(Containment::AnyOf),
                Operand::Options(values.iter().map(|v| v.to_string()).collect()),
            )
        };
        assert!(subtype(&[" Goblin"]).is_err());
        assert!(subtype(&["Goblin", ""]).is_err());
        assert!(subtype(&["Goblin", "Elf Warrior"]).is_ok());

        let mut leaf = subtype(&["Goblin"]).unwrap();
        assert!(leaf.set_operand(Operand::Options(["Goblin ".to_string()].into())).is_err());
        let mut out = String::new();
        leaf.write_grammar(&mut out);
        assert_eq!(out, "<sub:a{Goblin}>");
    }
}
