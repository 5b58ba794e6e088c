//! Filter codec tests.
//!
//! These tests cover the two filter encodings from the outside:
//! - The bracketed text grammar used by legacy deck files
//! - The JSON encoding used by category presets and JSON deck files
//! - Typed errors for bad input

use serde_json::json;

use deck_editor::cards::{Card, CardId, ColorSet, Expansion, Face, Inventory, ManaCost, ManaType, Rarity};
use deck_editor::deck::CategorySpec;
use deck_editor::filter::{CardAttribute, Comparator, Containment, Filter, FilterLeaf, GroupMode, Mode, Operand};
use deck_editor::FilterError;

fn bolt() -> Card {
    Card::new(
        CardId::new("bolt"),
        Expansion::new("Magic 2010", "M10"),
        Rarity::Common,
        vec![Face::new("Lightning Bolt")
            .with_mana_cost(ManaCost::parse("{R}").unwrap())
            .with_types(["Instant"])
            .with_rules_text("Lightning Bolt deals 3 damage to any target.")],
    )
}

/// A two-leaf AND group parses into a group whose children re-serialize
/// to their original substrings.
#[test]
fn test_nested_group_children_reserialize() {
    let text = "<AND <n:c AND red> <r:e{}>>";
    let filter = Filter::parse(text).unwrap();
    let group = filter.as_group().expect("top level should be a group");

    assert_eq!(group.mode(), GroupMode::And);
    assert_eq!(group.len(), 2);
    assert!(group.children().iter().all(|c| c.as_leaf().is_some()));
    assert_eq!(group.children()[0].to_string(), "<n:c AND red>");
    assert_eq!(group.children()[1].to_string(), "<r:e{}>");
}

/// Parsed filters evaluate against cards.
#[test]
fn test_parsed_filter_matches() {
    let filter: Filter = r"<AND <cardtype:a{Instant}> <cmc:\<=1> <o:c ~ damage>>".parse().unwrap();
    assert!(filter.matches(&bolt()));

    let filter: Filter = "<OR <c:e{W}> <r:a{rare,mythic rare}>>".parse().unwrap();
    assert!(!filter.matches(&bolt()));
}

/// Operand text containing grammar characters survives both encodings.
#[test]
fn test_brackets_in_operands() {
    let filter = Filter::text(CardAttribute::FlavorText, Containment::AnyOf, "<<hello>>")
        .unwrap()
        .or(Filter::options(CardAttribute::Subtype, Containment::AllOf, ["a,b", "{c}"]).unwrap());

    assert_eq!(Filter::parse(&filter.to_string()).unwrap(), filter);
    assert_eq!(Filter::from_json(&filter.to_json()).unwrap(), filter);
}

/// Operand text with line breaks is written on one line and read back intact.
#[test]
fn test_line_breaks_in_operands() {
    let filter = Filter::text(CardAttribute::RulesText, Containment::AllOf, "draw\nflying\r\n\tfirst strike").unwrap();
    let text = filter.to_string();
    assert!(!text.contains(['\n', '\r', '\t']), "{text:?}");
    assert_eq!(Filter::parse(&text).unwrap(), filter);
}

/// Only operands that encode back to themselves can be built or parsed.
#[test]
fn test_operands_must_round_trip() {
    for text in ["<cmc:=NaN>", "<cmc:=inf>", "<cmc:\\<-infinity>"] {
        assert!(matches!(Filter::parse(text), Err(FilterError::InvalidOperand { .. })), "{text:?}");
    }
    let zero = Filter::parse("<cmc:=-0>").unwrap();
    assert_eq!(zero, Filter::number(CardAttribute::ManaValue, Comparator::Eq, 0.0).unwrap());
    assert_eq!(zero.to_string(), "<cmc:=0>");

    let spaced = Filter::parse("<sub:a{ Goblin , Elf}>").unwrap();
    assert_eq!(spaced.to_string(), "<sub:a{Elf,Goblin}>");
    assert_eq!(Filter::parse(&spaced.to_string()).unwrap(), spaced);

    let subtype = |value: &str| {
        FilterLeaf::new(
            CardAttribute::Subtype,
            Mode::Contains(Containment::AnyOf),
            Operand::Options([value.to_string()].into()),
        )
    };
    assert!(matches!(subtype(" Goblin"), Err(FilterError::InvalidOperand { .. })));
    assert!(matches!(subtype(""), Err(FilterError::InvalidOperand { .. })));
    assert!(subtype("Goblin").is_ok());

    let negative_zero = FilterLeaf::new(CardAttribute::ManaValue, Mode::Compare(Comparator::Eq), Operand::Number(-0.0));
    assert!(matches!(negative_zero, Err(FilterError::InvalidOperand { .. })));
}

/// Unbalanced or partial input is rejected, never half-parsed.
#[test]
fn test_malformed_input_is_rejected() {
    for text in ["<AND <n:a x>", "<OR <n:a x>> <n:a y>", "<AND <n:a x> <n:a y>", ">", "<"] {
        assert!(
            matches!(Filter::parse(text), Err(FilterError::MalformedFilterString { .. })),
            "{text:?}"
        );
    }
}

/// Each failure class maps to its own error.
#[test]
fn test_error_taxonomy() {
    assert_eq!(Filter::parse("<zz:a x>"), Err(FilterError::UnknownField("zz".into())));
    assert!(matches!(
        Filter::parse("<p:c{Red}>"),
        Err(FilterError::InvalidContainmentMode { .. })
    ));
    assert!(matches!(
        Filter::parse("<p:>=big>"),
        Err(FilterError::MalformedFilterString { .. }) | Err(FilterError::InvalidOperand { .. })
    ));
    assert!(matches!(
        Filter::parse(r"<p:\>=big>"),
        Err(FilterError::InvalidOperand { .. })
    ));
    assert!(matches!(
        Filter::parse("<cmc:?>"),
        Err(FilterError::InvalidContainmentMode { .. })
    ));
}

/// The JSON form has a type discriminator and one key per operand part.
#[test]
fn test_json_form() {
    let filter = Filter::colors(
        CardAttribute::Color,
        Containment::AnyOf,
        ColorSet::new([ManaType::White, ManaType::Blue]),
        true,
    )
    .unwrap()
    .and(Filter::number(CardAttribute::Power, Comparator::Ge, 2.0).unwrap());

    let value = filter.to_json();
    assert_eq!(
        value,
        json!({
            "type": "group",
            "mode": "AND",
            "children": [
                {"type": "c", "mode": "a", "colors": "WU", "multicolored": true},
                {"type": "p", "mode": ">=", "value": 2.0}
            ]
        })
    );
    assert_eq!(Filter::from_json(&value).unwrap(), filter);
}

/// Bad JSON operands surface as typed errors that deck loading can wrap.
#[test]
fn test_json_errors_wrap_into_serde() {
    assert!(matches!(
        Filter::from_json(&json!({"type": "p", "mode": "=", "value": "two"})),
        Err(FilterError::MalformedFilterJson(_))
    ));
    let err = serde_json::from_value::<CategorySpec>(json!({
        "name": "Bad",
        "filter": {"type": "legal", "mode": "<"}
    }))
    .unwrap_err();
    assert!(err.to_string().contains("not valid"));
}

/// Category presets use the structured form.
#[test]
fn test_category_spec_round_trip() {
    let spec = CategorySpec::new(
        "Burn",
        Filter::all_of([
            Filter::options(CardAttribute::CardType, Containment::AnyOf, ["Instant", "Sorcery"]).unwrap(),
            Filter::text(CardAttribute::RulesText, Containment::AllOf, "damage").unwrap(),
        ])
        .unwrap(),
    )
    .with_whitelist([CardId::new("bolt")]);

    let text = serde_json::to_string(&spec).unwrap();
    let back: CategorySpec = serde_json::from_str(&text).unwrap();
    assert_eq!(back, spec);
}

/// Operand validation against the inventory's observed values.
#[test]
fn test_unknown_operands() {
    let inventory = Inventory::new(vec![bolt()]);
    let filter = Filter::options(CardAttribute::CardType, Containment::AnyOf, ["Instant", "Tribal"]).unwrap();
    assert_eq!(
        filter.unknown_operands(inventory.index()),
        vec![(CardAttribute::CardType, "Tribal".to_string())]
    );
    assert_eq!(
        CardAttribute::CardType.options(inventory.index()),
        Some(&["Instant".to_string()][..])
    );
    assert!(Mode::from_code("!=").is_some());
}
