//! Structured (JSON) encoding of filters.
//!
//! Groups are `{"type": "group", "mode": "AND", "children": [...]}`. Leaves
//! are `{"type": <field code>, "mode": <mode code>, ...}` with operand keys
//! that depend on the field:
//!
//! | field kind | keys |
//! |------------|------|
//! | text       | `text` |
//! | mana cost  | `cost` |
//! | number     | `value` (absent for `?` and `*` modes) |
//! | colors     | `colors`, `multicolored` |
//! | options    | `selected` |
//! | rarity     | `selected` |
//! | legality   | `formats`, `restricted` |
//!
//! Operand strings are parsed with the same functions the text grammar uses,
//! so a bad operand fails with [`FilterError::InvalidOperand`].

use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::attribute::{CardAttribute, ValueKind};
use super::leaf::FilterLeaf;
use super::mode::{GroupMode, Mode};
use super::operand::{option_set, ColorOperand, LegalityOperand, Operand, TextOperand};
use super::tree::{Filter, FilterGroup};
use crate::cards::{ColorSet, ManaCost, Rarity};
use crate::error::{FilterError, FilterResult};

const GROUP: &str = "group";

impl Filter {
    /// Encode as a JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Filter::Group(group) => {
                let mut object = Map::new();
                object.insert("type".into(), GROUP.into());
                object.insert("mode".into(), group.mode().keyword().into());
                object.insert(
                    "children".into(),
                    Value::Array(group.children().iter().map(Filter::to_json).collect()),
                );
                Value::Object(object)
            }
            Filter::Leaf(leaf) => leaf_to_json(leaf),
        }
    }

    /// Decode a JSON value produced by [`Filter::to_json`].
    pub fn from_json(value: &Value) -> FilterResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| FilterError::MalformedFilterJson("expected an object".into()))?;
        let kind = string(object, "type")?;

        if kind == GROUP {
            let keyword = string(object, "mode")?;
            let mode = GroupMode::from_keyword(keyword).ok_or_else(|| {
                FilterError::MalformedFilterJson(format!("unknown group mode \"{keyword}\""))
            })?;
            let children = object
                .get("children")
                .and_then(Value::as_array)
                .ok_or_else(|| missing("children"))?
                .iter()
                .map(Filter::from_json)
                .collect::<FilterResult<Vec<_>>>()?;
            return FilterGroup::new(mode, children).map(Filter::Group);
        }

        let attribute = CardAttribute::from_code(kind)?;
        if attribute.kind() == ValueKind::Vacuous {
            return Filter::leaf(attribute, Mode::Unconditional, Operand::None);
        }
        let code = string(object, "mode")?;
        let mode = Mode::from_code(code)
            .filter(|&mode| attribute.allows(mode))
            .ok_or_else(|| FilterError::InvalidContainmentMode {
                attribute: attribute.code().to_string(),
                mode: code.to_string(),
            })?;
        let operand = operand_from_json(attribute, mode, object)?;
        FilterLeaf::new(attribute, mode, operand).map(Filter::Leaf)
    }
}

fn leaf_to_json(leaf: &FilterLeaf) -> Value {
    let mut object = Map::new();
    object.insert("type".into(), leaf.attribute().code().into());
    if leaf.attribute().kind() != ValueKind::Vacuous {
        object.insert("mode".into(), leaf.mode().code().into());
    }
    match leaf.operand() {
        Operand::None => {}
        Operand::Text(text) => {
            object.insert("text".into(), text.text().into());
        }
        Operand::ManaCost(cost) => {
            object.insert("cost".into(), cost.to_string().into());
        }
        Operand::Number(value) => {
            object.insert("value".into(), (*value).into());
        }
        Operand::Colors(colors) => {
            object.insert("colors".into(), colors.colors.to_string().into());
            object.insert("multicolored".into(), colors.multicolored.into());
        }
        Operand::Options(values) => {
            object.insert("selected".into(), values.iter().cloned().collect());
        }
        Operand::Rarities(values) => {
            object.insert("selected".into(), values.iter().map(|r| r.name()).collect());
        }
        Operand::Legality(legality) => {
            object.insert("formats".into(), legality.formats().iter().cloned().collect());
            object.insert("restricted".into(), legality.restricted().into());
        }
    }
    Value::Object(object)
}

fn operand_from_json(
    attribute: CardAttribute,
    mode: Mode,
    object: &Map<String, Value>,
) -> FilterResult<Operand> {
    let invalid = |value: &str, reason: String| FilterError::operand(attribute.code(), value, reason);
    match attribute.kind() {
        ValueKind::Vacuous => Ok(Operand::None),
        ValueKind::Number if matches!(mode, Mode::Missing | Mode::Variable) => Ok(Operand::None),
        ValueKind::Number => {
            let value = object
                .get("value")
                .and_then(Value::as_f64)
                .ok_or_else(|| missing("value"))?;
            Operand::number(value).map_err(|e| invalid(&value.to_string(), e))
        }
        ValueKind::Text => {
            let text = string(object, "text")?;
            TextOperand::new(text)
                .map(Operand::Text)
                .map_err(|e| invalid(text, e))
        }
        ValueKind::ManaCost => {
            let cost = string(object, "cost")?;
            ManaCost::parse(cost)
                .map(Operand::ManaCost)
                .map_err(|e| invalid(cost, e))
        }
        ValueKind::Colors => {
            let colors = string(object, "colors")?;
            let set = ColorSet::from_str(colors).map_err(|e| invalid(colors, e))?;
            Ok(Operand::Colors(ColorOperand::new(set, flag(object, "multicolored")?)))
        }
        ValueKind::Options => Ok(Operand::Options(option_set(strings(object, "selected")?))),
        ValueKind::Rarity => strings(object, "selected")?
            .into_iter()
            .map(|r| Rarity::from_str(r).map_err(|e| invalid(r, e)))
            .collect::<FilterResult<_>>()
            .map(Operand::Rarities),
        ValueKind::Legality => Ok(Operand::Legality(LegalityOperand::new(
            strings(object, "formats")?,
            flag(object, "restricted")?,
        ))),
    }
}

fn missing(key: &str) -> FilterError {
    FilterError::MalformedFilterJson(format!("missing or mistyped key \"{key}\""))
}

fn string<'a>(object: &'a Map<String, Value>, key: &str) -> FilterResult<&'a str> {
    object.get(key).and_then(Value::as_str).ok_or_else(|| missing(key))
}

fn strings<'a>(object: &'a Map<String, Value>, key: &str) -> FilterResult<Vec<&'a str>> {
    object
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| missing(key))?
        .iter()
        .map(|v| v.as_str().ok_or_else(|| missing(key)))
        .collect()
}

/// Optional boolean; absent means false.
fn flag(object: &Map<String, Value>, key: &str) -> FilterResult<bool> {
    match object.get(key) {
        None => Ok(false),
        Some(value) => value.as_bool().ok_or_else(|| missing(key)),
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Filter::from_json(&value).map_err(D::Error::custom)
    }
}
