//! Deck files.
//!
//! Two formats are supported.
//!
//! The legacy line format:
//!
//! ```text
//! 2
//! <card id>\t<count>
//! <card id>\t<count>
//! 1
//! Lands <id:id> <id> <AND <cardtype:a{Land}> <*>>
//! ```
//!
//! Each category line is the name, the whitelist and blacklist ids in
//! brackets separated by `:`, and the filter in the text grammar. Names and
//! ids escape `\`, `<`, `>` and `:` with a backslash. Line breaks and tabs
//! anywhere on a line are written as `\n`, `\r` and `\t`.
//!
//! The JSON format ([`DeckFile`]) holds the main deck, a sideboard and free
//! text notes; categories use the structured filter encoding.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::category::CategorySpec;
use super::deck::Deck;
use crate::cards::{CardId, Inventory};
use crate::error::{DeckError, DeckResult};
use crate::filter::escape;
use crate::filter::Filter;

/// Characters escaped in category names and ids on a legacy category line.
const LINE_SPECIALS: &[char] = &['\\', '<', '>', ':'];

/// Characters escaped in card ids on an entry line.
const ID_SPECIALS: &[char] = &['\\'];

impl Deck {
    /// Write the legacy line format.
    pub fn write_legacy<W: Write>(&self, mut out: W) -> DeckResult<()> {
        writeln!(out, "{}", self.size())?;
        for entry in self.entries() {
            writeln!(out, "{}\t{}", escape::escape(entry.id().as_str(), ID_SPECIALS), entry.count())?;
        }
        writeln!(out, "{}", self.category_count())?;
        for category in self.categories() {
            let spec = category.category().to_spec();
            writeln!(
                out,
                "{} <{}> <{}> {}",
                escape::escape(&spec.name, LINE_SPECIALS),
                join_ids(&spec.whitelist),
                join_ids(&spec.blacklist),
                spec.filter
            )?;
        }
        Ok(())
    }

    /// Read the legacy line format, resolving card ids in `inventory`.
    pub fn read_legacy<R: BufRead>(input: R, inventory: &Inventory) -> DeckResult<Self> {
        let mut lines = input.lines().enumerate().map(|(i, line)| (i + 1, line));
        let mut next = || -> DeckResult<(usize, String)> {
            match lines.next() {
                Some((number, line)) => Ok((number, line?)),
                None => Err(DeckError::MalformedDeckFile {
                    line: 0,
                    reason: "unexpected end of file".into(),
                }),
            }
        };

        let mut deck = Deck::new();
        let (number, line) = next()?;
        let cards = parse_count(number, &line)?;
        for _ in 0..cards {
            let (number, line) = next()?;
            let (id, count) = line.trim_end().split_once('\t').ok_or_else(|| DeckError::MalformedDeckFile {
                line: number,
                reason: "expected \"<id>\\t<count>\"".into(),
            })?;
            let id = CardId::new(escape::unescape(id));
            let count = parse_copies(number, count)?;
            let card = inventory
                .get(&id)
                .ok_or_else(|| DeckError::UnknownCard(id.to_string()))?;
            if !deck.add(card, count) {
                return Err(DeckError::MalformedDeckFile {
                    line: number,
                    reason: format!("too many copies of \"{id}\""),
                });
            }
        }

        let (number, line) = next()?;
        let categories = parse_count(number, &line)?;
        for _ in 0..categories {
            let (number, line) = next()?;
            deck.add_category(parse_category_line(number, &line)?)?;
        }
        tracing::debug!(cards = deck.size(), categories = deck.category_count(), "Read legacy deck");
        Ok(deck)
    }

    pub fn save_legacy(&self, path: &Path) -> DeckResult<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_legacy(&mut out)?;
        out.flush()?;
        Ok(())
    }

    pub fn load_legacy(path: &Path, inventory: &Inventory) -> DeckResult<Self> {
        Self::read_legacy(BufReader::new(File::open(path)?), inventory)
    }
}

fn join_ids(ids: &[CardId]) -> String {
    ids.iter()
        .map(|id| escape::escape(id.as_str(), LINE_SPECIALS))
        .collect::<Vec<_>>()
        .join(":")
}

fn parse_count(line: usize, text: &str) -> DeckResult<usize> {
    text.trim().parse().map_err(|_| DeckError::MalformedDeckFile {
        line,
        reason: format!("expected a count, got \"{}\"", text.trim()),
    })
}

/// Copies of one card: at least one, and within `u32`.
fn parse_copies(line: usize, text: &str) -> DeckResult<u32> {
    let text = text.trim();
    match text.parse::<u32>() {
        Ok(0) => Err(DeckError::MalformedDeckFile {
            line,
            reason: "a card needs at least one copy".into(),
        }),
        Ok(count) => Ok(count),
        Err(e) => Err(DeckError::MalformedDeckFile {
            line,
            reason: format!("invalid copy count \"{text}\": {e}"),
        }),
    }
}

/// Take a leading `<...>` id list off `text`.
fn take_ids(line: usize, text: &str) -> DeckResult<(Vec<CardId>, &str)> {
    let malformed = |reason: &str| DeckError::MalformedDeckFile {
        line,
        reason: reason.to_string(),
    };
    let body = text.trim_start().strip_prefix('<').ok_or_else(|| malformed("expected '<'"))?;
    let end = escape::find_unescaped(body, '>').ok_or_else(|| malformed("unclosed id list"))?;
    let ids = if body[..end].is_empty() {
        Vec::new()
    } else {
        escape::split_unescaped(&body[..end], ':')
            .into_iter()
            .map(|id| CardId::new(escape::unescape(id)))
            .collect()
    };
    Ok((ids, &body[end + 1..]))
}

fn parse_category_line(line: usize, text: &str) -> DeckResult<CategorySpec> {
    let start = escape::find_unescaped(text, '<').ok_or_else(|| DeckError::MalformedDeckFile {
        line,
        reason: "category line has no id lists".into(),
    })?;
    // one space separates the name from the id lists; the rest is the name
    let name = &text[..start];
    let name = escape::unescape(name.strip_suffix(' ').unwrap_or(name));
    let (whitelist, rest) = take_ids(line, &text[start..])?;
    let (blacklist, rest) = take_ids(line, rest)?;
    let filter = Filter::parse(rest.trim())?;
    Ok(CategorySpec::new(name, filter)
        .with_whitelist(whitelist)
        .with_blacklist(blacklist))
}

/// A card id and count in a JSON deck file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub id: CardId,
    pub count: u32,
}

/// A deck list and its categories in a JSON deck file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckRecord {
    pub cards: Vec<EntryRecord>,
    #[serde(default)]
    pub categories: Vec<CategorySpec>,
}

impl DeckRecord {
    #[must_use]
    pub fn from_deck(deck: &Deck) -> Self {
        Self {
            cards: deck
                .entries()
                .map(|e| EntryRecord {
                    id: e.id().clone(),
                    count: e.count(),
                })
                .collect(),
            categories: deck.categories().map(|c| c.category().to_spec()).collect(),
        }
    }

    /// Rebuild the deck, resolving card ids in `inventory`.
    pub fn to_deck(&self, inventory: &Inventory) -> DeckResult<Deck> {
        let mut deck = Deck::new();
        for record in &self.cards {
            let card = inventory
                .get(&record.id)
                .ok_or_else(|| DeckError::UnknownCard(record.id.to_string()))?;
            if record.count == 0 {
                return Err(DeckError::InvalidCount {
                    card: record.id.to_string(),
                    reason: "a card needs at least one copy".into(),
                });
            }
            if !deck.add(card, record.count) {
                return Err(DeckError::InvalidCount {
                    card: record.id.to_string(),
                    reason: "too many copies".into(),
                });
            }
        }
        for spec in &self.categories {
            deck.add_category(spec.clone())?;
        }
        Ok(deck)
    }
}

/// The JSON deck document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckFile {
    pub main: DeckRecord,
    #[serde(default)]
    pub sideboard: DeckRecord,
    #[serde(default)]
    pub notes: String,
}

impl DeckFile {
    #[must_use]
    pub fn new(main: &Deck, sideboard: &Deck, notes: impl Into<String>) -> Self {
        Self {
            main: DeckRecord::from_deck(main),
            sideboard: DeckRecord::from_deck(sideboard),
            notes: notes.into(),
        }
    }

    pub fn write<W: Write>(&self, out: W) -> DeckResult<()> {
        serde_json::to_writer_pretty(out, self)?;
        Ok(())
    }

    pub fn read<R: Read>(input: R) -> DeckResult<Self> {
        Ok(serde_json::from_reader(input)?)
    }

    pub fn save(&self, path: &Path) -> DeckResult<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write(&mut out)?;
        out.flush()?;
        Ok(())
    }

    pub fn load(path: &Path) -> DeckResult<Self> {
        Self::read(BufReader::new(File::open(path)?))
    }

    /// Rebuild the main deck and sideboard.
    pub fn decks(&self, inventory: &Inventory) -> DeckResult<(Deck, Deck)> {
        Ok((self.main.to_deck(inventory)?, self.sideboard.to_deck(inventory)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::cards::{Card, Expansion, Face, Rarity};
    use crate::deck::CategoryColor;
    use crate::filter::{CardAttribute, Containment};

    fn inventory() -> Inventory {
        let card = |id: &str, types: &[&str]| {
            Card::new(
                CardId::new(id),
                Expansion::new("Alpha", "LEA"),
                Rarity::Common,
                vec![Face::new(id).with_types(types.iter().copied())],
            )
        };
        Inventory::new(vec![card("forest", &["Land"]), card("bear", &["Creature"]), card("odd:id", &["Land"])])
    }

    fn sample(inventory: &Inventory) -> Deck {
        let get = |id: &str| Arc::clone(inventory.get(&CardId::new(id)).unwrap());
        let mut deck = Deck::new();
        deck.add(&get("forest"), 17);
        deck.add(&get("bear"), 4);
        deck.add(&get("odd:id"), 1);
        let lands = Filter::options(CardAttribute::CardType, Containment::AnyOf, ["Land"]).unwrap();
        deck.add_category(CategorySpec::new("Lands <main>", lands).with_color(CategoryColor::new(0, 128, 0)))
            .unwrap();
        deck.include("Lands <main>", &get("bear")).unwrap();
        deck.exclude("Lands <main>", &get("odd:id")).unwrap();
        deck
    }

    #[test]
    fn test_legacy_round_trip() {
        let inventory = inventory();
        let deck = sample(&inventory);
        let mut bytes = Vec::new();
        deck.write_legacy(&mut bytes).unwrap();

        let text = String::from_utf8(bytes.clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "3");
        assert_eq!(lines[1], "forest\t17");
        assert_eq!(lines[4], "1");
        assert_eq!(lines[5], r"Lands \<main\> <bear> <odd\:id> <cardtype:a{Land}>");

        let loaded = Deck::read_legacy(bytes.as_slice(), &inventory).unwrap();
        assert_eq!(loaded.total(), 22);
        let lands = loaded.category("Lands <main>").unwrap();
        assert_eq!(lands.size(), 2);
        assert!(lands.contains(&CardId::new("bear")));
        assert!(!lands.contains(&CardId::new("odd:id")));
    }

    #[test]
    fn test_legacy_errors() {
        let inventory = inventory();
        let read = |text: &str| Deck::read_legacy(text.as_bytes(), &inventory);
        assert!(matches!(read("x\n"), Err(DeckError::MalformedDeckFile { line: 1, .. })));
        assert!(matches!(read("1\nforest 2\n0\n"), Err(DeckError::MalformedDeckFile { line: 2, .. })));
        assert!(matches!(read("1\nnope\t2\n0\n"), Err(DeckError::UnknownCard(_))));
        assert!(matches!(read("1\nforest\t2\n"), Err(DeckError::MalformedDeckFile { .. })));
        assert!(matches!(
            read("0\n1\nBad <> <> <AND <*>\n"),
            Err(DeckError::Filter(_))
        ));
    }

    #[test]
    fn test_legacy_multi_line_text() {
        let inventory = inventory();
        let mut deck = Deck::new();
        deck.add(inventory.get(&CardId::new("bear")).unwrap(), 2);
        let search = Filter::text(CardAttribute::RulesText, Containment::AnyOf, "draw\nflying\r\n\tx").unwrap();
        deck.add_category(CategorySpec::new("Evasive\nDraw", search.clone())).unwrap();
        deck.add_category(CategorySpec::new("  padded ", Filter::everything())).unwrap();

        let mut bytes = Vec::new();
        deck.write_legacy(&mut bytes).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert_eq!(text.lines().count(), 5);

        let loaded = Deck::read_legacy(bytes.as_slice(), &inventory).unwrap();
        assert_eq!(loaded.category("Evasive\nDraw").unwrap().filter(), &search);
        assert!(loaded.contains_category("  padded "));
    }

    #[test]
    fn test_legacy_copy_counts() {
        let inventory = inventory();
        let read = |text: &str| Deck::read_legacy(text.as_bytes(), &inventory);
        for count in ["0", "4294967296", "4294967297", "-1"] {
            assert!(
                matches!(
                    read(&format!("1\nforest\t{count}\n0\n")),
                    Err(DeckError::MalformedDeckFile { line: 2, .. })
                ),
                "{count}"
            );
        }
        assert!(matches!(
            read("2\nforest\t4294967295\nforest\t1\n0\n"),
            Err(DeckError::MalformedDeckFile { line: 3, .. })
        ));
        assert_eq!(read("1\nforest\t4294967295\n0\n").unwrap().total(), u32::MAX);
    }

    #[test]
    fn test_json_copy_counts() {
        let read = |count: &str| {
            let json = format!(r#"{{"main": {{"cards": [{{"id": "forest", "count": 4294967295}}, {{"id": "forest", "count": {count}}}]}}}}"#);
            serde_json::from_str::<DeckFile>(&json).unwrap().decks(&inventory())
        };
        assert!(matches!(read("0"), Err(DeckError::InvalidCount { .. })));
        assert!(matches!(read("1"), Err(DeckError::InvalidCount { .. })));
        assert!(serde_json::from_str::<DeckFile>(r#"{"main": {"cards": [{"id": "forest", "count": 4294967296}]}}"#).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let inventory = inventory();
        let deck = sample(&inventory);
        let file = DeckFile::new(&deck, &Deck::new(), "mono green");

        let mut bytes = Vec::new();
        file.write(&mut bytes).unwrap();
        let read = DeckFile::read(bytes.as_slice()).unwrap();
        assert_eq!(read, file);

        let (main, sideboard) = read.decks(&inventory).unwrap();
        assert_eq!(main.total(), deck.total());
        assert!(sideboard.is_empty());
        assert_eq!(main.category("Lands <main>").unwrap().color(), CategoryColor::new(0, 128, 0));
    }

    #[test]
    fn test_json_unknown_card() {
        let file: DeckFile = serde_json::from_str(r#"{"main": {"cards": [{"id": "zz", "count": 1}]}}"#).unwrap();
        assert!(matches!(file.decks(&inventory()), Err(DeckError::UnknownCard(_))));
    }
}
