//! Background loading of card database dumps.
//!
//! The loader reads an MTGJSON-style dump, either the v5 layout
//! (`{"meta": ..., "data": {SET: {...}}}`) or the older bare set map, and
//! builds an [`Inventory`]. Work happens one set at a time:
//!
//! 1. every card record in the set is parsed into a face;
//! 2. records of multi-faced cards are grouped by Scryfall id and joined;
//! 3. duplicate ids are dropped and the inventory index is built.
//!
//! A record that fails to parse is skipped and a warning is recorded; the
//! load carries on. Progress is reported through [`LoadEvent`]s, and a
//! [`CancelToken`] is checked at every set and card boundary. A cancelled
//! load yields an empty inventory, never a partial one.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::attributes::{CardLayout, ColorSet, Expansion, Legality, ManaType, Rarity, NO_BLOCK};
use super::definition::{Card, CardId, Face, FACE_SEPARATOR};
use super::inventory::Inventory;
use super::mana::ManaCost;
use crate::deck::FORMAT_NAMES;
use crate::error::LoadError;

type Object = Map<String, Value>;

/// Loader settings.
///
/// ## Example
///
/// ```
/// use deck_editor::cards::LoaderConfig;
///
/// let config = LoaderConfig::default()
///     .with_require_multiverse_id(false)
///     .with_progress_step(5);
/// assert!(config.warn_missing_artist);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Skip records without a multiverse id (cards not in Gatherer).
    pub require_multiverse_id: bool,

    /// Record a warning for faces without an artist.
    pub warn_missing_artist: bool,

    /// Minimum percentage increase between progress events.
    pub progress_step: u8,

    /// Formats with known deck constraints; others produce a warning.
    pub known_formats: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            require_multiverse_id: true,
            warn_missing_artist: true,
            progress_step: 1,
            known_formats: FORMAT_NAMES.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl LoaderConfig {
    /// Set whether records need a multiverse id (builder pattern).
    #[must_use]
    pub fn with_require_multiverse_id(mut self, require: bool) -> Self {
        self.require_multiverse_id = require;
        self
    }

    /// Set whether missing artists are reported (builder pattern).
    #[must_use]
    pub fn with_warn_missing_artist(mut self, warn: bool) -> Self {
        self.warn_missing_artist = warn;
        self
    }

    /// Set the progress granularity in percent (builder pattern).
    #[must_use]
    pub fn with_progress_step(mut self, step: u8) -> Self {
        self.progress_step = step.max(1);
        self
    }

    /// Set the formats considered known (builder pattern).
    #[must_use]
    pub fn with_known_formats<S: Into<String>>(mut self, formats: impl IntoIterator<Item = S>) -> Self {
        self.known_formats = formats.into_iter().map(Into::into).collect();
        self
    }
}

/// Load progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// Work whose size is not known (opening and parsing the file).
    Indeterminate,
    /// Percentage of card records processed. Never decreases within a load.
    Percent(u8),
}

/// Notification sent while loading, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadEvent {
    /// The loader moved to a new stage.
    Stage(String),
    Progress(Progress),
}

/// Cooperative cancellation flag shared with a running load.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the load to stop at the next set or card boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Result of a load.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub inventory: Inventory,
    /// Problems with individual records, in the order they were found.
    pub warnings: Vec<String>,
    /// The load was cancelled; `inventory` is empty.
    pub cancelled: bool,
}

impl LoadOutcome {
    fn cancelled() -> Self {
        Self {
            cancelled: true,
            ..Self::default()
        }
    }
}

/// Handle to a load running on a worker thread.
#[derive(Debug)]
pub struct LoadHandle {
    events: Receiver<LoadEvent>,
    cancel: CancelToken,
    worker: JoinHandle<Result<LoadOutcome, LoadError>>,
}

impl LoadHandle {
    /// Events sent by the worker. The channel closes when the load ends.
    #[must_use]
    pub fn events(&self) -> &Receiver<LoadEvent> {
        &self.events
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Block until the load finishes.
    pub fn wait(self) -> Result<LoadOutcome, LoadError> {
        self.worker.join().map_err(|_| LoadError::WorkerPanicked)?
    }
}

/// Builds an [`Inventory`] from a card database dump.
#[derive(Clone, Debug, Default)]
pub struct InventoryLoader {
    config: LoaderConfig,
}

impl InventoryLoader {
    #[must_use]
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load a dump from disk on a new thread.
    pub fn spawn(self, path: impl Into<PathBuf>) -> LoadHandle {
        let (sender, events) = mpsc::channel();
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let path = path.into();
        let worker = thread::spawn(move || {
            self.load_file(&path, &token, |event| {
                // the receiver may have been dropped; the load still completes
                let _ = sender.send(event);
            })
        });
        LoadHandle {
            events,
            cancel,
            worker,
        }
    }

    /// Load a dump from disk on the current thread.
    pub fn load_file(
        &self,
        path: &Path,
        cancel: &CancelToken,
        mut on_event: impl FnMut(LoadEvent),
    ) -> Result<LoadOutcome, LoadError> {
        let file_name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        on_event(LoadEvent::Stage(format!("Opening {file_name}...")));
        on_event(LoadEvent::Progress(Progress::Indeterminate));
        let text = fs::read_to_string(path)?;
        on_event(LoadEvent::Stage(format!("Parsing {file_name}...")));
        let root: Value = serde_json::from_str(&text)?;
        self.load_value(&root, cancel, on_event)
    }

    /// Load a dump held in memory.
    pub fn load_str(
        &self,
        json: &str,
        cancel: &CancelToken,
        on_event: impl FnMut(LoadEvent),
    ) -> Result<LoadOutcome, LoadError> {
        let root: Value = serde_json::from_str(json)?;
        self.load_value(&root, cancel, on_event)
    }

    /// Load an already parsed dump.
    pub fn load_value(
        &self,
        root: &Value,
        cancel: &CancelToken,
        mut on_event: impl FnMut(LoadEvent),
    ) -> Result<LoadOutcome, LoadError> {
        let root = root
            .as_object()
            .ok_or_else(|| LoadError::MissingData("top level is not an object".into()))?;
        let v5 = root.contains_key("meta");
        let sets = if v5 {
            root.get("data")
                .and_then(Value::as_object)
                .ok_or_else(|| LoadError::MissingData("no \"data\" object".into()))?
        } else {
            root
        };

        let total = self.count_records(sets, v5);
        tracing::debug!(sets = sets.len(), cards = total, v5, "Reading inventory dump");
        on_event(LoadEvent::Stage("Reading cards...".into()));

        let mut progress = ProgressTracker::new(total, self.config.progress_step);
        on_event(LoadEvent::Progress(progress.start()));

        let mut warnings = Vec::new();
        let mut records = Vec::with_capacity(total);
        for (key, set) in sets {
            if cancel.is_cancelled() {
                tracing::debug!("Inventory load cancelled");
                return Ok(LoadOutcome::cancelled());
            }
            let Some(set) = set.as_object() else {
                warnings.push(format!("{key}: set entry is not an object"));
                continue;
            };
            let expansion = Arc::new(parse_expansion(key, set));
            on_event(LoadEvent::Stage(format!("Loading cards from {}...", expansion.name)));

            for card in set.get("cards").and_then(Value::as_array).into_iter().flatten() {
                if cancel.is_cancelled() {
                    tracing::debug!("Inventory load cancelled");
                    return Ok(LoadOutcome::cancelled());
                }
                let Some(card) = card.as_object() else {
                    continue;
                };
                let multiverse_id = multiverse_id(card, v5);
                if self.config.require_multiverse_id && multiverse_id.is_none() {
                    continue;
                }
                match parse_record(card, &expansion, v5, multiverse_id) {
                    Ok(record) => {
                        if self.config.warn_missing_artist && record.face.artist.is_empty() {
                            warnings.push(format!("{} ({}): Missing artist!", record.face.name, expansion));
                        }
                        records.push(record);
                    }
                    Err(reason) => {
                        let name = card_name(card).unwrap_or("<unnamed>");
                        tracing::warn!(card = %name, set = %expansion, reason = %reason, "Skipping card");
                        warnings.push(format!("{name} ({expansion}): {reason}"));
                    }
                }
                if let Some(p) = progress.advance() {
                    on_event(LoadEvent::Progress(p));
                }
            }
        }

        on_event(LoadEvent::Stage("Processing multi-faced cards...".into()));
        let cards = assemble(records, &mut warnings);

        on_event(LoadEvent::Stage("Removing duplicate entries...".into()));
        let inventory = Inventory::new(cards);

        let unknown: Vec<&str> = inventory
            .index()
            .formats
            .iter()
            .filter(|f| !self.config.known_formats.iter().any(|k| k.eq_ignore_ascii_case(f)))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            warnings.push(format!(
                "Could not find definitions for the following formats: {}",
                unknown.join(", ")
            ));
        }

        on_event(LoadEvent::Progress(Progress::Percent(100)));
        tracing::debug!(cards = inventory.len(), warnings = warnings.len(), "Inventory loaded");
        Ok(LoadOutcome {
            inventory,
            warnings,
            cancelled: false,
        })
    }

    fn count_records(&self, sets: &Object, v5: bool) -> usize {
        sets.values()
            .filter_map(|set| set.get("cards").and_then(Value::as_array))
            .flatten()
            .filter_map(Value::as_object)
            .filter(|card| !self.config.require_multiverse_id || multiverse_id(card, v5).is_some())
            .count()
    }
}

/// Turns processed-record counts into non-decreasing percentages.
struct ProgressTracker {
    total: usize,
    done: usize,
    step: u8,
    reported: u8,
}

impl ProgressTracker {
    fn new(total: usize, step: u8) -> Self {
        Self {
            total,
            done: 0,
            step: step.max(1),
            reported: 0,
        }
    }

    fn start(&self) -> Progress {
        if self.total == 0 {
            Progress::Indeterminate
        } else {
            Progress::Percent(0)
        }
    }

    fn advance(&mut self) -> Option<Progress> {
        self.done += 1;
        if self.total == 0 {
            return None;
        }
        let percent = (self.done.min(self.total) * 100 / self.total) as u8;
        if percent >= self.reported.saturating_add(self.step) || (percent == 100 && self.reported < 100) {
            self.reported = percent;
            Some(Progress::Percent(percent))
        } else {
            None
        }
    }
}

/// One face record from the dump.
struct Record {
    id: Option<String>,
    group: Option<String>,
    order: usize,
    layout: CardLayout,
    face: Face,
    rarity: Rarity,
    color_identity: ColorSet,
    mana_value: Option<f64>,
    legality: Vec<(String, Legality)>,
    multiverse_id: Option<u32>,
    expansion: Arc<Expansion>,
}

impl Record {
    fn fallback_id(&self) -> String {
        format!("{}-{}-{}", self.expansion.code, self.face.number, self.face.name)
    }

    fn into_card(self, id: CardId, layout: CardLayout) -> Card {
        build_card(id, layout, vec![self])
    }
}

fn parse_expansion(key: &str, set: &Object) -> Expansion {
    let name = str_of(set, "name").unwrap_or(key);
    let code = str_of(set, "code").unwrap_or(key);
    let mut expansion = Expansion::new(name, code).with_block(str_of(set, "block").unwrap_or(NO_BLOCK));
    if let Some(date) = str_of(set, "releaseDate") {
        expansion = expansion.with_release_date(date);
    }
    expansion
}

fn str_of<'a>(object: &'a Object, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}

fn card_name(card: &Object) -> Option<&str> {
    str_of(card, "faceName").or_else(|| str_of(card, "name"))
}

fn strings_of(card: &Object, key: &str) -> Result<Vec<String>, String> {
    match card.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| v.as_str().map(str::to_string).ok_or_else(|| format!("\"{key}\" has a non-string entry")))
            .collect(),
        Some(_) => Err(format!("\"{key}\" is not a list")),
    }
}

fn colors_of(card: &Object, key: &str) -> Result<ColorSet, String> {
    strings_of(card, key)?
        .iter()
        .map(|c| ManaType::from_str(c))
        .collect()
}

fn multiverse_id(card: &Object, v5: bool) -> Option<u32> {
    let value = if v5 {
        card.get("identifiers")?.get("multiverseId")?
    } else {
        card.get("multiverseId")?
    };
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn parse_record(
    card: &Object,
    expansion: &Arc<Expansion>,
    v5: bool,
    multiverse_id: Option<u32>,
) -> Result<Record, String> {
    let name = card_name(card).ok_or("missing name")?;
    let full_name = str_of(card, "name").unwrap_or(name);
    let layout = CardLayout::from_str(str_of(card, "layout").unwrap_or("normal"))?;
    let rarity = Rarity::from_str(str_of(card, "rarity").ok_or("missing rarity")?)?;
    let mana_cost = ManaCost::parse(str_of(card, "manaCost").unwrap_or(""))?;

    let mut face = Face::new(name)
        .with_mana_cost(mana_cost)
        .with_colors(colors_of(card, "colors")?)
        .with_supertypes(strings_of(card, "supertypes")?)
        .with_types(strings_of(card, "types")?)
        .with_subtypes(strings_of(card, "subtypes")?)
        .with_type_line(str_of(card, "type").unwrap_or(""))
        .with_rules_text(str_of(card, "text").unwrap_or(""))
        .with_flavor_text(str_of(card, "flavorText").unwrap_or(""))
        .with_artist(str_of(card, "artist").unwrap_or(""))
        .with_number(str_of(card, "number").unwrap_or(""));
    if let (Some(power), Some(toughness)) = (str_of(card, "power"), str_of(card, "toughness")) {
        face = face.with_stats(power, toughness);
    }
    match card.get("loyalty") {
        Some(Value::String(loyalty)) => face = face.with_loyalty(loyalty),
        Some(Value::Null) => face = face.with_loyalty("X"),
        _ => {}
    }

    let mut legality = Vec::new();
    if let Some(formats) = card.get("legalities").and_then(Value::as_object) {
        for (format, status) in formats {
            let status = status.as_str().ok_or_else(|| format!("legality for {format} is not text"))?;
            legality.push((format.to_lowercase(), Legality::from_str(status)?));
        }
    }

    let identifiers = if v5 {
        card.get("identifiers").and_then(Value::as_object)
    } else {
        Some(card)
    };
    let scryfall = identifiers.and_then(|ids| str_of(ids, "scryfallId"));
    let uuid = str_of(card, "uuid");

    let names: Vec<String> = if v5 {
        full_name.split(FACE_SEPARATOR).map(str::to_string).collect()
    } else {
        strings_of(card, "names")?
    };
    let order = match str_of(card, "side") {
        Some(side) => side.bytes().next().map_or(0, |b| usize::from(b.saturating_sub(b'a'))),
        None => names.iter().position(|n| n == name).unwrap_or(0),
    };
    let group = if layout.is_multi_faced() && layout != CardLayout::Meld {
        scryfall
            .map(str::to_string)
            .or_else(|| (names.len() > 1).then(|| names.join(FACE_SEPARATOR)))
            .map(|key| format!("{}:{key}", expansion.code))
    } else {
        None
    };

    Ok(Record {
        id: scryfall.or(uuid).map(str::to_string),
        group,
        order,
        layout,
        face,
        rarity,
        color_identity: colors_of(card, "colorIdentity")?,
        mana_value: card
            .get("manaValue")
            .or_else(|| card.get("convertedManaCost"))
            .and_then(Value::as_f64),
        legality,
        multiverse_id,
        expansion: Arc::clone(expansion),
    })
}

/// Join face records into cards, keeping dump order.
fn assemble(records: Vec<Record>, warnings: &mut Vec<String>) -> Vec<Card> {
    enum Slot {
        Single(Record),
        Faces(String, Vec<Record>),
    }

    let mut slots: Vec<Slot> = Vec::with_capacity(records.len());
    let mut groups: FxHashMap<String, usize> = FxHashMap::default();
    for record in records {
        match record.group.clone() {
            Some(key) => match groups.get(&key) {
                Some(&i) => {
                    if let Slot::Faces(_, faces) = &mut slots[i] {
                        faces.push(record);
                    }
                }
                None => {
                    groups.insert(key.clone(), slots.len());
                    slots.push(Slot::Faces(key, vec![record]));
                }
            },
            None => slots.push(Slot::Single(record)),
        }
    }

    let mut cards = Vec::with_capacity(slots.len());
    for slot in slots {
        match slot {
            Slot::Single(record) => {
                let id = CardId::new(record.id.clone().unwrap_or_else(|| record.fallback_id()));
                let layout = record.layout;
                cards.push(record.into_card(id, layout));
            }
            Slot::Faces(key, mut faces) => {
                faces.sort_by_key(|f| f.order);
                match face_problem(&faces) {
                    None => {
                        let id = key.split_once(':').map_or(key.as_str(), |(_, id)| id).to_string();
                        let layout = faces[0].layout;
                        cards.push(build_card(CardId::new(id), layout, faces));
                    }
                    Some(problem) => {
                        let first = &faces[0];
                        tracing::warn!(card = %first.face.name, set = %first.expansion, problem, "Splitting faces");
                        warnings.push(format!("{} ({}): {problem}", first.face.name, first.expansion));
                        for (side, record) in faces.into_iter().enumerate() {
                            let id = CardId::new(format!("{}-{side}", record.fallback_id()));
                            cards.push(record.into_card(id, CardLayout::Normal));
                        }
                    }
                }
            }
        }
    }
    cards
}

fn face_problem(faces: &[Record]) -> Option<&'static str> {
    let layout = faces[0].layout;
    if faces.len() < 2 {
        Some("Can't find other face(s) of multi-faced card")
    } else if faces.iter().any(|f| f.layout != layout) {
        Some("Can't join faces with different layouts")
    } else if faces.len() > 2
        && !matches!(layout, CardLayout::Split | CardLayout::Aftermath | CardLayout::Adventure)
    {
        Some("Too many faces for card")
    } else {
        None
    }
}

/// Build a card from one or more face records. `records` must not be empty.
fn build_card(id: CardId, layout: CardLayout, records: Vec<Record>) -> Card {
    let expansion = Arc::clone(&records[0].expansion);
    let rarity = records[0].rarity;
    let mana_value = records[0].mana_value;
    let multiverse_id = records[0].multiverse_id;
    let legality = records[0].legality.clone();
    let identity = records
        .iter()
        .fold(ColorSet::COLORLESS, |set, r| set.union(r.color_identity));

    let faces = records.into_iter().map(|r| r.face).collect();
    let mut card = Card::new(id, expansion, rarity, faces)
        .with_layout(layout)
        .with_color_identity(identity);
    if let Some(mana_value) = mana_value {
        card = card.with_mana_value(mana_value);
    }
    for (format, status) in legality {
        card = card.with_legality(format, status);
    }
    if let Some(multiverse_id) = multiverse_id {
        card = card.with_multiverse_id(multiverse_id);
    }
    card
}
