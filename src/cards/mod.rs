//! Card system: definitions, inventory, and loading.
//!
//! ## Key Types
//!
//! - `CardId`: Stable identifier of a printing
//! - `Card` / `Face`: Immutable card record with one or more faces
//! - `ManaCost`, `ColorSet`, `Rarity`, `Legality`, `StatValue`: Field values
//! - `Inventory`: Every known card, with lookup and search
//! - `InventoryIndex`: Value lists observed while loading (types, sets, formats)
//! - `InventoryLoader`: Background loader for card database dumps
//!
//! Cards are created once when the inventory loads and are shared as
//! `Arc<Card>` afterwards; nothing mutates them.

pub mod attributes;
pub mod cache;
pub mod definition;
pub mod inventory;
pub mod loader;
pub mod mana;

pub use attributes::{CardLayout, ColorSet, Expansion, Legality, ManaType, Rarity, StatValue, NO_BLOCK};
pub use definition::{normalize, Card, CardId, Face, FACE_SEPARATOR, THIS};
pub use inventory::{Inventory, InventoryIndex};
pub use loader::{CancelToken, InventoryLoader, LoadEvent, LoadHandle, LoadOutcome, LoaderConfig, Progress};
pub use mana::{ManaCost, ManaSymbol};
