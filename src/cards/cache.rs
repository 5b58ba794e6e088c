//! Binary inventory cache.
//!
//! Parsing a full card dump takes seconds; the cache stores the already
//! assembled cards with bincode so later start-ups can skip the loader.
//! The index is not stored and is rebuilt on load.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use super::definition::Card;
use super::inventory::Inventory;
use crate::error::LoadError;

impl Inventory {
    /// Write the inventory's cards in the cache format.
    pub fn write_cache<W: Write>(&self, writer: W) -> Result<(), LoadError> {
        let cards: Vec<&Card> = self.iter().map(AsRef::as_ref).collect();
        bincode::serialize_into(writer, &cards)?;
        Ok(())
    }

    /// Read an inventory written by [`Inventory::write_cache`].
    pub fn read_cache<R: Read>(reader: R) -> Result<Self, LoadError> {
        let cards: Vec<Card> = bincode::deserialize_from(reader)?;
        Ok(Self::new(cards))
    }

    pub fn save_cache(&self, path: &Path) -> Result<(), LoadError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_cache(&mut writer)?;
        writer.flush()?;
        tracing::debug!(path = %path.display(), cards = self.len(), "Saved inventory cache");
        Ok(())
    }

    pub fn load_cache(path: &Path) -> Result<Self, LoadError> {
        let inventory = Self::read_cache(BufReader::new(File::open(path)?))?;
        tracing::debug!(path = %path.display(), cards = inventory.len(), "Loaded inventory cache");
        Ok(inventory)
    }
}
