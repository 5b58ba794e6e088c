//! Card filters: predicate trees over card fields.
//!
//! ## Key Types
//!
//! - `CardAttribute`: Registry of filterable fields and their grammar codes
//! - `Mode`: How a leaf compares its field (`Containment`, `Comparator`, existence tests)
//! - `Operand`: The typed value a leaf compares against
//! - `FilterLeaf`: One field, one mode, one operand
//! - `FilterGroup`: AND/OR over one or more child filters
//! - `Filter`: Either of the above, with `matches(card)`
//!
//! ## Encodings
//!
//! Filters round-trip through two encodings:
//!
//! - the bracketed text grammar (`Display` / `FromStr`), used by legacy deck files
//! - a structured JSON form (`to_json` / `from_json`, and serde)

pub mod attribute;
mod codec;
pub(crate) mod escape;
mod json;
pub mod leaf;
pub mod mode;
pub mod operand;
pub mod tree;

pub use attribute::{CardAttribute, NumberValue, ValueKind};
pub use leaf::FilterLeaf;
pub use mode::{Comparator, Containment, GroupMode, Mode};
pub use operand::{ColorOperand, LegalityOperand, Operand, TextOperand};
pub use tree::{Filter, FilterGroup};
