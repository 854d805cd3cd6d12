//! # entitainer: Declarative Entity Schemas
//!
//! Declare a host type's attributes, to-one relations ("belongs to") and
//! to-many relations ("has many") once, then build immutable records with
//! presence-tagged attributes, derived foreign keys and identity-aware
//! equality.
//!
//! ## Design Principles
//!
//! 1. **Schema as data**: a `Schema` descriptor is built once per host type
//! 2. **Unset is not null**: every slot is a `Slot` (`Unset` / `Set(value)`)
//! 3. **Two-phase construction**: `RecordBuilder` is mutable, `Record` is not
//! 4. **Identity first**: equal ids mean equal records, otherwise attributes decide
//!
//! ## Quick Start
//!
//! ```rust
//! use entitainer::{props, Entity, Record, Value};
//!
//! #[derive(Entity)]
//! #[entity(attributes(name), has_many(albums))]
//! pub struct Artist(Record);
//!
//! #[derive(Entity)]
//! #[entity(attributes(title, date), belongs_to(artist))]
//! pub struct Album(Record);
//!
//! # fn main() -> entitainer::Result<()> {
//! assert_eq!(Album::available_attributes(), ["id", "title", "date", "artist_id"]);
//!
//! let artist = Artist::new(props! { "id" => 1, "name" => "Czarny motyl" })?;
//! let album = Album::new(props! { "title" => "Maszyna do robienia dymu", "artist" => &artist })?;
//!
//! assert_eq!(album.artist_id(), &Value::Int(1));
//! assert_eq!(album.defined_attributes(), ["title", "artist_id"]);
//!
//! let artist = Artist::build(props! { "name" => "Czarny motyl" }, |a| {
//!     a.has_many("albums")?.push(Album::new(props! { "title" => "Maszyna do suszenia łez" })?);
//!     Ok(())
//! })?;
//! assert_eq!(artist.albums().len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `derive` | yes | `#[derive(Entity)]` for typed host types |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod schema;
pub mod entity;

// ============================================================================
// Re-exports
// ============================================================================

pub use model::{AttributeValues, PropertyMap, Value};
pub use schema::{Schema, SchemaBuilder, SlotKind};
pub use entity::{Entity, HasMany, Record, RecordBuilder, Slot};

#[cfg(feature = "derive")]
pub use entitainer_derive::Entity;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Undefined attribute `{name}` for {entity}")]
    UnknownAttribute { entity: String, name: String },

    #[error("Type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },

    #[error("Schema conflict: {0}")]
    SchemaConflict(String),

    #[error("Construction failed: {0}")]
    Construction(String),
}

pub type Result<T> = std::result::Result<T, Error>;
