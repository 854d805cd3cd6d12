//! # Schema Declaration
//!
//! A `Schema` is the descriptor of one host type: its ordered attribute,
//! belongs-to and has-many names, plus the foreign-key attribute derived for
//! every belongs-to relation. It is produced once by a `SchemaBuilder` and is
//! read-only afterward.
//!
//! ```text
//! Schema::builder("Album")
//!     .attributes(["title", "date"])     → [id, title, date]
//!     .belongs_to(["artist"])            → [id, title, date, artist_id]
//!     .has_many(["tracks"])
//!     .build()
//! ```
//!
//! Host-type identity is the identity of the shared `Arc<Schema>`: records
//! built from two separately built schemas never compare equal, even when
//! the declarations match.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use serde::Serialize;

use crate::entity::Record;
use crate::model::PropertyMap;
use crate::{Error, Result};

/// The attribute every schema carries, always first.
pub const ID: &str = "id";

/// Name of the foreign-key attribute derived for a belongs-to relation.
pub fn foreign_key_name(relation: &str) -> String {
    format!("{relation}_{ID}")
}

// ============================================================================
// Slot kinds
// ============================================================================

/// What a declared name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SlotKind {
    /// A scalar attribute, including `id` and derived `*_id` keys.
    Attribute,
    /// A to-one reference to another record.
    BelongsTo,
    /// An ordered to-many collection of records.
    HasMany,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotKind::Attribute => write!(f, "ATTRIBUTE"),
            SlotKind::BelongsTo => write!(f, "BELONGS_TO"),
            SlotKind::HasMany => write!(f, "HAS_MANY"),
        }
    }
}

// ============================================================================
// Schema
// ============================================================================

/// Descriptor of one host type.
#[derive(Debug, Serialize)]
pub struct Schema {
    name: String,
    attributes: Vec<String>,
    belongs_tos: Vec<String>,
    has_manys: Vec<String>,
    /// For each belongs-to relation, the position of its `*_id` attribute.
    #[serde(skip)]
    foreign_keys: Vec<usize>,
    /// name → (kind, position within that kind's list)
    #[serde(skip)]
    index: HashMap<String, (SlotKind, usize)>,
}

impl Schema {
    /// Start a declaration block for the host type `name`.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// Host type name, used in diagnostics and rendering.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All attributes: `id` first, then declaration order, including the
    /// derived `*_id` key of every belongs-to relation.
    pub fn available_attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn available_belongs_tos(&self) -> &[String] {
        &self.belongs_tos
    }

    pub fn available_has_manys(&self) -> &[String] {
        &self.has_manys
    }

    /// Kind of a declared name, `None` when the name was never declared.
    pub fn kind_of(&self, name: &str) -> Option<SlotKind> {
        self.index.get(name).map(|(kind, _)| *kind)
    }

    /// Foreign-key attribute of a belongs-to relation.
    pub fn foreign_key(&self, relation: &str) -> Option<&str> {
        match self.index.get(relation) {
            Some((SlotKind::BelongsTo, pos)) => Some(&self.attributes[self.foreign_keys[*pos]]),
            _ => None,
        }
    }

    /// Construct a frozen record of this host type. See [`Record::new`].
    pub fn new_record(self: &Arc<Self>, args: PropertyMap) -> Result<Record> {
        Record::new(self, args)
    }

    pub(crate) fn slot(&self, name: &str) -> Option<(SlotKind, usize)> {
        self.index.get(name).copied()
    }

    pub(crate) fn foreign_key_position(&self, relation_pos: usize) -> usize {
        self.foreign_keys[relation_pos]
    }

    pub(crate) fn id_position(&self) -> usize {
        // `build` guarantees `id` leads the attribute list
        0
    }
}

// ============================================================================
// SchemaBuilder
// ============================================================================

/// Accumulates the three declaration directives for one host type.
///
/// Every directive appends; repeated names within a kind are skipped.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    attributes: Vec<String>,
    belongs_tos: Vec<String>,
    has_manys: Vec<String>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            belongs_tos: Vec::new(),
            has_manys: Vec::new(),
        }
    }

    /// Declare scalar attributes.
    pub fn attributes(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        for name in names {
            push_distinct(&mut self.attributes, name.into());
        }
        self
    }

    /// Declare to-one relations. Each adds its `*_id` attribute at this
    /// point of the attribute order unless it is already declared.
    pub fn belongs_to(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        for name in names {
            let name = name.into();
            push_distinct(&mut self.attributes, foreign_key_name(&name));
            push_distinct(&mut self.belongs_tos, name);
        }
        self
    }

    /// Declare to-many relations.
    pub fn has_many(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        for name in names {
            push_distinct(&mut self.has_manys, name.into());
        }
        self
    }

    /// Finish the declaration: force `id` to the front and index every name.
    ///
    /// Fails with [`Error::SchemaConflict`] when a name is empty or declared
    /// under more than one kind.
    pub fn build(self) -> Result<Schema> {
        let SchemaBuilder { name, mut attributes, belongs_tos, has_manys } = self;

        match attributes.iter().position(|a| a == ID) {
            Some(0) => {}
            Some(pos) => {
                let id = attributes.remove(pos);
                attributes.insert(0, id);
            }
            None => attributes.insert(0, ID.to_owned()),
        }

        let mut index = HashMap::with_capacity(attributes.len() + belongs_tos.len() + has_manys.len());
        let lists = [
            (SlotKind::Attribute, &attributes),
            (SlotKind::BelongsTo, &belongs_tos),
            (SlotKind::HasMany, &has_manys),
        ];
        for (kind, list) in lists {
            for (pos, slot) in list.iter().enumerate() {
                if slot.is_empty() {
                    return Err(Error::SchemaConflict(format!("{name}: empty {kind} name")));
                }
                if let Some((prev, _)) = index.insert(slot.clone(), (kind, pos)) {
                    return Err(Error::SchemaConflict(format!(
                        "{name}: `{slot}` declared as both {prev} and {kind}"
                    )));
                }
            }
        }

        let foreign_keys = belongs_tos
            .iter()
            .map(|relation| match index.get(&foreign_key_name(relation)) {
                Some((SlotKind::Attribute, pos)) => Ok(*pos),
                _ => Err(Error::SchemaConflict(format!(
                    "{name}: missing foreign key for `{relation}`"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            entity = %name,
            attributes = ?attributes,
            belongs_to = ?belongs_tos,
            has_many = ?has_manys,
            "schema declared"
        );

        Ok(Schema { name, attributes, belongs_tos, has_manys, foreign_keys, index })
    }
}

fn push_distinct(list: &mut Vec<String>, name: String) {
    if !list.contains(&name) {
        list.push(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_added_to_empty_schema() {
        let schema = Schema::builder("Dummy").build().unwrap();
        assert_eq!(schema.available_attributes(), ["id"]);
        assert!(schema.available_belongs_tos().is_empty());
        assert!(schema.available_has_manys().is_empty());
    }

    #[test]
    fn test_id_prepended() {
        let schema = Schema::builder("User")
            .attributes(["first_name", "last_name", "email"])
            .build()
            .unwrap();
        assert_eq!(schema.available_attributes(), ["id", "first_name", "last_name", "email"]);
    }

    #[test]
    fn test_explicit_id_moves_to_front_once() {
        let schema = Schema::builder("User")
            .attributes(["name", "id", "id"])
            .build()
            .unwrap();
        assert_eq!(schema.available_attributes(), ["id", "name"]);
    }

    #[test]
    fn test_belongs_to_derives_foreign_key() {
        let schema = Schema::builder("Album")
            .attributes(["title", "date"])
            .belongs_to(["artist"])
            .build()
            .unwrap();
        assert_eq!(schema.available_attributes(), ["id", "title", "date", "artist_id"]);
        assert_eq!(schema.available_belongs_tos(), ["artist"]);
        assert_eq!(schema.foreign_key("artist"), Some("artist_id"));
        assert_eq!(schema.foreign_key("title"), None);
        assert_eq!(schema.kind_of("artist"), Some(SlotKind::BelongsTo));
        assert_eq!(schema.kind_of("artist_id"), Some(SlotKind::Attribute));
    }

    #[test]
    fn test_explicit_foreign_key_not_duplicated() {
        let before = Schema::builder("Album")
            .attributes(["artist_id", "title"])
            .belongs_to(["artist"])
            .build()
            .unwrap();
        assert_eq!(before.available_attributes(), ["id", "artist_id", "title"]);

        let after = Schema::builder("Album")
            .belongs_to(["artist"])
            .attributes(["title", "artist_id"])
            .build()
            .unwrap();
        assert_eq!(after.available_attributes(), ["id", "artist_id", "title"]);
    }

    #[test]
    fn test_directives_append() {
        let schema = Schema::builder("Track")
            .belongs_to(["album"])
            .belongs_to(["artist", "album"])
            .has_many(["samples"])
            .has_many(["credits"])
            .build()
            .unwrap();
        assert_eq!(schema.available_belongs_tos(), ["album", "artist"]);
        assert_eq!(schema.available_has_manys(), ["samples", "credits"]);
        assert_eq!(schema.available_attributes(), ["id", "album_id", "artist_id"]);
    }

    #[test]
    fn test_cross_kind_conflict_rejected() {
        let err = Schema::builder("Artist")
            .attributes(["albums"])
            .has_many(["albums"])
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::SchemaConflict(_)));

        let err = Schema::builder("Album")
            .attributes(["artist"])
            .belongs_to(["artist"])
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::SchemaConflict(_)));
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = Schema::builder("X").attributes([""]).build().unwrap_err();
        assert!(matches!(err, Error::SchemaConflict(_)));
    }

    #[test]
    fn test_unknown_name_has_no_kind() {
        let schema = Schema::builder("User").attributes(["name"]).build().unwrap();
        assert_eq!(schema.kind_of("phone"), None);
    }
}
