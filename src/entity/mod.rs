//! # Records
//!
//! A `Record` is one frozen instance of a host type. It is produced by a
//! `RecordBuilder` in four ordered phases:
//!
//! 1. **Attributes**: every declared attribute found in the input is *set*
//!    (even to `Null`); the rest stay *unset*.
//! 2. **Belongs-to**: a supplied relation sets both the relation slot and its
//!    `*_id` key from the related record's `id`. An absent relation forces
//!    both slots back to *unset*, discarding any bare `*_id` input.
//! 3. **Has-many**: every collection starts empty.
//! 4. **Finalization**: an optional callback gets `&mut RecordBuilder`; this
//!    is the only window to reassign relations or append to collections.
//!
//! `RecordBuilder::finish` then freezes the data behind an `Arc`. `Record`
//! has no mutating methods, so a frozen record cannot be changed:
//!
//! ```compile_fail
//! use std::sync::Arc;
//! use entitainer::{props, Record, Schema};
//!
//! let schema = Arc::new(Schema::builder("Album").belongs_to(["artist"]).build().unwrap());
//! let album = Record::new(&schema, props! {}).unwrap();
//! album.set_belongs_to("artist", entitainer::Value::Null);
//! ```
//!
//! Frozen has-many collections are plain slices, with nothing to append to:
//!
//! ```compile_fail
//! use std::sync::Arc;
//! use entitainer::{props, Record, Schema};
//!
//! let artists = Arc::new(Schema::builder("Artist").has_many(["albums"]).build().unwrap());
//! let albums = Arc::new(Schema::builder("Album").build().unwrap());
//! let artist = Record::new(&artists, props! {}).unwrap();
//! artist.has_many("albums").unwrap().push(Record::new(&albums, props! {}).unwrap());
//! ```

pub mod slot;
pub mod builder;
mod equality;

use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, Serializer};
use smallvec::SmallVec;

use crate::model::{AttributeValues, PropertyMap, Value};
use crate::schema::{Schema, SlotKind};
use crate::{Error, Result};

pub use builder::{HasMany, RecordBuilder};
pub use slot::Slot;

static NULL: Value = Value::Null;

// ============================================================================
// Slot storage shared by the builder and the frozen record
// ============================================================================

/// Slot storage laid out parallel to the schema's name lists.
pub(crate) struct RecordData {
    pub(crate) schema: Arc<Schema>,
    pub(crate) attributes: SmallVec<[Slot<Value>; 8]>,
    /// Each set slot holds `Value::Entity` or `Value::Null`.
    pub(crate) relations: SmallVec<[Slot<Value>; 2]>,
    pub(crate) collections: SmallVec<[Vec<Record>; 2]>,
}

impl RecordData {
    fn unknown(&self, name: &str) -> Error {
        Error::UnknownAttribute {
            entity: self.schema.name().to_owned(),
            name: name.to_owned(),
        }
    }

    pub(crate) fn get(&self, name: &str) -> Result<&Value> {
        match self.schema.slot(name) {
            Some((SlotKind::Attribute, pos)) => Ok(self.attributes[pos].value().unwrap_or(&NULL)),
            Some((SlotKind::BelongsTo, pos)) => Ok(self.relations[pos].value().unwrap_or(&NULL)),
            Some((SlotKind::HasMany, _)) => Err(Error::TypeError {
                expected: SlotKind::Attribute.to_string(),
                got: SlotKind::HasMany.to_string(),
            }),
            None => Err(self.unknown(name)),
        }
    }

    pub(crate) fn belongs_to(&self, name: &str) -> Result<Option<&Record>> {
        match self.schema.slot(name) {
            Some((SlotKind::BelongsTo, pos)) => Ok(self.relations[pos].value().and_then(Value::as_entity)),
            Some((kind, _)) => Err(Error::TypeError {
                expected: SlotKind::BelongsTo.to_string(),
                got: kind.to_string(),
            }),
            None => Err(self.unknown(name)),
        }
    }

    pub(crate) fn has_many(&self, name: &str) -> Result<&[Record]> {
        match self.schema.slot(name) {
            Some((SlotKind::HasMany, pos)) => Ok(&self.collections[pos]),
            Some((kind, _)) => Err(Error::TypeError {
                expected: SlotKind::HasMany.to_string(),
                got: kind.to_string(),
            }),
            None => Err(self.unknown(name)),
        }
    }

    pub(crate) fn id(&self) -> &Value {
        self.attributes[self.schema.id_position()].value().unwrap_or(&NULL)
    }

    pub(crate) fn defined_attributes(&self) -> Vec<&str> {
        self.schema
            .available_attributes()
            .iter()
            .zip(&self.attributes)
            .filter(|(_, slot)| slot.is_set())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub(crate) fn defined_attributes_with_values(&self) -> AttributeValues {
        let mut values = AttributeValues::with_capacity(self.attributes.len());
        for (name, slot) in self.schema.available_attributes().iter().zip(&self.attributes) {
            if let Some(v) = slot.value() {
                values.push(name, v.clone());
            }
        }
        values
    }
}

// ============================================================================
// Record
// ============================================================================

/// A frozen entity instance.
///
/// Cloning is cheap and shares the same frozen data. Equality follows the
/// identity rules documented on the `PartialEq` impl.
#[derive(Clone)]
pub struct Record {
    inner: Arc<RecordData>,
}

impl Record {
    /// Construct a record without a finalization step.
    pub fn new(schema: &Arc<Schema>, args: PropertyMap) -> Result<Self> {
        Ok(RecordBuilder::new(schema, args)?.finish())
    }

    /// Construct a record, running `finalize` on the still-mutable builder
    /// exactly once before freezing. An error from `finalize` aborts
    /// construction and is returned as is.
    pub fn build<F>(schema: &Arc<Schema>, args: PropertyMap, finalize: F) -> Result<Self>
    where
        F: FnOnce(&mut RecordBuilder) -> Result<()>,
    {
        let mut builder = RecordBuilder::new(schema, args)?;
        finalize(&mut builder)?;
        Ok(builder.finish())
    }

    pub(crate) fn from_data(data: RecordData) -> Self {
        Self { inner: Arc::new(data) }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.inner.schema
    }

    pub fn entity_name(&self) -> &str {
        self.inner.schema.name()
    }

    /// Whether both records belong to the very same host type.
    pub fn same_entity_as(&self, other: &Record) -> bool {
        Arc::ptr_eq(&self.inner.schema, &other.inner.schema)
    }

    /// The `id` attribute, `Null` when unset.
    pub fn id(&self) -> &Value {
        self.inner.id()
    }

    /// Read an attribute or belongs-to relation. Unset slots read as `Null`;
    /// undeclared names fail with [`Error::UnknownAttribute`].
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.inner.get(name)
    }

    /// The related record of a belongs-to relation, if one is attached.
    pub fn belongs_to(&self, name: &str) -> Result<Option<&Record>> {
        self.inner.belongs_to(name)
    }

    /// The frozen collection of a has-many relation, in append order.
    pub fn has_many(&self, name: &str) -> Result<&[Record]> {
        self.inner.has_many(name)
    }

    /// Whether the attribute or relation was supplied during construction.
    pub fn is_defined(&self, name: &str) -> Result<bool> {
        match self.inner.schema.slot(name) {
            Some((SlotKind::Attribute, pos)) => Ok(self.inner.attributes[pos].is_set()),
            Some((SlotKind::BelongsTo, pos)) => Ok(self.inner.relations[pos].is_set()),
            Some((SlotKind::HasMany, _)) => Ok(true),
            None => Err(self.inner.unknown(name)),
        }
    }

    /// Attributes whose slots are set, in declaration order.
    pub fn defined_attributes(&self) -> Vec<&str> {
        self.inner.defined_attributes()
    }

    /// Set attributes with their values, in declaration order.
    pub fn defined_attributes_with_values(&self) -> AttributeValues {
        self.inner.defined_attributes_with_values()
    }

    /// Defined attributes as a plain JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        let object = self
            .inner
            .schema
            .available_attributes()
            .iter()
            .zip(&self.inner.attributes)
            .filter_map(|(name, slot)| slot.value().map(|v| (name.clone(), v.to_json())))
            .collect();
        serde_json::Value::Object(object)
    }

    // Typed accessors call these with names their own schema declares, so a
    // lookup error means the newtype wraps a record of another host type.

    #[doc(hidden)]
    pub fn __read(&self, name: &str) -> &Value {
        self.inner.get(name).unwrap_or_else(|err| panic!("{err}"))
    }

    #[doc(hidden)]
    pub fn __relation(&self, name: &str) -> Option<&Record> {
        self.inner.belongs_to(name).unwrap_or_else(|err| panic!("{err}"))
    }

    #[doc(hidden)]
    pub fn __collection(&self, name: &str) -> &[Record] {
        self.inner.has_many(name).unwrap_or_else(|err| panic!("{err}"))
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.defined_attributes_with_values();
        if values.is_empty() {
            return write!(f, "{} {{}}", self.entity_name());
        }
        write!(f, "{} {{ ", self.entity_name())?;
        for (i, (name, value)) in values.iter().enumerate() {
            if i > 0 { write!(f, ", ")?; }
            write!(f, "{name}: {value}")?;
        }
        write!(f, " }}")
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let schema = &self.inner.schema;
        let mut out = f.debug_struct(schema.name());
        for (name, slot) in schema.available_attributes().iter().zip(&self.inner.attributes) {
            if let Some(v) = slot.value() {
                out.field(name, v);
            }
        }
        for (name, slot) in schema.available_belongs_tos().iter().zip(&self.inner.relations) {
            if let Some(v) = slot.value() {
                out.field(name, v);
            }
        }
        for (name, items) in schema.available_has_manys().iter().zip(&self.inner.collections) {
            out.field(name, items);
        }
        out.finish()
    }
}

/// Serializes as the ordered map of defined attributes.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.defined_attributes_with_values().serialize(serializer)
    }
}

// ============================================================================
// Typed host types
// ============================================================================

/// Evidence that a record was built from the schema of the host type it is
/// being wrapped in. Only this crate constructs it.
#[derive(Debug)]
pub struct SchemaMatch(());

/// A host type backed by a static schema.
///
/// Usually implemented with `#[derive(Entity)]` on a newtype over
/// [`Record`]; the derive also generates one read accessor per declared
/// name. Names that were never declared have no accessor:
///
/// ```compile_fail
/// use entitainer::{props, Entity, Record};
///
/// #[derive(Entity)]
/// #[entity(attributes(name))]
/// struct User(Record);
///
/// let user = User::new(props! { "phone" => "555" }).unwrap();
/// user.phone();
/// ```
///
/// Typed has-many accessors return frozen slices:
///
/// ```compile_fail
/// use entitainer::{props, Entity, Record};
///
/// #[derive(Entity)]
/// #[entity(attributes(name), has_many(albums))]
/// struct Artist(Record);
///
/// #[derive(Entity)]
/// #[entity(attributes(title))]
/// struct Album(Record);
///
/// let artist = Artist::new(props! {}).unwrap();
/// artist.albums().push(Album::new(props! {}).unwrap().into());
/// ```
///
/// The only way to wrap an existing record is [`Entity::try_from_record`];
/// a [`SchemaMatch`] cannot be made outside this crate:
///
/// ```compile_fail
/// use entitainer::entity::SchemaMatch;
///
/// let _ = SchemaMatch(());
/// ```
pub trait Entity: Sized {
    /// The host type's schema, declared once.
    fn schema() -> &'static Arc<Schema>;

    /// Wrap a record whose schema was checked to be `Self::schema()`.
    #[doc(hidden)]
    fn from_matching_record(record: Record, proof: SchemaMatch) -> Self;

    fn record(&self) -> &Record;

    /// Wrap a record, failing when it was built from another schema.
    fn try_from_record(record: Record) -> Result<Self> {
        if Arc::ptr_eq(record.schema(), Self::schema()) {
            Ok(Self::from_matching_record(record, SchemaMatch(())))
        } else {
            Err(Error::TypeError {
                expected: Self::schema().name().to_owned(),
                got: record.entity_name().to_owned(),
            })
        }
    }

    fn new(args: PropertyMap) -> Result<Self> {
        Record::new(Self::schema(), args).map(|r| Self::from_matching_record(r, SchemaMatch(())))
    }

    fn build<F>(args: PropertyMap, finalize: F) -> Result<Self>
    where
        F: FnOnce(&mut RecordBuilder) -> Result<()>,
    {
        Record::build(Self::schema(), args, finalize).map(|r| Self::from_matching_record(r, SchemaMatch(())))
    }

    fn available_attributes() -> &'static [String] {
        Self::schema().available_attributes()
    }

    fn available_belongs_tos() -> &'static [String] {
        Self::schema().available_belongs_tos()
    }

    fn available_has_manys() -> &'static [String] {
        Self::schema().available_has_manys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props;
    use pretty_assertions::assert_eq;

    fn user_schema() -> Arc<Schema> {
        Arc::new(
            Schema::builder("User")
                .attributes(["first_name", "last_name", "email"])
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_no_arguments_defines_nothing() {
        let user = Record::new(&user_schema(), props! {}).unwrap();
        assert!(user.defined_attributes().is_empty());
        assert_eq!(user.get("first_name").unwrap(), &Value::Null);
        assert_eq!(user.id(), &Value::Null);
    }

    #[test]
    fn test_explicit_null_counts_as_defined() {
        let user = Record::new(
            &user_schema(),
            props! { "id" => 1, "first_name" => "Joe", "email" => Value::Null, "last_name" => "Doe" },
        )
        .unwrap();

        assert_eq!(user.defined_attributes(), ["id", "first_name", "last_name", "email"]);
        let values = user.defined_attributes_with_values();
        assert_eq!(values.keys().collect::<Vec<_>>(), ["id", "first_name", "last_name", "email"]);
        assert_eq!(values.get("email"), Some(&Value::Null));
        assert!(user.is_defined("email").unwrap());
    }

    #[test]
    fn test_unknown_name_is_an_error() {
        let user = Record::new(&user_schema(), props! { "phone" => "555-123-456" }).unwrap();
        assert!(user.defined_attributes().is_empty());
        assert!(matches!(
            user.get("phone"),
            Err(Error::UnknownAttribute { ref entity, ref name }) if entity == "User" && name == "phone"
        ));
        assert!(user.is_defined("phone").is_err());
    }

    #[test]
    fn test_display_lists_defined_attributes() {
        let schema = user_schema();
        let user = Record::new(&schema, props! { "first_name" => "Joe", "id" => 3 }).unwrap();
        assert_eq!(user.to_string(), "User { id: 3, first_name: \"Joe\" }");
        assert_eq!(Record::new(&schema, props! {}).unwrap().to_string(), "User {}");
    }

    #[test]
    fn test_to_json_and_serialize() {
        let user = Record::new(&user_schema(), props! { "first_name" => "Joe", "email" => Value::Null }).unwrap();
        assert_eq!(user.to_json(), serde_json::json!({"first_name": "Joe", "email": null}));

        let tagged = serde_json::to_value(&user).unwrap();
        assert_eq!(tagged["first_name"], serde_json::json!({"type": "String", "value": "Joe"}));
        assert_eq!(tagged["email"]["type"], "Null");
    }

    #[test]
    fn test_record_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Record>();
    }
}
