//! The mutable construction window of a record.

use std::sync::Arc;

use smallvec::SmallVec;

use super::{Record, RecordData, Slot};
use crate::model::{PropertyMap, Value};
use crate::schema::{Schema, SlotKind};
use crate::{Error, Result};

/// A record under construction.
///
/// Created by [`RecordBuilder::new`] with phases 1-3 already applied, handed
/// to the finalization callback, then consumed by [`RecordBuilder::finish`].
pub struct RecordBuilder {
    data: RecordData,
}

impl RecordBuilder {
    /// Assign attributes, belongs-to relations and empty has-many
    /// collections from `args`.
    ///
    /// Keys that name no attribute or belongs-to relation are ignored. A
    /// bare `*_id` key without its relation is discarded. A belongs-to key
    /// must carry `Value::Entity` or `Value::Null`.
    pub fn new(schema: &Arc<Schema>, mut args: PropertyMap) -> Result<Self> {
        let attributes: SmallVec<[Slot<Value>; 8]> = schema
            .available_attributes()
            .iter()
            .map(|name| Slot::from(args.remove(name)))
            .collect();

        let mut builder = Self {
            data: RecordData {
                schema: Arc::clone(schema),
                attributes,
                relations: SmallVec::from_elem(Slot::Unset, schema.available_belongs_tos().len()),
                collections: SmallVec::new(),
            },
        };

        for (pos, relation) in schema.available_belongs_tos().iter().enumerate() {
            match args.remove(relation) {
                Some(value) => builder.assign_relation(pos, value)?,
                None => {
                    let fk = schema.foreign_key_position(pos);
                    if builder.data.attributes[fk].is_set() {
                        tracing::trace!(
                            entity = %schema.name(),
                            key = %schema.available_attributes()[fk],
                            "discarding foreign key supplied without its relation"
                        );
                    }
                    builder.data.attributes[fk] = Slot::Unset;
                }
            }
        }

        builder.data.collections = schema.available_has_manys().iter().map(|_| Vec::new()).collect();

        for key in args.keys() {
            tracing::trace!(entity = %schema.name(), key = %key, "ignoring undeclared key");
        }

        Ok(builder)
    }

    /// Freeze the record. Nothing can be changed afterward.
    pub fn finish(self) -> Record {
        Record::from_data(self.data)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.data.schema
    }

    /// Read an attribute or belongs-to relation as assigned so far.
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.data.get(name)
    }

    pub fn belongs_to(&self, name: &str) -> Result<Option<&Record>> {
        self.data.belongs_to(name)
    }

    /// Attach (or detach, with `Value::Null`) the related record of a
    /// belongs-to relation. The `*_id` attribute is set to the related
    /// record's `id`, or `Null`.
    pub fn set_belongs_to(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        match self.data.schema.slot(name) {
            Some((SlotKind::BelongsTo, pos)) => self.assign_relation(pos, value.into()),
            Some((kind, _)) => Err(Error::TypeError {
                expected: SlotKind::BelongsTo.to_string(),
                got: kind.to_string(),
            }),
            None => Err(self.data.unknown(name)),
        }
    }

    /// Append-only handle onto a has-many collection.
    pub fn has_many(&mut self, name: &str) -> Result<HasMany<'_>> {
        match self.data.schema.slot(name) {
            Some((SlotKind::HasMany, pos)) => Ok(HasMany { items: &mut self.data.collections[pos] }),
            Some((kind, _)) => Err(Error::TypeError {
                expected: SlotKind::HasMany.to_string(),
                got: kind.to_string(),
            }),
            None => Err(self.data.unknown(name)),
        }
    }

    pub fn defined_attributes(&self) -> Vec<&str> {
        self.data.defined_attributes()
    }

    fn assign_relation(&mut self, pos: usize, value: Value) -> Result<()> {
        let id = match &value {
            Value::Entity(related) => related.id().clone(),
            Value::Null => Value::Null,
            other => {
                return Err(Error::TypeError {
                    expected: "ENTITY or NULL".into(),
                    got: other.type_name().into(),
                });
            }
        };
        let fk = self.data.schema.foreign_key_position(pos);
        self.data.attributes[fk] = Slot::Set(id);
        self.data.relations[pos] = Slot::Set(value);
        Ok(())
    }
}

/// Append-only view of a has-many collection during construction.
pub struct HasMany<'a> {
    items: &'a mut Vec<Record>,
}

impl HasMany<'_> {
    pub fn push(&mut self, item: impl Into<Record>) {
        self.items.push(item.into());
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.items.iter()
    }
}

impl<R: Into<Record>> Extend<R> for HasMany<'_> {
    fn extend<I: IntoIterator<Item = R>>(&mut self, iter: I) {
        self.items.extend(iter.into_iter().map(Into::into));
    }
}
