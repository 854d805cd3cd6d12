//! Identity-aware record equality.

use super::Record;

/// Two records are equal when they share a host type and either
/// - both have a set, non-null `id` and the ids are equal, or
/// - their defined attributes with values are equal (derived `*_id` keys
///   included).
///
/// Has-many collections never take part.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        if !self.same_entity_as(other) {
            return false;
        }
        let (a, b) = (self.id(), other.id());
        if !a.is_null() && !b.is_null() && a == b {
            return true;
        }
        self.inner.defined_attributes_with_values() == other.inner.defined_attributes_with_values()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{props, Record, Schema, Value};

    fn user_schema() -> Arc<Schema> {
        Arc::new(Schema::builder("User").attributes(["name"]).build().unwrap())
    }

    #[test]
    fn test_equal_ids() {
        let users = user_schema();
        let a = Record::new(&users, props! { "id" => 1, "name" => "John" }).unwrap();
        let b = Record::new(&users, props! { "id" => 1, "name" => "Suzee" }).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_without_ids_attributes_decide() {
        let users = user_schema();
        let john = Record::new(&users, props! { "name" => "John" }).unwrap();
        assert_eq!(john, Record::new(&users, props! { "name" => "John" }).unwrap());
        assert_ne!(john, Record::new(&users, props! { "name" => "Suzee" }).unwrap());
    }

    #[test]
    fn test_null_id_falls_back_to_attributes() {
        let users = user_schema();
        let a = Record::new(&users, props! { "id" => Value::Null, "name" => "John" }).unwrap();
        let b = Record::new(&users, props! { "id" => Value::Null, "name" => "John" }).unwrap();
        let c = Record::new(&users, props! { "name" => "John" }).unwrap();
        assert_eq!(a, b);
        // explicit null id is defined, missing id is not
        assert_ne!(a, c);
    }

    #[test]
    fn test_one_sided_id_compares_attributes() {
        let users = user_schema();
        let a = Record::new(&users, props! { "id" => 1, "name" => "John" }).unwrap();
        let b = Record::new(&users, props! { "name" => "John" }).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_different_ids_differ() {
        let users = user_schema();
        let a = Record::new(&users, props! { "id" => 1, "name" => "John" }).unwrap();
        let b = Record::new(&users, props! { "id" => 2, "name" => "John" }).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_different_host_types_never_equal() {
        let a = Record::new(&user_schema(), props! { "id" => 1 }).unwrap();
        let b = Record::new(&user_schema(), props! { "id" => 1 }).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_not_equal_to_absence() {
        let a = Record::new(&user_schema(), props! { "id" => 1 }).unwrap();
        assert_ne!(Some(a.clone()), None);
        assert_ne!(Value::from(a), Value::Null);
    }

    #[test]
    fn test_has_many_ignored() {
        let artists = Arc::new(Schema::builder("Artist").has_many(["albums"]).build().unwrap());
        let albums = user_schema();
        let a = Record::build(&artists, props! { "id" => 1 }, |b| {
            b.has_many("albums")?.push(Record::new(&albums, props! {})?);
            Ok(())
        })
        .unwrap();
        let b = Record::new(&artists, props! { "id" => 1 }).unwrap();
        assert_eq!(a, b);
    }
}
