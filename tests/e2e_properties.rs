//! Property tests for schema declaration invariants.

use std::collections::HashSet;
use std::sync::Arc;

use entitainer::{props, Record, Schema};
use proptest::prelude::*;

fn name() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

proptest! {
    #[test]
    fn id_always_leads(attrs in prop::collection::vec(name(), 0..8)) {
        let schema = Schema::builder("T").attributes(attrs.clone()).build().unwrap();
        let available = schema.available_attributes();

        prop_assert_eq!(available[0].as_str(), "id");
        prop_assert_eq!(available.iter().filter(|a| *a == "id").count(), 1);

        let distinct: HashSet<_> = available.iter().collect();
        prop_assert_eq!(distinct.len(), available.len());
    }

    #[test]
    fn foreign_key_declared_once(
        attrs in prop::collection::vec(name(), 0..6),
        relations in prop::collection::vec("[a-z]{1,4}_r", 1..4),
    ) {
        let mut declared = attrs.clone();
        // list a derived key explicitly too
        declared.push(format!("{}_id", relations[0]));

        let schema = Schema::builder("T")
            .attributes(declared)
            .belongs_to(relations.clone())
            .build()
            .unwrap();

        for relation in &relations {
            let fk = format!("{relation}_id");
            let count = schema.available_attributes().iter().filter(|a| **a == fk).count();
            prop_assert_eq!(count, 1);
            prop_assert_eq!(schema.foreign_key(relation), Some(fk.as_str()));
        }
    }

    #[test]
    fn empty_construction_defines_nothing(attrs in prop::collection::vec(name(), 0..8)) {
        let schema = Arc::new(Schema::builder("T").attributes(attrs).build().unwrap());
        let record = Record::new(&schema, props! {}).unwrap();

        prop_assert!(record.defined_attributes().is_empty());
        for attr in schema.available_attributes() {
            prop_assert!(record.get(attr).unwrap().is_null());
        }
    }
}
