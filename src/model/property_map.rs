//! PropertyMap is the constructor input; AttributeValues is the ordered
//! introspection output.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use smallvec::SmallVec;

use super::Value;

/// A map of attribute/relation names to values, as accepted by record
/// constructors. Keys that match no declared name are ignored.
pub type PropertyMap = HashMap<String, Value>;

/// Build a [`PropertyMap`] from `name => value` pairs.
///
/// ```
/// use entitainer::{props, Value};
///
/// let args = props! { "id" => 1, "email" => Value::Null };
/// assert_eq!(args.len(), 2);
/// ```
#[macro_export]
macro_rules! props {
    () => { $crate::PropertyMap::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::PropertyMap::new();
        $( map.insert(::std::string::String::from($key), $crate::Value::from($value)); )+
        map
    }};
}

/// Defined attributes of a record paired with their values, in declaration
/// order (`id` first).
///
/// Only *set* attributes appear; an attribute explicitly set to `Null` is
/// included with a `Null` value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeValues {
    entries: SmallVec<[(String, Value); 8]>,
}

impl AttributeValues {
    pub(crate) fn with_capacity(n: usize) -> Self {
        Self { entries: SmallVec::with_capacity(n) }
    }

    pub(crate) fn push(&mut self, name: &str, value: Value) {
        self.entries.push((name.to_owned(), value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<'a> IntoIterator for &'a AttributeValues {
    type Item = &'a (String, Value);
    type IntoIter = std::slice::Iter<'a, (String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for AttributeValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
