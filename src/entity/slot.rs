//! Presence-tagged storage for a single attribute or relation.

use serde::Serialize;

/// A slot that remembers whether it was ever supplied.
///
/// `Set(Value::Null)` and `Unset` both read as `Null` through record
/// accessors, but only `Set` slots count as defined.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Slot<T> {
    Unset,
    Set(T),
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot::Unset
    }
}

impl<T> Slot<T> {
    pub fn is_set(&self) -> bool { matches!(self, Slot::Set(_)) }
    pub fn is_unset(&self) -> bool { matches!(self, Slot::Unset) }

    pub fn value(&self) -> Option<&T> {
        match self {
            Slot::Set(v) => Some(v),
            Slot::Unset => None,
        }
    }
}

impl<T> From<Option<T>> for Slot<T> {
    fn from(v: Option<T>) -> Self {
        v.map_or(Slot::Unset, Slot::Set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn test_set_null_is_not_unset() {
        let explicit: Slot<Value> = Slot::Set(Value::Null);
        let missing: Slot<Value> = Slot::Unset;

        assert!(explicit.is_set());
        assert!(missing.is_unset());
        assert_ne!(explicit, missing);
        assert_eq!(explicit.value(), Some(&Value::Null));
        assert_eq!(missing.value(), None);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Slot::from(Some(1)), Slot::Set(1));
        assert_eq!(Slot::<i32>::from(None), Slot::Unset);
        assert_eq!(Slot::<i32>::default(), Slot::Unset);
    }
}
