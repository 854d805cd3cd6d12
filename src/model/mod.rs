//! # Value Model
//!
//! The data that flows into and out of records: the universal `Value`,
//! the constructor input `PropertyMap`, and the ordered `AttributeValues`
//! produced by introspection.
//!
//! This module is pure data: no schema knowledge, no construction rules.

pub mod value;
pub mod property_map;

pub use value::Value;
pub use property_map::{AttributeValues, PropertyMap};
