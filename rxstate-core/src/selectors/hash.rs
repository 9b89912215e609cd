//! Key Hashing
//!
//! The hash strategy never compares keys. Instead every argument tuple is
//! serialized to a string and the string is folded into a 32-bit signed
//! integer, which becomes the storage key.
//!
//! # Serialization
//!
//! Each element of the tuple is serialized on its own and the results are
//! joined with a comma:
//!
//! - strings pass through unquoted
//! - numbers, booleans and null use their natural string form
//! - maps and structs serialize as JSON with keys in sorted order, at every
//!   depth, so equal maps give equal strings whatever their iteration order
//! - sequences serialize as a JSON object keyed by element index
//! - anything serde refuses degrades to the `"object"` type tag
//!
//! The last rule is imprecise on purpose: every unserializable value maps to
//! the same string and therefore to the same slot.
//!
//! # Collisions
//!
//! Two different tuples that hash to the same integer share one slot. The
//! second `set` overwrites the first and a `get` for either returns whatever
//! was written last.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

/// Type tag used for values that cannot be serialized.
const OPAQUE_TAG: &str = "\"object\"";

/// Turns argument tuples into hash keys.
pub struct KeySerializer<E> {
    serialize: fn(&E) -> String,
}

impl<E> KeySerializer<E> {
    /// Create a serializer from a per-element serialization function.
    pub fn new(serialize: fn(&E) -> String) -> Self {
        Self { serialize }
    }

    /// Create the default serde-based serializer.
    pub fn json() -> Self
    where
        E: Serialize,
    {
        Self::new(serialize_value::<E>)
    }

    /// Serialize a whole tuple into its comma-joined string form.
    pub fn serialize_key(&self, key: &[E]) -> String {
        key.iter()
            .map(|element| (self.serialize)(element))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Compute the storage key of a tuple.
    pub fn hash_key(&self, key: &[E]) -> i32 {
        string_hash(&self.serialize_key(key))
    }
}

impl<E> Clone for KeySerializer<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for KeySerializer<E> {}

impl<E> fmt::Debug for KeySerializer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySerializer").finish_non_exhaustive()
    }
}

/// Serialize one argument value.
pub fn serialize_value<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(Value::String(s)) => s,
        Ok(Value::Null) => "null".to_string(),
        Ok(scalar @ (Value::Bool(_) | Value::Number(_))) => scalar.to_string(),
        Ok(Value::Array(items)) => {
            let indexed: Map<String, Value> = items
                .into_iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), canonical(item)))
                .collect();
            Value::Object(indexed).to_string()
        }
        Ok(object @ Value::Object(_)) => canonical(object).to_string(),
        Err(_) => OPAQUE_TAG.to_string(),
    }
}

/// Rebuild `value` with every object's keys in sorted order.
///
/// A `HashMap` argument serializes in its iteration order, which differs
/// between equal maps.
fn canonical(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, item)| (key, canonical(item)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonical).collect()),
        other => other,
    }
}

/// Polynomial rolling hash over UTF-16 code units.
///
/// Computes `hash = hash * 31 + unit` with 32-bit wrapping arithmetic. The
/// empty string hashes to 0.
pub fn string_hash(s: &str) -> i32 {
    s.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_mul(31).wrapping_add(i32::from(unit))
    })
}
