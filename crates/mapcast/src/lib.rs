//! # mapcast
//!
//! Typed property access over loosely-typed, string-keyed maps.
//!
//! Decoded JSON arrives as nested maps, arrays, and scalars of unknown
//! shape. This crate reads one key at a time, coerces the value into the
//! requested type, and recursively builds domain objects through
//! caller-supplied constructors.
//!
//! ## Shape of a lookup
//!
//! ```text
//! RawMap            ← borrowed source, never mutated
//!     │  .string(key) / .number::<N>(key) / .object(key, ctor) / …
//! Property<Rule>    ← one key, one coercion rule
//!     │  .or_throw() | .or_default(v) | .or_default_with(f) | .or_none()
//! Result<T, Error>  ← PropertyError or ObjectError<E>
//! ```
//!
//! Default modes replace only `PropertyError::MissingOrInvalid` raised for
//! the property itself. Element failures inside arrays and errors returned
//! by constructors always propagate.
//!
//! ```
//! use mapcast::{PropertyError, RawMap};
//! use serde_json::json;
//!
//! struct Address {
//!     street: String,
//!     city: String,
//! }
//!
//! impl Address {
//!     fn from_raw(map: &RawMap) -> Result<Self, PropertyError> {
//!         Ok(Self {
//!             street: map.string("street").or_throw()?,
//!             city: map.string("city").or_default("unknown".to_string())?,
//!         })
//!     }
//! }
//!
//! let source = RawMap::from_json(json!({
//!     "count": "42",
//!     "address": {"street": "1 Rd"},
//! }))
//! .expect("object root");
//!
//! assert_eq!(source.number::<i64>("count").or_throw(), Ok(42));
//! let address = source.object("address", Address::from_raw).or_throw().expect("valid address");
//! assert_eq!(address.street, "1 Rd");
//! assert_eq!(address.city, "unknown");
//! ```

pub mod access;
pub mod collection;
pub mod enums;
pub mod error;
pub mod object;
pub mod scalar;
pub mod value;

pub use access::{AccessMode, OrDefault, OrDefaultWith, OrThrow, Property, Rule};
pub use collection::{ArrayOf, BoolArrayWith, StringArray, StringArrayMatching};
pub use enums::{
    ByEnumKey, ByFn, Candidates, EnumArrayRule, EnumKey, EnumLookup, EnumRule, EnumTable,
    KeyExtractor,
};
pub use error::{ObjectError, PropertyError, Recoverable};
pub use object::{MapArray, MapCast, NullableObject, Object, ObjectArray};
pub use scalar::{BoolWith, FromRaw, Matching, Numeric, Scalar};
pub use value::{RawMap, RawValue, ValueKind};
