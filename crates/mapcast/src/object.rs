//! Object construction through caller-supplied constructors.
//!
//! The engine only checks shape. A constructor sees a `&RawMap` (or, for the
//! nullable variant, `Option<&RawMap>`) and is free to use accessors on it,
//! so validation recurses uniformly at every depth. Whatever the constructor
//! returns comes back unmodified.

use crate::access::{Property, Rule};
use crate::collection::{reject_element, sequence};
use crate::error::{ObjectError, PropertyError};
use crate::value::{RawMap, RawValue};
use std::marker::PhantomData;

const OBJECT: &str = "object";
const OBJECT_OR_NULL: &str = "object or null";

fn map_shaped<'v>(key: &str, raw: Option<&'v RawValue>) -> Result<&'v RawMap, PropertyError> {
    let raw = raw.ok_or_else(|| PropertyError::missing(key, OBJECT))?;
    raw.as_map()
        .ok_or_else(|| PropertyError::invalid(key, OBJECT, raw))
}

/// Build a `T` from a nested map.
pub struct Object<C, T, E> {
    construct: C,
    _output: PhantomData<fn() -> Result<T, E>>,
}

impl<C, T, E> Object<C, T, E>
where
    C: Fn(&RawMap) -> Result<T, E>,
{
    pub fn new(construct: C) -> Self {
        Self {
            construct,
            _output: PhantomData,
        }
    }
}

impl<C, T, E> Rule for Object<C, T, E>
where
    C: Fn(&RawMap) -> Result<T, E>,
{
    type Output = T;
    type Error = ObjectError<E>;

    fn apply(&self, key: &str, raw: Option<&RawValue>) -> Result<T, ObjectError<E>> {
        let map = map_shaped(key, raw)?;
        (self.construct)(map).map_err(ObjectError::Constructor)
    }
}

/// Like [`Object`], but an explicit `null` reaches the constructor as `None`.
///
/// An absent key is still missing: only a present `null` is accepted.
pub struct NullableObject<C, T, E> {
    construct: C,
    _output: PhantomData<fn() -> Result<T, E>>,
}

impl<C, T, E> NullableObject<C, T, E>
where
    C: Fn(Option<&RawMap>) -> Result<T, E>,
{
    pub fn new(construct: C) -> Self {
        Self {
            construct,
            _output: PhantomData,
        }
    }
}

impl<C, T, E> Rule for NullableObject<C, T, E>
where
    C: Fn(Option<&RawMap>) -> Result<T, E>,
{
    type Output = T;
    type Error = ObjectError<E>;

    fn apply(&self, key: &str, raw: Option<&RawValue>) -> Result<T, ObjectError<E>> {
        let input = match raw {
            None => return Err(PropertyError::missing(key, OBJECT_OR_NULL).into()),
            Some(RawValue::Null) => None,
            Some(RawValue::Map(map)) => Some(map),
            Some(other) => return Err(PropertyError::invalid(key, OBJECT_OR_NULL, other).into()),
        };
        (self.construct)(input).map_err(ObjectError::Constructor)
    }
}

/// Build one `T` per element; the first failure aborts the array.
pub struct ObjectArray<C, T, E> {
    construct: C,
    _output: PhantomData<fn() -> Result<T, E>>,
}

impl<C, T, E> ObjectArray<C, T, E>
where
    C: Fn(&RawMap) -> Result<T, E>,
{
    pub fn new(construct: C) -> Self {
        Self {
            construct,
            _output: PhantomData,
        }
    }
}

impl<C, T, E> Rule for ObjectArray<C, T, E>
where
    C: Fn(&RawMap) -> Result<T, E>,
{
    type Output = Vec<T>;
    type Error = ObjectError<E>;

    fn apply(&self, key: &str, raw: Option<&RawValue>) -> Result<Vec<T>, ObjectError<E>> {
        let items = sequence(key, raw, || "array of object".to_string())?;
        let mut built = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let map = item
                .as_map()
                .ok_or_else(|| reject_element(key, index, OBJECT, item))?;
            built.push((self.construct)(map).map_err(ObjectError::Constructor)?);
        }
        Ok(built)
    }
}

/// Untyped cast of a nested map.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapCast;

impl Rule for MapCast {
    type Output = RawMap;
    type Error = PropertyError;

    fn apply(&self, key: &str, raw: Option<&RawValue>) -> Result<RawMap, PropertyError> {
        map_shaped(key, raw).cloned()
    }
}

/// Untyped cast of an array of maps.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapArray;

impl Rule for MapArray {
    type Output = Vec<RawMap>;
    type Error = PropertyError;

    fn apply(&self, key: &str, raw: Option<&RawValue>) -> Result<Vec<RawMap>, PropertyError> {
        let items = sequence(key, raw, || "array of object".to_string())?;
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.as_map()
                    .cloned()
                    .ok_or_else(|| reject_element(key, index, OBJECT, item))
            })
            .collect()
    }
}

impl RawMap {
    pub fn object<'a, C, T, E>(
        &'a self,
        key: &'a str,
        construct: C,
    ) -> Property<'a, Object<C, T, E>>
    where
        C: Fn(&RawMap) -> Result<T, E>,
    {
        self.prop(key, Object::new(construct))
    }

    pub fn nullable_object<'a, C, T, E>(
        &'a self,
        key: &'a str,
        construct: C,
    ) -> Property<'a, NullableObject<C, T, E>>
    where
        C: Fn(Option<&RawMap>) -> Result<T, E>,
    {
        self.prop(key, NullableObject::new(construct))
    }

    pub fn object_array<'a, C, T, E>(
        &'a self,
        key: &'a str,
        construct: C,
    ) -> Property<'a, ObjectArray<C, T, E>>
    where
        C: Fn(&RawMap) -> Result<T, E>,
    {
        self.prop(key, ObjectArray::new(construct))
    }

    pub fn map<'a>(&'a self, key: &'a str) -> Property<'a, MapCast> {
        self.prop(key, MapCast)
    }

    pub fn map_array<'a>(&'a self, key: &'a str) -> Property<'a, MapArray> {
        self.prop(key, MapArray)
    }
}
