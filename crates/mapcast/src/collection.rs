//! Array coercion: one element rule applied across a sequence.

use crate::access::{Property, Rule};
use crate::error::PropertyError;
use crate::scalar::{FromRaw, Matching, Numeric};
use crate::value::{RawMap, RawValue};
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use regex::Regex;
use std::marker::PhantomData;

/// The elements under `key`, or MissingOrInvalid when absent or not an array.
pub(crate) fn sequence<'v>(
    key: &str,
    raw: Option<&'v RawValue>,
    expected: impl FnOnce() -> String,
) -> Result<&'v [RawValue], PropertyError> {
    let Some(raw) = raw else {
        return Err(PropertyError::missing(key, expected()));
    };
    raw.as_array()
        .ok_or_else(|| PropertyError::invalid(key, expected(), raw))
}

pub(crate) fn reject_element(
    key: &str,
    index: usize,
    expected: impl Into<String>,
    element: &RawValue,
) -> PropertyError {
    let error = PropertyError::element(key, index, expected, element);
    tracing::trace!(key, index = %index, kind = %element.kind(), "array element rejected");
    error
}

/// Every element rendered as text; never fails per element.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringArray;

impl Rule for StringArray {
    type Output = Vec<String>;
    type Error = PropertyError;

    fn apply(&self, key: &str, raw: Option<&RawValue>) -> Result<Vec<String>, PropertyError> {
        let items = sequence(key, raw, || "array".to_string())?;
        Ok(items.iter().map(RawValue::to_text).collect())
    }
}

/// Strict element-wise [`FromRaw`]; the first failure aborts the whole array.
#[derive(Debug)]
pub struct ArrayOf<T>(PhantomData<fn() -> T>);

impl<T> ArrayOf<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for ArrayOf<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ArrayOf<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T: FromRaw> Rule for ArrayOf<T> {
    type Output = Vec<T>;
    type Error = PropertyError;

    fn apply(&self, key: &str, raw: Option<&RawValue>) -> Result<Vec<T>, PropertyError> {
        let items = sequence(key, raw, || format!("array of {}", T::EXPECTED))?;
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                T::from_raw(item).ok_or_else(|| reject_element(key, index, T::EXPECTED, item))
            })
            .collect()
    }
}

/// Booleans decided per element by a caller predicate.
#[derive(Debug, Clone)]
pub struct BoolArrayWith<P>(pub P);

impl<P> Rule for BoolArrayWith<P>
where
    P: Fn(&RawValue) -> bool,
{
    type Output = Vec<bool>;
    type Error = PropertyError;

    fn apply(&self, key: &str, raw: Option<&RawValue>) -> Result<Vec<bool>, PropertyError> {
        let items = sequence(key, raw, || "array of boolean".to_string())?;
        Ok(items.iter().map(|item| (self.0)(item)).collect())
    }
}

/// Stringified elements that must each match a pattern.
#[derive(Debug, Clone)]
pub struct StringArrayMatching<'p>(Matching<'p>);

impl<'p> StringArrayMatching<'p> {
    pub fn new(pattern: &'p Regex) -> Self {
        Self(Matching::new(pattern))
    }
}

impl Rule for StringArrayMatching<'_> {
    type Output = Vec<String>;
    type Error = PropertyError;

    fn apply(&self, key: &str, raw: Option<&RawValue>) -> Result<Vec<String>, PropertyError> {
        let items = sequence(key, raw, || format!("array of {}", self.0.expected()))?;
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let text = item.to_text();
                if self.0.is_match(&text) {
                    Ok(text)
                } else {
                    Err(reject_element(key, index, self.0.expected(), item))
                }
            })
            .collect()
    }
}

impl RawMap {
    pub fn string_array<'a>(&'a self, key: &'a str) -> Property<'a, StringArray> {
        self.prop(key, StringArray)
    }

    /// Any [`FromRaw`] element type, converted strictly.
    pub fn array<'a, T: FromRaw>(&'a self, key: &'a str) -> Property<'a, ArrayOf<T>> {
        self.prop(key, ArrayOf::new())
    }

    pub fn number_array<'a, N: Numeric>(&'a self, key: &'a str) -> Property<'a, ArrayOf<N>> {
        self.array(key)
    }

    pub fn big_int_array<'a>(&'a self, key: &'a str) -> Property<'a, ArrayOf<BigInt>> {
        self.array(key)
    }

    pub fn bool_array<'a>(&'a self, key: &'a str) -> Property<'a, ArrayOf<bool>> {
        self.array(key)
    }

    pub fn bool_array_with<'a, P>(
        &'a self,
        key: &'a str,
        predicate: P,
    ) -> Property<'a, BoolArrayWith<P>>
    where
        P: Fn(&RawValue) -> bool,
    {
        self.prop(key, BoolArrayWith(predicate))
    }

    pub fn date_array<'a>(&'a self, key: &'a str) -> Property<'a, ArrayOf<DateTime<Utc>>> {
        self.array(key)
    }

    pub fn string_array_matching<'a>(
        &'a self,
        key: &'a str,
        pattern: &'a Regex,
    ) -> Property<'a, StringArrayMatching<'a>> {
        self.prop(key, StringArrayMatching::new(pattern))
    }
}
