//! The generic accessor core.
//!
//! A lookup is a [`Rule`] applied to one key of a [`RawMap`], finished by an
//! [`AccessMode`]. Every named accessor on `RawMap` is a thin constructor for
//! a [`Property`] handle; the three call conventions live here once.

use crate::error::Recoverable;
use crate::value::{RawMap, RawValue};

/// A coercion rule for one target shape.
///
/// `raw` is `None` when the key is absent. Rules are pure: the same input
/// always yields the same success or the same failure.
pub trait Rule {
    type Output;
    type Error: Recoverable;

    fn apply(&self, key: &str, raw: Option<&RawValue>) -> Result<Self::Output, Self::Error>;
}

/// How a lookup reacts to a failed rule.
pub trait AccessMode<T> {
    fn resolve<E: Recoverable>(self, key: &str, outcome: Result<T, E>) -> Result<T, E>;
}

/// Surface every failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrThrow;

/// Replace a missing or invalid property with a constant.
#[derive(Debug, Clone)]
pub struct OrDefault<T>(pub T);

/// Replace a missing or invalid property with a lazily computed value.
#[derive(Debug, Clone)]
pub struct OrDefaultWith<F>(pub F);

impl<T> AccessMode<T> for OrThrow {
    fn resolve<E: Recoverable>(self, _key: &str, outcome: Result<T, E>) -> Result<T, E> {
        outcome
    }
}

impl<T> AccessMode<T> for OrDefault<T> {
    fn resolve<E: Recoverable>(self, key: &str, outcome: Result<T, E>) -> Result<T, E> {
        recover(key, outcome, || self.0)
    }
}

impl<T, F> AccessMode<T> for OrDefaultWith<F>
where
    F: FnOnce() -> T,
{
    fn resolve<E: Recoverable>(self, key: &str, outcome: Result<T, E>) -> Result<T, E> {
        recover(key, outcome, self.0)
    }
}

fn recover<T, E: Recoverable>(
    key: &str,
    outcome: Result<T, E>,
    fallback: impl FnOnce() -> T,
) -> Result<T, E> {
    match outcome {
        Ok(value) => Ok(value),
        Err(error) => match error.as_missing_or_invalid() {
            Some(reason) => {
                tracing::debug!(key, reason = %reason, "property replaced by default");
                Ok(fallback())
            }
            None => Err(error),
        },
    }
}

/// A pending lookup of `key` in `map` under `rule`.
#[must_use = "a property does nothing until an access mode is chosen"]
#[derive(Debug, Clone)]
pub struct Property<'a, R> {
    map: &'a RawMap,
    key: &'a str,
    rule: R,
}

impl<'a, R: Rule> Property<'a, R> {
    pub fn new(map: &'a RawMap, key: &'a str, rule: R) -> Self {
        Self { map, key, rule }
    }

    pub fn key(&self) -> &str {
        self.key
    }

    /// Run the rule and let `mode` decide what a failure turns into.
    pub fn with<M: AccessMode<R::Output>>(self, mode: M) -> Result<R::Output, R::Error> {
        let outcome = self.rule.apply(self.key, self.map.get(self.key));
        mode.resolve(self.key, outcome)
    }

    pub fn or_throw(self) -> Result<R::Output, R::Error> {
        self.with(OrThrow)
    }

    pub fn or_default(self, fallback: R::Output) -> Result<R::Output, R::Error> {
        self.with(OrDefault(fallback))
    }

    /// Like [`Property::or_default`], but `fallback` only runs on failure.
    pub fn or_default_with<F>(self, fallback: F) -> Result<R::Output, R::Error>
    where
        F: FnOnce() -> R::Output,
    {
        self.with(OrDefaultWith(fallback))
    }

    /// `None` for a missing or invalid property; other failures propagate.
    pub fn or_none(self) -> Result<Option<R::Output>, R::Error> {
        match self.rule.apply(self.key, self.map.get(self.key)) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.is_recoverable() => Ok(None),
            Err(error) => Err(error),
        }
    }
}

impl RawMap {
    /// Look up `key` under an arbitrary rule.
    pub fn prop<'a, R: Rule>(&'a self, key: &'a str, rule: R) -> Property<'a, R> {
        Property::new(self, key, rule)
    }
}
