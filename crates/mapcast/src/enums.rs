//! Enum matching against a finite candidate set.
//!
//! A raw string matches the first candidate whose extracted key equals it
//! exactly. Slice-based lookups scan linearly; an [`EnumTable`] precomputes
//! the key index once for candidate sets reused across many lookups.

use crate::access::{Property, Rule};
use crate::collection::{reject_element, sequence};
use crate::error::PropertyError;
use crate::value::{RawMap, RawValue};
use std::borrow::Cow;
use std::collections::HashMap;
use std::marker::PhantomData;

/// Canonical external key of an enum value.
///
/// This is the default key extractor.
pub trait EnumKey {
    fn enum_key(&self) -> &str;
}

/// Maps a candidate to the key raw values are compared against.
pub trait KeyExtractor<T> {
    fn key<'t>(&self, candidate: &'t T) -> Cow<'t, str>;

    fn matches(&self, candidate: &T, raw: &str) -> bool {
        self.key(candidate) == raw
    }
}

/// Extracts keys through [`EnumKey`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ByEnumKey;

impl<T: EnumKey> KeyExtractor<T> for ByEnumKey {
    fn key<'t>(&self, candidate: &'t T) -> Cow<'t, str> {
        Cow::Borrowed(candidate.enum_key())
    }

    fn matches(&self, candidate: &T, raw: &str) -> bool {
        candidate.enum_key() == raw
    }
}

/// Extracts keys through a caller function.
pub struct ByFn<F, K> {
    extract: F,
    _key: PhantomData<fn() -> K>,
}

impl<F, K> ByFn<F, K> {
    pub fn new(extract: F) -> Self {
        Self {
            extract,
            _key: PhantomData,
        }
    }
}

impl<T, F, K> KeyExtractor<T> for ByFn<F, K>
where
    F: Fn(&T) -> K,
    K: AsRef<str>,
{
    fn key<'t>(&self, candidate: &'t T) -> Cow<'t, str> {
        Cow::Owned((self.extract)(candidate).as_ref().to_string())
    }

    fn matches(&self, candidate: &T, raw: &str) -> bool {
        (self.extract)(candidate).as_ref() == raw
    }
}

/// A source of enum candidates addressable by raw key.
pub trait EnumLookup {
    type Candidate: Clone;

    fn find(&self, raw: &str) -> Option<&Self::Candidate>;

    /// Human-readable list of accepted keys.
    fn expected(&self) -> String;
}

fn one_of<'k>(keys: impl Iterator<Item = Cow<'k, str>>) -> String {
    let keys: Vec<Cow<'k, str>> = keys.collect();
    format!("one of [{}]", keys.join(", "))
}

/// Linear scan over a candidate slice.
pub struct Candidates<'c, T, X> {
    candidates: &'c [T],
    extractor: X,
}

impl<'c, T, X: KeyExtractor<T>> Candidates<'c, T, X> {
    pub fn new(candidates: &'c [T], extractor: X) -> Self {
        Self {
            candidates,
            extractor,
        }
    }
}

impl<T: Clone, X: KeyExtractor<T>> EnumLookup for Candidates<'_, T, X> {
    type Candidate = T;

    fn find(&self, raw: &str) -> Option<&T> {
        self.candidates
            .iter()
            .find(|candidate| self.extractor.matches(candidate, raw))
    }

    fn expected(&self) -> String {
        one_of(
            self.candidates
                .iter()
                .map(|candidate| self.extractor.key(candidate)),
        )
    }
}

/// Precomputed key → candidate index.
///
/// When two candidates share a key the first one wins, matching the scan
/// order of a slice lookup.
#[derive(Debug, Clone)]
pub struct EnumTable<T> {
    candidates: Vec<T>,
    keys: Vec<String>,
    index: HashMap<String, usize>,
}

impl<T> EnumTable<T> {
    /// Build a table keyed by [`EnumKey`].
    pub fn new(candidates: impl IntoIterator<Item = T>) -> Self
    where
        T: EnumKey,
    {
        Self::with_extractor(candidates, ByEnumKey)
    }

    /// Build a table keyed by `extractor`.
    pub fn with_extractor<X: KeyExtractor<T>>(
        candidates: impl IntoIterator<Item = T>,
        extractor: X,
    ) -> Self {
        let candidates: Vec<T> = candidates.into_iter().collect();
        let keys: Vec<String> = candidates
            .iter()
            .map(|candidate| extractor.key(candidate).into_owned())
            .collect();
        let mut index = HashMap::with_capacity(keys.len());
        for (position, key) in keys.iter().enumerate() {
            index.entry(key.clone()).or_insert(position);
        }
        Self {
            candidates,
            keys,
            index,
        }
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.index
            .get(key)
            .map(|&position| &self.candidates[position])
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Keys in candidate order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

impl<T: Clone> EnumLookup for &EnumTable<T> {
    type Candidate = T;

    fn find(&self, raw: &str) -> Option<&T> {
        self.get(raw)
    }

    fn expected(&self) -> String {
        one_of(self.keys().map(Cow::Borrowed))
    }
}

/// A single enum value.
///
/// Absent, non-string, and unmatched values all fail as MissingOrInvalid.
pub struct EnumRule<L>(pub L);

impl<L: EnumLookup> Rule for EnumRule<L> {
    type Output = L::Candidate;
    type Error = PropertyError;

    fn apply(&self, key: &str, raw: Option<&RawValue>) -> Result<L::Candidate, PropertyError> {
        let raw = raw.ok_or_else(|| PropertyError::missing(key, self.0.expected()))?;
        raw.as_str()
            .and_then(|text| self.0.find(text))
            .cloned()
            .ok_or_else(|| PropertyError::invalid(key, self.0.expected(), raw))
    }
}

/// An array of enum values; an unmatched element is an element failure.
pub struct EnumArrayRule<L>(pub L);

impl<L: EnumLookup> Rule for EnumArrayRule<L> {
    type Output = Vec<L::Candidate>;
    type Error = PropertyError;

    fn apply(
        &self,
        key: &str,
        raw: Option<&RawValue>,
    ) -> Result<Vec<L::Candidate>, PropertyError> {
        let items = sequence(key, raw, || format!("array of {}", self.0.expected()))?;
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.as_str()
                    .and_then(|text| self.0.find(text))
                    .cloned()
                    .ok_or_else(|| reject_element(key, index, self.0.expected(), item))
            })
            .collect()
    }
}

pub type SliceRule<'a, T, X> = EnumRule<Candidates<'a, T, X>>;
pub type SliceArrayRule<'a, T, X> = EnumArrayRule<Candidates<'a, T, X>>;

impl RawMap {
    pub fn enum_value<'a, T>(
        &'a self,
        key: &'a str,
        candidates: &'a [T],
    ) -> Property<'a, SliceRule<'a, T, ByEnumKey>>
    where
        T: EnumKey + Clone,
    {
        self.prop(key, EnumRule(Candidates::new(candidates, ByEnumKey)))
    }

    pub fn enum_with<'a, T, F, K>(
        &'a self,
        key: &'a str,
        candidates: &'a [T],
        extract: F,
    ) -> Property<'a, SliceRule<'a, T, ByFn<F, K>>>
    where
        T: Clone,
        F: Fn(&T) -> K,
        K: AsRef<str>,
    {
        self.prop(key, EnumRule(Candidates::new(candidates, ByFn::new(extract))))
    }

    pub fn enum_in<'a, T: Clone>(
        &'a self,
        key: &'a str,
        table: &'a EnumTable<T>,
    ) -> Property<'a, EnumRule<&'a EnumTable<T>>> {
        self.prop(key, EnumRule(table))
    }

    pub fn enum_array<'a, T>(
        &'a self,
        key: &'a str,
        candidates: &'a [T],
    ) -> Property<'a, SliceArrayRule<'a, T, ByEnumKey>>
    where
        T: EnumKey + Clone,
    {
        self.prop(key, EnumArrayRule(Candidates::new(candidates, ByEnumKey)))
    }

    pub fn enum_array_with<'a, T, F, K>(
        &'a self,
        key: &'a str,
        candidates: &'a [T],
        extract: F,
    ) -> Property<'a, SliceArrayRule<'a, T, ByFn<F, K>>>
    where
        T: Clone,
        F: Fn(&T) -> K,
        K: AsRef<str>,
    {
        self.prop(
            key,
            EnumArrayRule(Candidates::new(candidates, ByFn::new(extract))),
        )
    }

    pub fn enum_array_in<'a, T: Clone>(
        &'a self,
        key: &'a str,
        table: &'a EnumTable<T>,
    ) -> Property<'a, EnumArrayRule<&'a EnumTable<T>>> {
        self.prop(key, EnumArrayRule(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Role {
        Admin,
        User,
    }

    impl EnumKey for Role {
        fn enum_key(&self) -> &str {
            match self {
                Role::Admin => "admin",
                Role::User => "user",
            }
        }
    }

    const ROLES: [Role; 2] = [Role::Admin, Role::User];

    fn map(value: serde_json::Value) -> RawMap {
        RawMap::from_json(value).expect("fixture must be an object")
    }

    #[test]
    fn first_exact_match_wins() {
        let source = map(json!({"role": "admin", "shout": "ADMIN", "other": "owner"}));
        assert_eq!(source.enum_value("role", &ROLES).or_throw(), Ok(Role::Admin));
        assert!(
            source
                .enum_value("shout", &ROLES)
                .or_throw()
                .expect_err("matching is case-sensitive")
                .is_missing_or_invalid()
        );
        let error = source
            .enum_value("other", &ROLES)
            .or_throw()
            .expect_err("owner is not a role");
        insta::assert_snapshot!(
            error.to_string(),
            @"missing or invalid property `other`: expected one of [admin, user], found string `owner`"
        );
    }

    #[test]
    fn absent_and_unmatched_share_one_kind() {
        let source = map(json!({"role": 1}));
        assert!(source.enum_value("role", &ROLES).or_throw().is_err());
        assert!(
            source
                .enum_value("absent", &ROLES)
                .or_throw()
                .expect_err("absent must fail")
                .is_missing_or_invalid()
        );
        assert_eq!(
            source.enum_value("absent", &ROLES).or_default(Role::User),
            Ok(Role::User)
        );
    }

    #[test]
    fn custom_extractor_replaces_the_default_key() {
        let source = map(json!({"role": "ROLE_USER"}));
        let prefixed = |role: &Role| format!("ROLE_{}", role.enum_key().to_uppercase());
        assert_eq!(
            source.enum_with("role", &ROLES, prefixed).or_throw(),
            Ok(Role::User)
        );
        assert!(source.enum_value("role", &ROLES).or_throw().is_err());
    }

    #[test]
    fn duplicate_keys_resolve_to_the_first_candidate() {
        let candidates = [(1, "a"), (2, "a"), (3, "b")];
        let source = map(json!({"k": "a"}));
        let by_label = |pair: &(i32, &str)| pair.1.to_string();
        assert_eq!(
            source.enum_with("k", &candidates, by_label).or_throw(),
            Ok((1, "a"))
        );
        let table = EnumTable::with_extractor(candidates, ByFn::<_, String>::new(by_label));
        assert_eq!(source.enum_in("k", &table).or_throw(), Ok((1, "a")));
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["a", "a", "b"]);
    }

    #[test]
    fn arrays_split_shape_from_element_failures() {
        let source = map(json!({
            "roles": ["admin", "user"],
            "mixed": ["admin", "owner"],
            "flat": "admin",
        }));
        assert_eq!(
            source.enum_array("roles", &ROLES).or_throw(),
            Ok(vec![Role::Admin, Role::User])
        );
        let element = source
            .enum_array("mixed", &ROLES)
            .or_throw()
            .expect_err("owner does not match");
        assert!(element.is_element_conversion());
        let shape = source
            .enum_array("flat", &ROLES)
            .or_throw()
            .expect_err("a string is not an array");
        assert!(shape.is_missing_or_invalid());
        let absent = source
            .enum_array("absent", &ROLES)
            .or_throw()
            .expect_err("absent must fail");
        assert!(absent.is_missing_or_invalid());
    }

    #[test]
    fn table_lookups_agree_with_slice_scans() {
        let table = EnumTable::new(ROLES);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("user"), Some(&Role::User));
        assert_eq!(table.get("owner"), None);

        let source = map(json!({"role": "user", "roles": ["user", "nope"]}));
        assert_eq!(
            source.enum_in("role", &table).or_throw(),
            source.enum_value("role", &ROLES).or_throw()
        );
        let error = source
            .enum_array_in("roles", &table)
            .or_throw()
            .expect_err("nope does not match");
        insta::assert_snapshot!(
            error.to_string(),
            @"element [1] of `roles` could not be converted to one of [admin, user]: found string `nope`"
        );
    }

    #[test]
    fn array_extractor_form_matches_each_element() {
        let source = map(json!({"roles": ["A", "U"]}));
        let initial = |role: &Role| role.enum_key()[..1].to_uppercase();
        assert_eq!(
            source.enum_array_with("roles", &ROLES, initial).or_throw(),
            Ok(vec![Role::Admin, Role::User])
        );
    }
}
