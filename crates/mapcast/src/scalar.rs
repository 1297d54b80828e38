//! Scalar coercion: strings, numbers, big integers, booleans, dates, and
//! pattern-constrained strings.

use crate::access::{Property, Rule};
use crate::error::PropertyError;
use crate::value::{RawMap, RawValue};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use num_bigint::BigInt;
use regex::Regex;
use std::marker::PhantomData;

/// Conversion from a single raw value, trying each accepted form in order.
///
/// `None` means no accepted form matched. Implementations never guess: a
/// value is either converted exactly as documented or rejected.
pub trait FromRaw: Sized {
    /// Name of the target type, used in error messages.
    const EXPECTED: &'static str;

    fn from_raw(raw: &RawValue) -> Option<Self>;
}

/// Marker for the primitive numeric targets.
pub trait Numeric: FromRaw {}

/// Strings, and any number rendered as its canonical text.
impl FromRaw for String {
    const EXPECTED: &'static str = "string";

    fn from_raw(raw: &RawValue) -> Option<Self> {
        match raw {
            RawValue::String(s) => Some(s.clone()),
            RawValue::Int(_) | RawValue::UInt(_) | RawValue::Float(_) | RawValue::BigInt(_) => {
                Some(raw.to_text())
            }
            _ => None,
        }
    }
}

impl FromRaw for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_raw(raw: &RawValue) -> Option<Self> {
        raw.as_bool()
    }
}

impl FromRaw for BigInt {
    const EXPECTED: &'static str = "big-integer";

    fn from_raw(raw: &RawValue) -> Option<Self> {
        match raw {
            RawValue::BigInt(n) => Some(n.clone()),
            RawValue::Int(n) => Some(BigInt::from(*n)),
            RawValue::UInt(n) => Some(BigInt::from(*n)),
            RawValue::Float(f) if f.is_finite() && f.fract() == 0.0 => {
                format!("{f:.0}").parse().ok()
            }
            RawValue::String(s) => numeric_text(s)?.parse().ok(),
            _ => None,
        }
    }
}

/// Dates, ISO-8601 strings, and numbers read as epoch seconds.
impl FromRaw for DateTime<Utc> {
    const EXPECTED: &'static str = "date";

    fn from_raw(raw: &RawValue) -> Option<Self> {
        match raw {
            RawValue::Date(date) => Some(*date),
            RawValue::String(s) => parse_date(s),
            RawValue::Int(secs) => DateTime::from_timestamp_millis(secs.checked_mul(1000)?),
            RawValue::UInt(secs) => {
                DateTime::from_timestamp_millis(i64::try_from(*secs).ok()?.checked_mul(1000)?)
            }
            RawValue::Float(secs) => {
                float_to_i64((secs * 1000.0).round()).and_then(DateTime::from_timestamp_millis)
            }
            RawValue::BigInt(secs) => {
                DateTime::from_timestamp_millis(i64::try_from(secs).ok()?.checked_mul(1000)?)
            }
            _ => None,
        }
    }
}

fn float_to_i64(value: f64) -> Option<i64> {
    (value >= i64::MIN as f64 && value < -(i64::MIN as f64)).then_some(value as i64)
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Trimmed text of a numeric string, `None` when blank.
fn numeric_text(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Whole-number part of a plain decimal such as `-12.50`.
///
/// Exponent forms are left to the `f64` path.
fn integer_part(text: &str) -> Option<&str> {
    let (whole, fraction) = text.split_once('.')?;
    fraction
        .bytes()
        .all(|byte| byte.is_ascii_digit())
        .then_some(whole)
}

fn parse_finite(text: &str) -> Option<f64> {
    numeric_text(text)?
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

// Integer targets truncate floats toward zero. Bounds are [lower, upper) in
// f64 so both ends are exactly representable for every width. Plain decimal
// strings truncate on their text so values near the bounds stay exact.
macro_rules! integer_from_raw {
    ($($ty:ty => $lower:expr, $upper:expr);* $(;)?) => {
        $(
            impl FromRaw for $ty {
                const EXPECTED: &'static str = stringify!($ty);

                fn from_raw(raw: &RawValue) -> Option<Self> {
                    let truncate = |value: f64| {
                        let value = value.trunc();
                        (value.is_finite() && value >= $lower && value < $upper)
                            .then_some(value as $ty)
                    };
                    match raw {
                        RawValue::Int(n) => <$ty>::try_from(*n).ok(),
                        RawValue::UInt(n) => <$ty>::try_from(*n).ok(),
                        RawValue::Float(f) => truncate(*f),
                        RawValue::BigInt(n) => <$ty>::try_from(n).ok(),
                        RawValue::String(s) => {
                            let text = numeric_text(s)?;
                            text.parse::<$ty>()
                                .ok()
                                .or_else(|| integer_part(text)?.parse::<$ty>().ok())
                                .or_else(|| parse_finite(text).and_then(truncate))
                        }
                        _ => None,
                    }
                }
            }

            impl Numeric for $ty {}
        )*
    };
}

integer_from_raw! {
    i8 => i8::MIN as f64, -(i8::MIN as f64);
    i16 => i16::MIN as f64, -(i16::MIN as f64);
    i32 => i32::MIN as f64, -(i32::MIN as f64);
    i64 => i64::MIN as f64, -(i64::MIN as f64);
    isize => isize::MIN as f64, -(isize::MIN as f64);
    u8 => 0.0, u8::MAX as f64 + 1.0;
    u16 => 0.0, u16::MAX as f64 + 1.0;
    u32 => 0.0, u32::MAX as f64 + 1.0;
    u64 => 0.0, u64::MAX as f64 + 1.0;
    usize => 0.0, usize::MAX as f64 + 1.0;
}

macro_rules! float_from_raw {
    ($($ty:ty),*) => {
        $(
            impl FromRaw for $ty {
                const EXPECTED: &'static str = stringify!($ty);

                fn from_raw(raw: &RawValue) -> Option<Self> {
                    // Narrowing past the target's range yields infinity.
                    let narrow = |value: f64| Some(value as $ty).filter(|v| v.is_finite());
                    match raw {
                        RawValue::Int(n) => narrow(*n as f64),
                        RawValue::UInt(n) => narrow(*n as f64),
                        RawValue::Float(f) => narrow(*f),
                        RawValue::BigInt(n) => parse_finite(&n.to_string()).and_then(narrow),
                        RawValue::String(s) => parse_finite(s).and_then(narrow),
                        _ => None,
                    }
                }
            }

            impl Numeric for $ty {}
        )*
    };
}

float_from_raw!(f32, f64);

/// The plain scalar rule for any [`FromRaw`] target.
#[derive(Debug)]
pub struct Scalar<T>(PhantomData<fn() -> T>);

impl<T> Scalar<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Scalar<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Scalar<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T: FromRaw> Rule for Scalar<T> {
    type Output = T;
    type Error = PropertyError;

    fn apply(&self, key: &str, raw: Option<&RawValue>) -> Result<T, PropertyError> {
        let raw = raw.ok_or_else(|| PropertyError::missing(key, T::EXPECTED))?;
        T::from_raw(raw).ok_or_else(|| PropertyError::invalid(key, T::EXPECTED, raw))
    }
}

/// Boolean decided solely by a caller predicate.
///
/// The predicate sees every present value, including `null`; there is no
/// fallback to the plain boolean check.
#[derive(Debug, Clone)]
pub struct BoolWith<P>(pub P);

impl<P> Rule for BoolWith<P>
where
    P: Fn(&RawValue) -> bool,
{
    type Output = bool;
    type Error = PropertyError;

    fn apply(&self, key: &str, raw: Option<&RawValue>) -> Result<bool, PropertyError> {
        let raw = raw.ok_or_else(|| PropertyError::missing(key, bool::EXPECTED))?;
        Ok((self.0)(raw))
    }
}

/// String coercion followed by a regex check.
#[derive(Debug, Clone)]
pub struct Matching<'p> {
    pattern: &'p Regex,
}

impl<'p> Matching<'p> {
    pub fn new(pattern: &'p Regex) -> Self {
        Self { pattern }
    }

    pub(crate) fn expected(&self) -> String {
        format!("string matching `{}`", self.pattern.as_str())
    }

    pub(crate) fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

impl Rule for Matching<'_> {
    type Output = String;
    type Error = PropertyError;

    fn apply(&self, key: &str, raw: Option<&RawValue>) -> Result<String, PropertyError> {
        let raw = raw.ok_or_else(|| PropertyError::missing(key, self.expected()))?;
        String::from_raw(raw)
            .filter(|text| self.is_match(text))
            .ok_or_else(|| PropertyError::invalid(key, self.expected(), raw))
    }
}

impl RawMap {
    /// Any [`FromRaw`] target.
    pub fn value<'a, T: FromRaw>(&'a self, key: &'a str) -> Property<'a, Scalar<T>> {
        self.prop(key, Scalar::new())
    }

    pub fn string<'a>(&'a self, key: &'a str) -> Property<'a, Scalar<String>> {
        self.value(key)
    }

    /// Any primitive integer or float width, chosen by `N`.
    pub fn number<'a, N: Numeric>(&'a self, key: &'a str) -> Property<'a, Scalar<N>> {
        self.value(key)
    }

    pub fn big_int<'a>(&'a self, key: &'a str) -> Property<'a, Scalar<BigInt>> {
        self.value(key)
    }

    pub fn bool<'a>(&'a self, key: &'a str) -> Property<'a, Scalar<bool>> {
        self.value(key)
    }

    pub fn bool_with<'a, P>(&'a self, key: &'a str, predicate: P) -> Property<'a, BoolWith<P>>
    where
        P: Fn(&RawValue) -> bool,
    {
        self.prop(key, BoolWith(predicate))
    }

    pub fn date<'a>(&'a self, key: &'a str) -> Property<'a, Scalar<DateTime<Utc>>> {
        self.value(key)
    }

    pub fn string_matching<'a>(
        &'a self,
        key: &'a str,
        pattern: &'a Regex,
    ) -> Property<'a, Matching<'a>> {
        self.prop(key, Matching::new(pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn map(value: serde_json::Value) -> RawMap {
        RawMap::from_json(value).expect("fixture must be an object")
    }

    #[test]
    fn strings_accept_numbers_as_canonical_text() {
        let source = map(json!({"s": "hi", "i": 7, "f": 2.5, "b": true}));
        assert_eq!(source.string("s").or_throw(), Ok("hi".to_string()));
        assert_eq!(source.string("i").or_throw(), Ok("7".to_string()));
        assert_eq!(source.string("f").or_throw(), Ok("2.5".to_string()));
        assert!(source.string("b").or_throw().is_err());
    }

    #[test]
    fn numeric_strings_parse_fully() {
        let source = map(json!({"count": "42", "x": "abc", "padded": " 9 ", "blank": "  "}));
        assert_eq!(source.number::<i64>("count").or_throw(), Ok(42));
        assert_eq!(source.number::<i32>("padded").or_throw(), Ok(9));

        let error = source
            .number::<i64>("x")
            .or_throw()
            .expect_err("non-numeric text must fail");
        assert!(error.is_missing_or_invalid());
        assert!(source.number::<f64>("blank").or_throw().is_err());
    }

    #[test]
    fn integer_targets_truncate_floats_and_respect_range() {
        let source = map(json!({"f": 3.9, "neg": -3.9, "big": 300, "text": "7.8", "huge": 1e30}));
        assert_eq!(source.number::<i64>("f").or_throw(), Ok(3));
        assert_eq!(source.number::<i64>("neg").or_throw(), Ok(-3));
        assert_eq!(source.number::<i64>("text").or_throw(), Ok(7));
        assert!(source.number::<u8>("big").or_throw().is_err());
        assert!(source.number::<u8>("neg").or_throw().is_err());
        assert!(source.number::<i64>("huge").or_throw().is_err());
        assert_eq!(source.number::<f32>("f").or_throw(), Ok(3.9_f32));
    }

    #[test]
    fn float_targets_reject_values_beyond_their_range() {
        let source = map(json!({"big": 1e300, "txt": "1e300", "small": 1e30}));
        for key in ["big", "txt"] {
            let error = source
                .number::<f32>(key)
                .or_throw()
                .expect_err("1e300 does not fit in f32");
            assert!(error.is_missing_or_invalid(), "key {key}");
        }
        assert_eq!(source.number::<f64>("txt").or_throw(), Ok(1e300));
        assert_eq!(source.number::<f32>("small").or_throw(), Ok(1e30_f32));
    }

    #[test]
    fn decimal_strings_truncate_exactly_near_integer_bounds() {
        let source = map(json!({
            "max": "9223372036854775807.5",
            "min": "-9223372036854775808.9",
            "over": "9223372036854775808.0",
            "neg_zero": "-0.5",
            "exp": "1.5e3",
        }));
        assert_eq!(source.number::<i64>("max").or_throw(), Ok(i64::MAX));
        assert_eq!(source.number::<i64>("min").or_throw(), Ok(i64::MIN));
        assert!(source.number::<i64>("over").or_throw().is_err());
        assert_eq!(source.number::<u8>("neg_zero").or_throw(), Ok(0));
        assert_eq!(source.number::<i32>("exp").or_throw(), Ok(1500));
    }

    #[test]
    fn big_integers_are_exact() {
        let source = map(json!({
            "n": 12,
            "text": "123456789012345678901234567890",
            "whole": 1e20,
            "frac": 1.5,
        }));
        assert_eq!(source.big_int("n").or_throw(), Ok(BigInt::from(12)));
        assert_eq!(
            source.big_int("text").or_throw().map(|n| n.to_string()),
            Ok("123456789012345678901234567890".to_string())
        );
        assert_eq!(
            source.big_int("whole").or_throw().map(|n| n.to_string()),
            Ok("100000000000000000000".to_string())
        );
        assert!(source.big_int("frac").or_throw().is_err());
    }

    #[test]
    fn booleans_are_strict_without_predicate() {
        let source = map(json!({"t": true, "s": "true", "one": 1}));
        assert_eq!(source.bool("t").or_throw(), Ok(true));
        assert!(source.bool("s").or_throw().is_err());
        assert!(source.bool("one").or_throw().is_err());
    }

    #[test]
    fn predicate_is_used_exclusively() {
        let source = map(json!({"t": true, "yes": "yes"}));
        let yes_only = |raw: &RawValue| raw.as_str() == Some("yes");
        assert_eq!(source.bool_with("yes", yes_only).or_throw(), Ok(true));
        // A raw `true` is not consulted once a predicate is supplied.
        assert_eq!(source.bool_with("t", yes_only).or_throw(), Ok(false));
        assert!(source.bool_with("absent", yes_only).or_throw().is_err());
    }

    #[test]
    fn numeric_dates_are_epoch_seconds() {
        let source = map(json!({"ts": 1700000000, "frac": 1.5}));
        let date = source.date("ts").or_throw().expect("epoch seconds must parse");
        assert_eq!(date.timestamp_millis(), 1_700_000_000_000);
        let frac = source.date("frac").or_throw().expect("fractional seconds");
        assert_eq!(frac.timestamp_millis(), 1_500);
    }

    #[test]
    fn iso_strings_parse_as_dates() {
        let source = map(json!({
            "zoned": "2023-11-14T22:13:20Z",
            "offset": "2023-11-15T00:13:20+02:00",
            "naive": "2023-11-14T22:13:20",
            "day": "2023-11-14",
            "junk": "yesterday",
        }));
        for key in ["zoned", "offset", "naive"] {
            let date = source.date(key).or_throw().expect("ISO-8601 must parse");
            assert_eq!(date.timestamp_millis(), 1_700_000_000_000, "key {key}");
        }
        let day = source.date("day").or_throw().expect("date-only must parse");
        assert_eq!(day.timestamp(), 1_699_920_000);
        assert!(source.date("junk").or_throw().is_err());
    }

    #[test]
    fn pattern_mismatch_is_missing_or_invalid_with_pattern_text() {
        let pattern = Regex::new(r"^[a-z]+@[a-z]+\.com$").expect("valid regex");
        let source = map(json!({"good": "me@site.com", "bad": "nope"}));
        assert_eq!(
            source.string_matching("good", &pattern).or_throw(),
            Ok("me@site.com".to_string())
        );
        let error = source
            .string_matching("bad", &pattern)
            .or_throw()
            .expect_err("mismatch must fail");
        assert!(error.is_missing_or_invalid());
        assert!(error.to_string().contains(r"^[a-z]+@[a-z]+\.com$"));
    }

    #[test]
    fn null_is_present_but_invalid() {
        let source = map(json!({"n": null}));
        let error = source.string("n").or_throw().expect_err("null is not a string");
        insta::assert_snapshot!(
            error.to_string(),
            @"missing or invalid property `n`: expected string, found null"
        );
        assert_eq!(source.string("n").or_default("d".to_string()), Ok("d".to_string()));
    }

    #[test]
    fn absent_keys_fall_back_for_every_scalar() {
        let source = RawMap::new();
        assert_eq!(source.number::<u16>("k").or_default(5), Ok(5));
        assert_eq!(source.bool("k").or_default_with(|| true), Ok(true));
        assert_eq!(
            source.big_int("k").or_default(BigInt::from(-1)),
            Ok(BigInt::from(-1))
        );
        assert!(source.date("k").or_throw().is_err());
    }

    proptest! {
        #[test]
        fn typed_values_coerce_to_themselves(n in any::<i64>(), b in any::<bool>(), s in ".*") {
            let source: RawMap = [
                ("n", RawValue::from(n)),
                ("b", RawValue::from(b)),
                ("s", RawValue::from(s.clone())),
            ]
            .into_iter()
            .collect();
            prop_assert_eq!(source.number::<i64>("n").or_throw(), Ok(n));
            prop_assert_eq!(source.bool("b").or_throw(), Ok(b));
            prop_assert_eq!(source.string("s").or_throw(), Ok(s));
        }

        #[test]
        fn finite_floats_coerce_to_themselves(f in proptest::num::f64::NORMAL) {
            let source: RawMap = [("f", f)].into_iter().collect();
            prop_assert_eq!(source.number::<f64>("f").or_throw(), Ok(f));
        }
    }
}
