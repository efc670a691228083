//! Typed index values.

use crate::error::{CodecError, CodecResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Canonical rendering of `true` in index terms.
pub const YES: &str = "yes";
/// Canonical rendering of `false` in index terms.
pub const NO: &str = "no";

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FRACTION_DIGITS: u16 = 4;

/// Type tag of an [`IndexValue`].
///
/// The declaration order is the cross-type ordering of values: two values of
/// different types compare by tag alone.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum IndexValueType {
    /// UTF-8 text.
    Text = 0,
    /// List of texts.
    TextArray = 1,
    /// Boolean flag.
    Bool = 2,
    /// 32-bit signed integer.
    Int32 = 3,
    /// List of 32-bit signed integers.
    Int32Array = 4,
    /// 64-bit signed integer.
    Int64 = 5,
    /// Single precision float.
    Float32 = 6,
    /// Double precision float.
    Float64 = 7,
    /// UTC point in time.
    DateTime = 8,
}

impl IndexValueType {
    /// Returns the numeric tag.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Returns a display name for diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::TextArray => "TextArray",
            Self::Bool => "Bool",
            Self::Int32 => "Int32",
            Self::Int32Array => "Int32Array",
            Self::Int64 => "Int64",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::DateTime => "DateTime",
        }
    }
}

impl TryFrom<u8> for IndexValueType {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Text,
            1 => Self::TextArray,
            2 => Self::Bool,
            3 => Self::Int32,
            4 => Self::Int32Array,
            5 => Self::Int64,
            6 => Self::Float32,
            7 => Self::Float64,
            8 => Self::DateTime,
            other => {
                return Err(CodecError::UnknownTag {
                    tag: u64::from(other),
                })
            }
        })
    }
}

impl fmt::Display for IndexValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload of an [`IndexValue`].
#[derive(Debug, Clone)]
pub enum ValueData {
    /// UTF-8 text.
    Text(String),
    /// List of texts.
    TextArray(Vec<String>),
    /// Boolean flag.
    Bool(bool),
    /// 32-bit signed integer.
    Int32(i32),
    /// List of 32-bit signed integers.
    Int32Array(Vec<i32>),
    /// 64-bit signed integer.
    Int64(i64),
    /// Single precision float.
    Float32(f32),
    /// Double precision float.
    Float64(f64),
    /// UTC point in time.
    DateTime(DateTime<Utc>),
}

impl ValueData {
    /// Returns the type tag of this payload.
    #[must_use]
    pub const fn value_type(&self) -> IndexValueType {
        match self {
            Self::Text(_) => IndexValueType::Text,
            Self::TextArray(_) => IndexValueType::TextArray,
            Self::Bool(_) => IndexValueType::Bool,
            Self::Int32(_) => IndexValueType::Int32,
            Self::Int32Array(_) => IndexValueType::Int32Array,
            Self::Int64(_) => IndexValueType::Int64,
            Self::Float32(_) => IndexValueType::Float32,
            Self::Float64(_) => IndexValueType::Float64,
            Self::DateTime(_) => IndexValueType::DateTime,
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::TextArray(items) => items.join(","),
            Self::Bool(b) => if *b { YES } else { NO }.to_string(),
            Self::Int32(n) => n.to_string(),
            Self::Int32Array(items) => items
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
            Self::Int64(n) => n.to_string(),
            Self::Float32(n) => n.to_string(),
            Self::Float64(n) => n.to_string(),
            Self::DateTime(dt) => format_date(dt),
        }
    }

    fn cmp_same_type(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::TextArray(a), Self::TextArray(b)) => a.cmp(b),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int32(a), Self::Int32(b)) => a.cmp(b),
            (Self::Int32Array(a), Self::Int32Array(b)) => a.cmp(b),
            (Self::Int64(a), Self::Int64(b)) => a.cmp(b),
            (Self::Float32(a), Self::Float32(b)) => a.total_cmp(b),
            (Self::Float64(a), Self::Float64(b)) => a.total_cmp(b),
            (Self::DateTime(a), Self::DateTime(b)) => a.cmp(b),
            _ => Ordering::Equal, // callers compare tags first
        }
    }
}

/// An immutable typed atomic value shared by indexing and querying.
///
/// The canonical text (`value_as_string`) is computed once at construction:
/// booleans render as `yes`/`no`, numbers use invariant formatting, date-times
/// render as `yyyy-MM-dd HH:mm:ss.ffff` and arrays are comma-joined.
/// Date-times are truncated to that precision, so a value always equals the
/// value parsed back from its text.
///
/// Values order by type tag first and by payload only when the tags match.
#[derive(Debug, Clone)]
pub struct IndexValue {
    data: ValueData,
    text: String,
}

impl IndexValue {
    /// Creates a value from its payload.
    #[must_use]
    pub fn new(data: ValueData) -> Self {
        let data = match data {
            ValueData::DateTime(dt) => ValueData::DateTime(dt.trunc_subsecs(DATE_FRACTION_DIGITS)),
            other => other,
        };
        let text = data.render();
        Self { data, text }
    }

    /// The `0001-01-01 00:00:00` date, used as the "never expires" marker.
    #[must_use]
    pub fn min_date() -> DateTime<Utc> {
        let naive = NaiveDate::from_ymd_opt(1, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Utc.from_utc_datetime(&naive)
    }

    /// Returns the payload.
    #[must_use]
    pub const fn data(&self) -> &ValueData {
        &self.data
    }

    /// Returns the type tag.
    #[must_use]
    pub const fn value_type(&self) -> IndexValueType {
        self.data.value_type()
    }

    /// Returns the canonical text representation.
    #[must_use]
    pub fn value_as_string(&self) -> &str {
        &self.text
    }

    /// Returns the text, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            ValueData::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the texts, if this is a text array.
    #[must_use]
    pub fn as_text_array(&self) -> Option<&[String]> {
        match &self.data {
            ValueData::TextArray(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the flag, if this is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self.data {
            ValueData::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the integer, if this is an `Int32`.
    #[must_use]
    pub const fn as_int32(&self) -> Option<i32> {
        match self.data {
            ValueData::Int32(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the integers, if this is an `Int32Array`.
    #[must_use]
    pub fn as_int32_array(&self) -> Option<&[i32]> {
        match &self.data {
            ValueData::Int32Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the integer, if this is an `Int64`.
    #[must_use]
    pub const fn as_int64(&self) -> Option<i64> {
        match self.data {
            ValueData::Int64(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the float, if this is a `Float32`.
    #[must_use]
    pub const fn as_float32(&self) -> Option<f32> {
        match self.data {
            ValueData::Float32(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the float, if this is a `Float64`.
    #[must_use]
    pub const fn as_float64(&self) -> Option<f64> {
        match self.data {
            ValueData::Float64(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the date-time, if this is a `DateTime`.
    #[must_use]
    pub const fn as_date_time(&self) -> Option<DateTime<Utc>> {
        match self.data {
            ValueData::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Parses query or parameter text as a value of the given type.
    ///
    /// Array types parse to their element type, since a term addresses a
    /// single element of a multi-valued field.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Conversion`] if the text is not a valid literal
    /// of the requested type.
    pub fn parse_as(value_type: IndexValueType, text: &str) -> CodecResult<Self> {
        let target = value_type.name();
        let data = match value_type {
            IndexValueType::Text | IndexValueType::TextArray => ValueData::Text(text.to_string()),
            IndexValueType::Bool => ValueData::Bool(
                parse_bool(text).ok_or_else(|| CodecError::conversion(text, target))?,
            ),
            IndexValueType::Int32 | IndexValueType::Int32Array => ValueData::Int32(
                text.trim()
                    .parse()
                    .map_err(|_| CodecError::conversion(text, target))?,
            ),
            IndexValueType::Int64 => ValueData::Int64(
                text.trim()
                    .parse()
                    .map_err(|_| CodecError::conversion(text, target))?,
            ),
            IndexValueType::Float32 => {
                let n: f32 = text
                    .trim()
                    .parse()
                    .map_err(|_| CodecError::conversion(text, target))?;
                if n.is_nan() {
                    return Err(CodecError::NaNForbidden);
                }
                ValueData::Float32(n)
            }
            IndexValueType::Float64 => {
                let n: f64 = text
                    .trim()
                    .parse()
                    .map_err(|_| CodecError::conversion(text, target))?;
                if n.is_nan() {
                    return Err(CodecError::NaNForbidden);
                }
                ValueData::Float64(n)
            }
            IndexValueType::DateTime => ValueData::DateTime(
                parse_date(text).ok_or_else(|| CodecError::conversion(text, target))?,
            ),
        };
        Ok(Self::new(data))
    }
}

/// Formats a date-time the way index terms store it.
#[must_use]
pub fn format_date(dt: &DateTime<Utc>) -> String {
    format!(
        "{}.{:04}",
        dt.format(DATE_FORMAT),
        dt.timestamp_subsec_nanos() / 100_000
    )
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" => Some(true),
        "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

impl PartialEq for IndexValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for IndexValue {}

impl PartialOrd for IndexValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.value_type().cmp(&other.value_type()) {
            Ordering::Equal => self.data.cmp_same_type(&other.data),
            ord => ord,
        }
    }
}

impl fmt::Display for IndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<ValueData> for IndexValue {
    fn from(data: ValueData) -> Self {
        Self::new(data)
    }
}

impl From<String> for IndexValue {
    fn from(s: String) -> Self {
        Self::new(ValueData::Text(s))
    }
}

impl From<&str> for IndexValue {
    fn from(s: &str) -> Self {
        Self::new(ValueData::Text(s.to_string()))
    }
}

impl From<Vec<String>> for IndexValue {
    fn from(items: Vec<String>) -> Self {
        Self::new(ValueData::TextArray(items))
    }
}

impl From<&[&str]> for IndexValue {
    fn from(items: &[&str]) -> Self {
        Self::new(ValueData::TextArray(
            items.iter().map(|s| (*s).to_string()).collect(),
        ))
    }
}

impl From<bool> for IndexValue {
    fn from(b: bool) -> Self {
        Self::new(ValueData::Bool(b))
    }
}

impl From<i32> for IndexValue {
    fn from(n: i32) -> Self {
        Self::new(ValueData::Int32(n))
    }
}

impl From<Vec<i32>> for IndexValue {
    fn from(items: Vec<i32>) -> Self {
        Self::new(ValueData::Int32Array(items))
    }
}

impl From<i64> for IndexValue {
    fn from(n: i64) -> Self {
        Self::new(ValueData::Int64(n))
    }
}

impl From<f32> for IndexValue {
    fn from(n: f32) -> Self {
        Self::new(ValueData::Float32(n))
    }
}

impl From<f64> for IndexValue {
    fn from(n: f64) -> Self {
        Self::new(ValueData::Float64(n))
    }
}

impl From<DateTime<Utc>> for IndexValue {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::new(ValueData::DateTime(dt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn canonical_text() {
        assert_eq!(IndexValue::from("Folder").value_as_string(), "Folder");
        assert_eq!(IndexValue::from(true).value_as_string(), "yes");
        assert_eq!(IndexValue::from(false).value_as_string(), "no");
        assert_eq!(IndexValue::from(-42i32).value_as_string(), "-42");
        assert_eq!(IndexValue::from(1.5f64).value_as_string(), "1.5");
        assert_eq!(IndexValue::from(vec![1, 2, 3]).value_as_string(), "1,2,3");
        assert_eq!(
            IndexValue::from(&["a", "b"][..]).value_as_string(),
            "a,b"
        );
        assert_eq!(
            IndexValue::from(date(2020, 3, 4, 5, 6, 7)).value_as_string(),
            "2020-03-04 05:06:07.0000"
        );
        assert_eq!(
            IndexValue::from(IndexValue::min_date()).value_as_string(),
            "0001-01-01 00:00:00.0000"
        );
    }

    #[test]
    fn same_tag_orders_by_value() {
        assert!(IndexValue::from(1i32) < IndexValue::from(2i32));
        assert!(IndexValue::from(-5i64) < IndexValue::from(3i64));
        assert!(IndexValue::from("a") < IndexValue::from("b"));
        assert!(IndexValue::from(0.5f64) < IndexValue::from(1.25f64));
        assert!(IndexValue::from(false) < IndexValue::from(true));
        let earlier = IndexValue::from(date(2001, 1, 1, 0, 0, 0));
        assert!(earlier < IndexValue::from(date(2002, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn cross_tag_orders_by_tag_only() {
        // A huge Int32 still sorts before a tiny Int64, and any text before a bool.
        assert!(IndexValue::from(i32::MAX) < IndexValue::from(i64::MIN));
        assert!(IndexValue::from("zzz") < IndexValue::from(false));
        assert!(IndexValue::from(1000.0f32) < IndexValue::from(-1000.0f64));
        assert_ne!(IndexValue::from(1i32), IndexValue::from(1i64));
    }

    #[test]
    fn date_times_keep_the_precision_of_their_text() {
        let text = "2024-01-01 00:00:00.123456789";
        let parsed = IndexValue::parse_as(IndexValueType::DateTime, text).unwrap();
        assert_eq!(parsed.value_as_string(), "2024-01-01 00:00:00.1234");
        let reparsed =
            IndexValue::parse_as(IndexValueType::DateTime, parsed.value_as_string()).unwrap();
        assert_eq!(parsed, reparsed);
        assert_eq!(
            parsed.as_date_time().map(|dt| dt.timestamp_subsec_nanos()),
            Some(123_400_000)
        );

        let built = IndexValue::from(Utc.timestamp_opt(0, 999_999_999).unwrap());
        assert_eq!(built.value_as_string(), "1970-01-01 00:00:00.9999");
        assert_eq!(
            built.as_date_time().map(|dt| dt.timestamp_subsec_nanos()),
            Some(999_900_000)
        );
    }

    #[test]
    fn parse_as_types() {
        assert_eq!(
            IndexValue::parse_as(IndexValueType::Int32, "42").unwrap(),
            IndexValue::from(42i32)
        );
        assert_eq!(
            IndexValue::parse_as(IndexValueType::Bool, "Yes").unwrap(),
            IndexValue::from(true)
        );
        assert_eq!(
            IndexValue::parse_as(IndexValueType::DateTime, "2020-03-04 05:06:07.0000").unwrap(),
            IndexValue::from(date(2020, 3, 4, 5, 6, 7))
        );
        assert_eq!(
            IndexValue::parse_as(IndexValueType::DateTime, "2020-03-04").unwrap(),
            IndexValue::from(date(2020, 3, 4, 0, 0, 0))
        );
        assert_eq!(
            IndexValue::parse_as(IndexValueType::Int32Array, "7").unwrap(),
            IndexValue::from(7i32)
        );
        assert!(matches!(
            IndexValue::parse_as(IndexValueType::Int32, "seven"),
            Err(CodecError::Conversion { .. })
        ));
        assert!(matches!(
            IndexValue::parse_as(IndexValueType::Float64, "NaN"),
            Err(CodecError::NaNForbidden)
        ));
    }

    #[test]
    fn tag_roundtrip() {
        for tag in 0u8..=8 {
            assert_eq!(IndexValueType::try_from(tag).unwrap().tag(), tag);
        }
        assert!(IndexValueType::try_from(9).is_err());
    }
}
