//! AMF0 value model.

use crate::{Error, Result, MAX_SHORT_STRING_LEN};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One-byte AMF0 type marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Marker {
    Number = 0,
    Boolean = 1,
    String = 2,
    Object = 3,
    MovieClip = 4,
    Null = 5,
    Undefined = 6,
    Reference = 7,
    EcmaArray = 8,
    ObjectEnd = 9,
    StrictArray = 10,
    Date = 11,
    LongString = 12,
}

impl Marker {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Number,
            1 => Self::Boolean,
            2 => Self::String,
            3 => Self::Object,
            4 => Self::MovieClip,
            5 => Self::Null,
            6 => Self::Undefined,
            7 => Self::Reference,
            8 => Self::EcmaArray,
            9 => Self::ObjectEnd,
            10 => Self::StrictArray,
            11 => Self::Date,
            12 => Self::LongString,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A script data value.
///
/// The JSON form is adjacently tagged: `{"type": "Number", "value": 1.5}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ScriptValue {
    Number(#[serde(with = "crate::text::number")] f64),
    Boolean(bool),
    /// Short string, at most 65535 UTF-8 bytes.
    String(String),
    Object(ScriptObject),
    Null,
    Undefined,
    Reference(u16),
    /// Associative array; the element count on the wire is informational.
    EcmaArray(ScriptObject),
    StrictArray(Vec<ScriptValue>),
    Date(ScriptDate),
    LongString(String),
}

impl ScriptValue {
    pub fn number(value: f64) -> Self {
        Self::Number(value)
    }

    pub fn boolean(value: bool) -> Self {
        Self::Boolean(value)
    }

    /// A short string. Encoding fails if it exceeds 65535 bytes.
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn long_string(value: impl Into<String>) -> Self {
        Self::LongString(value.into())
    }

    /// A string value, promoted to `LongString` when it does not fit a short one.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.len() > MAX_SHORT_STRING_LEN {
            Self::LongString(value)
        } else {
            Self::String(value)
        }
    }

    pub fn object(props: ScriptObject) -> Self {
        Self::Object(props)
    }

    pub fn ecma_array(props: ScriptObject) -> Self {
        Self::EcmaArray(props)
    }

    pub fn date(value: DateTime<FixedOffset>) -> Self {
        Self::Date(ScriptDate::new(value))
    }

    /// The wire marker of this value.
    pub fn marker(&self) -> Marker {
        match self {
            Self::Number(_) => Marker::Number,
            Self::Boolean(_) => Marker::Boolean,
            Self::String(_) => Marker::String,
            Self::Object(_) => Marker::Object,
            Self::Null => Marker::Null,
            Self::Undefined => Marker::Undefined,
            Self::Reference(_) => Marker::Reference,
            Self::EcmaArray(_) => Marker::EcmaArray,
            Self::StrictArray(_) => Marker::StrictArray,
            Self::Date(_) => Marker::Date,
            Self::LongString(_) => Marker::LongString,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// String contents of a `String` or `LongString`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::LongString(s) => Some(s),
            _ => None,
        }
    }

    /// Properties of an `Object` or `EcmaArray`.
    pub fn as_object(&self) -> Option<&ScriptObject> {
        match self {
            Self::Object(props) | Self::EcmaArray(props) => Some(props),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut ScriptObject> {
        match self {
            Self::Object(props) | Self::EcmaArray(props) => Some(props),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ScriptValue]> {
        match self {
            Self::StrictArray(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&ScriptDate> {
        match self {
            Self::Date(date) => Some(date),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Ordered string-keyed properties of an `Object` or `EcmaArray`.
///
/// Keys keep their insertion order. Decoded duplicates are kept as they
/// appear on the wire; lookups and [`ScriptObject::insert`] act on the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptObject {
    entries: Vec<(String, ScriptValue)>,
}

impl ScriptObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ScriptValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ScriptValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Replace the value under `key` in place, or append it.
    pub fn insert(&mut self, key: impl Into<String>, value: ScriptValue) -> Option<ScriptValue> {
        let key = key.into();
        match self.entries.iter().position(|(k, _)| *k == key) {
            Some(index) => Some(std::mem::replace(&mut self.entries[index].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Append an entry without looking for an existing key.
    pub fn push(&mut self, key: impl Into<String>, value: ScriptValue) {
        self.entries.push((key.into(), value));
    }

    pub fn remove(&mut self, key: &str) -> Option<ScriptValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScriptValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl FromIterator<(String, ScriptValue)> for ScriptObject {
    fn from_iter<I: IntoIterator<Item = (String, ScriptValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ScriptObject {
    type Item = (String, ScriptValue);
    type IntoIter = std::vec::IntoIter<(String, ScriptValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A date with its UTC offset.
///
/// Equality compares both the instant and the offset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptDate(DateTime<FixedOffset>);

impl ScriptDate {
    pub fn new(value: DateTime<FixedOffset>) -> Self {
        Self(value)
    }

    /// Build from the wire fields: milliseconds since the Unix epoch and the
    /// offset from UTC in minutes.
    pub fn from_parts(epoch_millis: f64, offset_minutes: i16) -> Result<Self> {
        if !epoch_millis.is_finite() {
            return Err(Error::invalid_date(format!("timestamp {}", epoch_millis)));
        }
        let offset = FixedOffset::east_opt(offset_minutes as i32 * 60)
            .ok_or_else(|| Error::invalid_date(format!("offset {} minutes", offset_minutes)))?;

        let secs = (epoch_millis / 1000.0).floor();
        let mut nanos = ((epoch_millis - secs * 1000.0) * 1_000_000.0).round();
        let mut secs = secs;
        if nanos >= 1_000_000_000.0 {
            secs += 1.0;
            nanos -= 1_000_000_000.0;
        }
        if secs.abs() > i64::MAX as f64 / 2.0 {
            return Err(Error::invalid_date(format!("timestamp {}", epoch_millis)));
        }

        let utc = DateTime::<Utc>::from_timestamp(secs as i64, nanos as u32)
            .ok_or_else(|| Error::invalid_date(format!("timestamp {}", epoch_millis)))?;
        Ok(Self(offset.from_utc_datetime(&utc.naive_utc())))
    }

    /// Milliseconds since the Unix epoch, sub-millisecond part included.
    pub fn epoch_millis(&self) -> f64 {
        let sub_millis = (self.0.timestamp_subsec_nanos() % 1_000_000) as f64 / 1_000_000.0;
        self.0.timestamp_millis() as f64 + sub_millis
    }

    /// Offset from UTC in minutes.
    pub fn offset_minutes(&self) -> i16 {
        (self.0.offset().local_minus_utc() / 60) as i16
    }

    pub fn as_datetime(&self) -> &DateTime<FixedOffset> {
        &self.0
    }
}

impl PartialEq for ScriptDate {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.0.offset() == other.0.offset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_mapping() {
        for b in 0u8..=12 {
            assert_eq!(Marker::from_u8(b).unwrap().as_u8(), b);
        }
        assert_eq!(Marker::from_u8(13), None);
        assert_eq!(Marker::from_u8(0x11), None);
    }

    #[test]
    fn test_text_promotes_long_strings() {
        assert!(matches!(ScriptValue::text("short"), ScriptValue::String(_)));
        let long = "x".repeat(MAX_SHORT_STRING_LEN + 1);
        assert!(matches!(ScriptValue::text(long), ScriptValue::LongString(_)));
        let edge = "x".repeat(MAX_SHORT_STRING_LEN);
        assert!(matches!(ScriptValue::text(edge), ScriptValue::String(_)));
    }

    #[test]
    fn test_object_keeps_insertion_order() {
        let mut props = ScriptObject::new();
        props.insert("width", ScriptValue::number(1280.0));
        props.insert("height", ScriptValue::number(720.0));
        props.insert("duration", ScriptValue::number(0.0));

        let previous = props.insert("height", ScriptValue::number(1080.0));
        assert_eq!(previous, Some(ScriptValue::number(720.0)));
        assert_eq!(
            props.keys().collect::<Vec<_>>(),
            vec!["width", "height", "duration"]
        );
        assert_eq!(props.get("height").and_then(ScriptValue::as_f64), Some(1080.0));

        assert!(props.remove("width").is_some());
        assert_eq!(props.keys().next(), Some("height"));
        assert!(!props.contains_key("width"));
    }

    #[test]
    fn test_extractors() {
        let mut value = ScriptValue::ecma_array(ScriptObject::new());
        value
            .as_object_mut()
            .unwrap()
            .insert("ok", ScriptValue::boolean(true));
        assert_eq!(value.marker(), Marker::EcmaArray);
        assert_eq!(
            value.as_object().unwrap().get("ok").and_then(ScriptValue::as_bool),
            Some(true)
        );
        assert_eq!(ScriptValue::long_string("a").as_str(), Some("a"));
        assert_eq!(ScriptValue::Null.as_f64(), None);
        assert!(ScriptValue::Null.is_null());
    }

    #[test]
    fn test_date_parts() {
        let date = ScriptDate::from_parts(1_600_000_000_123.0, 480).unwrap();
        assert_eq!(date.epoch_millis(), 1_600_000_000_123.0);
        assert_eq!(date.offset_minutes(), 480);
        assert_eq!(date.as_datetime().to_rfc3339(), "2020-09-13T20:26:40.123+08:00");

        let negative = ScriptDate::from_parts(-1500.25, -300).unwrap();
        assert_eq!(negative.epoch_millis(), -1500.25);
        assert_eq!(negative.offset_minutes(), -300);
    }

    #[test]
    fn test_date_equality_includes_offset() {
        let utc = ScriptDate::from_parts(0.0, 0).unwrap();
        let shifted = ScriptDate::from_parts(0.0, 60).unwrap();
        assert_eq!(utc.as_datetime(), shifted.as_datetime());
        assert_ne!(utc, shifted);
    }

    #[test]
    fn test_date_invalid() {
        assert!(ScriptDate::from_parts(f64::NAN, 0).is_err());
        assert!(ScriptDate::from_parts(1e300, 0).is_err());
        assert!(ScriptDate::from_parts(0.0, i16::MAX).is_err());
    }
}
