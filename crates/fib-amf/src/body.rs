//! Metadata tag bodies.

use crate::value::{Marker, ScriptObject, ScriptValue};
use crate::{Error, Result};
use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};

/// The payload of a script tag: a name such as `onMetaData` followed by an
/// `Object` or `EcmaArray` of properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBody")]
pub struct ScriptTagBody {
    name: String,
    value: ScriptValue,
}

#[derive(Deserialize)]
struct RawBody {
    name: String,
    value: ScriptValue,
}

impl TryFrom<RawBody> for ScriptTagBody {
    type Error = Error;

    fn try_from(raw: RawBody) -> Result<Self> {
        Self::new(raw.name, raw.value)
    }
}

impl ScriptTagBody {
    /// Fails unless `value` is an `Object` or `EcmaArray`.
    pub fn new(name: impl Into<String>, value: ScriptValue) -> Result<Self> {
        match value {
            ScriptValue::Object(_) | ScriptValue::EcmaArray(_) => Ok(Self {
                name: name.into(),
                value,
            }),
            other => Err(Error::invalid_body(format!(
                "value is {}, expected Object or EcmaArray",
                other.marker()
            ))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &ScriptValue {
        &self.value
    }

    pub fn properties(&self) -> &ScriptObject {
        match &self.value {
            ScriptValue::Object(props) | ScriptValue::EcmaArray(props) => props,
            _ => unreachable!("body value is always an object"),
        }
    }

    pub fn properties_mut(&mut self) -> &mut ScriptObject {
        match &mut self.value {
            ScriptValue::Object(props) | ScriptValue::EcmaArray(props) => props,
            _ => unreachable!("body value is always an object"),
        }
    }

    /// Decode from a tag payload. Bytes after the value are ignored.
    pub fn decode(mut input: &[u8]) -> Result<Self> {
        Self::read_from(&mut input)
    }

    pub fn read_from<B: Buf>(buf: &mut B) -> Result<Self> {
        let name = match ScriptValue::read_from(buf)? {
            ScriptValue::String(name) => name,
            other => {
                return Err(Error::invalid_body(format!(
                    "name is {}, expected {}",
                    other.marker(),
                    Marker::String
                )))
            }
        };
        let value = ScriptValue::read_from(buf)?;
        Self::new(name, value)
    }

    pub fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        ScriptValue::String(self.name.clone()).encode(buf)?;
        self.value.encode(buf)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::with_capacity(256);
        self.encode(&mut buf)?;
        Ok(buf.to_vec())
    }

    /// Pretty-printed JSON form, suitable for hand editing.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
