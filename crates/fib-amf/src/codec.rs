//! Binary AMF0 codec.
//!
//! Decoding reads from any [`Buf`], encoding writes to any [`BufMut`]. Every
//! length is checked against the remaining input before anything is
//! allocated.

use crate::value::{Marker, ScriptDate, ScriptObject, ScriptValue};
use crate::{Error, Result, MAX_SHORT_STRING_LEN};
use bytes::{Buf, BufMut, BytesMut};

/// Deepest nesting of objects and arrays accepted in either direction.
///
/// Each level costs two levels in the JSON form, which has to stay under
/// serde_json's recursion limit of 128 inside a plan file.
pub const MAX_DEPTH: usize = 32;

/// Trailer of every Object and EcmaArray: an empty key and the end marker.
const OBJECT_END: [u8; 3] = [0, 0, Marker::ObjectEnd as u8];

impl ScriptValue {
    /// Decode one value from the start of `input`. Trailing bytes are ignored.
    pub fn decode(mut input: &[u8]) -> Result<Self> {
        Self::read_from(&mut input)
    }

    /// Decode one value, advancing `buf` past it.
    pub fn read_from<B: Buf>(buf: &mut B) -> Result<Self> {
        read_value(buf, 0)
    }

    /// Encode this value.
    pub fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        write_value(self, buf, 0)
    }

    /// Encode this value into a new buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::with_capacity(64);
        self.encode(&mut buf)?;
        Ok(buf.to_vec())
    }
}

fn need<B: Buf>(buf: &B, n: usize) -> Result<()> {
    if buf.remaining() < n {
        return Err(Error::UnexpectedEof {
            need: n,
            have: buf.remaining(),
        });
    }
    Ok(())
}

fn read_value<B: Buf>(buf: &mut B, depth: usize) -> Result<ScriptValue> {
    need(buf, 1)?;
    let byte = buf.get_u8();
    let marker = Marker::from_u8(byte).ok_or(Error::UnknownMarker(byte))?;

    let value = match marker {
        Marker::Number => {
            need(buf, 8)?;
            ScriptValue::Number(buf.get_f64())
        }
        Marker::Boolean => {
            need(buf, 1)?;
            ScriptValue::Boolean(buf.get_u8() != 0)
        }
        Marker::String => {
            need(buf, 2)?;
            let len = buf.get_u16() as usize;
            ScriptValue::String(read_utf8(buf, len)?)
        }
        Marker::Object => ScriptValue::Object(read_properties(buf, nested(depth)?)?),
        Marker::MovieClip => return Err(Error::MovieClip),
        Marker::Null => ScriptValue::Null,
        Marker::Undefined => ScriptValue::Undefined,
        Marker::Reference => {
            need(buf, 2)?;
            ScriptValue::Reference(buf.get_u16())
        }
        Marker::EcmaArray => {
            need(buf, 4)?;
            // declared count, not checked against the entries
            let _declared = buf.get_u32();
            ScriptValue::EcmaArray(read_properties(buf, nested(depth)?)?)
        }
        Marker::ObjectEnd => return Err(Error::UnexpectedEndMarker),
        Marker::StrictArray => {
            need(buf, 4)?;
            let count = buf.get_u32() as usize;
            let depth = nested(depth)?;
            let mut items = Vec::with_capacity(count.min(buf.remaining()));
            for _ in 0..count {
                items.push(read_value(buf, depth)?);
            }
            ScriptValue::StrictArray(items)
        }
        Marker::Date => {
            need(buf, 10)?;
            let epoch_millis = buf.get_f64();
            let offset_minutes = buf.get_i16();
            ScriptValue::Date(ScriptDate::from_parts(epoch_millis, offset_minutes)?)
        }
        Marker::LongString => {
            need(buf, 4)?;
            let len = buf.get_u32();
            if len as usize > buf.remaining() {
                return Err(Error::LongStringTooLarge { len: len as u64 });
            }
            ScriptValue::LongString(read_utf8(buf, len as usize)?)
        }
    };

    Ok(value)
}

fn nested(depth: usize) -> Result<usize> {
    if depth >= MAX_DEPTH {
        return Err(Error::NestingTooDeep(MAX_DEPTH));
    }
    Ok(depth + 1)
}

fn read_utf8<B: Buf>(buf: &mut B, len: usize) -> Result<String> {
    need(buf, len)?;
    let mut bytes = vec![0u8; len];
    buf.copy_to_slice(&mut bytes);
    Ok(String::from_utf8(bytes)?)
}

/// Read keyed values up to and including the end marker.
fn read_properties<B: Buf>(buf: &mut B, depth: usize) -> Result<ScriptObject> {
    let mut props = ScriptObject::new();
    loop {
        need(buf, 2)?;
        let len = buf.get_u16() as usize;
        if len == 0 {
            need(buf, 1)?;
            let marker = buf.get_u8();
            if marker != Marker::ObjectEnd as u8 {
                return Err(Error::EndMarkerMismatch(marker));
            }
            return Ok(props);
        }
        let key = read_utf8(buf, len)?;
        let value = read_value(buf, depth)?;
        props.push(key, value);
    }
}

fn write_value<B: BufMut>(value: &ScriptValue, buf: &mut B, depth: usize) -> Result<()> {
    match value {
        ScriptValue::Number(n) => {
            buf.put_u8(Marker::Number.as_u8());
            buf.put_f64(*n);
        }
        ScriptValue::Boolean(b) => {
            buf.put_u8(Marker::Boolean.as_u8());
            buf.put_u8(*b as u8);
        }
        ScriptValue::String(s) => {
            check_short(s)?;
            buf.put_u8(Marker::String.as_u8());
            buf.put_u16(s.len() as u16);
            buf.put_slice(s.as_bytes());
        }
        ScriptValue::Object(props) => {
            buf.put_u8(Marker::Object.as_u8());
            write_properties(props, buf, nested(depth)?)?;
        }
        ScriptValue::Null => buf.put_u8(Marker::Null.as_u8()),
        ScriptValue::Undefined => buf.put_u8(Marker::Undefined.as_u8()),
        ScriptValue::Reference(r) => {
            buf.put_u8(Marker::Reference.as_u8());
            buf.put_u16(*r);
        }
        ScriptValue::EcmaArray(props) => {
            buf.put_u8(Marker::EcmaArray.as_u8());
            buf.put_u32(props.len() as u32);
            write_properties(props, buf, nested(depth)?)?;
        }
        ScriptValue::StrictArray(items) => {
            let depth = nested(depth)?;
            buf.put_u8(Marker::StrictArray.as_u8());
            buf.put_u32(items.len() as u32);
            for item in items {
                write_value(item, buf, depth)?;
            }
        }
        ScriptValue::Date(date) => {
            buf.put_u8(Marker::Date.as_u8());
            buf.put_f64(date.epoch_millis());
            buf.put_i16(date.offset_minutes());
        }
        ScriptValue::LongString(s) => {
            let len = u32::try_from(s.len())
                .map_err(|_| Error::LongStringTooLarge { len: s.len() as u64 })?;
            buf.put_u8(Marker::LongString.as_u8());
            buf.put_u32(len);
            buf.put_slice(s.as_bytes());
        }
    }
    Ok(())
}

fn write_properties<B: BufMut>(props: &ScriptObject, buf: &mut B, depth: usize) -> Result<()> {
    for (key, value) in props.iter() {
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }
        check_short(key)?;
        buf.put_u16(key.len() as u16);
        buf.put_slice(key.as_bytes());
        write_value(value, buf, depth)?;
    }
    buf.put_slice(&OBJECT_END);
    Ok(())
}

fn check_short(s: &str) -> Result<()> {
    if s.len() > MAX_SHORT_STRING_LEN {
        return Err(Error::StringTooLong(s.len()));
    }
    Ok(())
}
