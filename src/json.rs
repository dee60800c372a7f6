//! JSON encoding and decoding of an [`OrderedMap`].
//!
//! The map's own shape (braces, separators, keys) is written and read here;
//! each value is delegated to `serde_json`. Entries are emitted in order and
//! decoded entries are stored in input order, so the order survives a
//! round trip.

use crate::error::CodecError;
use crate::ordered_map::OrderedMap;
use crate::scanner::{Scanner, Token};
use crate::wire_key::WireKey;
use core::any::type_name;
use core::hash::{BuildHasher, Hash};
use serde::de::DeserializeOwned;
use serde::Serialize;

impl<K, V, S> OrderedMap<K, V, S>
where
    K: WireKey,
    V: Serialize,
{
    /// Encode the live entries as a JSON object, in insertion order.
    ///
    /// Keys are written as JSON strings whatever their type; values use
    /// their `serde_json` encoding. No output is returned on failure.
    ///
    /// ```
    /// use orderedmap::OrderedMap;
    ///
    /// let mut m = OrderedMap::new();
    /// m.store(12, 34);
    /// m.store(-56, -78);
    /// assert_eq!(m.to_json().unwrap(), br#"{"12":34,"-56":-78}"#);
    /// ```
    pub fn to_json(&self) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::with_capacity(2 + self.len() * 16);
        buf.push(b'{');
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                buf.push(b',');
            }
            write_key(&mut buf, key)?;
            buf.push(b':');
            write_value(&mut buf, value)?;
        }
        buf.push(b'}');
        tracing::trace!(entries = self.len(), bytes = buf.len(), "encoded ordered map");
        Ok(buf)
    }

    /// [`to_json`](Self::to_json) as a `String`.
    pub fn to_json_string(&self) -> Result<String, CodecError> {
        let bytes = self.to_json()?;
        // Keys and values are written by serde_json, which only emits UTF-8.
        Ok(String::from_utf8(bytes).expect("serde_json writes valid UTF-8"))
    }
}

fn write_key<K: WireKey>(buf: &mut Vec<u8>, key: &K) -> Result<(), CodecError> {
    let text = key.wire_key()?;
    serde_json::to_writer(&mut *buf, &*text).map_err(|source| {
        CodecError::UnsupportedType {
            type_name: type_name::<K>(),
            source,
        }
    })
}

fn write_value<V: Serialize>(buf: &mut Vec<u8>, value: &V) -> Result<(), CodecError> {
    serde_json::to_writer(&mut *buf, value).map_err(|source| {
        tracing::debug!(value_type = type_name::<V>(), error = %source, "value encoder failed");
        CodecError::UnsupportedType {
            type_name: type_name::<V>(),
            source,
        }
    })
}

impl<K, V, S> OrderedMap<K, V, S>
where
    K: WireKey + Eq + Hash,
    V: DeserializeOwned,
    S: BuildHasher,
{
    /// Store every entry of a JSON object into this map, in input order.
    ///
    /// Entries go through [`store`](Self::store): existing live keys are
    /// overwritten in place, other keys are appended. Empty input is a
    /// no-op. On error the map is left exactly as it was.
    pub fn extend_from_json(&mut self, input: &[u8]) -> Result<(), CodecError> {
        let entries = decode_entries::<K, V>(input)?;
        tracing::trace!(entries = entries.len(), "decoded ordered map");
        self.extend(entries);
        Ok(())
    }

    /// Decode a JSON object into a new map.
    pub fn from_json(input: &[u8]) -> Result<Self, CodecError>
    where
        S: Default,
    {
        let mut m = Self::default();
        m.extend_from_json(input)?;
        Ok(m)
    }
}

/// Decode all entries before touching any map so failures stay atomic.
fn decode_entries<K, V>(input: &[u8]) -> Result<Vec<(K, V)>, CodecError>
where
    K: WireKey,
    V: DeserializeOwned,
{
    let mut scanner = Scanner::new(input);
    let mut entries = Vec::new();
    let opened = scanner.open().inspect_err(|e| {
        tracing::debug!(error = %e, "rejecting JSON input");
    })?;
    if !opened {
        return Ok(entries);
    }

    loop {
        let key_span = match scanner.next_token() {
            Ok(Token::Key(span)) => span,
            Ok(Token::End) => break,
            Err(e) => {
                tracing::debug!(error = %e, "rejecting JSON input");
                return Err(e);
            }
        };
        let key_offset = key_span.start;
        let raw_key: String = serde_json::from_slice(&scanner.input()[key_span])
            .map_err(|e| CodecError::syntax(key_offset, e.to_string()))?;
        let key = K::from_wire_key(&raw_key)?;

        let value_span = scanner.value().inspect_err(|e| {
            tracing::debug!(error = %e, "rejecting JSON input");
        })?;
        let value_offset = value_span.start;
        let value: V = serde_json::from_slice(&scanner.input()[value_span])
            .map_err(|source| CodecError::Value {
                offset: value_offset,
                source,
            })?;
        tracing::trace!(key = %raw_key, offset = value_offset, "decoded entry");
        entries.push((key, value));
    }

    scanner.finish()?;
    tracing::trace!(bytes = scanner.offset(), "consumed JSON input");
    Ok(entries)
}
