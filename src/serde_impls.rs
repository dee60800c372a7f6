//! `Serialize`/`Deserialize` for [`OrderedMap`], so a map can sit inside any
//! serde data structure and keep its order there too.
//!
//! Keys use the same wire form as [`to_json`](OrderedMap::to_json); values
//! use their own serde impls.

use crate::ordered_map::OrderedMap;
use crate::wire_key::WireKey;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{self, Serialize, SerializeMap, Serializer};

impl<K, V, S> Serialize for OrderedMap<K, V, S>
where
    K: WireKey,
    V: Serialize,
{
    fn serialize<T>(&self, serializer: T) -> Result<T::Ok, T::Error>
    where
        T: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self {
            let key = k.wire_key().map_err(<T::Error as ser::Error>::custom)?;
            map.serialize_entry(&*key, v)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<K, V, S> {
    marker: PhantomData<fn() -> OrderedMap<K, V, S>>,
}

impl<'de, K, V, S> Visitor<'de> for OrderedMapVisitor<K, V, S>
where
    K: WireKey + Eq + Hash,
    V: Deserialize<'de>,
    S: BuildHasher + Default,
{
    type Value = OrderedMap<K, V, S>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    #[inline]
    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(OrderedMap::default())
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let hint = access.size_hint().unwrap_or(0).min(4096);
        let mut map = OrderedMap::with_capacity_and_hasher(hint, S::default());
        while let Some(raw) = access.next_key::<String>()? {
            let key = K::from_wire_key(&raw).map_err(<A::Error as de::Error>::custom)?;
            let value = access.next_value()?;
            map.store(key, value);
        }
        Ok(map)
    }
}

impl<'de, K, V, S> Deserialize<'de> for OrderedMap<K, V, S>
where
    K: WireKey + Eq + Hash,
    V: Deserialize<'de>,
    S: BuildHasher + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(OrderedMapVisitor {
            marker: PhantomData,
        })
    }
}
