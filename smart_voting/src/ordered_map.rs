// Serde adapter storing a JSON object as an ordered list of (key, value) pairs.
//
// The store relies on the order of the objects in the backing file: elections
// are listed in creation order and voters in registration order.

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

#[allow(clippy::ptr_arg)]
pub fn serialize<V, S>(entries: &Vec<(String, V)>, serializer: S) -> Result<S::Ok, S::Error>
where
    V: Serialize,
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (key, value) in entries.iter() {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

pub fn deserialize<'de, V, D>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
where
    V: Deserialize<'de>,
    D: Deserializer<'de>,
{
    deserializer.deserialize_map(EntriesVisitor {
        marker: PhantomData,
    })
}

struct EntriesVisitor<V> {
    marker: PhantomData<V>,
}

impl<'de, V> Visitor<'de> for EntriesVisitor<V>
where
    V: Deserialize<'de>,
{
    type Value = Vec<(String, V)>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an object with unique string keys")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries: Vec<(String, V)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
        let mut seen: HashSet<String> = HashSet::new();
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            if !seen.insert(key.clone()) {
                return Err(de::Error::custom(format!("duplicate key {:?}", key)));
            }
            entries.push((key, value));
        }
        Ok(entries)
    }
}
