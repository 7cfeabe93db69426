use crate::alloc::BucketAlloc;
use crate::hash_table::HashTable;
use crate::key_info::KeyInfo;
use crate::set::HashSet;
use ::serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use ::serde::ser::{Serialize, Serializer};
use core::fmt;
use core::marker::PhantomData;

/// Caps the pre-sizing taken from an untrusted length hint.
fn cautious_buckets(hint: Option<usize>) -> usize {
    hint.unwrap_or(0).min(4096)
}

impl<K, V, I, A, const N: usize> Serialize for HashTable<K, V, I, A, N>
where
    K: Serialize,
    V: Serialize,
    I: KeyInfo<K>,
    A: BucketAlloc,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de, K, V, I, A, const N: usize> Deserialize<'de> for HashTable<K, V, I, A, N>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
    I: KeyInfo<K>,
    A: BucketAlloc + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MapVisitor<K, V, I, A, const N: usize> {
            marker: PhantomData<fn() -> (K, V, I, A)>,
        }

        impl<'de, K, V, I, A, const N: usize> Visitor<'de> for MapVisitor<K, V, I, A, N>
        where
            K: Deserialize<'de>,
            V: Deserialize<'de>,
            I: KeyInfo<K>,
            A: BucketAlloc + Default,
        {
            type Value = HashTable<K, V, I, A, N>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a map")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
                let mut table =
                    HashTable::with_capacity_in(cautious_buckets(map.size_hint()), A::default());
                while let Some((key, value)) = map.next_entry::<K, V>()? {
                    if !I::is_valid(&key) {
                        return Err(de::Error::custom("map key is a reserved sentinel value"));
                    }
                    table.emplace(key, value);
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(MapVisitor {
            marker: PhantomData,
        })
    }
}

impl<T, I, A, const N: usize> Serialize for HashSet<T, I, A, N>
where
    T: Serialize,
    I: KeyInfo<T>,
    A: BucketAlloc,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, T, I, A, const N: usize> Deserialize<'de> for HashSet<T, I, A, N>
where
    T: Deserialize<'de>,
    I: KeyInfo<T>,
    A: BucketAlloc + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SeqVisitor<T, I, A, const N: usize> {
            marker: PhantomData<fn() -> (T, I, A)>,
        }

        impl<'de, T, I, A, const N: usize> Visitor<'de> for SeqVisitor<T, I, A, N>
        where
            T: Deserialize<'de>,
            I: KeyInfo<T>,
            A: BucketAlloc + Default,
        {
            type Value = HashSet<T, I, A, N>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a sequence")
            }

            fn visit_seq<S: SeqAccess<'de>>(self, mut seq: S) -> Result<Self::Value, S::Error> {
                let mut set =
                    HashSet::with_capacity_in(cautious_buckets(seq.size_hint()), A::default());
                while let Some(value) = seq.next_element::<T>()? {
                    if !I::is_valid(&value) {
                        return Err(de::Error::custom("set element is a reserved sentinel value"));
                    }
                    set.insert(value);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_seq(SeqVisitor {
            marker: PhantomData,
        })
    }
}
