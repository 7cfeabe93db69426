//! Key policy: sentinel values, hashing and equality for a key type.
//!
//! The table never stores a per-bucket state byte. Instead every bucket
//! always holds a key, and two reserved key values mark the bucket as
//! EMPTY (never used since the last clear/rebuild) or TOMBSTONE (held an
//! entry that was erased). A `KeyInfo<K>` implementation supplies those two
//! values together with the hash and equality used for probing.

use core::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;

/// Per-key-type policy used by [`HashTable`](crate::HashTable).
///
/// # Safety
///
/// The table decides whether a bucket's value slot is initialised by asking
/// [`is_valid`](KeyInfo::is_valid) about the bucket's key. Implementations
/// must therefore guarantee:
///
/// - `is_valid(&empty())` and `is_valid(&tombstone())` are `false`;
/// - `is_empty`, `is_tombstone` and `is_valid` are deterministic: the same
///   key always gets the same answer;
/// - `is_empty(&empty())` and `is_tombstone(&tombstone())` are `true`, and
///   `is_valid(k)` is `true` for every key that is neither sentinel.
///
/// `hash` and `is_equal` only affect correctness of lookups, never memory
/// safety; a constant hash is legal (and slow).
pub unsafe trait KeyInfo<K> {
    /// Sentinel marking a bucket that has never held an entry.
    fn empty() -> K;

    /// Sentinel marking a bucket whose entry was erased.
    fn tombstone() -> K;

    fn hash(key: &K) -> u64;

    fn is_equal(lhs: &K, rhs: &K) -> bool;

    #[inline]
    fn is_empty(key: &K) -> bool {
        Self::is_equal(key, &Self::empty())
    }

    #[inline]
    fn is_tombstone(key: &K) -> bool {
        Self::is_equal(key, &Self::tombstone())
    }

    /// True for keys that may be stored, i.e. neither sentinel.
    #[inline]
    fn is_valid(key: &K) -> bool {
        !Self::is_empty(key) && !Self::is_tombstone(key)
    }
}

/// Default key policy for the primitive integers and `String`.
///
/// Callers add support for their own key types with
/// `unsafe impl KeyInfo<MyKey> for DefaultKeyInfo`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct DefaultKeyInfo;

/// 64-bit finalizer (splitmix64). Integer keys are often sequential or
/// strided, and bucket selection only looks at the low bits.
#[inline]
pub fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

// Signed integers reserve the two largest values: MAX - 1 is EMPTY, MAX is
// TOMBSTONE.
macro_rules! signed_key_info {
    ($($t:ty),*) => {$(
        unsafe impl KeyInfo<$t> for DefaultKeyInfo {
            #[inline]
            fn empty() -> $t {
                <$t>::MAX - 1
            }
            #[inline]
            fn tombstone() -> $t {
                <$t>::MAX
            }
            #[inline]
            fn hash(key: &$t) -> u64 {
                mix64(*key as i64 as u64)
            }
            #[inline]
            fn is_equal(lhs: &$t, rhs: &$t) -> bool {
                lhs == rhs
            }
            #[inline]
            fn is_valid(key: &$t) -> bool {
                *key < <$t>::MAX - 1
            }
        }
    )*};
}

// Unsigned integers: MAX is EMPTY, MAX - 1 is TOMBSTONE.
macro_rules! unsigned_key_info {
    ($($t:ty),*) => {$(
        unsafe impl KeyInfo<$t> for DefaultKeyInfo {
            #[inline]
            fn empty() -> $t {
                <$t>::MAX
            }
            #[inline]
            fn tombstone() -> $t {
                <$t>::MAX - 1
            }
            #[inline]
            fn hash(key: &$t) -> u64 {
                mix64(*key as u64)
            }
            #[inline]
            fn is_equal(lhs: &$t, rhs: &$t) -> bool {
                lhs == rhs
            }
            #[inline]
            fn is_valid(key: &$t) -> bool {
                *key < <$t>::MAX - 1
            }
        }
    )*};
}

signed_key_info!(i8, i16, i32, i64, isize);
unsigned_key_info!(u8, u16, u32, u64, usize);

// The empty string is EMPTY and "\u{1}" is TOMBSTONE. Neither allocates.
unsafe impl KeyInfo<String> for DefaultKeyInfo {
    #[inline]
    fn empty() -> String {
        String::new()
    }

    #[inline]
    fn tombstone() -> String {
        String::from("\u{1}")
    }

    fn hash(key: &String) -> u64 {
        // DefaultHasher::new() uses fixed keys, so the hash is stable for
        // the lifetime of the process.
        let mut h = DefaultHasher::new();
        key.as_str().hash(&mut h);
        h.finish()
    }

    #[inline]
    fn is_equal(lhs: &String, rhs: &String) -> bool {
        lhs == rhs
    }

    #[inline]
    fn is_empty(key: &String) -> bool {
        key.is_empty()
    }

    #[inline]
    fn is_tombstone(key: &String) -> bool {
        key.as_bytes() == [1u8]
    }
}
