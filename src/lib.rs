//! inline-hashtable: an open-addressing hash table with linear probing,
//! sentinel keys, tombstone deletion and inline storage for tiny tables.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a flat, cache-friendly map/set with predictable layout: one
//!   contiguous bucket array, no per-entry allocation, no per-bucket state
//!   byte, and no heap at all while the table fits its inline buckets.
//! - Layers:
//!   - `raw::Storage<K, V, N>`: bucket items either inline in the table
//!     object or in one cache-line aligned heap block. Knows nothing about
//!     hashing.
//!   - `HashTable<K, V, I, A, N>`: probing, insertion, erasure, growth,
//!     handles and iteration on top of the storage.
//!   - `HashSet<T, I, A, N>`: `HashTable<T, ()>` with set-shaped methods.
//!
//! Bucket encoding
//! - Every bucket is `{ key: K, value: MaybeUninit<V> }`. The key is always
//!   initialised; two reserved key values from `KeyInfo` mark EMPTY and
//!   TOMBSTONE buckets. The value is initialised exactly when the key is
//!   valid, and every value access checks that first.
//! - `KeyInfo` is an `unsafe trait` because the table's memory safety
//!   depends on `is_valid` answering consistently for sentinels.
//!
//! Probing
//! - Start bucket is the hash truncated to `usize` and masked by
//!   `capacity - 1`; capacity is always a power of two.
//! - Linear probing with wrap-around. Lookups stop at a match, an EMPTY
//!   bucket, or after visiting every bucket. Inserts remember the first
//!   TOMBSTONE seen and reuse it; a probe that wraps without an EMPTY bucket
//!   still terminates on that tombstone.
//!
//! Growth
//! - Checked before each insert of an absent key: grow when
//!   `len + tombstones > 3/4 * capacity`. Tombstones count, so heavy
//!   insert/erase churn cannot exhaust EMPTY buckets.
//! - When the live entries would fit in half the buckets the array is
//!   rebuilt at the same size (purging tombstones); otherwise it doubles,
//!   with a heap floor of 16 buckets.
//! - Hashes are not cached; a rebuild recomputes them. A panicking hash
//!   during a rebuild leaks the not-yet-moved entries and never drops
//!   anything twice.
//!
//! Erasure
//! - Erase turns the bucket into a TOMBSTONE. Erasing the last live entry
//!   resets every bucket to EMPTY, which also clears all tombstones.
//! - Removed entries are handed back (or dropped) only after the table is
//!   consistent again, so `Drop` of `K`/`V` never observes a half-updated
//!   table.
//!
//! Handles
//! - `Handle` is a bucket index. It stays valid until the bucket array is
//!   rebuilt; erasing other entries does not move anything, which is what
//!   makes `first`/`next_after`/`erase_at` walks possible.
//!
//! Contract checks
//! - Using a sentinel as a key is a contract violation. `invariant!` panics
//!   on it in debug builds or with the `checked` feature; otherwise the
//!   outcome is unspecified but memory-safe.
//!
//! Notes and non-goals
//! - Single owner, `&mut self` for every mutation; `Send`/`Sync` follow the
//!   key, value and allocator types.
//! - No automatic shrink; `clear` keeps capacity.
//! - Iteration order is unspecified.

pub mod alloc;
pub mod error;
mod external_trait_impls;
pub mod hash_table;
#[cfg(test)]
mod hash_table_proptest;
mod invariant;
pub mod iter;
pub mod key_info;
mod raw;
pub mod set;

// Public surface
pub use alloc::{BucketAlloc, Global};
pub use error::{InsertError, TryReserveError};
pub use hash_table::{Handle, HashTable};
pub use key_info::{mix64, DefaultKeyInfo, KeyInfo};
pub use set::HashSet;

/// Map-flavoured name for [`HashTable`] with the global allocator and a
/// single inline bucket.
pub type HashMap<K, V, I = DefaultKeyInfo> = HashTable<K, V, I>;
