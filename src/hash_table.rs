//! HashTable: open addressing with linear probing, sentinel keys and
//! tombstones, plus inline bucket storage for tiny tables.

use crate::alloc::{BucketAlloc, Global};
use crate::error::{InsertError, TryReserveError};
use crate::invariant::invariant;
use crate::iter::{IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
use crate::key_info::{DefaultKeyInfo, KeyInfo};
use crate::raw::{Item, Storage, MIN_BUCKETS};
use core::fmt;
use core::marker::PhantomData;
use core::mem::{self, ManuallyDrop};
use core::ptr;

/// Positional reference to a bucket.
///
/// A handle stays meaningful until the table rebuilds its bucket array
/// (growth, `reserve`, `rehash`). Erasing other entries never moves an
/// entry, so handles survive erasure of anything but their own bucket.
/// Handles compare by position only; comparing handles taken from
/// different tables is meaningless.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Handle(usize);

impl Handle {
    #[inline]
    pub(crate) fn new(index: usize) -> Self {
        Handle(index)
    }

    /// Bucket index this handle points at.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }

    pub fn key<'a, K, V, I, A, const N: usize>(
        &self,
        table: &'a HashTable<K, V, I, A, N>,
    ) -> Option<&'a K>
    where
        I: KeyInfo<K>,
        A: BucketAlloc,
    {
        table.handle_key(*self)
    }

    pub fn value<'a, K, V, I, A, const N: usize>(
        &self,
        table: &'a HashTable<K, V, I, A, N>,
    ) -> Option<&'a V>
    where
        I: KeyInfo<K>,
        A: BucketAlloc,
    {
        table.handle_value(*self)
    }

    pub fn value_mut<'a, K, V, I, A, const N: usize>(
        &self,
        table: &'a mut HashTable<K, V, I, A, N>,
    ) -> Option<&'a mut V>
    where
        I: KeyInfo<K>,
        A: BucketAlloc,
    {
        table.handle_value_mut(*self)
    }
}

/// Grow once live entries plus tombstones exceed 3/4 of the buckets.
#[inline]
fn load_threshold(buckets: usize) -> usize {
    (buckets >> 1) + (buckets >> 2)
}

#[cold]
fn reserve_failed(err: TryReserveError) -> ! {
    match err {
        TryReserveError::CapacityOverflow => panic!("capacity overflow"),
        TryReserveError::AllocError { layout } => std::alloc::handle_alloc_error(layout),
    }
}

/// Places an entry known to be absent into a tombstone-free bucket array.
fn insert_unique<K, V, I: KeyInfo<K>>(items: &mut [Item<K, V>], hash: u64, key: K, value: V) {
    let mask = items.len() - 1;
    let mut index = hash as usize & mask;
    for _ in 0..items.len() {
        let item = &mut items[index];
        if I::is_empty(&item.key) {
            item.key = key;
            item.value.write(value);
            return;
        }
        index = (index + 1) & mask;
    }
    panic!("rebuilt bucket array has no free bucket");
}

/// Open-addressing hash table with map semantics.
///
/// - `I` supplies the EMPTY/TOMBSTONE sentinels, hashing and equality.
/// - `A` supplies heap memory for bucket arrays.
/// - `N` is the number of buckets stored inline in the table object
///   (a power of two). Until the table outgrows them no heap memory is used.
pub struct HashTable<K, V, I = DefaultKeyInfo, A = Global, const N: usize = 1>
where
    I: KeyInfo<K>,
    A: BucketAlloc,
{
    storage: ManuallyDrop<Storage<K, V, N>>,
    num_buckets: usize,
    num_elements: usize,
    num_tombstones: usize,
    alloc: A,
    _marker: PhantomData<(K, V, fn() -> I)>,
}

// The heap block is owned exclusively, like a `Vec`.
unsafe impl<K, V, I, A, const N: usize> Send for HashTable<K, V, I, A, N>
where
    K: Send,
    V: Send,
    I: KeyInfo<K>,
    A: BucketAlloc + Send,
{
}

unsafe impl<K, V, I, A, const N: usize> Sync for HashTable<K, V, I, A, N>
where
    K: Sync,
    V: Sync,
    I: KeyInfo<K>,
    A: BucketAlloc + Sync,
{
}

impl<K, V> HashTable<K, V>
where
    DefaultKeyInfo: KeyInfo<K>,
{
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// Table with at least `buckets` buckets (rounded up to a power of two).
    pub fn with_capacity(buckets: usize) -> Self {
        Self::with_capacity_in(buckets, Global)
    }
}

impl<K, V, I, A, const N: usize> HashTable<K, V, I, A, N>
where
    I: KeyInfo<K>,
    A: BucketAlloc,
{
    const INLINE_BUCKETS: usize = {
        assert!(
            N.is_power_of_two(),
            "inline bucket count must be a non-zero power of two"
        );
        N
    };

    pub fn new_in(alloc: A) -> Self {
        HashTable {
            storage: ManuallyDrop::new(Storage::inline::<I>()),
            num_buckets: Self::INLINE_BUCKETS,
            num_elements: 0,
            num_tombstones: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    pub fn with_capacity_in(buckets: usize, alloc: A) -> Self {
        let mut table = Self::new_in(alloc);
        if buckets > N {
            table.reserve(buckets);
        }
        table
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.num_elements
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_elements == 0
    }

    /// Number of buckets; always a power of two.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.num_buckets
    }

    /// Buckets holding an erased entry that have not been reclaimed yet.
    #[inline]
    pub fn num_tombstones(&self) -> usize {
        self.num_tombstones
    }

    /// True while the buckets live inside the table object.
    #[inline]
    pub fn is_inline(&self) -> bool {
        self.storage.is_inline()
    }

    #[inline]
    fn buckets(&self) -> &[Item<K, V>] {
        self.storage.buckets(self.num_buckets)
    }

    fn find_index(&self, key: &K) -> Option<usize> {
        invariant!(I::is_valid(key), "lookup with a reserved sentinel key");
        let items = self.buckets();
        let mask = items.len() - 1;
        let mut index = I::hash(key) as usize & mask;
        for _ in 0..items.len() {
            let slot = &items[index].key;
            if I::is_empty(slot) {
                return None;
            }
            if I::is_equal(slot, key) {
                return Some(index);
            }
            index = (index + 1) & mask;
        }
        None
    }

    pub fn find(&self, key: &K) -> Option<Handle> {
        self.find_index(key).map(Handle::new)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find_index(key).is_some()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.handle_value(self.find(key)?)
    }

    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.handle_entry(self.find(key)?)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let handle = self.find(key)?;
        self.handle_value_mut(handle)
    }

    pub fn handle_key(&self, handle: Handle) -> Option<&K> {
        self.handle_entry(handle).map(|(k, _)| k)
    }

    pub fn handle_value(&self, handle: Handle) -> Option<&V> {
        self.handle_entry(handle).map(|(_, v)| v)
    }

    pub fn handle_entry(&self, handle: Handle) -> Option<(&K, &V)> {
        let item = self.buckets().get(handle.0)?;
        if I::is_valid(&item.key) {
            Some((&item.key, unsafe { item.value.assume_init_ref() }))
        } else {
            None
        }
    }

    pub fn handle_value_mut(&mut self, handle: Handle) -> Option<&mut V> {
        let item = self
            .storage
            .buckets_mut(self.num_buckets)
            .get_mut(handle.0)?;
        if I::is_valid(&item.key) {
            Some(unsafe { item.value.assume_init_mut() })
        } else {
            None
        }
    }

    /// Inserts `key -> value` unless `key` is already present.
    ///
    /// Returns the entry's handle and whether an insertion happened. An
    /// existing value is never overwritten, and a present key never makes
    /// the table grow.
    pub fn emplace(&mut self, key: K, value: V) -> (Handle, bool) {
        self.emplace_with(key, move || value)
    }

    /// Like [`emplace`](Self::emplace), but only builds the value when the
    /// key is absent.
    pub fn emplace_with<F>(&mut self, key: K, make_value: F) -> (Handle, bool)
    where
        F: FnOnce() -> V,
    {
        invariant!(I::is_valid(&key), "insert with a reserved sentinel key");
        if self.num_elements + self.num_tombstones > load_threshold(self.num_buckets) {
            if let Some(index) = self.find_index(&key) {
                return (Handle(index), false);
            }
            self.grow();
        }
        let (index, inserted) = self.probe_insert(key, make_value);
        (Handle(index), inserted)
    }

    /// Checked insert: rejects duplicates and sentinel keys with an error.
    pub fn insert(&mut self, key: K, value: V) -> Result<Handle, InsertError> {
        if !I::is_valid(&key) {
            return Err(InsertError::ReservedKey);
        }
        match self.emplace(key, value) {
            (handle, true) => Ok(handle),
            (_, false) => Err(InsertError::DuplicateKey),
        }
    }

    /// Value for `key`, inserting `V::default()` first if absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let (handle, _) = self.emplace_with(key, V::default);
        match self.handle_value_mut(handle) {
            Some(value) => value,
            None => panic!("get_or_insert_default called with a reserved sentinel key"),
        }
    }

    fn probe_insert<F>(&mut self, key: K, make_value: F) -> (usize, bool)
    where
        F: FnOnce() -> V,
    {
        let items = self.storage.buckets_mut(self.num_buckets);
        let mask = items.len() - 1;
        let mut index = I::hash(&key) as usize & mask;
        let mut tombstone = None;
        let mut vacant = None;
        for _ in 0..items.len() {
            let slot = &items[index].key;
            if I::is_empty(slot) {
                vacant = Some(index);
                break;
            }
            if I::is_tombstone(slot) {
                tombstone = tombstone.or(Some(index));
            } else if I::is_equal(slot, &key) {
                return (index, false);
            }
            index = (index + 1) & mask;
        }

        // Without an EMPTY bucket the whole table was scanned, so the key is
        // absent and the first tombstone is still a correct home.
        let target = match tombstone.or(vacant) {
            Some(target) => target,
            None => panic!(
                "probe visited all {} buckets without finding a free one",
                items.len()
            ),
        };
        let value = make_value();
        let item = &mut items[target];
        item.key = key;
        item.value.write(value);
        self.num_elements += 1;
        if tombstone.is_some() {
            self.num_tombstones -= 1;
        }
        (target, true)
    }

    /// Makes room for one more entry. When live entries would still fit in
    /// half the buckets, tombstones are the pressure and the array is
    /// rebuilt at the same size; otherwise it doubles.
    fn grow(&mut self) {
        let buckets = self.num_buckets;
        let target = if self.num_tombstones > 0 && self.num_elements < buckets / 2 {
            buckets
        } else {
            match buckets.checked_mul(2) {
                Some(doubled) => doubled.max(MIN_BUCKETS),
                None => reserve_failed(TryReserveError::CapacityOverflow),
            }
        };
        self.resize(target);
    }

    fn alloc_storage(&self, buckets: usize) -> Result<Storage<K, V, N>, TryReserveError> {
        if buckets == N {
            Ok(Storage::inline::<I>())
        } else {
            Storage::heap::<I, A>(buckets, &self.alloc)
        }
    }

    fn resize(&mut self, buckets: usize) {
        if let Err(err) = self.try_resize(buckets) {
            reserve_failed(err)
        }
    }

    /// Moves every live entry into a fresh array of `buckets` buckets.
    /// Tombstones are dropped, hashes recomputed.
    fn try_resize(&mut self, buckets: usize) -> Result<(), TryReserveError> {
        debug_assert!(buckets.is_power_of_two() && buckets >= self.num_elements);
        let fresh = self.alloc_storage(buckets)?;
        let mut old = ManuallyDrop::new(mem::replace(&mut *self.storage, fresh));
        let old_buckets = mem::replace(&mut self.num_buckets, buckets);
        self.num_elements = 0;
        self.num_tombstones = 0;

        let (old_items, old_block) = match &mut *old {
            Storage::Inline(items) => (items.as_mut_ptr(), None),
            Storage::Heap { ptr, layout } => (ptr.as_ptr(), Some((ptr.cast::<u8>(), *layout))),
        };
        // Entries already moved are never touched again. If a hash panics,
        // the remaining old entries leak but the block is still released.
        let alloc = &self.alloc;
        let _release = scopeguard::guard((), move |()| {
            if let Some((block, layout)) = old_block {
                unsafe { alloc.deallocate(block, layout) };
            }
        });

        let items = self.storage.buckets_mut(buckets);
        for i in 0..old_buckets {
            let item = unsafe { &mut *old_items.add(i) };
            if I::is_valid(&item.key) {
                let hash = I::hash(&item.key);
                let key = unsafe { ptr::read(&item.key) };
                let value = unsafe { item.value.assume_init_read() };
                insert_unique::<K, V, I>(items, hash, key, value);
                self.num_elements += 1;
            } else {
                unsafe { ptr::drop_in_place(&mut item.key) };
            }
        }
        Ok(())
    }

    /// Grows to at least `buckets` buckets (next power of two).
    ///
    /// Returns `false` without doing anything when `buckets` is zero or
    /// below the current capacity; never shrinks. Aborts on allocation
    /// failure, see [`try_reserve`](Self::try_reserve).
    pub fn reserve(&mut self, buckets: usize) -> bool {
        match self.try_reserve(buckets) {
            Ok(grown) => grown,
            Err(err) => reserve_failed(err),
        }
    }

    pub fn try_reserve(&mut self, buckets: usize) -> Result<bool, TryReserveError> {
        if buckets == 0 || buckets < self.num_buckets {
            return Ok(false);
        }
        let target = buckets
            .checked_next_power_of_two()
            .ok_or(TryReserveError::CapacityOverflow)?;
        let target = if target <= N {
            N
        } else {
            target.max(MIN_BUCKETS)
        };
        self.try_resize(target)?;
        Ok(true)
    }

    /// Rebuilds the bucket array at its current size, reclaiming every
    /// tombstone.
    pub fn rehash(&mut self) {
        let buckets = self.num_buckets;
        self.resize(buckets);
    }

    /// Removes the entry at `index`, leaving a tombstone. Erasing the last
    /// entry resets every bucket to EMPTY instead.
    fn take_index(&mut self, index: usize) -> (K, V) {
        invariant!(self.num_elements != 0, "erase from a table with no live entries");
        let tombstone = I::tombstone();
        let items = self.storage.buckets_mut(self.num_buckets);
        let item = &mut items[index];
        let key = mem::replace(&mut item.key, tombstone);
        let value = unsafe { item.value.assume_init_read() };
        self.num_elements -= 1;
        if self.num_elements == 0 {
            self.num_tombstones = 0;
            for item in items.iter_mut() {
                item.key = I::empty();
            }
        } else {
            self.num_tombstones += 1;
        }
        (key, value)
    }

    /// Removes the entry a handle points at. `None` if the bucket is not
    /// occupied.
    pub fn remove_at(&mut self, handle: Handle) -> Option<(K, V)> {
        let occupied = self
            .buckets()
            .get(handle.0)
            .map_or(false, |item| I::is_valid(&item.key));
        if occupied {
            Some(self.take_index(handle.0))
        } else {
            None
        }
    }

    pub fn erase_at(&mut self, handle: Handle) -> bool {
        self.remove_at(handle).is_some()
    }

    pub fn erase(&mut self, key: &K) -> bool {
        self.remove_entry(key).is_some()
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let index = self.find_index(key)?;
        self.remove_at(Handle(index))
    }

    /// Keeps only the entries for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        for index in 0..self.num_buckets {
            let Item { key, value } = &mut self.storage.buckets_mut(self.num_buckets)[index];
            if !I::is_valid(key) {
                continue;
            }
            if !keep(&*key, unsafe { value.assume_init_mut() }) {
                drop(self.take_index(index));
            }
        }
    }

    /// Drops every entry and resets all buckets to EMPTY. Capacity is kept.
    pub fn clear(&mut self) {
        if self.num_elements == 0 && self.num_tombstones == 0 {
            return;
        }
        let items = self.storage.buckets_mut(self.num_buckets);
        for item in items.iter_mut() {
            if I::is_valid(&item.key) {
                let key = mem::replace(&mut item.key, I::empty());
                let value = unsafe { item.value.assume_init_read() };
                self.num_elements -= 1;
                drop((key, value));
            } else if I::is_tombstone(&item.key) {
                item.key = I::empty();
            }
        }
        self.num_elements = 0;
        self.num_tombstones = 0;
    }

    /// Handle of the first occupied bucket.
    pub fn first(&self) -> Option<Handle> {
        self.occupied_from(0)
    }

    /// Handle of the next occupied bucket after `handle`. Valid after
    /// `erase_at(handle)`, which makes erase-while-walking possible.
    pub fn next_after(&self, handle: Handle) -> Option<Handle> {
        self.occupied_from(handle.0.saturating_add(1))
    }

    fn occupied_from(&self, start: usize) -> Option<Handle> {
        if self.num_elements == 0 {
            return None;
        }
        self.buckets()
            .get(start..)?
            .iter()
            .position(|item| I::is_valid(&item.key))
            .map(|offset| Handle(start + offset))
    }

    pub fn iter(&self) -> Iter<'_, K, V, I> {
        Iter::new(self.buckets(), self.num_elements)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V, I> {
        IterMut::new(self.storage.buckets_mut(self.num_buckets), self.num_elements)
    }

    pub fn keys(&self) -> Keys<'_, K, V, I> {
        Keys::new(self.iter())
    }

    pub fn values(&self) -> Values<'_, K, V, I> {
        Values::new(self.iter())
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V, I> {
        ValuesMut::new(self.iter_mut())
    }

    /// Moves the next live entry at or after `*cursor` out of the table,
    /// leaving EMPTY behind. Only used by owning iteration, where no lookup
    /// follows.
    pub(crate) fn take_next(&mut self, cursor: &mut usize) -> Option<(K, V)> {
        if self.num_elements == 0 {
            return None;
        }
        let items = self.storage.buckets_mut(self.num_buckets);
        while let Some(item) = items.get_mut(*cursor) {
            *cursor += 1;
            if I::is_valid(&item.key) {
                let key = mem::replace(&mut item.key, I::empty());
                let value = unsafe { item.value.assume_init_read() };
                self.num_elements -= 1;
                return Some((key, value));
            }
        }
        None
    }

    /// Exchanges the contents of two tables in O(1).
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }
}

impl<K, V, I, A, const N: usize> Drop for HashTable<K, V, I, A, N>
where
    I: KeyInfo<K>,
    A: BucketAlloc,
{
    fn drop(&mut self) {
        if mem::needs_drop::<V>() && self.num_elements != 0 {
            for item in self.storage.buckets_mut(self.num_buckets) {
                if I::is_valid(&item.key) {
                    unsafe { item.value.assume_init_drop() };
                }
            }
        }
        unsafe { self.storage.free(self.num_buckets, &self.alloc) };
    }
}

impl<K, V, I, A, const N: usize> Clone for HashTable<K, V, I, A, N>
where
    K: Clone,
    V: Clone,
    I: KeyInfo<K>,
    A: BucketAlloc + Clone,
{
    /// Deep copy at the source's capacity; tombstones are not carried over.
    fn clone(&self) -> Self {
        let mut table = Self::new_in(self.alloc.clone());
        if !self.is_inline() {
            table.reserve(self.num_buckets);
        }
        for (key, value) in self.iter() {
            table.emplace(key.clone(), value.clone());
        }
        table
    }
}

impl<K, V, I, A, const N: usize> Default for HashTable<K, V, I, A, N>
where
    I: KeyInfo<K>,
    A: BucketAlloc + Default,
{
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<K, V, I, A, const N: usize> fmt::Debug for HashTable<K, V, I, A, N>
where
    K: fmt::Debug,
    V: fmt::Debug,
    I: KeyInfo<K>,
    A: BucketAlloc,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, I, A, const N: usize> PartialEq for HashTable<K, V, I, A, N>
where
    V: PartialEq,
    I: KeyInfo<K>,
    A: BucketAlloc,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).map_or(false, |v| *value == *v))
    }
}

impl<K, V, I, A, const N: usize> Eq for HashTable<K, V, I, A, N>
where
    V: Eq,
    I: KeyInfo<K>,
    A: BucketAlloc,
{
}

impl<K, V, I, A, const N: usize> Extend<(K, V)> for HashTable<K, V, I, A, N>
where
    I: KeyInfo<K>,
    A: BucketAlloc,
{
    /// Entries whose key is already present are ignored.
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.emplace(key, value);
        }
    }
}

impl<K, V, I, A, const N: usize> FromIterator<(K, V)> for HashTable<K, V, I, A, N>
where
    I: KeyInfo<K>,
    A: BucketAlloc + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut table = Self::default();
        table.extend(iter);
        table
    }
}

impl<'a, K, V, I, A, const N: usize> IntoIterator for &'a HashTable<K, V, I, A, N>
where
    I: KeyInfo<K>,
    A: BucketAlloc,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, I>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, I, A, const N: usize> IntoIterator for &'a mut HashTable<K, V, I, A, N>
where
    I: KeyInfo<K>,
    A: BucketAlloc,
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V, I>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, I, A, const N: usize> IntoIterator for HashTable<K, V, I, A, N>
where
    I: KeyInfo<K>,
    A: BucketAlloc,
{
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, I, A, N>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}
