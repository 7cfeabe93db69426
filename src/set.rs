//! HashSet: a [`HashTable`] with unit values.

use crate::alloc::{BucketAlloc, Global};
use crate::error::TryReserveError;
use crate::hash_table::HashTable;
use crate::iter::{self, Keys};
use crate::key_info::{DefaultKeyInfo, KeyInfo};
use core::fmt;
use core::iter::FusedIterator;

pub struct HashSet<T, I = DefaultKeyInfo, A = Global, const N: usize = 1>
where
    I: KeyInfo<T>,
    A: BucketAlloc,
{
    table: HashTable<T, (), I, A, N>,
}

impl<T> HashSet<T>
where
    DefaultKeyInfo: KeyInfo<T>,
{
    pub fn new() -> Self {
        HashSet {
            table: HashTable::new(),
        }
    }

    pub fn with_capacity(buckets: usize) -> Self {
        HashSet {
            table: HashTable::with_capacity(buckets),
        }
    }
}

impl<T, I, A, const N: usize> HashSet<T, I, A, N>
where
    I: KeyInfo<T>,
    A: BucketAlloc,
{
    pub fn new_in(alloc: A) -> Self {
        HashSet {
            table: HashTable::new_in(alloc),
        }
    }

    pub fn with_capacity_in(buckets: usize, alloc: A) -> Self {
        HashSet {
            table: HashTable::with_capacity_in(buckets, alloc),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    #[inline]
    pub fn num_tombstones(&self) -> usize {
        self.table.num_tombstones()
    }

    /// Adds `value`; returns false (and drops `value`) if it was present.
    pub fn insert(&mut self, value: T) -> bool {
        self.table.emplace(value, ()).1
    }

    pub fn contains(&self, value: &T) -> bool {
        self.table.contains_key(value)
    }

    /// The stored element equal to `value`.
    pub fn get(&self, value: &T) -> Option<&T> {
        self.table.get_key_value(value).map(|(k, _)| k)
    }

    pub fn remove(&mut self, value: &T) -> bool {
        self.table.erase(value)
    }

    /// Removes and returns the stored element equal to `value`.
    pub fn take(&mut self, value: &T) -> Option<T> {
        self.table.remove_entry(value).map(|(k, ())| k)
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.table.retain(|k, _| keep(k));
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn reserve(&mut self, buckets: usize) -> bool {
        self.table.reserve(buckets)
    }

    pub fn try_reserve(&mut self, buckets: usize) -> Result<bool, TryReserveError> {
        self.table.try_reserve(buckets)
    }

    pub fn rehash(&mut self) {
        self.table.rehash();
    }

    pub fn swap(&mut self, other: &mut Self) {
        self.table.swap(&mut other.table);
    }

    pub fn iter(&self) -> Iter<'_, T, I> {
        Iter {
            inner: self.table.keys(),
        }
    }
}

impl<T, I, A, const N: usize> Clone for HashSet<T, I, A, N>
where
    T: Clone,
    I: KeyInfo<T>,
    A: BucketAlloc + Clone,
{
    fn clone(&self) -> Self {
        HashSet {
            table: self.table.clone(),
        }
    }
}

impl<T, I, A, const N: usize> Default for HashSet<T, I, A, N>
where
    I: KeyInfo<T>,
    A: BucketAlloc + Default,
{
    fn default() -> Self {
        HashSet {
            table: HashTable::default(),
        }
    }
}

impl<T, I, A, const N: usize> fmt::Debug for HashSet<T, I, A, N>
where
    T: fmt::Debug,
    I: KeyInfo<T>,
    A: BucketAlloc,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, I, A, const N: usize> PartialEq for HashSet<T, I, A, N>
where
    I: KeyInfo<T>,
    A: BucketAlloc,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|v| other.contains(v))
    }
}

impl<T, I, A, const N: usize> Eq for HashSet<T, I, A, N>
where
    I: KeyInfo<T>,
    A: BucketAlloc,
{
}

impl<T, I, A, const N: usize> Extend<T> for HashSet<T, I, A, N>
where
    I: KeyInfo<T>,
    A: BucketAlloc,
{
    fn extend<It: IntoIterator<Item = T>>(&mut self, iter: It) {
        self.table.extend(iter.into_iter().map(|v| (v, ())));
    }
}

impl<T, I, A, const N: usize> FromIterator<T> for HashSet<T, I, A, N>
where
    I: KeyInfo<T>,
    A: BucketAlloc + Default,
{
    fn from_iter<It: IntoIterator<Item = T>>(iter: It) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

pub struct Iter<'a, T, I> {
    inner: Keys<'a, T, (), I>,
}

impl<T, I> Clone for Iter<'_, T, I> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, T, I: KeyInfo<T>> Iterator for Iter<'a, T, I> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, I: KeyInfo<T>> ExactSizeIterator for Iter<'_, T, I> {}
impl<T, I: KeyInfo<T>> FusedIterator for Iter<'_, T, I> {}

pub struct IntoIter<T, I = DefaultKeyInfo, A = Global, const N: usize = 1>
where
    I: KeyInfo<T>,
    A: BucketAlloc,
{
    inner: iter::IntoIter<T, (), I, A, N>,
}

impl<T, I, A, const N: usize> Iterator for IntoIter<T, I, A, N>
where
    I: KeyInfo<T>,
    A: BucketAlloc,
{
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.inner.next().map(|(k, ())| k)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, I, A, const N: usize> ExactSizeIterator for IntoIter<T, I, A, N>
where
    I: KeyInfo<T>,
    A: BucketAlloc,
{
}

impl<T, I, A, const N: usize> FusedIterator for IntoIter<T, I, A, N>
where
    I: KeyInfo<T>,
    A: BucketAlloc,
{
}

impl<'a, T, I, A, const N: usize> IntoIterator for &'a HashSet<T, I, A, N>
where
    I: KeyInfo<T>,
    A: BucketAlloc,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T, I>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, I, A, const N: usize> IntoIterator for HashSet<T, I, A, N>
where
    I: KeyInfo<T>,
    A: BucketAlloc,
{
    type Item = T;
    type IntoIter = IntoIter<T, I, A, N>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_contains_remove() {
        let mut s: HashSet<i64> = HashSet::new();
        assert!(s.insert(10));
        assert!(!s.insert(10));
        assert!(s.insert(-4));
        assert_eq!(s.len(), 2);
        assert!(s.contains(&-4));
        assert!(!s.contains(&5));
        assert!(s.remove(&10));
        assert!(!s.remove(&10));
        assert_eq!(s.take(&-4), Some(-4));
        assert!(s.is_empty());
        assert_eq!(s.num_tombstones(), 0);
    }

    /// `get` returns the stored element, not the probe.
    #[test]
    fn get_returns_stored_element() {
        let mut s: HashSet<String> = HashSet::new();
        s.insert("alpha".to_string());
        let stored = s.get(&"alpha".to_string()).unwrap();
        assert_eq!(stored, "alpha");
        assert!(s.get(&"beta".to_string()).is_none());
    }

    #[test]
    fn retain_and_iterate() {
        let mut s: HashSet<u32> = (0..100).collect();
        s.retain(|v| v % 2 == 1);
        assert_eq!(s.len(), 50);
        assert_eq!(s.iter().len(), 50);
        let sum: u32 = s.iter().sum();
        assert_eq!(sum, (0..100).filter(|v| v % 2 == 1).sum());
        let mut all: Vec<u32> = s.into_iter().collect();
        all.sort_unstable();
        assert_eq!(all.first(), Some(&1));
        assert_eq!(all.last(), Some(&99));
    }

    #[test]
    fn equality_ignores_layout() {
        let a: HashSet<u8> = [1u8, 2, 3].into_iter().collect();
        let mut b: HashSet<u8> = HashSet::with_capacity(256);
        b.extend([3u8, 2, 1, 1]);
        assert_eq!(a, b);
        b.remove(&1);
        assert_ne!(a, b);
        assert_eq!(b.clone(), b);
    }

    #[test]
    fn inline_set_swap() {
        let mut a: HashSet<u16, DefaultKeyInfo, Global, 4> = HashSet::default();
        a.insert(1);
        a.insert(2);
        let mut b: HashSet<u16, DefaultKeyInfo, Global, 4> = HashSet::default();
        b.insert(9);
        a.swap(&mut b);
        assert!(a.contains(&9) && a.len() == 1);
        assert!(b.contains(&1) && b.contains(&2));
        assert_eq!(a.capacity(), 4);
    }
}
