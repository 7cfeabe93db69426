//! Iterators over a [`HashTable`].
//!
//! Borrowing iterators walk the bucket slice in index order and skip EMPTY
//! and TOMBSTONE buckets. Order is unspecified: it depends on hashes and
//! capacity.

use crate::alloc::{BucketAlloc, Global};
use crate::hash_table::HashTable;
use crate::key_info::{DefaultKeyInfo, KeyInfo};
use crate::raw::Item;
use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::slice;

pub struct Iter<'a, K, V, I> {
    items: slice::Iter<'a, Item<K, V>>,
    remaining: usize,
    _info: PhantomData<fn() -> I>,
}

impl<'a, K, V, I> Iter<'a, K, V, I> {
    pub(crate) fn new(items: &'a [Item<K, V>], len: usize) -> Self {
        Iter {
            items: items.iter(),
            remaining: len,
            _info: PhantomData,
        }
    }
}

impl<K, V, I> Clone for Iter<'_, K, V, I> {
    fn clone(&self) -> Self {
        Iter {
            items: self.items.clone(),
            remaining: self.remaining,
            _info: PhantomData,
        }
    }
}

impl<'a, K, V, I: KeyInfo<K>> Iterator for Iter<'a, K, V, I> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        for item in self.items.by_ref() {
            if I::is_valid(&item.key) {
                self.remaining -= 1;
                return Some((&item.key, unsafe { item.value.assume_init_ref() }));
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, I: KeyInfo<K>> ExactSizeIterator for Iter<'_, K, V, I> {}
impl<K, V, I: KeyInfo<K>> FusedIterator for Iter<'_, K, V, I> {}

impl<K, V, I> fmt::Debug for Iter<'_, K, V, I>
where
    K: fmt::Debug,
    V: fmt::Debug,
    I: KeyInfo<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

pub struct IterMut<'a, K, V, I> {
    items: slice::IterMut<'a, Item<K, V>>,
    remaining: usize,
    _info: PhantomData<fn() -> I>,
}

impl<'a, K, V, I> IterMut<'a, K, V, I> {
    pub(crate) fn new(items: &'a mut [Item<K, V>], len: usize) -> Self {
        IterMut {
            items: items.iter_mut(),
            remaining: len,
            _info: PhantomData,
        }
    }
}

impl<'a, K, V, I: KeyInfo<K>> Iterator for IterMut<'a, K, V, I> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        for item in self.items.by_ref() {
            if I::is_valid(&item.key) {
                self.remaining -= 1;
                let Item { key, value } = item;
                return Some((&*key, unsafe { value.assume_init_mut() }));
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, I: KeyInfo<K>> ExactSizeIterator for IterMut<'_, K, V, I> {}
impl<K, V, I: KeyInfo<K>> FusedIterator for IterMut<'_, K, V, I> {}

pub struct Keys<'a, K, V, I> {
    inner: Iter<'a, K, V, I>,
}

impl<'a, K, V, I> Keys<'a, K, V, I> {
    pub(crate) fn new(inner: Iter<'a, K, V, I>) -> Self {
        Keys { inner }
    }
}

impl<K, V, I> Clone for Keys<'_, K, V, I> {
    fn clone(&self) -> Self {
        Keys {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V, I: KeyInfo<K>> Iterator for Keys<'a, K, V, I> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, I: KeyInfo<K>> ExactSizeIterator for Keys<'_, K, V, I> {}
impl<K, V, I: KeyInfo<K>> FusedIterator for Keys<'_, K, V, I> {}

pub struct Values<'a, K, V, I> {
    inner: Iter<'a, K, V, I>,
}

impl<'a, K, V, I> Values<'a, K, V, I> {
    pub(crate) fn new(inner: Iter<'a, K, V, I>) -> Self {
        Values { inner }
    }
}

impl<K, V, I> Clone for Values<'_, K, V, I> {
    fn clone(&self) -> Self {
        Values {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V, I: KeyInfo<K>> Iterator for Values<'a, K, V, I> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, I: KeyInfo<K>> ExactSizeIterator for Values<'_, K, V, I> {}
impl<K, V, I: KeyInfo<K>> FusedIterator for Values<'_, K, V, I> {}

pub struct ValuesMut<'a, K, V, I> {
    inner: IterMut<'a, K, V, I>,
}

impl<'a, K, V, I> ValuesMut<'a, K, V, I> {
    pub(crate) fn new(inner: IterMut<'a, K, V, I>) -> Self {
        ValuesMut { inner }
    }
}

impl<'a, K, V, I: KeyInfo<K>> Iterator for ValuesMut<'a, K, V, I> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, I: KeyInfo<K>> ExactSizeIterator for ValuesMut<'_, K, V, I> {}
impl<K, V, I: KeyInfo<K>> FusedIterator for ValuesMut<'_, K, V, I> {}

/// Owning iterator. Entries not yet yielded are dropped with the iterator.
pub struct IntoIter<K, V, I = DefaultKeyInfo, A = Global, const N: usize = 1>
where
    I: KeyInfo<K>,
    A: BucketAlloc,
{
    table: HashTable<K, V, I, A, N>,
    cursor: usize,
}

impl<K, V, I, A, const N: usize> IntoIter<K, V, I, A, N>
where
    I: KeyInfo<K>,
    A: BucketAlloc,
{
    pub(crate) fn new(table: HashTable<K, V, I, A, N>) -> Self {
        IntoIter { table, cursor: 0 }
    }
}

impl<K, V, I, A, const N: usize> Iterator for IntoIter<K, V, I, A, N>
where
    I: KeyInfo<K>,
    A: BucketAlloc,
{
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<(K, V)> {
        self.table.take_next(&mut self.cursor)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.table.len();
        (len, Some(len))
    }
}

impl<K, V, I, A, const N: usize> ExactSizeIterator for IntoIter<K, V, I, A, N>
where
    I: KeyInfo<K>,
    A: BucketAlloc,
{
}

impl<K, V, I, A, const N: usize> FusedIterator for IntoIter<K, V, I, A, N>
where
    I: KeyInfo<K>,
    A: BucketAlloc,
{
}
