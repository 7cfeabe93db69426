//! Bucket storage: one item per bucket, held either inline in the table
//! object or in a single cache-line aligned heap block.
//!
//! Every bucket's key slot is always initialised (a sentinel or a live
//! key). The value slot is initialised exactly when the key is valid; this
//! module never looks at values, the table drops them before releasing
//! storage.

use crate::alloc::BucketAlloc;
use crate::error::TryReserveError;
use crate::key_info::KeyInfo;
use core::mem::{self, MaybeUninit};
use core::ptr::{self, NonNull};
use core::slice;
use std::alloc::Layout;

/// Smallest heap bucket count.
pub(crate) const MIN_BUCKETS: usize = 16;

/// Alignment floor for heap blocks, one cache line.
pub(crate) const CACHE_LINE: usize = 64;

pub(crate) struct Item<K, V> {
    pub(crate) key: K,
    pub(crate) value: MaybeUninit<V>,
}

impl<K, V> Item<K, V> {
    #[inline]
    pub(crate) fn vacant(key: K) -> Self {
        Item {
            key,
            value: MaybeUninit::uninit(),
        }
    }
}

/// Layout of a heap block holding `buckets` items.
pub(crate) fn bucket_layout<K, V>(buckets: usize) -> Result<Layout, TryReserveError> {
    let align = mem::align_of::<Item<K, V>>().max(CACHE_LINE);
    let size = mem::size_of::<Item<K, V>>()
        .checked_mul(buckets)
        .and_then(|s| s.checked_add(align - 1))
        .ok_or(TryReserveError::CapacityOverflow)?
        & !(align - 1);
    Layout::from_size_align(size.max(align), align).map_err(|_| TryReserveError::CapacityOverflow)
}

pub(crate) enum Storage<K, V, const N: usize> {
    Inline([Item<K, V>; N]),
    Heap {
        ptr: NonNull<Item<K, V>>,
        layout: Layout,
    },
}

impl<K, V, const N: usize> Storage<K, V, N> {
    pub(crate) fn inline<I: KeyInfo<K>>() -> Self {
        Storage::Inline(core::array::from_fn(|_| Item::vacant(I::empty())))
    }

    /// Allocates `buckets` items with every key set to EMPTY.
    pub(crate) fn heap<I, A>(buckets: usize, alloc: &A) -> Result<Self, TryReserveError>
    where
        I: KeyInfo<K>,
        A: BucketAlloc,
    {
        debug_assert!(buckets.is_power_of_two());
        let layout = bucket_layout::<K, V>(buckets)?;
        let raw = unsafe { alloc.allocate(layout) }.ok_or(TryReserveError::AllocError { layout })?;
        let ptr = raw.cast::<Item<K, V>>();

        // Count of constructed keys; on unwind they are dropped and the
        // block is released.
        let mut built = scopeguard::guard(0usize, move |built| unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(ptr.as_ptr(), built));
            alloc.deallocate(raw, layout);
        });
        while *built < buckets {
            unsafe { ptr.as_ptr().add(*built).write(Item::vacant(I::empty())) };
            *built += 1;
        }
        scopeguard::ScopeGuard::into_inner(built);

        Ok(Storage::Heap { ptr, layout })
    }

    #[inline]
    pub(crate) fn is_inline(&self) -> bool {
        matches!(self, Storage::Inline(_))
    }

    /// `len` is the table's bucket count; it equals `N` for inline storage.
    #[inline]
    pub(crate) fn buckets(&self, len: usize) -> &[Item<K, V>] {
        match self {
            Storage::Inline(items) => &items[..],
            Storage::Heap { ptr, .. } => unsafe { slice::from_raw_parts(ptr.as_ptr(), len) },
        }
    }

    #[inline]
    pub(crate) fn buckets_mut(&mut self, len: usize) -> &mut [Item<K, V>] {
        match self {
            Storage::Inline(items) => &mut items[..],
            Storage::Heap { ptr, .. } => unsafe {
                slice::from_raw_parts_mut(ptr.as_ptr(), len)
            },
        }
    }

    /// Drops every key and releases a heap block. Values must already have
    /// been dropped or moved out.
    ///
    /// # Safety
    ///
    /// `len` is the bucket count this storage was created with, and the
    /// storage is neither used nor dropped afterwards; owners keep it in a
    /// `ManuallyDrop`.
    pub(crate) unsafe fn free<A: BucketAlloc>(&mut self, len: usize, alloc: &A) {
        match self {
            Storage::Inline(items) => {
                ptr::drop_in_place(items.as_mut_slice());
            }
            Storage::Heap { ptr, layout } => {
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(ptr.as_ptr(), len));
                alloc.deallocate(ptr.cast(), *layout);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::Global;
    use crate::key_info::DefaultKeyInfo;
    use core::mem::ManuallyDrop;

    #[test]
    fn layout_is_cache_line_aligned_and_padded() {
        let l = bucket_layout::<u32, u32>(16).unwrap();
        assert_eq!(l.align(), CACHE_LINE);
        assert_eq!(l.size(), 128);
        let l = bucket_layout::<u8, ()>(16).unwrap();
        assert_eq!(l.size(), 64, "16 one-byte items padded to a cache line");
    }

    #[test]
    fn layout_overflow_is_reported() {
        assert_eq!(
            bucket_layout::<u64, u64>(usize::MAX / 2),
            Err(TryReserveError::CapacityOverflow)
        );
    }

    #[test]
    fn heap_storage_starts_all_empty() {
        let mut s: ManuallyDrop<Storage<String, String, 1>> = ManuallyDrop::new(
            Storage::heap::<DefaultKeyInfo, _>(MIN_BUCKETS, &Global).unwrap(),
        );
        assert!(!s.is_inline());
        let items = s.buckets(MIN_BUCKETS);
        assert_eq!(items.len(), MIN_BUCKETS);
        assert!(items.iter().all(|it| it.key.is_empty()));
        let addr = items.as_ptr() as usize;
        assert_eq!(addr % CACHE_LINE, 0);
        unsafe { s.free(MIN_BUCKETS, &Global) };
    }

    #[test]
    fn inline_storage_has_n_empty_buckets() {
        let mut s: ManuallyDrop<Storage<u32, u32, 4>> =
            ManuallyDrop::new(Storage::inline::<DefaultKeyInfo>());
        assert!(s.is_inline());
        assert!(s.buckets(4).iter().all(|it| it.key == u32::MAX));
        unsafe { s.free(4, &Global) };
    }
}
