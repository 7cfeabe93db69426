//! Allocator hook for heap bucket storage.

use core::ptr::NonNull;
use std::alloc::{alloc, dealloc, Layout};

/// Source of raw memory for bucket arrays.
///
/// Bucket blocks are requested with an alignment of at least one cache line
/// (64 bytes), so implementations must honour over-aligned layouts.
///
/// # Safety
///
/// A pointer returned by `allocate` must be valid for reads and writes of
/// `layout.size()` bytes, aligned to `layout.align()`, and must stay valid
/// until it is passed back to `deallocate` with the same layout.
pub unsafe trait BucketAlloc {
    /// Returns `None` when memory is exhausted.
    ///
    /// # Safety
    ///
    /// `layout` has a non-zero size.
    unsafe fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// # Safety
    ///
    /// `ptr` was returned by `allocate` on this allocator with `layout`.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// The process-wide global allocator.
#[derive(Copy, Clone, Debug, Default)]
pub struct Global;

unsafe impl BucketAlloc for Global {
    #[inline]
    unsafe fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        NonNull::new(alloc(layout))
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        dealloc(ptr.as_ptr(), layout)
    }
}
