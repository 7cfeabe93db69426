//! Error types.

use std::alloc::Layout;
use thiserror::Error;

/// Failure to grow the bucket array.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TryReserveError {
    /// The requested bucket count does not fit in `usize` once rounded up,
    /// or its byte size overflows.
    #[error("requested bucket count exceeds the addressable capacity")]
    CapacityOverflow,

    /// The allocator returned no memory.
    #[error("memory allocation of {} bytes (align {}) failed", .layout.size(), .layout.align())]
    AllocError { layout: Layout },
}

/// Rejected `insert`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum InsertError {
    /// The key is already present; the stored value is left untouched.
    #[error("key already present")]
    DuplicateKey,
    /// The key equals one of the reserved EMPTY/TOMBSTONE sentinels.
    #[error("key is a reserved sentinel value")]
    ReservedKey,
}
