//! Error and diagnostic types.
//!
//! [`HeapError`] is the one genuine structural fault in this allocator: a
//! backing region too small to hold a single block. Everything else a
//! caller can do wrong — freeing a bad pointer, double-freeing, running out
//! of space — is advisory and reported through [`Diagnostic`] instead,
//! matching the propagation policy of the system this crate implements
//! (operations never abort; misuse is logged, not raised).

/// Fatal construction error: the supplied arena cannot hold a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeapError {
    /// The requested arena capacity is smaller than one header plus one footer.
    #[error("arena of {actual} bytes is too small to hold a single block (minimum {minimum} bytes)")]
    RegionTooSmall {
        /// The capacity that was requested.
        actual: usize,
        /// The smallest capacity that could hold a single block.
        minimum: usize,
    },
}

/// An advisory condition reported by `free` without changing how the
/// operation completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub(crate) enum Diagnostic {
    /// The pointer handed to `free` does not lie within the arena.
    #[error("error: not a heap pointer")]
    NotAHeapPointer,
    /// The pointer names a block that is already free.
    #[error("error: double free")]
    DoubleFree,
    /// No block in the arena starts at the given pointer.
    #[error("error: not a malloced address")]
    NotAMallocedAddress,
}

impl Diagnostic {
    /// Emit this diagnostic through the logging facade at error level.
    pub(crate) fn emit(self) {
        log::error!("{self}");
    }
}
