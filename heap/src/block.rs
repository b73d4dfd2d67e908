//! Boundary-tag block layout.
//!
//! Every block living in the arena is a `Header`, followed by a payload of
//! some multiple of 8 bytes, followed by a `Footer`. The header and footer
//! both carry the payload size with the low bit repurposed as the
//! allocated flag, which is what lets [`next_block_offset`] and
//! [`prev_block_offset`] walk the block chain in either direction in O(1)
//! without consulting the free list.
//!
//! All block positions are tracked as byte offsets from the arena's base
//! pointer rather than as raw pointers: the arena is the only memory this
//! allocator ever touches, so an offset is simpler to reason about than a
//! pointer and sidesteps provenance questions entirely.

use core::mem::size_of;

/// Sentinel offset used to encode `None` in an on-disk link field.
///
/// No real block offset can reach this value: the arena is bounded by
/// [`crate::heap::ARENA_CAPACITY`], many orders of magnitude below `usize::MAX`.
pub(crate) const NONE: usize = usize::MAX;

/// Low bit of a block's `size` word: set when the block is allocated.
pub(crate) const ALLOC_BIT: usize = 1;

/// The boundary-tag header prefixing every block.
#[repr(C)]
pub(crate) struct Header {
    /// Bytes originally requested by the caller. Zero for free blocks.
    pub(crate) requested_size: usize,
    /// Payload size with the allocated flag folded into the low bit.
    pub(crate) size: usize,
    /// Free-list successor, or [`NONE`]. Meaningless while allocated.
    pub(crate) next: usize,
    /// Free-list predecessor, or [`NONE`]. Meaningless while allocated.
    pub(crate) prev: usize,
}

/// The boundary-tag footer suffixing every block.
#[repr(C)]
pub(crate) struct Footer {
    /// Mirrors the owning header's `size` word.
    pub(crate) size: usize,
}

pub(crate) const HEADER_SIZE: usize = size_of::<Header>();
pub(crate) const FOOTER_SIZE: usize = size_of::<Footer>();

/// Strip the allocated flag, leaving the payload size.
#[inline]
pub(crate) const fn payload_size(size_word: usize) -> usize {
    size_word & !ALLOC_BIT
}

/// Whether a raw `size` word denotes an allocated block.
#[inline]
pub(crate) const fn is_allocated(size_word: usize) -> bool {
    size_word & ALLOC_BIT != 0
}

/// Round `n` up to the next multiple of 8.
#[inline]
pub(crate) const fn round_up_8(n: usize) -> usize {
    (n + 7) & !7
}

/// Encode a free-list link for on-disk storage.
#[inline]
pub(crate) const fn encode_link(link: Option<usize>) -> usize {
    match link {
        Some(offset) => offset,
        None => NONE,
    }
}

/// Decode an on-disk free-list link.
#[inline]
pub(crate) const fn decode_link(raw: usize) -> Option<usize> {
    if raw == NONE { None } else { Some(raw) }
}

/// Byte offset of the footer belonging to the header at `header_offset` with
/// the given `payload` size.
#[inline]
pub(crate) const fn footer_offset(header_offset: usize, payload: usize) -> usize {
    header_offset + HEADER_SIZE + payload
}

/// Raw pointer to the header at `offset` bytes from `base`.
///
/// # Safety
/// `[offset, offset + HEADER_SIZE)` must lie within the arena and `offset`
/// must be 8-byte aligned.
#[inline]
pub(crate) unsafe fn header(base: *const u8, offset: usize) -> *const Header {
    unsafe { base.add(offset).cast::<Header>() }
}

/// Mutable counterpart of [`header`].
///
/// # Safety
/// Same as [`header`]; additionally, no other reference to this header may
/// be live for the duration of the returned pointer's use.
#[inline]
pub(crate) unsafe fn header_mut(base: *mut u8, offset: usize) -> *mut Header {
    unsafe { base.add(offset).cast::<Header>() }
}

/// Raw pointer to the footer belonging to the header at `header_offset`.
///
/// # Safety
/// `header_offset + HEADER_SIZE + payload + FOOTER_SIZE` must lie within the
/// arena.
#[inline]
pub(crate) unsafe fn footer_mut(base: *mut u8, header_offset: usize, payload: usize) -> *mut Footer {
    unsafe { base.add(footer_offset(header_offset, payload)).cast::<Footer>() }
}

/// Offset of the payload immediately following the header at `offset`.
#[inline]
pub(crate) const fn payload_offset(header_offset: usize) -> usize {
    header_offset + HEADER_SIZE
}

/// Offset of the physical next block's header, or `None` if the current
/// block is the last one in the arena.
///
/// # Safety
/// `header_offset` must be the offset of a valid header within an arena of
/// `capacity` bytes rooted at `base`.
pub(crate) unsafe fn next_block_offset(base: *const u8, capacity: usize, header_offset: usize) -> Option<usize> {
    let payload = unsafe { payload_size((*header(base, header_offset)).size) };
    let next = footer_offset(header_offset, payload) + FOOTER_SIZE;
    if next >= capacity { None } else { Some(next) }
}

/// Offset of the physical previous block's header, or `None` if
/// `header_offset` names the first block in the arena.
///
/// # Safety
/// `header_offset` must be the offset of a valid header, and every block
/// between the arena base and `header_offset` must carry consistent boundary
/// tags (invariant 3 of the data model).
pub(crate) unsafe fn prev_block_offset(base: *const u8, header_offset: usize) -> Option<usize> {
    if header_offset < FOOTER_SIZE {
        return None;
    }
    let prev_footer_offset = header_offset - FOOTER_SIZE;
    let prev_payload = unsafe { payload_size((*base.add(prev_footer_offset).cast::<Footer>()).size) };
    Some(prev_footer_offset - HEADER_SIZE - prev_payload)
}
