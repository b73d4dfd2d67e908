//! The explicit, doubly-linked free list threaded through free blocks.
//!
//! The list is unordered by address and grows at the head (LIFO): a block
//! that was just freed becomes the new `free_head` rather than being
//! inserted in sorted position. This mirrors the reference allocator this
//! crate is descended from and keeps every insertion O(1).

use crate::block::{decode_link, encode_link, header_mut};

/// Push the block at `offset` onto the head of the free list.
///
/// # Safety
/// `offset` must name a block whose header is writable and not currently on
/// the free list.
pub(crate) unsafe fn push_front(base: *mut u8, free_head: &mut Option<usize>, offset: usize) {
    unsafe {
        let hdr = &mut *header_mut(base, offset);
        hdr.prev = encode_link(None);
        hdr.next = encode_link(*free_head);
        if let Some(old_head) = *free_head {
            (*header_mut(base, old_head)).prev = encode_link(Some(offset));
        }
    }
    *free_head = Some(offset);
}

/// Splice the block at `offset` out of the free list using the `prev`/`next`
/// links currently stored in its own header.
///
/// # Safety
/// `offset`'s header must currently hold valid free-list links consistent
/// with `free_head`.
pub(crate) unsafe fn unlink(base: *mut u8, free_head: &mut Option<usize>, offset: usize) {
    let (prev, next) = unsafe {
        let hdr = &*header_mut(base, offset).cast_const();
        (decode_link(hdr.prev), decode_link(hdr.next))
    };
    unsafe { splice(base, free_head, prev, next) };
}

/// Reconnect `prev` and `next` to each other, as if the block between them
/// had been removed. Does not touch the removed block's own header.
///
/// # Safety
/// `prev` and `next`, when present, must be valid header offsets.
pub(crate) unsafe fn splice(base: *mut u8, free_head: &mut Option<usize>, prev: Option<usize>, next: Option<usize>) {
    match prev {
        Some(p) => unsafe { (*header_mut(base, p)).next = encode_link(next) },
        None => *free_head = next,
    }
    if let Some(n) = next {
        unsafe { (*header_mut(base, n)).prev = encode_link(prev) };
    }
}

/// Reconnect `prev` and `next` to `new_offset`, as if `new_offset` now
/// occupies the free-list slot formerly held by whatever sat between them.
///
/// Used when splitting or growing a block in place: the remainder inherits
/// the chosen block's position in the list without a separate
/// remove-then-insert pass.
///
/// # Safety
/// `prev`, `next`, and `new_offset` must be valid header offsets; `new_offset`
/// must not already appear elsewhere in the free list.
pub(crate) unsafe fn replace(
    base: *mut u8,
    free_head: &mut Option<usize>,
    prev: Option<usize>,
    next: Option<usize>,
    new_offset: usize,
) {
    match prev {
        Some(p) => unsafe { (*header_mut(base, p)).next = encode_link(Some(new_offset)) },
        None => *free_head = Some(new_offset),
    }
    if let Some(n) = next {
        unsafe { (*header_mut(base, n)).prev = encode_link(Some(new_offset)) };
    }
}
