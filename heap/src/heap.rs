//! The allocator itself: a single arena of boundary-tagged blocks threaded
//! onto an explicit free list, searched by one of three placement policies.

use core::ptr;

use crate::algorithm::Algorithm;
use crate::block::{
    ALLOC_BIT, FOOTER_SIZE, HEADER_SIZE, decode_link, encode_link, footer_mut, footer_offset, header,
    header_mut, is_allocated, next_block_offset, payload_offset, payload_size, prev_block_offset, round_up_8,
};
use crate::error::{Diagnostic, HeapError};
use crate::free_list;
use crate::placement::find_free_block;

/// Fixed arena capacity, in bytes.
pub const ARENA_CAPACITY: usize = 1 << 20;

/// Alignment guaranteed for every payload and for the arena itself.
pub const ALIGNMENT: usize = 8;

/// Byte pattern the arena is filled with at `init`, to make uninitialized
/// reads through a stale pointer easy to spot in a debugger.
const SENTINEL_BYTE: u8 = 0xFF;

/// A single fixed-size arena managed as a sequence of boundary-tagged
/// blocks, with free blocks additionally threaded onto a doubly-linked free
/// list.
///
/// `Heap` owns its backing storage outright (a boxed byte slice obtained
/// from the host's global allocator at [`Heap::init`]); there is no shared
/// or global allocator state anywhere in this crate. Operating two `Heap`
/// values concurrently from different threads is unsound — nothing here is
/// synchronized — but operating several sequentially-owned `Heap`s, one per
/// thread, is entirely fine.
pub struct Heap {
    region: Box<[u8]>,
    algorithm: Algorithm,
    free_head: Option<usize>,
    next_fit_tail: Option<usize>,
}

impl Heap {
    /// Acquire a fresh [`ARENA_CAPACITY`]-byte arena from the host and
    /// imprint a single free block spanning it.
    ///
    /// # Errors
    /// Returns [`HeapError::RegionTooSmall`] if [`ARENA_CAPACITY`] is ever
    /// configured below one header plus one footer. With the shipped
    /// constant this branch is unreachable.
    pub fn init(algorithm: Algorithm) -> Result<Self, HeapError> {
        let minimum = HEADER_SIZE + FOOTER_SIZE;
        if ARENA_CAPACITY < minimum {
            return Err(HeapError::RegionTooSmall { actual: ARENA_CAPACITY, minimum });
        }

        let mut region = vec![SENTINEL_BYTE; ARENA_CAPACITY].into_boxed_slice();
        let base = region.as_mut_ptr();
        let payload = ARENA_CAPACITY - minimum;
        unsafe {
            let hdr = &mut *header_mut(base, 0);
            hdr.requested_size = 0;
            hdr.size = payload;
            hdr.next = encode_link(None);
            hdr.prev = encode_link(None);
            (*footer_mut(base, 0, payload)).size = payload;
        }

        log::debug!("heap initialized: capacity={ARENA_CAPACITY} algorithm={algorithm:?}");
        Ok(Self { region, algorithm, free_head: Some(0), next_fit_tail: Some(0) })
    }

    /// Allocate `size` bytes, returning the payload pointer or null.
    ///
    /// Returns null silently for `size == 0` and for any request the
    /// configured placement policy cannot satisfy.
    pub fn allocate(&mut self, size: usize) -> *mut u8 {
        if size == 0 {
            return ptr::null_mut();
        }
        let padded = round_up_8(size);
        let base = self.region.as_mut_ptr();

        let Some(offset) =
            (unsafe { find_free_block(base.cast_const(), self.free_head, self.next_fit_tail, self.algorithm, padded) })
        else {
            return ptr::null_mut();
        };

        unsafe {
            let old_payload;
            let old_prev;
            let old_next;
            {
                let hdr = &mut *header_mut(base, offset);
                old_payload = payload_size(hdr.size);
                old_prev = decode_link(hdr.prev);
                old_next = decode_link(hdr.next);

                hdr.requested_size = size;
                hdr.size = padded | ALLOC_BIT;
                hdr.next = encode_link(None);
                hdr.prev = encode_link(None);
            }
            (*footer_mut(base, offset, padded)).size = padded | ALLOC_BIT;

            if padded == old_payload {
                free_list::splice(base, &mut self.free_head, old_prev, old_next);
                self.next_fit_tail = self.free_head;
            } else {
                let remainder_offset = footer_offset(offset, padded) + FOOTER_SIZE;
                let remainder_payload = old_payload - HEADER_SIZE - FOOTER_SIZE - padded;
                {
                    let rhdr = &mut *header_mut(base, remainder_offset);
                    rhdr.requested_size = 0;
                    rhdr.size = remainder_payload;
                    rhdr.next = encode_link(old_next);
                    rhdr.prev = encode_link(old_prev);
                }
                (*footer_mut(base, remainder_offset, remainder_payload)).size = remainder_payload;

                free_list::replace(base, &mut self.free_head, old_prev, old_next, remainder_offset);
                self.next_fit_tail = Some(remainder_offset);
            }

            base.add(payload_offset(offset))
        }
    }

    /// Free a previously allocated pointer.
    ///
    /// A null pointer is a no-op. A pointer outside the arena emits a
    /// diagnostic and keeps looking anyway; since nothing in the arena can
    /// own an out-of-bounds address, that futile search always ends in a
    /// second diagnostic ("not a malloced address") before returning. A
    /// pointer that doesn't name the start of any in-bounds block, or a
    /// pointer to an already-free block, each emit one diagnostic and leave
    /// the arena untouched.
    pub fn free(&mut self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }

        let base = self.region.as_mut_ptr();
        let arena_start = base as usize;
        let arena_end = arena_start + self.region.len();
        let addr = ptr as usize;
        if addr < arena_start || addr >= arena_end {
            Diagnostic::NotAHeapPointer.emit();
        }

        let Some(mut offset) = self.find_owning_block(addr) else {
            Diagnostic::NotAMallocedAddress.emit();
            return;
        };

        unsafe {
            if !is_allocated((*header(base.cast_const(), offset)).size) {
                Diagnostic::DoubleFree.emit();
                return;
            }

            let payload = {
                let hdr = &mut *header_mut(base, offset);
                hdr.requested_size = 0;
                hdr.size &= !ALLOC_BIT;
                hdr.size
            };
            (*footer_mut(base, offset, payload)).size = payload;

            if let Some(next_offset) = next_block_offset(base.cast_const(), self.region.len(), offset) {
                let next_size = (*header(base.cast_const(), next_offset)).size;
                if !is_allocated(next_size) {
                    if self.next_fit_tail == Some(next_offset) {
                        self.next_fit_tail = Some(offset);
                    }
                    free_list::unlink(base, &mut self.free_head, next_offset);

                    let merged = payload_size((*header(base.cast_const(), offset)).size) + payload_size(next_size) + HEADER_SIZE + FOOTER_SIZE;
                    (*header_mut(base, offset)).size = merged;
                    (*footer_mut(base, offset, merged)).size = merged;
                }
            }

            if let Some(prev_offset) = prev_block_offset(base.cast_const(), offset) {
                let prev_size = (*header(base.cast_const(), prev_offset)).size;
                if !is_allocated(prev_size) {
                    if self.next_fit_tail == Some(offset) || self.next_fit_tail == Some(prev_offset) {
                        self.next_fit_tail = Some(prev_offset);
                    }
                    free_list::unlink(base, &mut self.free_head, prev_offset);

                    let cur_payload = payload_size((*header(base.cast_const(), offset)).size);
                    let merged = payload_size(prev_size) + cur_payload + HEADER_SIZE + FOOTER_SIZE;
                    (*header_mut(base, prev_offset)).size = merged;
                    (*footer_mut(base, prev_offset, merged)).size = merged;
                    offset = prev_offset;
                }
            }

            free_list::push_front(base, &mut self.free_head, offset);
        }
    }

    /// Grow or shrink a previously allocated pointer.
    ///
    /// `(null, 0)` returns null. `(null, n)` delegates to [`Heap::allocate`].
    /// `(p, 0)` delegates to [`Heap::free`] and returns null. Otherwise the
    /// block is grown in place if it already fits or can absorb its free
    /// physical neighbor; failing that, a new block is allocated, the
    /// originally-requested prefix is copied over, and the old block is
    /// freed.
    pub fn reallocate(&mut self, ptr: *mut u8, size: usize) -> *mut u8 {
        if ptr.is_null() {
            return if size == 0 { ptr::null_mut() } else { self.allocate(size) };
        }
        if size == 0 {
            self.free(ptr);
            return ptr::null_mut();
        }

        let base = self.region.as_mut_ptr();
        let offset = (ptr as usize) - (base as usize) - HEADER_SIZE;
        let padded = round_up_8(size);

        unsafe {
            let (current_payload, current_requested) = {
                let hdr = &*header(base.cast_const(), offset);
                (payload_size(hdr.size), hdr.requested_size)
            };

            if current_payload >= padded {
                (*header_mut(base, offset)).requested_size = size;
                return ptr;
            }

            if let Some(next_offset) = next_block_offset(base.cast_const(), self.region.len(), offset) {
                let next_hdr_snapshot = {
                    let hdr = &*header(base.cast_const(), next_offset);
                    (hdr.size, decode_link(hdr.prev), decode_link(hdr.next))
                };
                let (next_size, next_prev, next_next) = next_hdr_snapshot;
                let next_payload = payload_size(next_size);

                if !is_allocated(next_size) && current_payload + next_payload >= padded {
                    if self.next_fit_tail == Some(next_offset) {
                        self.next_fit_tail = next_next.or(self.free_head);
                    }

                    {
                        let hdr = &mut *header_mut(base, offset);
                        hdr.requested_size = size;
                        hdr.size = padded | ALLOC_BIT;
                    }
                    (*footer_mut(base, offset, padded)).size = padded | ALLOC_BIT;

                    let remainder_offset = footer_offset(offset, padded) + FOOTER_SIZE;
                    let remainder_payload = current_payload + next_payload - padded;
                    {
                        let rhdr = &mut *header_mut(base, remainder_offset);
                        rhdr.requested_size = 0;
                        rhdr.size = remainder_payload;
                        rhdr.next = encode_link(next_next);
                        rhdr.prev = encode_link(next_prev);
                    }
                    (*footer_mut(base, remainder_offset, remainder_payload)).size = remainder_payload;

                    free_list::replace(base, &mut self.free_head, next_prev, next_next, remainder_offset);
                    return ptr;
                }
            }

            let new_ptr = self.allocate(size);
            if new_ptr.is_null() {
                return ptr::null_mut();
            }
            let copy_len = current_requested.min(size);
            ptr::copy_nonoverlapping(ptr, new_ptr, copy_len);
            self.free(ptr);
            new_ptr
        }
    }

    /// Ratio of bytes requested by still-live allocations to bytes spanned
    /// by the arena up to (and including) the last free block encountered
    /// during a left-to-right walk.
    ///
    /// Returns `1.0` if no free block has been seen yet (an arena that is
    /// either empty or entirely allocated from its very first byte).
    #[must_use]
    pub fn utilization(&self) -> f64 {
        let base = self.region.as_ptr();
        let capacity = self.region.len();

        let mut cursor = Some(0usize);
        let mut last_free_offset = 0usize;
        let mut space_requested: usize = 0;
        while let Some(offset) = cursor {
            unsafe {
                let hdr = &*header(base, offset);
                if is_allocated(hdr.size) {
                    space_requested += hdr.requested_size;
                } else {
                    last_free_offset = offset;
                }
                cursor = next_block_offset(base, capacity, offset);
            }
        }

        let space_used = last_free_offset;
        if space_used == 0 { 1.0 } else { space_requested as f64 / space_used as f64 }
    }

    /// Release the arena back to the host. Equivalent to dropping this
    /// value; spelled out so callers can match the six-operation surface
    /// this crate implements.
    pub fn teardown(self) {}

    /// Locate the block whose payload starts at `addr`, walking the arena
    /// from its base. Returns its header offset.
    fn find_owning_block(&self, addr: usize) -> Option<usize> {
        let base = self.region.as_ptr();
        let arena_start = base as usize;
        let capacity = self.region.len();
        let mut cursor = Some(0usize);
        while let Some(offset) = cursor {
            if arena_start + payload_offset(offset) == addr {
                return Some(offset);
            }
            cursor = unsafe { next_block_offset(base, capacity, offset) };
        }
        None
    }
}

impl Drop for Heap {
    fn drop(&mut self) {
        log::debug!("tearing down heap (capacity={})", self.region.len());
    }
}
