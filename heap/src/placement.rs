//! Free-block placement search.
//!
//! A free block is a candidate for a request of `padded` bytes if its
//! payload matches exactly, or if it's large enough to be split into an
//! allocated part and a free remainder that can itself hold a header and
//! footer. The asymmetry (exact fit accepted with no split headroom, but a
//! non-exact fit requiring a *full* remainder) is intentional: a remainder
//! with less than `HEADER_SIZE + FOOTER_SIZE` bytes has nowhere to put its
//! own boundary tags.

use crate::algorithm::Algorithm;
use crate::block::{FOOTER_SIZE, HEADER_SIZE, decode_link, header, payload_size};

#[inline]
fn fits(payload: usize, padded: usize) -> bool {
    payload == padded || payload >= HEADER_SIZE + padded + FOOTER_SIZE
}

/// Search the free list for a block satisfying `padded` bytes under the
/// given `algorithm`, returning its header offset.
///
/// # Safety
/// `free_head` and `next_fit_tail` must be `None` or name valid free blocks
/// reachable from each other via consistent free-list links.
pub(crate) unsafe fn find_free_block(
    base: *const u8,
    free_head: Option<usize>,
    next_fit_tail: Option<usize>,
    algorithm: Algorithm,
    padded: usize,
) -> Option<usize> {
    match algorithm {
        Algorithm::FirstFit => unsafe { scan_from(base, free_head, padded) },
        Algorithm::BestFit => unsafe { best_fit(base, free_head, padded) },
        Algorithm::NextFit => unsafe { next_fit(base, free_head, next_fit_tail, padded) },
    }
}

/// Scan the free list starting at `start`, returning the first fitter.
///
/// # Safety
/// See [`find_free_block`].
unsafe fn scan_from(base: *const u8, start: Option<usize>, padded: usize) -> Option<usize> {
    let mut cursor = start;
    while let Some(offset) = cursor {
        let hdr = unsafe { &*header(base, offset) };
        if fits(payload_size(hdr.size), padded) {
            return Some(offset);
        }
        cursor = decode_link(hdr.next);
    }
    None
}

/// # Safety
/// See [`find_free_block`].
unsafe fn next_fit(
    base: *const u8,
    free_head: Option<usize>,
    next_fit_tail: Option<usize>,
    padded: usize,
) -> Option<usize> {
    let start = next_fit_tail.or(free_head);
    if let Some(found) = unsafe { scan_from(base, start, padded) } {
        return Some(found);
    }
    // Wrap around: resume at freeHead, stopping before `start`.
    let mut cursor = free_head;
    while let Some(offset) = cursor {
        if Some(offset) == start {
            break;
        }
        let hdr = unsafe { &*header(base, offset) };
        if fits(payload_size(hdr.size), padded) {
            return Some(offset);
        }
        cursor = decode_link(hdr.next);
    }
    None
}

/// # Safety
/// See [`find_free_block`].
unsafe fn best_fit(base: *const u8, free_head: Option<usize>, padded: usize) -> Option<usize> {
    let mut cursor = free_head;
    let mut best: Option<(usize, usize)> = None;
    while let Some(offset) = cursor {
        let hdr = unsafe { &*header(base, offset) };
        let payload = payload_size(hdr.size);
        if fits(payload, padded) && best.is_none_or(|(_, best_payload)| payload < best_payload) {
            best = Some((offset, payload));
        }
        cursor = decode_link(hdr.next);
    }
    best.map(|(offset, _)| offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{encode_link, header_mut};

    #[test]
    fn fits_accepts_exact_match_with_no_split_room() {
        assert!(fits(64, 64));
    }

    #[test]
    fn fits_rejects_undersized_block() {
        assert!(!fits(32, 64));
    }

    #[test]
    fn fits_rejects_block_with_insufficient_split_remainder() {
        // One byte short of room for a header + footer remainder.
        assert!(!fits(64 + HEADER_SIZE + FOOTER_SIZE - 8, 64));
    }

    #[test]
    fn fits_accepts_block_with_exactly_enough_split_remainder() {
        assert!(fits(64 + HEADER_SIZE + FOOTER_SIZE, 64));
    }

    /// Lay out free blocks of the given payload sizes back to back starting
    /// at offset 0, threaded into a free list in list order (`sizes[0]` is
    /// `free_head`). Returns each block's offset.
    fn build_free_list(region: &mut [u8], sizes: &[usize]) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(sizes.len());
        let mut offset = 0usize;
        for &payload in sizes {
            offsets.push(offset);
            offset += HEADER_SIZE + payload + FOOTER_SIZE;
        }
        let base = region.as_mut_ptr();
        for (i, (&offset, &payload)) in offsets.iter().zip(sizes).enumerate() {
            unsafe {
                let hdr = &mut *header_mut(base, offset);
                hdr.requested_size = 0;
                hdr.size = payload;
                hdr.prev = encode_link(if i == 0 { None } else { Some(offsets[i - 1]) });
                hdr.next = encode_link(offsets.get(i + 1).copied());
            }
        }
        offsets
    }

    #[test]
    fn first_fit_returns_first_fitting_block_in_list_order() {
        let mut region = vec![0u8; 4096];
        // off0 (payload 80) has room to split for a 32-byte request even
        // though off2's payload is an exact match; first-fit must still
        // prefer the earlier splittable block.
        let offsets = build_free_list(&mut region, &[80, 16, 32]);
        let base = region.as_ptr();
        let found = unsafe { find_free_block(base, Some(offsets[0]), None, Algorithm::FirstFit, 32) };
        assert_eq!(found, Some(offsets[0]), "first fit should prefer the earlier splittable block over a later exact match");
    }

    #[test]
    fn first_fit_returns_none_when_nothing_fits() {
        let mut region = vec![0u8; 4096];
        let offsets = build_free_list(&mut region, &[16, 24]);
        let base = region.as_ptr();
        let found = unsafe { find_free_block(base, Some(offsets[0]), None, Algorithm::FirstFit, 1024) };
        assert_eq!(found, None);
    }

    #[test]
    fn best_fit_returns_the_smallest_fitting_block() {
        let mut region = vec![0u8; 4096];
        let offsets = build_free_list(&mut region, &[128, 16, 64]);
        let base = region.as_ptr();
        let found = unsafe { find_free_block(base, Some(offsets[0]), None, Algorithm::BestFit, 16) };
        assert_eq!(found, Some(offsets[1]));
    }

    #[test]
    fn best_fit_breaks_ties_in_favor_of_the_earlier_encountered_block() {
        let mut region = vec![0u8; 4096];
        let offsets = build_free_list(&mut region, &[32, 32]);
        let base = region.as_ptr();
        let found = unsafe { find_free_block(base, Some(offsets[0]), None, Algorithm::BestFit, 32) };
        assert_eq!(found, Some(offsets[0]));
    }

    #[test]
    fn next_fit_resumes_at_the_cursor_not_the_free_head() {
        let mut region = vec![0u8; 4096];
        let offsets = build_free_list(&mut region, &[64, 64, 64, 64]);
        let base = region.as_ptr();
        // Every block is an exact fit; next-fit must still return the one
        // at the cursor rather than falling back to free_head.
        let found = unsafe {
            find_free_block(base, Some(offsets[0]), Some(offsets[2]), Algorithm::NextFit, 64)
        };
        assert_eq!(found, Some(offsets[2]), "next fit should return the fitter at the cursor, not free_head");
    }

    #[test]
    fn next_fit_wraps_to_free_head_when_nothing_fits_from_the_cursor_onward() {
        let mut region = vec![0u8; 4096];
        let offsets = build_free_list(&mut region, &[8, 16, 8, 8]);
        let base = region.as_ptr();
        // Cursor sits at offsets[2] (payload 8, too small for 16 bytes);
        // nothing from there to the list end fits, so the search must wrap
        // and find offsets[1]'s exact match before reaching back to the
        // cursor.
        let found = unsafe {
            find_free_block(base, Some(offsets[0]), Some(offsets[2]), Algorithm::NextFit, 16)
        };
        assert_eq!(found, Some(offsets[1]));
    }

    #[test]
    fn next_fit_with_no_cursor_behaves_like_first_fit() {
        let mut region = vec![0u8; 4096];
        let offsets = build_free_list(&mut region, &[80, 16, 32]);
        let base = region.as_ptr();
        let found = unsafe { find_free_block(base, Some(offsets[0]), None, Algorithm::NextFit, 32) };
        assert_eq!(found, Some(offsets[0]));
    }
}
