//! Black-box tests against the public API only: no access to block layout,
//! just the six operations a caller actually has.

use std::ptr;

use boundary_heap::{Algorithm, Heap};

const ALGORITHMS: [Algorithm; 3] = [Algorithm::FirstFit, Algorithm::NextFit, Algorithm::BestFit];

#[test]
fn every_algorithm_initializes_at_full_utilization() {
    for algorithm in ALGORITHMS {
        let heap = Heap::init(algorithm).unwrap();
        assert_eq!(heap.utilization(), 1.0);
    }
}

#[test]
fn allocated_memory_is_writable_and_distinct() {
    for algorithm in ALGORITHMS {
        let mut heap = Heap::init(algorithm).unwrap();
        let a = heap.allocate(128);
        let b = heap.allocate(128);
        assert!(!a.is_null());
        assert!(!b.is_null());
        assert_ne!(a, b);
        unsafe {
            ptr::write_bytes(a, 0xAA, 128);
            ptr::write_bytes(b, 0xBB, 128);
            assert_eq!(*a, 0xAA);
            assert_eq!(*b, 0xBB);
        }
    }
}

#[test]
fn freeing_every_live_allocation_restores_full_utilization() {
    for algorithm in ALGORITHMS {
        let mut heap = Heap::init(algorithm).unwrap();
        let pointers: Vec<_> = (0..16).map(|i| heap.allocate(8 * (i + 1))).collect();
        assert!(pointers.iter().all(|p| !p.is_null()));
        for p in pointers {
            heap.free(p);
        }
        assert_eq!(heap.utilization(), 1.0);
    }
}

#[test]
fn an_arena_that_cannot_satisfy_a_request_returns_null() {
    let mut heap = Heap::init(Algorithm::FirstFit).unwrap();
    assert!(heap.allocate(usize::MAX / 2).is_null());
}

#[test]
fn realloc_preserves_content_across_shrink_then_grow() {
    let mut heap = Heap::init(Algorithm::BestFit).unwrap();
    let p = heap.allocate(200);
    unsafe {
        for i in 0..200u8 {
            *p.add(i as usize) = i;
        }
    }
    let p = heap.reallocate(p, 50);
    unsafe {
        for i in 0..50u8 {
            assert_eq!(*p.add(i as usize), i);
        }
    }
    let blocker = heap.allocate(16);
    let p = heap.reallocate(p, 4096);
    unsafe {
        for i in 0..50u8 {
            assert_eq!(*p.add(i as usize), i);
        }
    }
    heap.free(blocker);
    heap.free(p);
    assert_eq!(heap.utilization(), 1.0);
}

#[test]
fn double_free_and_bogus_free_do_not_abort_the_process() {
    let mut heap = Heap::init(Algorithm::FirstFit).unwrap();
    let p = heap.allocate(16);
    heap.free(p);
    heap.free(p);
    heap.free(ptr::null_mut());
    heap.free(0x1usize as *mut u8);
    let q = heap.allocate(16);
    assert!(!q.is_null());
}

#[test]
fn fragmentation_lowers_utilization_until_coalesced_away() {
    let mut heap = Heap::init(Algorithm::FirstFit).unwrap();
    let a = heap.allocate(64);
    let b = heap.allocate(64);
    let c = heap.allocate(64);
    heap.free(b);
    let mid_utilization = heap.utilization();
    assert!(mid_utilization < 1.0);
    heap.free(a);
    heap.free(c);
    assert_eq!(heap.utilization(), 1.0);
}

#[test]
fn a_long_mixed_workload_never_returns_overlapping_live_allocations() {
    struct Lcg(u64);
    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self.0.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            self.0 >> 33
        }
        fn range(&mut self, lo: usize, hi: usize) -> usize {
            lo + (self.next() as usize % (hi - lo))
        }
    }

    for algorithm in ALGORITHMS {
        let mut heap = Heap::init(algorithm).unwrap();
        let mut rng = Lcg(0xFACADE);
        let mut live: Vec<(*mut u8, usize)> = Vec::new();

        for _ in 0..2000 {
            if live.len() < 32 && rng.next() % 3 != 0 {
                let size = rng.range(1, 513);
                let p = heap.allocate(size);
                if !p.is_null() {
                    live.push((p, size));
                }
            } else if let Some(idx) = (!live.is_empty()).then(|| rng.range(0, live.len())) {
                let (p, _) = live.swap_remove(idx);
                heap.free(p);
            }
        }

        for (i, &(p, size)) in live.iter().enumerate() {
            for (j, &(q, other_size)) in live.iter().enumerate() {
                if i == j {
                    continue;
                }
                let p_range = (p as usize)..(p as usize + size);
                let q_range = (q as usize)..(q as usize + other_size);
                assert!(
                    p_range.end <= q_range.start || q_range.end <= p_range.start,
                    "live allocations overlap under {algorithm:?}"
                );
            }
        }

        for (p, _) in live {
            heap.free(p);
        }
        assert_eq!(heap.utilization(), 1.0);
    }
}
