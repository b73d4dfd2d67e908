//! Throughput and fragmentation benchmark, ported from the reference
//! allocator's own `memperf` driver: a fixed number of random
//! allocate/free/reallocate operations against a bounded pool of live
//! pointers, run once per placement policy.

use std::ptr;
use std::time::Instant;

use boundary_heap::{Algorithm, Heap};
use rand::Rng;
use rand::rngs::ThreadRng;

const NUM_OPS: usize = 1 << 20;
const NUM_PTRS: usize = 1 << 12;
const MIN_SIZE: usize = 1;
const MAX_SIZE: usize = 256;

#[derive(Clone, Copy)]
enum Op {
    Malloc,
    Free,
    Realloc,
}

fn choose_op(rng: &mut ThreadRng, have_live_pointer: bool) -> Op {
    if !have_live_pointer {
        return Op::Malloc;
    }
    if rng.gen_bool(0.5) { Op::Free } else { Op::Realloc }
}

fn run(algorithm: Algorithm) {
    let mut heap = Heap::init(algorithm).expect("arena capacity is large enough for a single block");
    let mut pointers: Vec<*mut u8> = vec![ptr::null_mut(); NUM_PTRS];
    let mut rng = rand::thread_rng();

    let start = Instant::now();
    let mut completed = 0usize;
    while completed < NUM_OPS {
        let slot = rng.gen_range(0..NUM_PTRS);
        let have_live_pointer = !pointers[slot].is_null();
        let succeeded = match choose_op(&mut rng, have_live_pointer) {
            Op::Malloc => {
                let size = rng.gen_range(MIN_SIZE..=MAX_SIZE);
                let p = heap.allocate(size);
                let ok = !p.is_null();
                if ok {
                    pointers[slot] = p;
                }
                ok
            }
            Op::Free => {
                heap.free(pointers[slot]);
                pointers[slot] = ptr::null_mut();
                true
            }
            Op::Realloc => {
                let size = rng.gen_range(MIN_SIZE..=MAX_SIZE);
                let new_ptr = heap.reallocate(pointers[slot], size);
                let ok = !new_ptr.is_null();
                if ok {
                    pointers[slot] = new_ptr;
                }
                ok
            }
        };
        if succeeded {
            completed += 1;
        }
    }
    let elapsed = start.elapsed();
    let utilization = heap.utilization();

    for p in pointers.into_iter().filter(|p| !p.is_null()) {
        heap.free(p);
    }

    let ops_per_sec = NUM_OPS as f64 / elapsed.as_secs_f64();
    println!(
        "{algorithm:?}: {:>10} ops in {:>8.3}s ({:>12.0} ops/s), utilization before teardown = {:.4}",
        NUM_OPS,
        elapsed.as_secs_f64(),
        ops_per_sec,
        utilization
    );
}

fn main() {
    env_logger::init();
    for algorithm in [Algorithm::FirstFit, Algorithm::NextFit, Algorithm::BestFit] {
        run(algorithm);
    }
}
