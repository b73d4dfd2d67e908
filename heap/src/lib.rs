//! A boundary-tag heap allocator over a single fixed-size arena.
//!
//! ```text
//! ┌──────────────────────────────── arena ─────────────────────────────────┐
//! │ Header │        payload        │ Footer │ Header │  payload  │ Footer  │
//! │  alloc │////////////////////// │  alloc │  free  │ - - - - - │  free   │
//! └────────────────────────────────┴────────┴────────┴───────────┴─────────┘
//!                                              ▲                     │
//!                                              └──── free list ──────┘
//! ```
//!
//! Every block carries its size in both a leading header and a trailing
//! footer, which lets [`heap::Heap::free`] find and merge physically
//! adjacent blocks in either direction without walking the free list.
//! Free blocks are additionally threaded onto a doubly-linked free list
//! (see [`free_list`]) that [`placement`] searches under one of three
//! policies selected by [`Algorithm`].
//!
//! The arena itself lives in a single owned [`Box<[u8]>`](Box); there is no
//! global allocator state, so more than one [`heap::Heap`] can exist at once,
//! each independent of the others.

mod algorithm;
mod block;
mod error;
mod free_list;
mod heap;
mod placement;

pub use algorithm::Algorithm;
pub use error::HeapError;
pub use heap::{ALIGNMENT, ARENA_CAPACITY, Heap};
