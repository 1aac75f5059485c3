//! # brkalloc - A Best-Fit Boundary-Tag Allocator
//!
//! This crate provides a `malloc`-style allocator that manages one
//! contiguous heap obtained from the program break (`sbrk(2)`), keeps freed
//! blocks in an explicit free list and merges neighbours on free.
//!
//! ## Overview
//!
//! ```text
//!   Heap managed by brkalloc:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                         HEAP MEMORY                                  │
//!   │                                                                      │
//!   │   ┌──────┬────────────┬──────┬────────────────┬──────┐               │
//!   │   │  A1  │    free    │  A2  │      free      │  A3  │               │
//!   │   └──────┴────────────┴──────┴────────────────┴──────┘               │
//!   │   ▲             ▲                     ▲              ▲               │
//!   │   │             └──── free list ──────┘              │               │
//!   │ heap start                                     Program Break         │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   Allocation: smallest free block that fits (best fit), else grow the break.
//!   Free: merge with free neighbours; give the tail back to the OS.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   brkalloc
//!   ├── align      - Alignment macros (align!, align_to!)
//!   ├── allocator  - Allocator: allocate, free, resize, zero_allocate
//!   ├── block      - Block handle: header, footer and link offsets
//!   ├── brk        - ProgramBreak trait, Sbrk and Arena
//!   ├── coalesce   - Boundary-tag merging
//!   ├── codec      - Size adjustment and tag encoding
//!   ├── config     - Runtime configuration
//!   ├── error      - Error types
//!   ├── free_list  - Circular doubly-linked free list
//!   ├── global     - BrkAlloc, a locked process-wide instance
//!   ├── heap       - Heap start/end bookkeeping
//!   └── inspect    - Heap walks, audit and dump
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use brkalloc::Allocator;
//!
//! // A private 64 KiB heap; `Allocator::sbrk()` uses the real program break.
//! let mut allocator = Allocator::arena(64 * 1024);
//!
//! let ptr = allocator.allocate(100).unwrap().as_ptr();
//!
//! unsafe {
//!     ptr.write_bytes(0xAB, 100);
//!     allocator.free(ptr).unwrap();
//! }
//!
//! // The block sat at the end of the heap, so the heap shrank back.
//! assert_eq!(allocator.heap_size(), 0);
//! ```
//!
//! ## Block Layout
//!
//! ```text
//!   Allocated block:
//!   ┌──────────────┬────────────────────────────────┬──────────────┐
//!   │    header    │            payload             │    footer    │
//!   │  size | 1    │   >= requested bytes, 8-aligned│  size | 1    │
//!   └──────────────┴────────────────────────────────┴──────────────┘
//!                  ▲
//!                  └── Pointer returned to user
//!
//!   Free block:
//!   ┌──────────────┬──────────┬──────────┬──────────┬──────────────┐
//!   │    header    │   next   │   prev   │  unused  │    footer    │
//!   │  size | 0    │          │          │          │  size | 0    │
//!   └──────────────┴──────────┴──────────┴──────────┴──────────────┘
//! ```
//!
//! The footer duplicates the header so the block on the left of any block
//! can be found in constant time when freeing.
//!
//! ## Limitations
//!
//! - **Single-threaded engine**: [`Allocator`] takes `&mut self`; use
//!   [`BrkAlloc`] to share one heap between threads
//! - **8-byte alignment**: stricter layouts are refused
//! - **Tail-only release**: memory goes back to the OS only from the heap end
//! - **Unix-only**: [`Sbrk`] requires `libc` and `sbrk`
//!
//! ## Safety
//!
//! Freeing and resizing take raw pointers and are `unsafe`. Pointers that
//! are outside the heap or already free are detected and reported as
//! [`Error`]s, or abort the process under [`ViolationPolicy::Abort`].

pub mod align;
mod allocator;
mod block;
mod brk;
mod coalesce;
pub mod codec;
mod config;
mod error;
mod free_list;
mod global;
mod heap;
mod inspect;

pub use allocator::Allocator;
pub use brk::{Arena, ProgramBreak, Sbrk};
pub use config::{Config, ViolationPolicy};
pub use error::{BreakError, Corruption, Error};
pub use global::BrkAlloc;
pub use inspect::{BlockInfo, Blocks, HeapDump};
