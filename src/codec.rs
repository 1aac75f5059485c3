//! Block metadata encoding.
//!
//! Every block starts and ends with one word holding its total size with
//! the allocation bit packed into bit 0:
//!
//! ```text
//!   ┌──────────┬───────────────────────────────┬──────────┐
//!   │  header  │            payload            │  footer  │
//!   │ size | a │  (next, prev links when free) │ size | a │
//!   └──────────┴───────────────────────────────┴──────────┘
//!   ▲          ▲
//!   block      pointer handed to the caller
//! ```

use core::mem;

use crate::align_to;

/// Size of a header or footer word.
pub const WORD_SIZE: usize = mem::size_of::<usize>();

/// Alignment of every payload pointer handed out.
pub const ALIGNMENT: usize = 8;

/// Smallest payload, large enough to hold the two free-list links.
pub const MIN_PAYLOAD: usize = 2 * WORD_SIZE;

/// Smallest block: header, two links and footer.
pub const MIN_BLOCK_SIZE: usize = 4 * WORD_SIZE;

/// Largest block the allocator will try to carve, bounded by the signed
/// pointer-difference range.
pub const MAX_BLOCK_SIZE: usize = isize::MAX as usize & !(ALIGNMENT - 1);

const ALLOCATED: usize = 1;

/// Computes the total block size needed to serve `requested` payload bytes.
///
/// Returns `None` when the block would not fit in [`MAX_BLOCK_SIZE`].
pub const fn adjust_size(requested: usize) -> Option<usize> {
  let payload = if requested < MIN_PAYLOAD {
    MIN_PAYLOAD
  } else {
    requested
  };

  if payload > MAX_BLOCK_SIZE - 2 * WORD_SIZE {
    return None;
  }

  Some(2 * WORD_SIZE + align_to!(payload, ALIGNMENT))
}

/// Packs the allocation bit into a block size.
#[inline]
pub const fn tag(
  size: usize,
  allocated: bool,
) -> usize {
  debug_assert!((size & ALLOCATED) == 0);
  if allocated { size | ALLOCATED } else { size }
}

/// Splits a header or footer word into size and allocation bit.
#[inline]
pub const fn untag(word: usize) -> (usize, bool) {
  (word & !ALLOCATED, (word & ALLOCATED) != 0)
}
