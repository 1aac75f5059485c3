//! Boundary-tag merging of a freshly freed block with its neighbours.
//!
//! Both helpers expect the block's own tags to already read "free".

use log::debug;

use crate::block::Block;
use crate::codec::untag;
use crate::free_list::FreeList;

/// Merges `block` with the block to its right when that one is free.
///
/// The right neighbour leaves the free list and the enlarged block is
/// inserted in its place.
///
/// # Safety
///
/// `block` must be free, unlisted, and must not end at the heap end.
pub unsafe fn coalesce_right(
  list: &mut FreeList,
  block: Block,
) -> (Block, bool) {
  unsafe {
    let right = block.right();
    let (right_size, allocated) = untag(right.header());

    if allocated {
      return (block, false);
    }

    let size = block.size() + right_size;

    debug!("coalesce {block:?} with right {right:?} into {size} bytes");

    list.remove(right);
    block.set_tags(size, false);
    list.insert(block);

    (block, true)
  }
}

/// Merges `block` into the block to its left when that one is free.
///
/// The left neighbour keeps its place in the free list, so the merged block
/// is already listed when this returns `true`.
///
/// # Safety
///
/// `block` must be free, unlisted, and must not start at the heap start.
pub unsafe fn coalesce_left(block: Block) -> (Block, bool) {
  unsafe {
    let (left_size, allocated) = untag(block.left_footer());

    if allocated {
      return (block, false);
    }

    let left = block.left();
    let size = left_size + block.size();

    debug!("coalesce {block:?} with left {left:?} into {size} bytes");

    left.set_tags(size, false);

    (left, true)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::{MIN_BLOCK_SIZE, WORD_SIZE};

  /// Lays out blocks back to back; `true` marks an allocated block.
  fn layout(blocks: &[(usize, bool)]) -> (Vec<usize>, Vec<Block>) {
    let total: usize = blocks.iter().map(|(size, _)| size).sum();
    let mut words = vec![0usize; total / WORD_SIZE];
    let base = words.as_mut_ptr().cast::<u8>();

    let mut offset = 0;
    let mut handles = Vec::new();

    for &(size, allocated) in blocks {
      unsafe {
        let block = Block::at(base.add(offset));
        block.set_tags(size, allocated);
        handles.push(block);
      }
      offset += size;
    }

    (words, handles)
  }

  #[test]
  fn test_right_merge() {
    let (_words, blocks) = layout(&[(MIN_BLOCK_SIZE, false), (64, false), (MIN_BLOCK_SIZE, true)]);
    let mut list = FreeList::new();

    unsafe {
      list.insert(blocks[1]);

      let (merged, coalesced) = coalesce_right(&mut list, blocks[0]);

      assert!(coalesced);
      assert_eq!(merged, blocks[0]);
      assert_eq!(merged.size(), MIN_BLOCK_SIZE + 64);
      assert_eq!(merged.header(), merged.footer());
      assert_eq!(merged.right(), blocks[2]);
      assert_eq!(list.len(), 1);
      assert_eq!(list.head(), Some(merged));
    }
  }

  #[test]
  fn test_right_neighbour_allocated() {
    let (_words, blocks) = layout(&[(MIN_BLOCK_SIZE, false), (64, true)]);
    let mut list = FreeList::new();

    unsafe {
      let (block, coalesced) = coalesce_right(&mut list, blocks[0]);

      assert!(!coalesced);
      assert_eq!(block.size(), MIN_BLOCK_SIZE);
      assert!(list.is_empty());
    }
  }

  #[test]
  fn test_left_merge_moves_identity() {
    let (_words, blocks) = layout(&[(MIN_BLOCK_SIZE, true), (64, false), (48, false)]);
    let mut list = FreeList::new();

    unsafe {
      list.insert(blocks[1]);

      let (merged, coalesced) = coalesce_left(blocks[2]);

      assert!(coalesced);
      assert_eq!(merged, blocks[1]);
      assert_eq!(merged.size(), 112);
      assert_eq!(merged.header(), merged.footer());
      assert_eq!(list.head(), Some(merged));
      assert_eq!(merged.left(), blocks[0]);
    }
  }

  #[test]
  fn test_left_neighbour_allocated() {
    let (_words, blocks) = layout(&[(64, true), (MIN_BLOCK_SIZE, false)]);

    unsafe {
      let (block, coalesced) = coalesce_left(blocks[1]);

      assert!(!coalesced);
      assert_eq!(block, blocks[1]);
      assert!(blocks[0].is_allocated());
    }
  }
}
