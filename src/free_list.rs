use log::trace;

use crate::block::Block;

/// Circular doubly-linked list threaded through the payload of free blocks.
///
/// The list owns no memory: its nodes are the free blocks themselves, and it
/// keeps no particular order. New blocks go in front of the head, between
/// the head and the tail.
///
/// ```text
///        ┌────────────────────────────────────────────┐
///        ▼                                            │
///   ┌─────────┐ next ┌─────────┐ next ┌─────────┐ next │
///   │  head   │─────►│    B    │─────►│  tail   │──────┘
///   └─────────┘◄─────└─────────┘◄─────└─────────┘
///        │      prev              prev      ▲
///        └──────────────────────────────────┘ prev
/// ```
#[derive(Debug, Default)]
pub struct FreeList {
  head: Option<Block>,
  len: usize,
}

impl FreeList {
  pub const fn new() -> Self {
    Self { head: None, len: 0 }
  }

  #[cfg(test)]
  pub fn head(&self) -> Option<Block> {
    self.head
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.head.is_none()
  }

  /// Links `block` in as the new head.
  ///
  /// # Safety
  ///
  /// `block` must be a free block with room for two links and must not
  /// already be in the list.
  pub unsafe fn insert(
    &mut self,
    block: Block,
  ) {
    trace!("free list insert {block:?}");

    unsafe {
      match self.head {
        None => {
          block.set_next_free(block);
          block.set_prev_free(block);
        }
        Some(head) => {
          let tail = head.prev_free();

          block.set_next_free(head);
          block.set_prev_free(tail);
          tail.set_next_free(block);
          head.set_prev_free(block);
        }
      }
    }

    self.head = Some(block);
    self.len += 1;
  }

  /// Unlinks `block`.
  ///
  /// # Safety
  ///
  /// `block` must currently be in the list.
  pub unsafe fn remove(
    &mut self,
    block: Block,
  ) {
    trace!("free list remove {block:?}");

    let (next, prev) = unsafe { (block.next_free(), block.prev_free()) };

    if next == block {
      self.head = None;
    } else {
      if self.head == Some(block) {
        self.head = Some(next);
      }

      unsafe {
        prev.set_next_free(next);
        next.set_prev_free(prev);
      }
    }

    self.len -= 1;
  }

  /// Smallest free block of at least `size` bytes, or `None`.
  ///
  /// Scans the list once starting at the head, stopping early only on an
  /// exact fit; among equal sizes the first one met wins. The block is left
  /// in the list.
  ///
  /// # Safety
  ///
  /// Every listed block must be a valid free block.
  pub unsafe fn find_best_fit(
    &self,
    size: usize,
  ) -> Option<Block> {
    let mut best: Option<(Block, usize)> = None;

    for block in unsafe { self.iter() } {
      let candidate = unsafe { block.size() };

      if candidate < size {
        continue;
      }

      match best {
        Some((_, best_size)) if best_size <= candidate => {}
        _ => best = Some((block, candidate)),
      }

      if candidate == size {
        break;
      }
    }

    best.map(|(block, _)| block)
  }

  /// Walks the list once, starting at the head.
  ///
  /// # Safety
  ///
  /// The list must not be modified while the iterator is alive.
  pub unsafe fn iter(&self) -> Iter {
    Iter {
      head: self.head,
      next: self.head,
    }
  }
}

pub struct Iter {
  head: Option<Block>,
  next: Option<Block>,
}

impl Iterator for Iter {
  type Item = Block;

  fn next(&mut self) -> Option<Block> {
    let current = self.next?;
    let following = unsafe { current.next_free() };

    self.next = if Some(following) == self.head {
      None
    } else {
      Some(following)
    };

    Some(current)
  }
}
