//! Read-only views of an allocator's heap.

use core::fmt;

use crate::allocator::Allocator;
use crate::block::Block;
use crate::brk::ProgramBreak;
use crate::codec::{ALIGNMENT, MIN_BLOCK_SIZE, untag};
use crate::error::Corruption;

/// Snapshot of one block's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  pub addr: usize,
  pub size: usize,
  pub allocated: bool,
  pub header: usize,
  pub footer: usize,
  /// Free-list links, only for free blocks.
  pub links: Option<(usize, usize)>,
}

impl BlockInfo {
  /// # Safety
  ///
  /// `block` must be a block with a sane header.
  unsafe fn read(block: Block) -> Self {
    unsafe {
      let header = block.header();
      let (size, allocated) = untag(header);

      let links = if allocated {
        None
      } else {
        Some((block.next_free().addr() as usize, block.prev_free().addr() as usize))
      };

      Self {
        addr: block.addr() as usize,
        size,
        allocated,
        header,
        footer: block.footer(),
        links,
      }
    }
  }
}

/// Walks the heap from start to end.
pub struct Blocks<'a, B: ProgramBreak> {
  allocator: &'a Allocator<B>,
  next: *mut u8,
}

impl<B: ProgramBreak> Iterator for Blocks<'_, B> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<BlockInfo> {
    let end = self.allocator.heap_end();

    if self.next.is_null() || self.next >= end {
      return None;
    }

    let block = unsafe { Block::at(self.next) };
    let (size, _) = untag(unsafe { block.header() });

    // Stop on any header that cannot start a block.
    if size < MIN_BLOCK_SIZE
      || size % ALIGNMENT != 0
      || size > end as usize - self.next as usize
    {
      self.next = end;
      return None;
    }

    self.next = unsafe { self.next.add(size) };

    Some(unsafe { BlockInfo::read(block) })
  }
}

/// Text report of every block and the free list.
pub struct HeapDump<'a, B: ProgramBreak> {
  allocator: &'a Allocator<B>,
}

fn write_block(
  f: &mut fmt::Formatter<'_>,
  info: &BlockInfo,
) -> fmt::Result {
  writeln!(f, "------------------------------")?;
  writeln!(f, "Address: {:#x}", info.addr)?;
  writeln!(f, "Status: {}", if info.allocated { "Allocated" } else { "Free" })?;
  writeln!(f, "Block size: {}", info.size)?;
  writeln!(f, "Header: {}", info.header)?;

  match info.links {
    Some((next, prev)) => {
      writeln!(f, "Next: {next:#x}")?;
      writeln!(f, "Previous: {prev:#x}")?;
    }
    None => writeln!(f, "Payload: ...")?,
  }

  writeln!(f, "Footer: {}", info.footer)
}

impl<B: ProgramBreak> fmt::Display for HeapDump<'_, B> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    let allocator = self.allocator;

    if allocator.heap_start().is_null() {
      return writeln!(f, "HEAP is NULL");
    }

    writeln!(f, "============ HEAP ============")?;
    writeln!(f, "START: {:?}", allocator.heap_start())?;
    writeln!(f, "END: {:?}", allocator.heap_end())?;
    writeln!(f, "HEAP SIZE: {}", allocator.heap_size())?;

    for info in allocator.blocks() {
      write_block(f, &info)?;
    }

    writeln!(f, "==============================")?;

    if !allocator.free_list_handle().is_empty() {
      writeln!(f, "============ FREE LIST ============")?;

      for info in allocator.free_list() {
        write_block(f, &info)?;
      }
    }

    Ok(())
  }
}

impl<B: ProgramBreak> Allocator<B> {
  /// Every committed block, in address order.
  pub fn blocks(&self) -> Blocks<'_, B> {
    Blocks {
      allocator: self,
      next: self.heap_start(),
    }
  }

  /// Every free block, in free-list order starting at the head.
  pub fn free_list(&self) -> impl Iterator<Item = BlockInfo> + '_ {
    unsafe { self.free_list_handle().iter() }
      .take(self.free_blocks())
      .map(|block| unsafe { BlockInfo::read(block) })
  }

  /// Human-readable report of the heap, for debugging.
  pub fn dump(&self) -> HeapDump<'_, B> {
    HeapDump { allocator: self }
  }

  /// Checks every structural invariant of the heap and the free list.
  pub fn audit(&self) -> Result<(), Corruption> {
    let start = self.heap_start() as usize;
    let end = self.heap_end() as usize;

    let mut cursor = start;
    let mut previous_free: Option<usize> = None;
    let mut free = Vec::new();

    while cursor < end {
      let block = unsafe { Block::at(cursor as *mut u8) };
      let header = unsafe { block.header() };
      let (size, allocated) = untag(header);

      if size < MIN_BLOCK_SIZE || size % ALIGNMENT != 0 {
        return Err(Corruption::BadSize { addr: cursor, size });
      }

      if size > end - cursor {
        return Err(Corruption::Overrun { addr: cursor });
      }

      let footer = unsafe { block.footer() };
      if header != footer {
        return Err(Corruption::TagMismatch {
          addr: cursor,
          header,
          footer,
        });
      }

      if allocated {
        previous_free = None;
      } else {
        if let Some(left) = previous_free {
          return Err(Corruption::AdjacentFree { left, right: cursor });
        }

        previous_free = Some(cursor);
        free.push(cursor);
      }

      cursor += size;
    }

    let listed = self.free_blocks();
    let mut seen = 0;

    for block in unsafe { self.free_list_handle().iter() }.take(listed + 1) {
      let addr = block.addr() as usize;

      if free.binary_search(&addr).is_err() {
        return Err(Corruption::ForeignEntry { addr });
      }

      if unsafe { block.next_free().prev_free() } != block {
        return Err(Corruption::BrokenLink { addr });
      }

      seen += 1;
    }

    if seen != listed || listed != free.len() {
      return Err(Corruption::CountMismatch {
        listed: seen,
        free: free.len(),
      });
    }

    Ok(())
  }
}
