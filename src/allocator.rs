use core::cmp;
use core::ptr::{self, NonNull};

use log::{error, trace, warn};

use crate::block::Block;
use crate::brk::{Arena, ProgramBreak, Sbrk};
use crate::codec::{self, ALIGNMENT, MIN_BLOCK_SIZE};
use crate::coalesce::{coalesce_left, coalesce_right};
use crate::config::{Config, ViolationPolicy};
use crate::error::Error;
use crate::free_list::FreeList;
use crate::heap::HeapRegion;

/// Best-fit, boundary-tag allocator over a single growable heap.
///
/// ```text
///   heap start                                              heap end
///   ▼                                                              ▼
///   ┌──────────┬───────────────┬──────────┬──────────────┬─────────┐
///   │ A (used) │   B (free)    │ C (used) │   D (free)   │ E (used)│
///   └──────────┴───────────────┴──────────┴──────────────┴─────────┘
///                     ▲                          ▲
///                     └──────── free list ───────┘
/// ```
///
/// Allocation reuses the smallest free block that fits, splitting off the
/// tail when it is large enough to stand alone, and grows the heap
/// otherwise. Freeing merges the block with free neighbours and gives the
/// memory back to the break when it ends up at the heap end.
pub struct Allocator<B: ProgramBreak> {
  heap: HeapRegion<B>,
  free: FreeList,
  config: Config,
}

// The heap is only reachable through the allocator, so moving the allocator
// moves exclusive access to it.
unsafe impl<B: ProgramBreak + Send> Send for Allocator<B> {}

impl Allocator<Sbrk> {
  /// An allocator over the process program break.
  pub const fn sbrk() -> Self {
    Self::new(Sbrk)
  }
}

impl Allocator<Arena> {
  /// An allocator over a private arena of `capacity` bytes.
  pub fn arena(capacity: usize) -> Self {
    Self::new(Arena::new(capacity))
  }
}

impl<B: ProgramBreak> Allocator<B> {
  pub const fn new(brk: B) -> Self {
    Self::with_config(brk, Config::new())
  }

  pub const fn with_config(
    brk: B,
    config: Config,
  ) -> Self {
    Self {
      heap: HeapRegion::new(brk),
      free: FreeList::new(),
      config,
    }
  }

  pub fn config(&self) -> Config {
    self.config
  }

  /// The break this allocator draws memory from.
  pub fn program_break(&self) -> &B {
    self.heap.program_break()
  }

  pub(crate) fn free_list_handle(&self) -> &FreeList {
    &self.free
  }

  /// First managed byte, or null before the first allocation.
  pub fn heap_start(&self) -> *mut u8 {
    self.heap.start()
  }

  /// One past the last managed byte, or null before the first allocation.
  pub fn heap_end(&self) -> *mut u8 {
    self.heap.end()
  }

  /// Bytes currently taken from the program break.
  pub fn heap_size(&self) -> usize {
    self.heap.len()
  }

  /// Number of blocks waiting in the free list.
  pub fn free_blocks(&self) -> usize {
    self.free.len()
  }

  /// Allocates at least `size` bytes, 8-byte aligned and uninitialized.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, Error> {
    self.heap.ensure_initialized()?;

    if size == 0 {
      return Err(Error::ZeroSize);
    }

    let mut total = codec::adjust_size(size).ok_or(Error::TooLarge { requested: size })?;

    let block = match unsafe { self.free.find_best_fit(total) } {
      Some(block) => unsafe {
        self.free.remove(block);

        let remaining = block.size() - total;

        if remaining >= MIN_BLOCK_SIZE {
          let rest = Block::at(block.addr().add(total));
          rest.set_tags(remaining, false);
          self.free.insert(rest);

          trace!("split {block:?}: {total} bytes used, {remaining} bytes left at {rest:?}");
        } else {
          total = block.size();
        }

        block
      },
      None => unsafe { Block::at(self.heap.grow(total)?) },
    };

    unsafe { block.set_tags(total, true) };

    trace!("allocated {size} bytes in {block:?} ({total} bytes)");

    Ok(block.payload())
  }

  /// Returns a block to the allocator.
  ///
  /// A null `ptr` is ignored. Pointers outside the heap and blocks that are
  /// already free are rejected according to [`Config::on_violation`].
  ///
  /// # Safety
  ///
  /// `ptr` must be null or a pointer handed out by this allocator; the
  /// block must not be used afterwards.
  pub unsafe fn free(
    &mut self,
    ptr: *mut u8,
  ) -> Result<(), Error> {
    if ptr.is_null() {
      return Ok(());
    }

    let block = self.live_block(ptr)?;

    unsafe { self.release(block) };

    Ok(())
  }

  /// Moves a block to a new allocation of `size` bytes.
  ///
  /// A null `ptr` behaves like [`allocate`](Self::allocate); a zero `size`
  /// frees `ptr` and returns `None`. Otherwise the contents are copied up to
  /// the smaller of the old payload and `size`. If the new allocation fails
  /// the old block is left untouched.
  ///
  /// # Safety
  ///
  /// Same contract as [`free`](Self::free).
  pub unsafe fn resize(
    &mut self,
    ptr: *mut u8,
    size: usize,
  ) -> Result<Option<NonNull<u8>>, Error> {
    if ptr.is_null() {
      return self.allocate(size).map(Some);
    }

    if size == 0 {
      unsafe { self.free(ptr)? };
      return Ok(None);
    }

    let old = self.live_block(ptr)?;
    let capacity = unsafe { old.payload_size() };

    let new = self.allocate(size)?;

    unsafe {
      ptr::copy_nonoverlapping(ptr, new.as_ptr(), cmp::min(size, capacity));
      self.release(old);
    }

    Ok(Some(new))
  }

  /// Allocates `count * size` zeroed bytes.
  pub fn zero_allocate(
    &mut self,
    count: usize,
    size: usize,
  ) -> Result<NonNull<u8>, Error> {
    let total = count.checked_mul(size).ok_or(Error::TooLarge { requested: usize::MAX })?;

    let payload = self.allocate(total)?;

    unsafe { Block::from_payload(payload.as_ptr()).zero_payload(total) };

    Ok(payload)
  }

  /// Usable bytes behind a live allocation.
  ///
  /// # Safety
  ///
  /// `ptr` must have been handed out by this allocator.
  pub unsafe fn payload_size(
    &self,
    ptr: *mut u8,
  ) -> Result<usize, Error> {
    let block = self.live_block(ptr)?;

    Ok(unsafe { block.payload_size() })
  }

  /// Resolves `ptr` to an allocated block, or reports the violation.
  fn live_block(
    &self,
    ptr: *mut u8,
  ) -> Result<Block, Error> {
    let addr = ptr as usize;

    if !self.heap.contains(ptr) || addr % ALIGNMENT != 0 {
      return Err(self.violation(Error::InvalidPointer { addr }));
    }

    let block = unsafe { Block::from_payload(ptr) };
    let header = unsafe { block.header() };
    let (size, allocated) = codec::untag(header);

    // The header must describe a block that fits before the heap end.
    if size < MIN_BLOCK_SIZE
      || size % ALIGNMENT != 0
      || size > self.heap_end() as usize - block.addr() as usize
    {
      return Err(self.violation(Error::InvalidPointer { addr }));
    }

    if !allocated {
      return Err(self.violation(Error::DoubleFree { addr }));
    }

    if unsafe { block.footer() } != header {
      return Err(self.violation(Error::InvalidPointer { addr }));
    }

    Ok(block)
  }

  fn violation(
    &self,
    err: Error,
  ) -> Error {
    match self.config.on_violation {
      ViolationPolicy::Report => {
        warn!("{err}");
        err
      }
      ViolationPolicy::Abort => {
        error!("{err}, aborting");
        std::process::abort()
      }
    }
  }

  /// Marks `block` free, merges it with free neighbours and either keeps the
  /// result in the free list or hands it back to the break.
  unsafe fn release(
    &mut self,
    block: Block,
  ) {
    unsafe {
      let size = block.size();
      block.set_tags(size, false);

      trace!("free {block:?} ({size} bytes)");

      let mut block = block;
      let mut listed = false;

      if block.end() < self.heap.end() {
        (block, listed) = coalesce_right(&mut self.free, block);
      }

      if block.addr() > self.heap.start() {
        if listed {
          self.free.remove(block);
        }

        let (merged, coalesced) = coalesce_left(block);
        block = merged;
        listed = coalesced;
      }

      if !listed {
        self.free.insert(block);
      }

      if block.end() == self.heap.end() {
        let size = block.size();
        self.free.remove(block);

        if let Err(err) = self.heap.shrink(size) {
          warn!("keeping {block:?} ({size} bytes) at the heap end: {err}");
          self.free.insert(block);
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::WORD_SIZE;
  use crate::error::BreakError;

  fn allocator() -> Allocator<Arena> {
    let config = Config::new().on_violation(ViolationPolicy::Report);
    Allocator::with_config(Arena::new(256 * 1024), config)
  }

  fn total(size: usize) -> usize {
    codec::adjust_size(size).unwrap()
  }

  fn assert_sound(allocator: &Allocator<Arena>) {
    if let Err(corruption) = allocator.audit() {
      panic!("heap corrupted: {corruption}\n{}", allocator.dump());
    }
  }

  /// The six allocations of the best-fit and coalescing scenarios.
  fn six_blocks(allocator: &mut Allocator<Arena>) -> [*mut u8; 6] {
    [100, 200, 150, 300, 50, 170].map(|size| allocator.allocate(size).unwrap().as_ptr())
  }

  #[test]
  fn test_allocate_zero_fails() {
    let mut allocator = allocator();

    assert_eq!(allocator.allocate(0), Err(Error::ZeroSize));
    assert_eq!(allocator.heap_size(), 0);
  }

  #[test]
  fn test_allocate_too_large_fails() {
    let mut allocator = allocator();

    assert_eq!(allocator.allocate(usize::MAX), Err(Error::TooLarge { requested: usize::MAX }));
    assert_eq!(allocator.heap_size(), 0);
  }

  #[test]
  fn test_out_of_memory_leaves_state_untouched() {
    let mut allocator = Allocator::arena(256);
    let first = allocator.allocate(100).unwrap();
    let size = allocator.heap_size();

    assert!(matches!(
      allocator.allocate(200),
      Err(Error::OutOfMemory(BreakError::Exhausted { .. }))
    ));
    assert_eq!(allocator.heap_size(), size);
    assert_eq!(allocator.free_blocks(), 0);
    assert_sound(&allocator);

    unsafe { allocator.free(first.as_ptr()).unwrap() };
    assert_eq!(allocator.heap_size(), 0);
  }

  #[test]
  fn test_payloads_are_aligned_and_usable() {
    let mut allocator = allocator();
    let mut live = Vec::new();

    for size in 1..64 {
      let ptr = allocator.allocate(size).unwrap();
      assert_eq!(ptr.as_ptr() as usize % ALIGNMENT, 0);

      unsafe { ptr::write_bytes(ptr.as_ptr(), size as u8, size) };
      live.push((ptr, size));
    }

    for &(ptr, size) in &live {
      let bytes = unsafe { core::slice::from_raw_parts(ptr.as_ptr(), size) };
      assert!(bytes.iter().all(|&byte| byte == size as u8));
    }

    assert_sound(&allocator);
  }

  #[test]
  fn test_live_blocks_never_overlap() {
    let mut allocator = allocator();
    let mut live: Vec<(usize, usize)> = Vec::new();

    for round in 0..200usize {
      let size = (round * 37) % 300 + 1;
      let ptr = allocator.allocate(size).unwrap();
      live.push((ptr.as_ptr() as usize, size));

      if round % 3 == 0 {
        let (addr, _) = live.remove((round * 7) % live.len());
        unsafe { allocator.free(addr as *mut u8).unwrap() };
      }

      assert_sound(&allocator);
    }

    live.sort_unstable();
    for pair in live.windows(2) {
      assert!(pair[0].0 + pair[0].1 <= pair[1].0);
    }
  }

  #[test]
  fn test_round_trip_restores_heap_size() {
    let mut allocator = allocator();
    let keep = allocator.allocate(64).unwrap();
    let before = allocator.heap_size();

    let ptr = allocator.allocate(1000).unwrap();
    assert_eq!(allocator.heap_size(), before + total(1000));

    unsafe { allocator.free(ptr.as_ptr()).unwrap() };
    assert_eq!(allocator.heap_size(), before);
    assert_eq!(allocator.free_blocks(), 0);

    unsafe { allocator.free(keep.as_ptr()).unwrap() };
  }

  #[test]
  fn test_single_block_shrinks_heap_back() {
    let mut allocator = allocator();

    let ptr = allocator.allocate(42).unwrap();
    let start = allocator.heap_start();
    assert_eq!(allocator.heap_size(), total(42));

    unsafe { allocator.free(ptr.as_ptr()).unwrap() };

    assert_eq!(allocator.heap_size(), 0);
    assert_eq!(allocator.heap_end(), start);
    assert_eq!(allocator.program_break().used(), 0);
  }

  #[test]
  fn test_free_null_is_noop() {
    let mut allocator = allocator();

    assert_eq!(unsafe { allocator.free(ptr::null_mut()) }, Ok(()));

    let ptr = allocator.allocate(8).unwrap();
    assert_eq!(unsafe { allocator.free(ptr::null_mut()) }, Ok(()));
    assert_eq!(allocator.heap_size(), total(8));

    unsafe { allocator.free(ptr.as_ptr()).unwrap() };
  }

  #[test]
  fn test_double_free_is_detected() {
    let mut allocator = allocator();
    let a = allocator.allocate(32).unwrap().as_ptr();
    let _b = allocator.allocate(32).unwrap();

    unsafe {
      allocator.free(a).unwrap();
      assert_eq!(allocator.free(a), Err(Error::DoubleFree { addr: a as usize }));
    }

    assert_eq!(allocator.free_blocks(), 1);
    assert_sound(&allocator);
  }

  #[test]
  fn test_invalid_pointer_is_detected() {
    let mut allocator = allocator();
    let a = allocator.allocate(32).unwrap().as_ptr();
    let mut outside = 0u64;
    let outside = (&mut outside as *mut u64).cast::<u8>();

    unsafe {
      let err = allocator.free(outside).unwrap_err();
      assert_eq!(err, Error::InvalidPointer { addr: outside as usize });
      assert!(err.is_violation());

      assert!(allocator.free(allocator.heap_start()).is_err());
      assert!(allocator.free(a.add(1)).is_err());
      assert!(allocator.free(allocator.heap_end()).is_err());
    }

    assert!(unsafe { allocator.free(a) }.is_ok());
  }

  #[test]
  fn test_free_before_any_allocation_is_invalid() {
    let mut allocator = allocator();
    let mut word = 0usize;

    let result = unsafe { allocator.free((&mut word as *mut usize).cast()) };
    assert!(matches!(result, Err(Error::InvalidPointer { .. })));
  }

  #[test]
  fn test_interior_pointer_with_forged_header_is_rejected() {
    let mut allocator = allocator();
    let a = allocator.allocate(64).unwrap().as_ptr();
    let _guard = allocator.allocate(32).unwrap();

    unsafe {
      let words = a.cast::<usize>();
      ptr::write_bytes(a, 0, 64);

      // Plausible header, footer slot left zeroed.
      words.write(codec::tag(48, true));
      let err = allocator.free(a.add(WORD_SIZE)).unwrap_err();
      assert_eq!(err, Error::InvalidPointer { addr: a.add(WORD_SIZE) as usize });

      // Allocation bit on a size that is not a block size.
      words.write(0x31 | 0x4);
      assert!(matches!(
        allocator.free(a.add(WORD_SIZE)),
        Err(Error::InvalidPointer { .. })
      ));

      // Size running past the heap end.
      words.write(codec::tag(allocator.heap_size() + 64, true));
      assert!(matches!(
        allocator.free(a.add(WORD_SIZE)),
        Err(Error::InvalidPointer { .. })
      ));
    }

    assert_sound(&allocator);
    assert_eq!(allocator.free_blocks(), 0);
    assert!(unsafe { allocator.free(a) }.is_ok());
    assert_sound(&allocator);
  }

  #[test]
  fn test_best_fit_reuses_smallest_hole() {
    let mut allocator = allocator();
    let [a, b, c, _d, e, _f] = six_blocks(&mut allocator);

    unsafe {
      allocator.free(a).unwrap();
      allocator.free(c).unwrap();
      allocator.free(e).unwrap();
    }

    assert_eq!(allocator.free_blocks(), 3);
    let size = allocator.heap_size();

    // The 50-byte hole is 8 bytes short; the 100-byte one is the best fit.
    let reused = allocator.allocate(60).unwrap().as_ptr();

    assert_eq!(reused, a);
    assert_eq!(allocator.heap_size(), size);
    assert_eq!(allocator.free_blocks(), 3);
    assert_sound(&allocator);

    let info: Vec<_> = allocator.blocks().collect();
    assert_eq!(info[0].size, total(60));
    assert_eq!(info[1].size, total(100) - total(60));
    assert!(!info[1].allocated);
    assert_eq!(info[2].addr + WORD_SIZE, b as usize);

    let tight = allocator.allocate(50).unwrap().as_ptr();
    assert_eq!(tight, e);
    assert_eq!(allocator.heap_size(), size);
  }

  #[test]
  fn test_reuse_splits_large_hole() {
    let mut allocator = allocator();
    let [_a, _b, _c, d, _e, _f] = six_blocks(&mut allocator);

    unsafe { allocator.free(d).unwrap() };

    let small = allocator.allocate(16).unwrap().as_ptr();
    assert_eq!(small, d);

    let info: Vec<_> = allocator.blocks().collect();
    assert_eq!(info[3].size, total(16));
    assert!(info[3].allocated);
    assert_eq!(info[4].size, total(300) - total(16));
    assert!(!info[4].allocated);
    assert_eq!(allocator.free_blocks(), 1);
    assert_sound(&allocator);
  }

  #[test]
  fn test_reuse_without_split_absorbs_leftover() {
    let mut allocator = allocator();
    let a = allocator.allocate(40).unwrap().as_ptr();
    let _guard = allocator.allocate(8).unwrap();

    unsafe { allocator.free(a).unwrap() };

    // Serving 32 bytes out of 40 leaves less than a minimum block.
    let b = allocator.allocate(32).unwrap().as_ptr();
    assert_eq!(b, a);
    assert_eq!(unsafe { allocator.payload_size(b) }, Ok(total(40) - 2 * WORD_SIZE));
    assert_eq!(allocator.free_blocks(), 0);
    assert_sound(&allocator);
  }

  #[test]
  fn test_coalescing_scenario() {
    let mut allocator = allocator();
    let [a, b, c, d, e, f] = six_blocks(&mut allocator);
    let merged_size: usize = [100, 200, 150, 300, 50].map(total).iter().sum();

    for ptr in [b, a, d, e, c] {
      unsafe { allocator.free(ptr).unwrap() };
      assert_sound(&allocator);
    }

    let info: Vec<_> = allocator.blocks().collect();
    assert_eq!(info.len(), 2);
    assert!(!info[0].allocated);
    assert_eq!(info[0].size, merged_size);
    assert_eq!(info[0].addr, allocator.heap_start() as usize);
    assert!(info[1].allocated);
    assert_eq!(info[1].addr + WORD_SIZE, f as usize);
    assert_eq!(allocator.free_blocks(), 1);

    unsafe { allocator.free(f).unwrap() };
    assert_eq!(allocator.heap_size(), 0);
    assert_eq!(allocator.free_blocks(), 0);
  }

  #[test]
  fn test_right_merge_without_left_merge_stays_listed() {
    let mut allocator = allocator();
    let [_a, b, c, _d, _e, _f] = six_blocks(&mut allocator);

    unsafe {
      allocator.free(c).unwrap();
      allocator.free(b).unwrap();
    }

    assert_eq!(allocator.free_blocks(), 1);
    assert_sound(&allocator);

    let reused = allocator.allocate(200 + 150).unwrap().as_ptr();
    assert_eq!(reused, b);
    assert_eq!(allocator.free_blocks(), 0);
  }

  #[test]
  fn test_freeing_last_block_merges_and_shrinks() {
    let mut allocator = allocator();
    let [_a, _b, _c, _d, e, f] = six_blocks(&mut allocator);
    let size = allocator.heap_size();

    unsafe {
      allocator.free(e).unwrap();
      allocator.free(f).unwrap();
    }

    assert_eq!(allocator.heap_size(), size - total(50) - total(170));
    assert_eq!(allocator.free_blocks(), 0);
    assert_sound(&allocator);
  }

  #[test]
  fn test_resize_grows_and_copies() {
    let mut allocator = allocator();
    let old = allocator.allocate(16).unwrap().as_ptr();
    let _guard = allocator.allocate(8).unwrap();

    unsafe {
      for i in 0..16 {
        old.add(i).write(i as u8);
      }

      let new = allocator.resize(old, 64).unwrap().unwrap().as_ptr();
      assert_ne!(new, old);

      for i in 0..16 {
        assert_eq!(new.add(i).read(), i as u8);
      }

      assert!(matches!(allocator.free(old), Err(Error::DoubleFree { .. })));
    }

    assert_sound(&allocator);
  }

  #[test]
  fn test_resize_shrinking_copies_prefix() {
    let mut allocator = allocator();
    let old = allocator.allocate(64).unwrap().as_ptr();

    unsafe {
      ptr::write_bytes(old, 0x5A, 64);

      let new = allocator.resize(old, 8).unwrap().unwrap().as_ptr();
      let bytes = core::slice::from_raw_parts(new, 8);
      assert!(bytes.iter().all(|&byte| byte == 0x5A));
    }

    assert_sound(&allocator);
  }

  #[test]
  fn test_resize_null_allocates() {
    let mut allocator = allocator();

    let ptr = unsafe { allocator.resize(ptr::null_mut(), 24) }.unwrap();
    assert!(ptr.is_some());
    assert_eq!(allocator.heap_size(), total(24));
  }

  #[test]
  fn test_resize_to_zero_frees() {
    let mut allocator = allocator();
    let ptr = allocator.allocate(24).unwrap().as_ptr();

    assert_eq!(unsafe { allocator.resize(ptr, 0) }, Ok(None));
    assert_eq!(allocator.heap_size(), 0);
  }

  #[test]
  fn test_resize_failure_keeps_old_block() {
    let mut allocator = Allocator::arena(512);
    let old = allocator.allocate(64).unwrap().as_ptr();

    unsafe {
      ptr::write_bytes(old, 7, 64);

      assert!(matches!(allocator.resize(old, 4096), Err(Error::OutOfMemory(_))));

      let bytes = core::slice::from_raw_parts(old, 64);
      assert!(bytes.iter().all(|&byte| byte == 7));
      assert!(allocator.free(old).is_ok());
    }
  }

  #[test]
  fn test_resize_invalid_pointer_does_not_allocate() {
    let mut allocator = allocator();
    let _live = allocator.allocate(8).unwrap();
    let size = allocator.heap_size();
    let mut word = 0usize;

    let result = unsafe { allocator.resize((&mut word as *mut usize).cast(), 32) };

    assert!(matches!(result, Err(Error::InvalidPointer { .. })));
    assert_eq!(allocator.heap_size(), size);
  }

  #[test]
  fn test_zero_allocate_clears_reused_memory() {
    let mut allocator = allocator();
    let dirty = allocator.allocate(400).unwrap().as_ptr();
    let _guard = allocator.allocate(8).unwrap();

    unsafe {
      ptr::write_bytes(dirty, 0xFF, 400);
      allocator.free(dirty).unwrap();
    }

    let ptr = allocator.zero_allocate(100, 4).unwrap().as_ptr();
    assert_eq!(ptr, dirty);

    let bytes = unsafe { core::slice::from_raw_parts(ptr, 400) };
    assert!(bytes.iter().all(|&byte| byte == 0));
  }

  #[test]
  fn test_zero_allocate_overflow() {
    let mut allocator = allocator();

    assert!(matches!(allocator.zero_allocate(usize::MAX, 2), Err(Error::TooLarge { .. })));
    assert_eq!(allocator.zero_allocate(0, 8), Err(Error::ZeroSize));
  }

  #[test]
  fn test_independent_heaps() {
    let mut first = allocator();
    let mut second = allocator();

    let a = first.allocate(32).unwrap().as_ptr();
    let b = second.allocate(32).unwrap().as_ptr();

    assert!(matches!(unsafe { first.free(b) }, Err(Error::InvalidPointer { .. })));
    assert!(unsafe { second.free(b) }.is_ok());
    assert!(unsafe { first.free(a) }.is_ok());
  }

  #[test]
  fn test_shrink_refused_keeps_block_listed() {
    let mut allocator = allocator();
    let _a = allocator.allocate(32).unwrap();
    let b = allocator.allocate(32).unwrap().as_ptr();

    // Something else moves the break past the heap end.
    unsafe { allocator.heap.program_break_mut().grow(64).unwrap() };

    unsafe { allocator.free(b).unwrap() };
    assert_eq!(allocator.free_blocks(), 1);
    assert_eq!(allocator.heap_size(), 2 * total(32));

    assert!(matches!(
      allocator.allocate(1000),
      Err(Error::OutOfMemory(BreakError::Discontiguous))
    ));

    let reused = allocator.allocate(32).unwrap().as_ptr();
    assert_eq!(reused, b);
  }
}
