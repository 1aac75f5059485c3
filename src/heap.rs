use core::ptr;

use log::{debug, warn};

use crate::brk::{ProgramBreak, distance};
use crate::codec::ALIGNMENT;
use crate::error::BreakError;

/// The managed address range `[start, end)`.
///
/// `start` is captured from the break the first time the region is used and
/// never moves again; `end` follows every grow and shrink.
pub struct HeapRegion<B> {
  brk: B,
  start: *mut u8,
  end: *mut u8,
}

impl<B: ProgramBreak> HeapRegion<B> {
  pub const fn new(brk: B) -> Self {
    Self {
      brk,
      start: ptr::null_mut(),
      end: ptr::null_mut(),
    }
  }

  pub fn is_initialized(&self) -> bool {
    !self.start.is_null()
  }

  /// Captures the current break as the heap start, claiming padding first
  /// if the break is not aligned.
  pub fn ensure_initialized(&mut self) -> Result<(), BreakError> {
    if self.is_initialized() {
      return Ok(());
    }

    let current = self.brk.current();
    let padding = current.align_offset(ALIGNMENT);

    if padding != 0 {
      unsafe { self.brk.grow(padding)? };
    }

    let start = self.brk.current();

    debug!("heap initialized at {start:?} ({padding} bytes of padding)");

    self.start = start;
    self.end = start;

    Ok(())
  }

  /// Extends the heap by `n` bytes and returns the old end.
  ///
  /// # Safety
  ///
  /// The region must be initialized.
  pub unsafe fn grow(
    &mut self,
    n: usize,
  ) -> Result<*mut u8, BreakError> {
    let previous = unsafe { self.brk.grow(n)? };

    if previous != self.end {
      warn!("program break moved from {:?} to {previous:?} behind the allocator", self.end);

      if unsafe { self.brk.shrink(n) }.is_err() {
        warn!("could not roll back {n} bytes at {previous:?}");
      }

      return Err(BreakError::Discontiguous);
    }

    self.end = unsafe { previous.add(n) };

    debug!("heap grown by {n} bytes, end = {:?}", self.end);

    Ok(previous)
  }

  /// Releases the last `n` bytes of the heap.
  ///
  /// # Safety
  ///
  /// The released bytes must be a free block that ends at the heap end.
  pub unsafe fn shrink(
    &mut self,
    n: usize,
  ) -> Result<(), BreakError> {
    debug_assert!(n <= self.len());

    if self.brk.current() != self.end {
      return Err(BreakError::Discontiguous);
    }

    self.end = unsafe { self.brk.shrink(n)? };

    debug!("heap shrunk by {n} bytes, end = {:?}", self.end);

    Ok(())
  }

  /// Whether `ptr` lies strictly inside the heap.
  pub fn contains(
    &self,
    ptr: *const u8,
  ) -> bool {
    self.start.cast_const() < ptr && ptr < self.end.cast_const()
  }

  pub fn start(&self) -> *mut u8 {
    self.start
  }

  pub fn end(&self) -> *mut u8 {
    self.end
  }

  /// Bytes currently claimed from the break.
  pub fn len(&self) -> usize {
    distance(self.start, self.end)
  }

  pub fn program_break(&self) -> &B {
    &self.brk
  }

  #[cfg(test)]
  pub(crate) fn program_break_mut(&mut self) -> &mut B {
    &mut self.brk
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::brk::Arena;

  #[test]
  fn test_lazy_initialization() {
    let mut region = HeapRegion::new(Arena::new(128));
    assert!(!region.is_initialized());
    assert!(region.start().is_null());

    region.ensure_initialized().unwrap();
    let start = region.start();
    assert!(region.is_initialized());
    assert_eq!(start, region.end());
    assert_eq!(region.len(), 0);

    region.ensure_initialized().unwrap();
    assert_eq!(start, region.start());
  }

  #[test]
  fn test_grow_and_shrink_track_end() {
    let mut region = HeapRegion::new(Arena::new(256));
    region.ensure_initialized().unwrap();
    let start = region.start();

    unsafe {
      assert_eq!(region.grow(64).unwrap(), start);
      assert_eq!(region.grow(32).unwrap(), start.add(64));
      assert_eq!(region.len(), 96);

      region.shrink(32).unwrap();
      assert_eq!(region.end(), start.add(64));
      assert_eq!(region.program_break().used(), 64);
    }
  }

  #[test]
  fn test_failed_grow_keeps_state() {
    let mut region = HeapRegion::new(Arena::new(64));
    region.ensure_initialized().unwrap();

    unsafe {
      region.grow(48).unwrap();
      assert_eq!(region.grow(32), Err(BreakError::Exhausted { requested: 32 }));
    }

    assert_eq!(region.len(), 48);
  }

  #[test]
  fn test_contains_is_strict() {
    let mut region = HeapRegion::new(Arena::new(64));
    region.ensure_initialized().unwrap();

    unsafe { region.grow(32).unwrap() };

    let start = region.start();
    assert!(!region.contains(start));
    assert!(region.contains(unsafe { start.add(8) }));
    assert!(region.contains(unsafe { start.add(31) }));
    assert!(!region.contains(region.end()));
    assert!(!region.contains(ptr::null()));
  }
}
