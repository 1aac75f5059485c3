//! Sources of heap memory.
//!
//! The allocator only ever needs one primitive from the operating system:
//! move the end of the data segment forward or backward. [`ProgramBreak`]
//! captures that, [`Sbrk`] implements it on top of `sbrk(2)` and [`Arena`]
//! emulates it inside a fixed buffer so several heaps can coexist.

use core::ptr::NonNull;
use std::alloc::{self, Layout};

use libc::{c_void, intptr_t, sbrk};
use log::trace;

use crate::codec::ALIGNMENT;
use crate::error::BreakError;

/// A movable end-of-heap pointer.
///
/// # Safety
///
/// `grow` must hand out memory that nothing else uses, and `shrink` must only
/// be called with memory the caller no longer touches.
pub unsafe trait ProgramBreak {
  /// Returns the current break.
  fn current(&mut self) -> *mut u8;

  /// Moves the break `n` bytes forward and returns the previous break.
  ///
  /// On failure the break is left where it was.
  ///
  /// # Safety
  ///
  /// The caller becomes responsible for the returned region.
  unsafe fn grow(
    &mut self,
    n: usize,
  ) -> Result<*mut u8, BreakError>;

  /// Moves the break `n` bytes backward and returns the new break.
  ///
  /// # Safety
  ///
  /// The last `n` bytes below the break must not be used after this call.
  unsafe fn shrink(
    &mut self,
    n: usize,
  ) -> Result<*mut u8, BreakError>;
}

/// The process program break.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sbrk;

impl Sbrk {
  fn failed(address: *mut c_void) -> bool {
    address == usize::MAX as *mut c_void
  }
}

unsafe impl ProgramBreak for Sbrk {
  fn current(&mut self) -> *mut u8 {
    unsafe { sbrk(0) as *mut u8 }
  }

  unsafe fn grow(
    &mut self,
    n: usize,
  ) -> Result<*mut u8, BreakError> {
    let increment = intptr_t::try_from(n).map_err(|_| BreakError::Exhausted { requested: n })?;

    let address = unsafe { sbrk(increment) };

    if Self::failed(address) {
      return Err(BreakError::Exhausted { requested: n });
    }

    Ok(address as *mut u8)
  }

  unsafe fn shrink(
    &mut self,
    n: usize,
  ) -> Result<*mut u8, BreakError> {
    let decrement = intptr_t::try_from(n).map_err(|_| BreakError::Underflow { requested: n })?;

    if Self::failed(unsafe { sbrk(-decrement) }) {
      return Err(BreakError::Underflow { requested: n });
    }

    Ok(self.current())
  }
}

/// A fixed-capacity region that behaves like a private program break.
///
/// The backing buffer comes from the global allocator and is released when
/// the arena is dropped, so blocks handed out from it must not outlive it.
#[derive(Debug)]
pub struct Arena {
  base: NonNull<u8>,
  layout: Layout,
  brk: usize,
}

impl Arena {
  /// Reserves `capacity` bytes.
  ///
  /// # Panics
  ///
  /// Panics when `capacity` is zero or too large for a [`Layout`], and
  /// aborts through [`alloc::handle_alloc_error`] if the host allocator
  /// cannot provide the buffer.
  pub fn new(capacity: usize) -> Self {
    assert!(capacity > 0, "arena capacity must be non-zero");

    let layout = match Layout::from_size_align(capacity, ALIGNMENT) {
      Ok(layout) => layout,
      Err(_) => panic!("arena capacity {capacity} is too large"),
    };

    let base = unsafe { alloc::alloc(layout) };
    let Some(base) = NonNull::new(base) else {
      alloc::handle_alloc_error(layout)
    };

    trace!("arena reserved {capacity} bytes at {base:?}");

    Self { base, layout, brk: 0 }
  }

  /// Total bytes the arena can hand out.
  pub fn capacity(&self) -> usize {
    self.layout.size()
  }

  /// Bytes currently below the break.
  pub fn used(&self) -> usize {
    self.brk
  }

  /// First byte of the arena.
  pub fn base(&self) -> *mut u8 {
    self.base.as_ptr()
  }
}

unsafe impl ProgramBreak for Arena {
  fn current(&mut self) -> *mut u8 {
    unsafe { self.base.as_ptr().add(self.brk) }
  }

  unsafe fn grow(
    &mut self,
    n: usize,
  ) -> Result<*mut u8, BreakError> {
    if n > self.capacity() - self.brk {
      return Err(BreakError::Exhausted { requested: n });
    }

    let previous = self.current();
    self.brk += n;

    Ok(previous)
  }

  unsafe fn shrink(
    &mut self,
    n: usize,
  ) -> Result<*mut u8, BreakError> {
    if n > self.brk {
      return Err(BreakError::Underflow { requested: n });
    }

    self.brk -= n;

    Ok(self.current())
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) };
  }
}

/// Reads the byte distance between two addresses of the same region.
pub(crate) fn distance(
  from: *const u8,
  to: *const u8,
) -> usize {
  (to as usize).wrapping_sub(from as usize)
}
