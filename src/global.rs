use core::alloc::{GlobalAlloc, Layout};
use core::ptr::{self, NonNull};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::error;

use crate::allocator::Allocator;
use crate::brk::Sbrk;
use crate::codec::ALIGNMENT;
use crate::config::{Config, ViolationPolicy};

/// Process-wide allocator on the program break, usable as
/// `#[global_allocator]`.
///
/// Every operation holds one lock for its whole duration. Layouts aligned to
/// more than 8 bytes are refused with a null pointer.
///
/// ```rust,ignore
/// use brkalloc::BrkAlloc;
///
/// #[global_allocator]
/// static ALLOCATOR: BrkAlloc = BrkAlloc::new();
/// ```
///
/// Do not install a `log` backend that allocates while this is the global
/// allocator: the allocator logs while holding its lock.
pub struct BrkAlloc {
  inner: Mutex<Allocator<Sbrk>>,
}

impl BrkAlloc {
  pub const fn new() -> Self {
    let config = Config::new().on_violation(ViolationPolicy::Abort);

    Self {
      inner: Mutex::new(Allocator::with_config(Sbrk, config)),
    }
  }

  fn lock(&self) -> MutexGuard<'_, Allocator<Sbrk>> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Runs `f` with exclusive access to the underlying allocator.
  pub fn with<R>(
    &self,
    f: impl FnOnce(&mut Allocator<Sbrk>) -> R,
  ) -> R {
    f(&mut self.lock())
  }

  fn supported(layout: Layout) -> bool {
    layout.align() <= ALIGNMENT
  }
}

impl Default for BrkAlloc {
  fn default() -> Self {
    Self::new()
  }
}

fn into_raw(result: Result<NonNull<u8>, crate::Error>) -> *mut u8 {
  result.map_or(ptr::null_mut(), NonNull::as_ptr)
}

unsafe impl GlobalAlloc for BrkAlloc {
  unsafe fn alloc(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    if !Self::supported(layout) {
      return ptr::null_mut();
    }

    into_raw(self.lock().allocate(layout.size()))
  }

  unsafe fn alloc_zeroed(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    if !Self::supported(layout) {
      return ptr::null_mut();
    }

    into_raw(self.lock().zero_allocate(1, layout.size()))
  }

  unsafe fn dealloc(
    &self,
    ptr: *mut u8,
    _layout: Layout,
  ) {
    if let Err(err) = unsafe { self.lock().free(ptr) } {
      error!("dealloc of {ptr:?} failed: {err}");
      std::process::abort();
    }
  }

  unsafe fn realloc(
    &self,
    ptr: *mut u8,
    layout: Layout,
    new_size: usize,
  ) -> *mut u8 {
    if !Self::supported(layout) {
      return ptr::null_mut();
    }

    match unsafe { self.lock().resize(ptr, new_size) } {
      Ok(Some(new)) => new.as_ptr(),
      Ok(None) | Err(_) => ptr::null_mut(),
    }
  }
}
