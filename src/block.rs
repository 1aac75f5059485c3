use core::fmt;
use core::ptr::{self, NonNull};

use crate::codec::{WORD_SIZE, tag, untag};

/// Address of a block's header.
///
/// All header, footer and free-list link offsets are computed here. A
/// `Block` is only a number; every accessor that touches memory is unsafe
/// and requires the address to point at a block laid out by this crate.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Block(NonNull<u8>);

impl Block {
  /// # Safety
  ///
  /// `addr` must be non-null and word aligned.
  #[inline]
  pub unsafe fn at(addr: *mut u8) -> Self {
    debug_assert!(!addr.is_null());
    Self(unsafe { NonNull::new_unchecked(addr) })
  }

  /// Recovers the block owning a payload pointer.
  ///
  /// # Safety
  ///
  /// `payload` must be at least one word past a block start.
  #[inline]
  pub unsafe fn from_payload(payload: *mut u8) -> Self {
    unsafe { Self::at(payload.sub(WORD_SIZE)) }
  }

  #[inline]
  pub fn addr(self) -> *mut u8 {
    self.0.as_ptr()
  }

  #[inline]
  pub fn payload(self) -> NonNull<u8> {
    unsafe { self.0.add(WORD_SIZE) }
  }

  #[inline]
  unsafe fn word(
    self,
    offset: usize,
  ) -> *mut usize {
    unsafe { self.addr().add(offset).cast::<usize>() }
  }

  /// Raw header word.
  #[inline]
  pub unsafe fn header(self) -> usize {
    unsafe { self.word(0).read() }
  }

  /// Raw footer word, located through the header's size.
  #[inline]
  pub unsafe fn footer(self) -> usize {
    unsafe { self.word(self.size() - WORD_SIZE).read() }
  }

  #[inline]
  pub unsafe fn size(self) -> usize {
    untag(unsafe { self.header() }).0
  }

  #[inline]
  pub unsafe fn is_allocated(self) -> bool {
    untag(unsafe { self.header() }).1
  }

  /// Bytes a caller may use in an allocated block.
  #[inline]
  pub unsafe fn payload_size(self) -> usize {
    unsafe { self.size() - 2 * WORD_SIZE }
  }

  /// Writes identical header and footer words for a block of `size` bytes.
  #[inline]
  pub unsafe fn set_tags(
    self,
    size: usize,
    allocated: bool,
  ) {
    let word = tag(size, allocated);

    unsafe {
      self.word(0).write(word);
      self.word(size - WORD_SIZE).write(word);
    }
  }

  /// One past the last byte of the block.
  #[inline]
  pub unsafe fn end(self) -> *mut u8 {
    unsafe { self.addr().add(self.size()) }
  }

  /// The block starting right after this one.
  ///
  /// # Safety
  ///
  /// This block must not end at the heap end.
  #[inline]
  pub unsafe fn right(self) -> Block {
    unsafe { Self::at(self.end()) }
  }

  /// The block ending right before this one, found through its footer.
  ///
  /// # Safety
  ///
  /// This block must not start at the heap start.
  #[inline]
  pub unsafe fn left(self) -> Block {
    let (size, _) = untag(unsafe { self.addr().sub(WORD_SIZE).cast::<usize>().read() });

    unsafe { Self::at(self.addr().sub(size)) }
  }

  /// Tag word found in the footer of the left neighbour.
  #[inline]
  pub unsafe fn left_footer(self) -> usize {
    unsafe { self.addr().sub(WORD_SIZE).cast::<usize>().read() }
  }

  /// Next free block; only meaningful while this block is free.
  #[inline]
  pub unsafe fn next_free(self) -> Block {
    unsafe { Self::at(self.word(WORD_SIZE).cast::<*mut u8>().read()) }
  }

  /// Previous free block; only meaningful while this block is free.
  #[inline]
  pub unsafe fn prev_free(self) -> Block {
    unsafe { Self::at(self.word(2 * WORD_SIZE).cast::<*mut u8>().read()) }
  }

  #[inline]
  pub unsafe fn set_next_free(
    self,
    next: Block,
  ) {
    unsafe { self.word(WORD_SIZE).cast::<*mut u8>().write(next.addr()) }
  }

  #[inline]
  pub unsafe fn set_prev_free(
    self,
    prev: Block,
  ) {
    unsafe { self.word(2 * WORD_SIZE).cast::<*mut u8>().write(prev.addr()) }
  }

  /// Fills the payload with zeroes.
  pub unsafe fn zero_payload(
    self,
    len: usize,
  ) {
    debug_assert!(len <= unsafe { self.payload_size() });
    unsafe { ptr::write_bytes(self.payload().as_ptr(), 0, len) }
  }
}

impl fmt::Debug for Block {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "Block({:?})", self.0)
  }
}
