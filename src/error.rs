use thiserror::Error;

/// Failures of the program-break primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BreakError {
  #[error("program break cannot grow by {requested} bytes")]
  Exhausted { requested: usize },
  #[error("program break cannot shrink by {requested} bytes")]
  Underflow { requested: usize },
  #[error("program break was moved outside of the allocator")]
  Discontiguous,
}

/// Errors reported by the allocator operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
  #[error("zero-sized allocation")]
  ZeroSize,
  #[error("allocation of {requested} bytes exceeds the maximum block size")]
  TooLarge { requested: usize },
  #[error("out of memory: {0}")]
  OutOfMemory(#[from] BreakError),
  #[error("invalid pointer {addr:#x} is not inside the heap")]
  InvalidPointer { addr: usize },
  #[error("double free of {addr:#x}")]
  DoubleFree { addr: usize },
}

impl Error {
  /// Whether the error is a caller contract violation rather than exhaustion.
  pub fn is_violation(&self) -> bool {
    matches!(self, Self::InvalidPointer { .. } | Self::DoubleFree { .. })
  }
}

/// Inconsistencies found by [`Allocator::audit`](crate::Allocator::audit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Corruption {
  #[error("block {addr:#x}: header {header:#x} does not match footer {footer:#x}")]
  TagMismatch {
    addr: usize,
    header: usize,
    footer: usize,
  },
  #[error("block {addr:#x}: invalid size {size}")]
  BadSize { addr: usize, size: usize },
  #[error("block {addr:#x} overruns the heap end")]
  Overrun { addr: usize },
  #[error("blocks {left:#x} and {right:#x} are adjacent and both free")]
  AdjacentFree { left: usize, right: usize },
  #[error("free list entry {addr:#x} is not a free block of this heap")]
  ForeignEntry { addr: usize },
  #[error("free list entry {addr:#x} has a broken back link")]
  BrokenLink { addr: usize },
  #[error("free list holds {listed} entries but the heap has {free} free blocks")]
  CountMismatch { listed: usize, free: usize },
}
