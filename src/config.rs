/// What [`Allocator::free`](crate::Allocator::free) does when handed a
/// pointer it cannot have produced or a block that is already free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationPolicy {
  /// Log a warning and return the error to the caller.
  Report,
  /// Log the error and abort the process.
  Abort,
}

impl ViolationPolicy {
  /// `Abort` when the crate is built with the `strict` feature, else `Report`.
  pub const fn default_for_build() -> Self {
    if cfg!(feature = "strict") {
      Self::Abort
    } else {
      Self::Report
    }
  }
}

impl Default for ViolationPolicy {
  fn default() -> Self {
    Self::default_for_build()
  }
}

/// Runtime knobs of an [`Allocator`](crate::Allocator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
  pub on_violation: ViolationPolicy,
}

impl Config {
  pub const fn new() -> Self {
    Self {
      on_violation: ViolationPolicy::default_for_build(),
    }
  }

  pub const fn on_violation(
    mut self,
    policy: ViolationPolicy,
  ) -> Self {
    self.on_violation = policy;
    self
  }
}

impl Default for Config {
  fn default() -> Self {
    Self::new()
  }
}
