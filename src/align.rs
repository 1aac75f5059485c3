/// Rounds `value` up to the machine word size.
///
/// # Examples
///
/// ```rust
/// use brkalloc::align;
///
/// match std::mem::size_of::<usize>() {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, ::core::mem::size_of::<usize>())
  };
}

/// Rounds `value` up to the next multiple of `align`, which must be a power of two.
///
/// ```rust
/// use brkalloc::align_to;
///
/// assert_eq!(align_to!(1, 8), 8);
/// assert_eq!(align_to!(16, 8), 16);
/// assert_eq!(align_to!(17, 8), 24);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    ($value + $align - 1) & !($align - 1)
  };
}
