// ABOUTME: Sealed trait pattern for runtime traits.
// ABOUTME: Only the bollard adapter, the lazy wrapper and test fakes implement them.

/// Sealed supertrait of every runtime capability trait.
///
/// Keeping it crate-private lets the capability traits grow new methods
/// without breaking downstream code.
pub trait Sealed {}
