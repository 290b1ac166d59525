use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

/// Shared, mutable state handed between a subscriber and the handle that
/// observes it (a stream, a future, a test probe).
///
/// Cloning shares the same cell.
pub struct MutArc<T>(Arc<Mutex<T>>);

impl<T> MutArc<T> {
  pub fn own(t: T) -> Self { Self(Arc::new(Mutex::new(t))) }

  #[inline]
  pub fn rc_deref_mut(&self) -> MutexGuard<'_, T> { self.0.lock() }

  /// Number of live handles sharing this cell.
  #[inline]
  pub fn handle_count(&self) -> usize { Arc::strong_count(&self.0) }
}

impl<T> Clone for MutArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T: Default> Default for MutArc<T> {
  fn default() -> Self { Self::own(T::default()) }
}

impl<T> From<T> for MutArc<T> {
  fn from(t: T) -> Self { Self::own(t) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxcombine_macro::test]
  fn clones_share_the_cell() {
    let a = MutArc::own(1);
    let b = a.clone();
    *b.rc_deref_mut() += 1;
    assert_eq!(*a.rc_deref_mut(), 2);
    assert_eq!(a.handle_count(), 2);
  }
}
