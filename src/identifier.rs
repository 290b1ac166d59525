use std::{fmt, sync::Arc};

use parking_lot::{const_mutex, Mutex};

static NEXT_IDENTIFIER: Mutex<u64> = const_mutex(1);

/// An opaque token distinguishing subscriber and subscription instances.
///
/// Identifiers are either issued from a process-wide counter
/// ([`Identifier::new`]) or derived from the address of a live object
/// ([`Identifier::of`]). An address-derived identifier is only meaningful
/// while the object it was taken from is alive.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(u64);

impl Identifier {
  /// Issue a fresh identifier. Identifiers issued this way are unique for the
  /// lifetime of the process.
  pub fn new() -> Self {
    let mut next = NEXT_IDENTIFIER.lock();
    let id = *next;
    *next += 1;
    Identifier(id)
  }

  /// The identifier of the object behind a shared pointer.
  #[inline]
  pub fn of<T: ?Sized>(value: &Arc<T>) -> Self { Self::of_ref(&**value) }

  /// The identifier of the object at `value`'s address.
  #[inline]
  pub fn of_ref<T: ?Sized>(value: &T) -> Self {
    Identifier(value as *const T as *const () as usize as u64)
  }
}

impl Default for Identifier {
  fn default() -> Self { Self::new() }
}

impl fmt::Display for Identifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "0x{:x}", self.0) }
}

impl fmt::Debug for Identifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Identifier(0x{:x})", self.0)
  }
}
