use std::{
  collections::HashSet,
  fmt,
  hash::{Hash, Hasher},
};

use parking_lot::Mutex;

use super::Cancellable;
use crate::identifier::Identifier;

type CancelFn = Box<dyn FnOnce() + Send>;

/// A type-erased cancellation token.
///
/// The wrapped cancellation runs at most once: on the first call to
/// [`cancel`](Cancellable::cancel), or when the token is dropped. Keep the
/// token alive for as long as the activity it guards should run.
///
/// ```rust
/// use rxcombine::prelude::*;
///
/// let subject = PassthroughSubject::<i32, Never>::new();
/// let mut bag = Vec::new();
/// subject.sink_value(|v| println!("{v}")).store(&mut bag);
/// subject.send(1);
/// bag.clear(); // cancels
/// ```
pub struct AnyCancellable {
  identifier: Identifier,
  cancel: Mutex<Option<CancelFn>>,
}

impl AnyCancellable {
  /// Wrap anything cancellable.
  pub fn new<C: Cancellable + Send + 'static>(cancellable: C) -> Self {
    Self::from_fn(move || cancellable.cancel())
  }

  /// Wrap a cancellation closure.
  pub fn from_fn(cancel: impl FnOnce() + Send + 'static) -> Self {
    AnyCancellable { identifier: Identifier::new(), cancel: Mutex::new(Some(Box::new(cancel))) }
  }

  /// Move this token into a collection, keeping it alive.
  pub fn store(self, collection: &mut Vec<AnyCancellable>) { collection.push(self); }

  pub fn store_in_set(self, set: &mut HashSet<AnyCancellable>) { set.insert(self); }

  #[inline]
  pub fn is_cancelled(&self) -> bool { self.cancel.lock().is_none() }

  /// Drop the token without cancelling what it guards.
  pub fn detach(self) { self.cancel.lock().take(); }
}

impl Cancellable for AnyCancellable {
  fn cancel(&self) {
    // Released before running, so the closure may touch this token again.
    let cancel = self.cancel.lock().take();
    if let Some(cancel) = cancel {
      cancel();
    }
  }
}

impl Drop for AnyCancellable {
  fn drop(&mut self) {
    if let Some(cancel) = self.cancel.get_mut().take() {
      cancel();
    }
  }
}

impl PartialEq for AnyCancellable {
  fn eq(&self, other: &Self) -> bool { self.identifier == other.identifier }
}

impl Eq for AnyCancellable {}

impl Hash for AnyCancellable {
  fn hash<H: Hasher>(&self, state: &mut H) { self.identifier.hash(state) }
}

impl fmt::Debug for AnyCancellable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AnyCancellable")
      .field("identifier", &self.identifier)
      .field("cancelled", &self.is_cancelled())
      .finish()
  }
}
