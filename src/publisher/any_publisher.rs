use std::{any::Any, fmt, sync::Arc};

use super::Publisher;
use crate::subscriber::{AnySubscriber, Subscriber};

// ============================================================================
// DynPublisher Trait
// ============================================================================

/// Object-safe publisher, the dynamic dispatch point behind [`AnyPublisher`].
///
/// Subscribers cross this boundary already erased.
pub trait DynPublisher<Output, Failure>: Send + Sync {
  fn receive_any_subscriber(&self, subscriber: AnySubscriber<Output, Failure>);
}

impl<P, Output, Failure> DynPublisher<Output, Failure> for P
where
  P: Publisher<Output = Output, Failure = Failure> + Send + Sync,
  Output: Send + 'static,
  Failure: Send + 'static,
{
  #[inline]
  fn receive_any_subscriber(&self, subscriber: AnySubscriber<Output, Failure>) {
    self.receive_subscriber(subscriber)
  }
}

// ============================================================================
// AnyPublisher
// ============================================================================

/// A type-erased publisher.
///
/// Erasing an `AnyPublisher` again yields a handle to the same box rather
/// than wrapping it a second time. Clones share the wrapped publisher.
///
/// ```rust
/// use rxcombine::prelude::*;
///
/// let subject = PassthroughSubject::<i32, Never>::new();
/// let erased: AnyPublisher<i32, Never> = subject.clone().erase();
/// let again = erased.clone().erase();
/// assert!(erased.ptr_eq(&again));
/// ```
pub struct AnyPublisher<Output, Failure> {
  inner: Arc<dyn DynPublisher<Output, Failure>>,
}

impl<Output, Failure> AnyPublisher<Output, Failure>
where
  Output: Send + 'static,
  Failure: Send + 'static,
{
  pub fn new<P>(publisher: P) -> Self
  where
    P: Publisher<Output = Output, Failure = Failure> + Send + Sync + 'static,
  {
    if let Some(erased) = (&publisher as &dyn Any).downcast_ref::<Self>() {
      return erased.clone();
    }
    AnyPublisher { inner: Arc::new(publisher) }
  }
}

impl<Output, Failure> AnyPublisher<Output, Failure> {
  /// Whether both handles wrap the same publisher.
  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.inner, &other.inner) }
}

impl<Output, Failure> Clone for AnyPublisher<Output, Failure> {
  fn clone(&self) -> Self { AnyPublisher { inner: self.inner.clone() } }
}

impl<Output, Failure> Publisher for AnyPublisher<Output, Failure>
where
  Output: Send + 'static,
  Failure: Send + 'static,
{
  type Output = Output;
  type Failure = Failure;

  fn receive_subscriber<S>(&self, subscriber: S)
  where
    S: Subscriber<Self::Output, Self::Failure> + 'static,
  {
    self.inner.receive_any_subscriber(AnySubscriber::new(subscriber))
  }

  fn erase(self) -> AnyPublisher<Output, Failure> { self }
}

impl<Output, Failure> fmt::Debug for AnyPublisher<Output, Failure> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("AnyPublisher") }
}
