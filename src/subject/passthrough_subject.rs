use std::{fmt, sync::Arc};

use super::{subject_core::SubjectCore, Subject};
use crate::{
  completion::Completion,
  publisher::Publisher,
  subscriber::{AnySubscriber, Subscriber},
  subscription::AnySubscription,
};

/// A subject that broadcasts values to its current subscribers without
/// remembering them.
///
/// Handles are cheap to clone and all clones drive the same subject. Once the
/// last handle is dropped, every subscriber is severed without a completion
/// and upstream subscriptions are cancelled.
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use rxcombine::prelude::*;
///
/// let subject = PassthroughSubject::<i32, Never>::new();
/// let seen = Arc::new(Mutex::new(vec![]));
/// let s = seen.clone();
/// let _token = subject.sink_value(move |v| s.lock().unwrap().push(v));
///
/// subject.send(1);
/// subject.send(2);
/// subject.send_completion(Completion::Finished);
/// subject.send(3);
/// assert_eq!(*seen.lock().unwrap(), [1, 2]);
/// ```
pub struct PassthroughSubject<Output, Failure> {
  core: Arc<SubjectCore<Output, Failure, ()>>,
}

impl<Output, Failure> PassthroughSubject<Output, Failure>
where
  Output: Clone + Send + 'static,
  Failure: Clone + Send + 'static,
{
  pub fn new() -> Self { PassthroughSubject { core: SubjectCore::new("PassthroughSubject", (), false) } }
}

impl<Output, Failure> Default for PassthroughSubject<Output, Failure>
where
  Output: Clone + Send + 'static,
  Failure: Clone + Send + 'static,
{
  fn default() -> Self { Self::new() }
}

impl<Output, Failure> Clone for PassthroughSubject<Output, Failure> {
  fn clone(&self) -> Self { PassthroughSubject { core: self.core.clone() } }
}

impl<Output, Failure> Publisher for PassthroughSubject<Output, Failure>
where
  Output: Clone + Send + 'static,
  Failure: Clone + Send + 'static,
{
  type Output = Output;
  type Failure = Failure;

  fn receive_subscriber<S>(&self, subscriber: S)
  where
    S: Subscriber<Self::Output, Self::Failure> + 'static,
  {
    self.core.receive(AnySubscriber::new(subscriber))
  }
}

impl<Output, Failure> Subject for PassthroughSubject<Output, Failure>
where
  Output: Clone + Send + 'static,
  Failure: Clone + Send + 'static,
{
  #[inline]
  fn send(&self, value: Output) { self.core.send(value) }

  #[inline]
  fn send_completion(&self, completion: Completion<Failure>) { self.core.send_completion(completion) }

  #[inline]
  fn send_subscription(&self, subscription: AnySubscription) {
    self.core.send_subscription(subscription)
  }
}

impl<Output, Failure> fmt::Debug for PassthroughSubject<Output, Failure> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("PassthroughSubject") }
}
