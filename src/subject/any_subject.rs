use std::{any::Any, fmt, sync::Arc};

use super::Subject;
use crate::{
  completion::Completion,
  demand::Demand,
  publisher::{AnyPublisher, DynPublisher, Publisher},
  subscriber::{AnySubscriber, Subscriber},
  subscription::{AnySubscription, Subscription},
};

/// Object-safe subject, the dynamic dispatch point behind [`AnySubject`].
pub trait DynSubject<Output, Failure>: DynPublisher<Output, Failure> {
  fn send_any(&self, value: Output);

  fn send_any_completion(&self, completion: Completion<Failure>);

  fn send_any_subscription(&self, subscription: AnySubscription);
}

impl<S, Output, Failure> DynSubject<Output, Failure> for S
where
  S: Subject<Output = Output, Failure = Failure>,
  Output: Send + 'static,
  Failure: Send + 'static,
{
  #[inline]
  fn send_any(&self, value: Output) { self.send(value) }

  #[inline]
  fn send_any_completion(&self, completion: Completion<Failure>) { self.send_completion(completion) }

  #[inline]
  fn send_any_subscription(&self, subscription: AnySubscription) {
    self.send_subscription(subscription)
  }
}

/// A type-erased subject.
///
/// Built either around a concrete [`Subject`] or from three closures
/// handling subscribe, send and send-completion. Every call is forwarded as
/// is, nothing is buffered or reordered on the way.
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use rxcombine::prelude::*;
///
/// let log = Arc::new(Mutex::new(vec![]));
/// let l = log.clone();
/// let subject = AnySubject::<i32, Never>::from_fns(|_| {}, move |v| l.lock().unwrap().push(v), |_| {});
/// subject.send(42);
/// assert_eq!(*log.lock().unwrap(), [42]);
/// ```
pub struct AnySubject<Output, Failure> {
  inner: Arc<dyn DynSubject<Output, Failure>>,
}

impl<Output, Failure> AnySubject<Output, Failure>
where
  Output: Send + 'static,
  Failure: Send + 'static,
{
  pub fn new<S>(subject: S) -> Self
  where
    S: Subject<Output = Output, Failure = Failure> + 'static,
  {
    if let Some(erased) = (&subject as &dyn Any).downcast_ref::<Self>() {
      return erased.clone();
    }
    AnySubject { inner: Arc::new(subject) }
  }

  /// A subject made of closures. Upstream subscriptions handed to it are
  /// asked for unlimited values.
  pub fn from_fns(
    subscribe: impl Fn(AnySubscriber<Output, Failure>) + Send + Sync + 'static,
    send: impl Fn(Output) + Send + Sync + 'static,
    send_completion: impl Fn(Completion<Failure>) + Send + Sync + 'static,
  ) -> Self {
    AnySubject {
      inner: Arc::new(ClosureSubject {
        subscribe: Box::new(subscribe),
        send: Box::new(send),
        send_completion: Box::new(send_completion),
      }),
    }
  }

  /// View this subject as a plain publisher.
  pub fn as_publisher(&self) -> AnyPublisher<Output, Failure> { AnyPublisher::new(self.clone()) }
}

impl<Output, Failure> AnySubject<Output, Failure> {
  /// Whether both handles wrap the same subject.
  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.inner, &other.inner) }
}

impl<Output, Failure> Clone for AnySubject<Output, Failure> {
  fn clone(&self) -> Self { AnySubject { inner: self.inner.clone() } }
}

impl<Output, Failure> Publisher for AnySubject<Output, Failure>
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
}

impl<Output, Failure> Subject for AnySubject<Output, Failure>
where
  Output: Send + 'static,
  Failure: Send + 'static,
{
  #[inline]
  fn send(&self, value: Output) { self.inner.send_any(value) }

  #[inline]
  fn send_completion(&self, completion: Completion<Failure>) {
    self.inner.send_any_completion(completion)
  }

  #[inline]
  fn send_subscription(&self, subscription: AnySubscription) {
    self.inner.send_any_subscription(subscription)
  }
}

impl<Output, Failure> fmt::Debug for AnySubject<Output, Failure> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("AnySubject") }
}

// ============================================================================
// ClosureSubject
// ============================================================================

struct ClosureSubject<Output, Failure> {
  subscribe: Box<dyn Fn(AnySubscriber<Output, Failure>) + Send + Sync>,
  send: Box<dyn Fn(Output) + Send + Sync>,
  send_completion: Box<dyn Fn(Completion<Failure>) + Send + Sync>,
}

impl<Output, Failure> Publisher for ClosureSubject<Output, Failure>
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
    (self.subscribe)(AnySubscriber::new(subscriber))
  }
}

impl<Output, Failure> Subject for ClosureSubject<Output, Failure>
where
  Output: Send + 'static,
  Failure: Send + 'static,
{
  fn send(&self, value: Output) { (self.send)(value) }

  fn send_completion(&self, completion: Completion<Failure>) { (self.send_completion)(completion) }

  fn send_subscription(&self, subscription: AnySubscription) {
    subscription.request(Demand::unlimited())
  }
}

#[cfg(test)]
mod tests {
  use parking_lot::Mutex;

  use super::*;
  use crate::{identifier::Identifier, prelude::*};

  #[derive(Debug, Clone, PartialEq)]
  enum Event {
    Subscriber(Identifier),
    Value(i32),
    Completion(Completion<&'static str>),
  }

  /// Records every call without acting on it.
  #[derive(Default)]
  struct TrackingSubject {
    history: Mutex<Vec<Event>>,
  }

  impl Publisher for TrackingSubject {
    type Output = i32;
    type Failure = &'static str;

    fn receive_subscriber<S>(&self, subscriber: S)
    where
      S: Subscriber<Self::Output, Self::Failure> + 'static,
    {
      self.history.lock().push(Event::Subscriber(subscriber.combine_identifier()));
    }
  }

  impl Subject for TrackingSubject {
    fn send(&self, value: i32) { self.history.lock().push(Event::Value(value)) }

    fn send_completion(&self, completion: Completion<&'static str>) {
      self.history.lock().push(Event::Completion(completion))
    }

    fn send_subscription(&self, _: AnySubscription) {}
  }

  fn exercise(erased: &AnySubject<i32, &'static str>) -> Identifier {
    let subscriber = AnySubscriber::<i32, &'static str>::from_fns(|_| {}, |_| Demand::none(), |_| {});
    let id = subscriber.combine_identifier();
    erased.subscribe(subscriber.clone());
    erased.send(42);
    erased.send_completion(Completion::Finished);
    erased.send_completion(Completion::Failure("f"));
    erased.send(12);
    erased.subscribe(subscriber);
    id
  }

  #[rxcombine_macro::test]
  fn erase_subject() {
    let subject = Arc::new(TrackingSubject::default());
    let erased = AnySubject::new(subject.clone());
    let id = exercise(&erased);
    assert_eq!(
      *subject.history.lock(),
      [
        Event::Subscriber(id),
        Event::Value(42),
        Event::Completion(Completion::Finished),
        Event::Completion(Completion::Failure("f")),
        Event::Value(12),
        Event::Subscriber(id),
      ]
    );
  }

  #[rxcombine_macro::test]
  fn closure_based_subject() {
    let events = Arc::new(Mutex::new(vec![]));
    let (e1, e2, e3) = (events.clone(), events.clone(), events.clone());
    let erased = AnySubject::<i32, &'static str>::from_fns(
      move |s| e1.lock().push(Event::Subscriber(s.combine_identifier())),
      move |v| e2.lock().push(Event::Value(v)),
      move |c| e3.lock().push(Event::Completion(c)),
    );
    let id = exercise(&erased);
    assert_eq!(
      *events.lock(),
      [
        Event::Subscriber(id),
        Event::Value(42),
        Event::Completion(Completion::Finished),
        Event::Completion(Completion::Failure("f")),
        Event::Value(12),
        Event::Subscriber(id),
      ]
    );
  }

  #[rxcombine_macro::test]
  fn double_erasure_is_idempotent() {
    let erased = AnySubject::new(PassthroughSubject::<i32, &'static str>::new());
    let twice = AnySubject::new(erased.clone());
    assert!(erased.ptr_eq(&twice));
  }

  #[rxcombine_macro::test]
  fn wraps_a_real_subject() {
    let subject = PassthroughSubject::<i32, Never>::new();
    let erased = AnySubject::new(subject.clone());
    let seen = Arc::new(Mutex::new(vec![]));
    let s = seen.clone();
    let _token = erased.as_publisher().sink_value(move |v| s.lock().push(v));
    erased.send(1);
    subject.send(2);
    assert_eq!(*seen.lock(), [1, 2]);
  }
}
