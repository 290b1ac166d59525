use std::{any::Any, fmt, sync::Arc};

use crate::{
  completion::Completion, demand::Demand, identifier::Identifier, subject::Subject,
  subscription::AnySubscription,
};

use super::Subscriber;

/// A type-erased subscriber.
///
/// Forwards every protocol call to the subscriber it wraps, exactly and in
/// order. Erasing an `AnySubscriber` again returns a clone of the same box.
/// Clones share the wrapped subscriber and its identifier.
pub struct AnySubscriber<Input, Failure> {
  inner: Arc<dyn Subscriber<Input, Failure>>,
  identifier: Identifier,
}

impl<Input: 'static, Failure: 'static> AnySubscriber<Input, Failure> {
  pub fn new<S>(subscriber: S) -> Self
  where
    S: Subscriber<Input, Failure> + 'static,
  {
    if let Some(erased) = (&subscriber as &dyn Any).downcast_ref::<Self>() {
      return erased.clone();
    }
    let inner: Arc<dyn Subscriber<Input, Failure>> = Arc::new(subscriber);
    // Taken after boxing so address-derived identifiers stay valid.
    let identifier = inner.combine_identifier();
    AnySubscriber { inner, identifier }
  }

  /// An anonymous subscriber built from three callbacks.
  pub fn from_fns(
    receive_subscription: impl Fn(AnySubscription) + Send + Sync + 'static,
    receive_value: impl Fn(Input) -> Demand + Send + Sync + 'static,
    receive_completion: impl Fn(Completion<Failure>) + Send + Sync + 'static,
  ) -> Self {
    let inner = ClosureSubscriber {
      receive_subscription: Box::new(receive_subscription),
      receive_value: Box::new(receive_value),
      receive_completion: Box::new(receive_completion),
    };
    AnySubscriber { inner: Arc::new(inner), identifier: Identifier::new() }
  }

  /// A subscriber that forwards into `subject`.
  ///
  /// The upstream subscription is handed to the subject, values go to
  /// [`Subject::send`] and the subscriber always asks for unlimited more,
  /// since a subject applies no backpressure of its own.
  pub fn from_subject<S>(subject: S) -> Self
  where
    S: Subject<Output = Input, Failure = Failure> + 'static,
  {
    let subject = Arc::new(subject);
    let on_subscription = subject.clone();
    let on_value = subject.clone();
    Self::from_fns(
      move |subscription| on_subscription.send_subscription(subscription),
      move |value| {
        on_value.send(value);
        Demand::unlimited()
      },
      move |completion| subject.send_completion(completion),
    )
  }
}

impl<Input, Failure> AnySubscriber<Input, Failure> {
  /// Whether both handles forward to the same subscriber.
  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.inner, &other.inner) }
}

impl<Input, Failure> Clone for AnySubscriber<Input, Failure> {
  fn clone(&self) -> Self {
    AnySubscriber { inner: self.inner.clone(), identifier: self.identifier }
  }
}

impl<Input, Failure> Subscriber<Input, Failure> for AnySubscriber<Input, Failure> {
  #[inline]
  fn receive_subscription(&self, subscription: AnySubscription) {
    self.inner.receive_subscription(subscription)
  }

  #[inline]
  fn receive(&self, input: Input) -> Demand { self.inner.receive(input) }

  #[inline]
  fn receive_completion(&self, completion: Completion<Failure>) {
    self.inner.receive_completion(completion)
  }

  #[inline]
  fn combine_identifier(&self) -> Identifier { self.identifier }
}

impl<Input, Failure> fmt::Debug for AnySubscriber<Input, Failure> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("AnySubscriber").field(&self.identifier).finish()
  }
}

struct ClosureSubscriber<Input, Failure> {
  receive_subscription: Box<dyn Fn(AnySubscription) + Send + Sync>,
  receive_value: Box<dyn Fn(Input) -> Demand + Send + Sync>,
  receive_completion: Box<dyn Fn(Completion<Failure>) + Send + Sync>,
}

impl<Input, Failure> Subscriber<Input, Failure> for ClosureSubscriber<Input, Failure> {
  fn receive_subscription(&self, subscription: AnySubscription) {
    (self.receive_subscription)(subscription)
  }

  fn receive(&self, input: Input) -> Demand { (self.receive_value)(input) }

  fn receive_completion(&self, completion: Completion<Failure>) {
    (self.receive_completion)(completion)
  }
}
