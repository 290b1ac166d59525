//! The producing side of the protocol.
//!
//! A publisher hands every subscriber a subscription synchronously from
//! [`Publisher::receive_subscriber`], then delivers values only against the
//! demand that subscriber has requested, and finally at most one completion.

use std::sync::Arc;

use crate::{
  completion::{Completion, Never},
  subject::Subject,
  subscriber::{Sink, SubjectSubscriber, Subscriber},
  subscription::AnyCancellable,
};

mod any_publisher;

pub use any_publisher::{AnyPublisher, DynPublisher};

#[cfg(feature = "futures-bridge")]
use crate::ops::into_stream::Values;

pub trait Publisher {
  type Output: Send + 'static;
  type Failure: Send + 'static;

  /// Attach `subscriber`. Implementations call its `receive_subscription`
  /// before returning.
  fn receive_subscriber<S>(&self, subscriber: S)
  where
    S: Subscriber<Self::Output, Self::Failure> + 'static;

  #[inline]
  fn subscribe<S>(&self, subscriber: S)
  where
    S: Subscriber<Self::Output, Self::Failure> + 'static,
  {
    self.receive_subscriber(subscriber)
  }

  /// Feed `subject` from this publisher.
  ///
  /// The subject decides how much to request upstream. Cancelling (or
  /// dropping) the returned token detaches the subject.
  fn subscribe_subject<S>(&self, subject: S) -> AnyCancellable
  where
    S: Subject<Output = Self::Output, Failure = Self::Failure> + 'static,
  {
    let subscriber = SubjectSubscriber::new(subject);
    self.subscribe(subscriber.clone());
    AnyCancellable::new(subscriber)
  }

  /// Request everything and hand it to closures.
  ///
  /// ```rust
  /// use rxcombine::prelude::*;
  ///
  /// let future = Future::<i32, &str>::new(|promise| promise.succeed(42));
  /// let _token = future.sink(|completion| assert!(completion.is_finished()), |v| {
  ///   assert_eq!(v, 42)
  /// });
  /// ```
  fn sink(
    &self,
    receive_completion: impl FnOnce(Completion<Self::Failure>) + Send + 'static,
    receive_value: impl Fn(Self::Output) + Send + Sync + 'static,
  ) -> AnyCancellable {
    let sink = Arc::new(Sink::new(receive_completion, receive_value));
    self.subscribe(sink.clone());
    AnyCancellable::new(sink)
  }

  /// [`sink`](Publisher::sink) for publishers that cannot fail.
  fn sink_value(&self, receive_value: impl Fn(Self::Output) + Send + Sync + 'static) -> AnyCancellable
  where
    Self: Publisher<Failure = Never>,
  {
    self.sink(|_| {}, receive_value)
  }

  /// Hide the concrete publisher type.
  fn erase(self) -> AnyPublisher<Self::Output, Self::Failure>
  where
    Self: Sized + Send + Sync + 'static,
  {
    AnyPublisher::new(self)
  }

  /// Pull values one at a time as a [`futures::Stream`].
  ///
  /// Each poll requests a single value, so the publisher never runs ahead of
  /// the consumer. Dropping the stream cancels the subscription.
  ///
  /// The stream ends only when the publisher completes. A subject dropped
  /// without sending a completion severs its subscribers silently, so a
  /// stream over it stays pending. A [`Future`](crate::future::Future) stays
  /// alive for as long as a subscriber waits on it, so its stream always
  /// ends even when built from a temporary.
  #[cfg(feature = "futures-bridge")]
  fn values(&self) -> Values<Self::Output, Self::Failure> { Values::new(self) }
}

impl<P: Publisher + ?Sized> Publisher for Arc<P> {
  type Output = P::Output;
  type Failure = P::Failure;

  #[inline]
  fn receive_subscriber<S>(&self, subscriber: S)
  where
    S: Subscriber<Self::Output, Self::Failure> + 'static,
  {
    (**self).receive_subscriber(subscriber)
  }
}
