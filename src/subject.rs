//! Subjects: publishers with an imperative `send` API, multicasting to every
//! attached subscriber.
//!
//! Every subscriber gets its own conduit with independent demand accounting.
//! A value sent while a subscriber has no outstanding demand is not buffered
//! for it. Completion is recorded once; later subscribers receive an inert
//! subscription followed by the recorded completion.

use std::sync::Arc;

use crate::{completion::Completion, publisher::Publisher, subscription::AnySubscription};

mod any_subject;
pub(crate) mod conduit_list;
mod current_value_subject;
mod passthrough_subject;
mod subject_core;

pub use any_subject::{AnySubject, DynSubject};
pub use current_value_subject::CurrentValueSubject;
pub use passthrough_subject::PassthroughSubject;

pub trait Subject: Publisher + Send + Sync {
  /// Deliver `value` to every subscriber with outstanding demand.
  fn send(&self, value: Self::Output);

  /// Terminate every subscriber. Only the first completion has any effect.
  fn send_completion(&self, completion: Completion<Self::Failure>);

  /// Attach an upstream subscription whose demand this subject manages.
  fn send_subscription(&self, subscription: AnySubscription);

  /// [`send`](Subject::send) for subjects that only signal that something
  /// happened.
  #[inline]
  fn send_unit(&self)
  where
    Self: Publisher<Output = ()>,
  {
    self.send(())
  }
}

impl<S: Subject + ?Sized> Subject for Arc<S> {
  #[inline]
  fn send(&self, value: Self::Output) { (**self).send(value) }

  #[inline]
  fn send_completion(&self, completion: Completion<Self::Failure>) {
    (**self).send_completion(completion)
  }

  #[inline]
  fn send_subscription(&self, subscription: AnySubscription) {
    (**self).send_subscription(subscription)
  }
}
