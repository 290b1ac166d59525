//! The consuming side of the protocol.
//!
//! A subscriber sees, in this order and on any thread:
//!
//! 1. exactly one `receive_subscription`,
//! 2. zero or more `receive`, each bounded by the demand it has requested,
//! 3. at most one `receive_completion`.
//!
//! Methods take `&self`: a subscriber is shared between the producer that
//! feeds it and whoever holds its subscription, and a callback may re-enter
//! the producer synchronously. Implementations keep their state behind
//! interior mutability.

use std::sync::Arc;

use crate::{
  completion::Completion, demand::Demand, identifier::Identifier, subscription::AnySubscription,
};

mod any_subscriber;
mod sink;
mod subject_subscriber;

pub use any_subscriber::AnySubscriber;
pub use sink::Sink;
pub use subject_subscriber::SubjectSubscriber;

pub trait Subscriber<Input, Failure>: Send + Sync {
  fn receive_subscription(&self, subscription: AnySubscription);

  /// Deliver one value. The returned demand is added to what is outstanding.
  fn receive(&self, input: Input) -> Demand;

  fn receive_completion(&self, completion: Completion<Failure>);

  fn combine_identifier(&self) -> Identifier { Identifier::of_ref(self) }
}

impl<Input, Failure, S> Subscriber<Input, Failure> for Arc<S>
where
  S: Subscriber<Input, Failure> + ?Sized,
{
  #[inline]
  fn receive_subscription(&self, subscription: AnySubscription) {
    (**self).receive_subscription(subscription)
  }

  #[inline]
  fn receive(&self, input: Input) -> Demand { (**self).receive(input) }

  #[inline]
  fn receive_completion(&self, completion: Completion<Failure>) {
    (**self).receive_completion(completion)
  }

  #[inline]
  fn combine_identifier(&self) -> Identifier { (**self).combine_identifier() }
}
