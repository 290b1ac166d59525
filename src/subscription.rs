//! The link between one publisher and one subscriber.
//!
//! A subscription is handed to a subscriber through
//! [`Subscriber::receive_subscription`](crate::subscriber::Subscriber). The
//! subscriber then pulls values with [`Subscription::request`] and may
//! [`Cancellable::cancel`] at any time. Both calls are safe from any thread,
//! any number of times, including after the stream terminated; once a
//! subscription is severed they are no-ops.

use std::sync::Arc;

use crate::{demand::Demand, identifier::Identifier};

mod any_cancellable;
mod empty;

pub use any_cancellable::AnyCancellable;
pub use empty::empty_subscription;

/// Something that can stop an activity and release its resources.
pub trait Cancellable {
  /// Idempotent and thread-safe.
  fn cancel(&self);
}

pub trait Subscription: Cancellable + Send + Sync {
  /// Ask for up to `demand` more values. Zero demand is a protocol violation.
  fn request(&self, demand: Demand);

  fn combine_identifier(&self) -> Identifier { Identifier::of_ref(self) }
}

/// A type-erased, shareable subscription handle.
pub type AnySubscription = Arc<dyn Subscription>;

impl<T: Cancellable + ?Sized> Cancellable for Arc<T> {
  #[inline]
  fn cancel(&self) { (**self).cancel() }
}

impl<T: Cancellable + ?Sized> Cancellable for Box<T> {
  #[inline]
  fn cancel(&self) { (**self).cancel() }
}

/// Where a subscriber stands with respect to its upstream.
pub(crate) enum SubscriptionStatus {
  AwaitingSubscription,
  Subscribed(AnySubscription),
  Terminal,
}

impl SubscriptionStatus {
  /// Take the subscription out, leaving the status terminal.
  pub(crate) fn terminate(&mut self) -> Option<AnySubscription> {
    match std::mem::replace(self, SubscriptionStatus::Terminal) {
      SubscriptionStatus::Subscribed(subscription) => Some(subscription),
      _ => None,
    }
  }
}
