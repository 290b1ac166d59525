use std::sync::Arc;

use once_cell::sync::Lazy;

use super::{AnySubscription, Cancellable, Subscription};
use crate::{demand::Demand, identifier::Identifier};

struct EmptySubscription {
  identifier: Identifier,
}

impl Cancellable for EmptySubscription {
  fn cancel(&self) {}
}

impl Subscription for EmptySubscription {
  fn request(&self, _demand: Demand) {}

  fn combine_identifier(&self) -> Identifier { self.identifier }
}

static EMPTY: Lazy<AnySubscription> =
  Lazy::new(|| Arc::new(EmptySubscription { identifier: Identifier::new() }));

/// The inert subscription: requests and cancels are ignored.
///
/// Handed to subscribers of a producer that has already terminated, right
/// before the recorded completion is replayed to them. Every call returns the
/// same instance.
pub fn empty_subscription() -> AnySubscription { Arc::clone(&EMPTY) }
