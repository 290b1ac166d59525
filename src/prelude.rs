//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Async bridges
#[cfg(feature = "futures-bridge")]
pub use crate::ops::{FutureValue, Values};
// Core traits and their erased forms
pub use crate::publisher::{AnyPublisher, DynPublisher, Publisher};
// Subjects
pub use crate::subject::{AnySubject, CurrentValueSubject, DynSubject, PassthroughSubject, Subject};
// Subscribers
pub use crate::subscriber::{AnySubscriber, Sink, SubjectSubscriber, Subscriber};
// Subscriptions
pub use crate::subscription::{
  empty_subscription, AnyCancellable, AnySubscription, Cancellable, Subscription,
};
pub use crate::{
  completion::{Completion, Never},
  demand::Demand,
  error::{DemandError, ProtocolViolation},
  future::{Future, Promise},
  identifier::Identifier,
};
