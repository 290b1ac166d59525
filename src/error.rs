//! Error taxonomy.
//!
//! Two kinds of failure exist. Domain failures are ordinary values carried
//! downstream in [`Completion::Failure`](crate::completion::Completion) and
//! are never inspected here. Protocol violations are programmer errors in a
//! publisher or subscriber implementation; they are logged and turned into a
//! panic by [`violation`], never returned.

use thiserror::Error;

/// A broken publisher/subscriber contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
  /// `request` was called with `Demand::none()`.
  #[error("demand must not be zero")]
  ZeroDemand,

  /// A value arrived before `receive_subscription`.
  #[error("received a value before receiving a subscription")]
  ValueBeforeSubscription,

  /// A completion arrived before `receive_subscription`.
  #[error("received a completion before receiving a subscription")]
  UnexpectedCompletion,
}

/// Rejected conversion into a [`Demand`](crate::demand::Demand).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DemandError {
  #[error("demand cannot be negative, got {0}")]
  Negative(i64),
}

/// Abort on a protocol violation.
#[cold]
#[track_caller]
pub(crate) fn violation(violation: ProtocolViolation) -> ! {
  tracing::error!(%violation, "API violation");
  panic!("API Violation: {violation}")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxcombine_macro::test]
  fn messages() {
    assert_eq!(ProtocolViolation::ZeroDemand.to_string(), "demand must not be zero");
    assert_eq!(DemandError::Negative(-3).to_string(), "demand cannot be negative, got -3");
  }

  #[rxcombine_macro::test]
  #[should_panic(expected = "API Violation: received a value before receiving a subscription")]
  fn violation_panics() { violation(ProtocolViolation::ValueBeforeSubscription) }
}
