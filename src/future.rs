//! A publisher that eventually produces a single value and then finishes,
//! or fails.
//!
//! The closure handed to [`Future::new`] runs immediately and receives a
//! [`Promise`]. The first call to the promise fixes the result; later calls
//! are ignored. Every subscriber, whether it attached before or after the
//! promise was fulfilled, sees the same result once it has requested demand.
//! A failure needs no demand.
//!
//! ```rust
//! use rxcombine::prelude::*;
//!
//! let future = Future::<i32, &str>::new(|promise| promise.succeed(42));
//! let _token = future.sink(
//!   |completion| assert_eq!(completion, Completion::Finished),
//!   |v| assert_eq!(v, 42),
//! );
//! ```

use std::{fmt, sync::Arc};

use parking_lot::{Mutex, ReentrantMutex};

#[cfg(feature = "futures-bridge")]
use crate::ops::into_future::FutureValue;
use crate::{
  completion::Completion,
  demand::Demand,
  publisher::Publisher,
  subject::conduit_list::ConduitList,
  subscriber::{AnySubscriber, Subscriber},
  subscription::{Cancellable, Subscription},
};

pub struct Future<Output, Failure> {
  core: Arc<FutureCore<Output, Failure>>,
}

/// The resolving side of a [`Future`].
///
/// Clones resolve the same future; whichever call comes first wins.
pub struct Promise<Output, Failure> {
  core: Arc<FutureCore<Output, Failure>>,
}

impl<Output, Failure> Future<Output, Failure>
where
  Output: Clone + Send + 'static,
  Failure: Clone + Send + 'static,
{
  pub fn new(attempt_to_fulfill: impl FnOnce(Promise<Output, Failure>)) -> Self {
    let core = Arc::new(FutureCore {
      state: Mutex::new(FutureState { result: None, conduits: ConduitList::default() }),
    });
    attempt_to_fulfill(Promise { core: core.clone() });
    Future { core }
  }

  /// Whether the promise has been fulfilled.
  pub fn is_resolved(&self) -> bool { self.core.result().is_some() }

  /// Await the result.
  ///
  /// The returned future subscribes when created and requests a single
  /// value. Dropping it before it resolves cancels that subscription.
  #[cfg(feature = "futures-bridge")]
  pub fn value(&self) -> FutureValue<Output, Failure> { FutureValue::new(self) }
}

impl<Output, Failure> Promise<Output, Failure>
where
  Output: Clone + Send + 'static,
  Failure: Clone + Send + 'static,
{
  pub fn resolve(&self, result: Result<Output, Failure>) { self.core.resolve(result) }

  #[inline]
  pub fn succeed(&self, value: Output) { self.resolve(Ok(value)) }

  #[inline]
  pub fn fail(&self, failure: Failure) { self.resolve(Err(failure)) }
}

impl<Output, Failure> Clone for Future<Output, Failure> {
  fn clone(&self) -> Self { Future { core: self.core.clone() } }
}

impl<Output, Failure> Clone for Promise<Output, Failure> {
  fn clone(&self) -> Self { Promise { core: self.core.clone() } }
}

impl<Output, Failure> Publisher for Future<Output, Failure>
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

impl<Output, Failure> fmt::Debug for Future<Output, Failure> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("Future") }
}

impl<Output, Failure> fmt::Debug for Promise<Output, Failure> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("Promise") }
}

// ============================================================================
// FutureCore
// ============================================================================

struct FutureCore<O, F> {
  state: Mutex<FutureState<O, F>>,
}

struct FutureState<O, F> {
  result: Option<Result<O, F>>,
  /// Conduits stay registered until they delivered the result or were
  /// cancelled. Each holds the core alive until then, so a result is never
  /// lost to a subscriber that asks for it after the handles are gone.
  conduits: ConduitList<Arc<FutureConduit<O, F>>>,
}

impl<O, F> FutureCore<O, F>
where
  O: Clone + Send + 'static,
  F: Clone + Send + 'static,
{
  fn result(&self) -> Option<Result<O, F>> { self.state.lock().result.clone() }

  fn resolve(&self, result: Result<O, F>) {
    let conduits = {
      let mut state = self.state.lock();
      if state.result.is_some() {
        return;
      }
      state.result = Some(result.clone());
      state.conduits.snapshot()
    };
    tracing::debug!(subscribers = conduits.len(), success = result.is_ok(), "future resolved");
    for conduit in conduits {
      conduit.fulfill(&result);
    }
  }

  fn receive(self: &Arc<Self>, subscriber: AnySubscriber<O, F>) {
    let (conduit, result) = {
      let mut state = self.state.lock();
      let slot = state.conduits.reserve_slot();
      let conduit = Arc::new(FutureConduit::new(slot, self.clone(), subscriber.clone()));
      state.conduits.insert(slot, conduit.clone());
      (conduit, state.result.clone())
    };

    {
      let _guard = conduit.downstream_lock.lock();
      subscriber.receive_subscription(conduit.clone());
    }
    if let Some(result) = result {
      conduit.fulfill(&result);
    }
  }

  fn disassociate(&self, slot: usize) {
    let removed = self.state.lock().conduits.remove(slot);
    drop(removed);
  }
}

// ============================================================================
// FutureConduit
// ============================================================================

struct FutureConduit<O, F> {
  slot: usize,
  state: Mutex<FutureConduitState<O, F>>,
  downstream_lock: ReentrantMutex<()>,
}

struct FutureConduitState<O, F> {
  /// Taken once the conduit delivered or was cancelled.
  parent: Option<Arc<FutureCore<O, F>>>,
  downstream: Option<AnySubscriber<O, F>>,
  has_any_demand: bool,
}

impl<O, F> FutureConduit<O, F> {
  fn new(slot: usize, parent: Arc<FutureCore<O, F>>, downstream: AnySubscriber<O, F>) -> Self {
    FutureConduit {
      slot,
      state: Mutex::new(FutureConduitState {
        parent: Some(parent),
        downstream: Some(downstream),
        has_any_demand: false,
      }),
      downstream_lock: ReentrantMutex::new(()),
    }
  }
}

impl<O, F> FutureConduit<O, F>
where
  O: Clone + Send + 'static,
  F: Clone + Send + 'static,
{
  /// Deliver `result` unless it is a value nobody asked for yet.
  fn fulfill(&self, result: &Result<O, F>) {
    let (downstream, parent) = {
      let mut state = self.state.lock();
      if state.downstream.is_none() || (result.is_ok() && !state.has_any_demand) {
        return;
      }
      (state.downstream.take(), state.parent.take())
    };
    let Some(downstream) = downstream else { return };

    {
      let _guard = self.downstream_lock.lock();
      match result {
        Ok(value) => {
          let _ = downstream.receive(value.clone());
          downstream.receive_completion(Completion::Finished);
        }
        Err(failure) => downstream.receive_completion(Completion::Failure(failure.clone())),
      }
    }
    if let Some(parent) = parent {
      parent.disassociate(self.slot);
    }
  }
}

impl<O, F> Subscription for FutureConduit<O, F>
where
  O: Clone + Send + 'static,
  F: Clone + Send + 'static,
{
  fn request(&self, demand: Demand) {
    demand.assert_non_zero();
    let parent = {
      let mut state = self.state.lock();
      if state.downstream.is_none() {
        return;
      }
      state.has_any_demand = true;
      state.parent.clone()
    };
    let result = parent.and_then(|parent| parent.result());
    if let Some(result) = result {
      self.fulfill(&result);
    }
  }
}

impl<O, F> Cancellable for FutureConduit<O, F>
where
  O: Clone + Send + 'static,
  F: Clone + Send + 'static,
{
  fn cancel(&self) {
    let (downstream, parent) = {
      let mut state = self.state.lock();
      (state.downstream.take(), state.parent.take())
    };
    if downstream.is_none() {
      return;
    }
    tracing::trace!(slot = self.slot, "future conduit cancelled");
    drop(downstream);
    if let Some(parent) = parent {
      parent.disassociate(self.slot);
    }
  }
}
