//! Shared machinery of the multicast subjects.
//!
//! A [`SubjectCore`] owns one [`Conduit`] per subscriber. Conduits point back
//! at the core weakly, so dropping the last subject handle drops the core,
//! which severs every conduit and cancels upstream.
//!
//! Lock discipline: the core lock and each conduit lock are only held to
//! read or update bookkeeping, never across a call into user code. A conduit
//! may take the core lock while holding its own, never the other way round.
//! Calls into one downstream are serialised by that conduit's re-entrant
//! `downstream_lock`, so a subscriber may call back into the subject from
//! inside its own callback. No strong reference to the core is ever dropped
//! while a conduit lock is held.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex};

use super::conduit_list::{ConduitList, Snapshot};
use crate::{
  completion::Completion,
  demand::Demand,
  subscriber::{AnySubscriber, Subscriber},
  subscription::{empty_subscription, AnySubscription, Cancellable, Subscription},
};

// ============================================================================
// Current value slot
// ============================================================================

/// What a subject remembers of the values sent through it.
pub(crate) trait ValueSlot<O>: Send + 'static {
  fn store(&mut self, value: &O);

  /// The value offered to a conduit that has not seen the latest one.
  fn replay(&self) -> Option<O>;
}

/// Remembers nothing.
impl<O> ValueSlot<O> for () {
  #[inline]
  fn store(&mut self, _: &O) {}

  #[inline]
  fn replay(&self) -> Option<O> { None }
}

/// Remembers the latest value.
pub(crate) struct Latest<O>(pub(crate) O);

impl<O: Clone + Send + 'static> ValueSlot<O> for Latest<O> {
  #[inline]
  fn store(&mut self, value: &O) { self.0 = value.clone(); }

  #[inline]
  fn replay(&self) -> Option<O> { Some(self.0.clone()) }
}

// ============================================================================
// SubjectCore
// ============================================================================

pub(crate) struct SubjectCore<O, F, V> {
  kind: &'static str,
  state: Mutex<SubjectState<O, F, V>>,
}

pub(crate) struct SubjectState<O, F, V> {
  completion: Option<Completion<F>>,
  conduits: ConduitList<Arc<Conduit<O, F, V>>>,
  upstream: Vec<AnySubscription>,
  /// Set once any downstream asked for values; from then on every upstream
  /// subscription is asked for unlimited.
  has_any_downstream_demand: bool,
  pub(crate) current: V,
  /// Bumped by every value sent, so a conduit can tell the value it
  /// replayed from the same value arriving through `send`.
  sequence: u64,
}

impl<O, F, V> SubjectCore<O, F, V>
where
  O: Clone + Send + 'static,
  F: Clone + Send + 'static,
  V: ValueSlot<O>,
{
  /// `eager_upstream` asks upstream for unlimited as soon as it attaches,
  /// rather than waiting for downstream demand.
  pub(crate) fn new(kind: &'static str, current: V, eager_upstream: bool) -> Arc<Self> {
    Arc::new(SubjectCore {
      kind,
      state: Mutex::new(SubjectState {
        completion: None,
        conduits: ConduitList::default(),
        upstream: Vec::new(),
        has_any_downstream_demand: eager_upstream,
        current,
        sequence: 0,
      }),
    })
  }

  pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut SubjectState<O, F, V>) -> R) -> R {
    f(&mut self.state.lock())
  }

  pub(crate) fn receive(self: &Arc<Self>, subscriber: AnySubscriber<O, F>) {
    let mut state = self.state.lock();
    if let Some(completion) = state.completion.clone() {
      drop(state);
      tracing::debug!(subject = self.kind, "late subscriber, replaying completion");
      subscriber.receive_subscription(empty_subscription());
      subscriber.receive_completion(completion);
      return;
    }

    let slot = state.conduits.reserve_slot();
    let conduit = Arc::new(Conduit::new(slot, Arc::downgrade(self), subscriber.clone()));
    state.conduits.insert(slot, conduit.clone());
    drop(state);

    let _guard = conduit.downstream_lock.lock();
    subscriber.receive_subscription(conduit.clone());
  }

  #[inline]
  pub(crate) fn send(&self, value: O) { self.publish(value, false) }

  /// Store `value` as the latest even after completion, then send it.
  #[inline]
  pub(crate) fn set_value(&self, value: O) { self.publish(value, true) }

  fn publish(&self, value: O, store_when_completed: bool) {
    let (conduits, sequence) = {
      let mut state = self.state.lock();
      if state.completion.is_some() {
        if store_when_completed {
          state.current.store(&value);
        }
        return;
      }
      state.current.store(&value);
      state.sequence += 1;
      (state.conduits.snapshot(), state.sequence)
    };
    offer_all(conduits, value, sequence);
  }

  pub(crate) fn send_completion(&self, completion: Completion<F>) {
    let (subscribers, conduits) = {
      let mut state = self.state.lock();
      if state.completion.is_some() {
        return;
      }
      state.completion = Some(completion.clone());
      (state.conduits.len(), state.conduits.take())
    };
    tracing::debug!(
      subject = self.kind,
      subscribers,
      finished = completion.is_finished(),
      "subject completed"
    );
    finish_all(conduits, completion);
  }

  pub(crate) fn send_subscription(&self, subscription: AnySubscription) {
    let request = {
      let mut state = self.state.lock();
      state.upstream.push(subscription.clone());
      state.has_any_downstream_demand
    };
    if request {
      subscription.request(Demand::unlimited());
    }
  }

  fn acknowledge_downstream_demand(&self) {
    let upstream = {
      let mut state = self.state.lock();
      if state.has_any_downstream_demand {
        return;
      }
      state.has_any_downstream_demand = true;
      state.upstream.clone()
    };
    for subscription in upstream {
      subscription.request(Demand::unlimited());
    }
  }

  fn replay(&self) -> Option<(O, u64)> {
    let state = self.state.lock();
    state.current.replay().map(|value| (value, state.sequence))
  }

  fn disassociate(&self, slot: usize) {
    let removed = {
      let mut state = self.state.lock();
      if state.completion.is_some() {
        return;
      }
      state.conduits.remove(slot)
    };
    drop(removed);
  }
}

impl<O, F, V> Drop for SubjectCore<O, F, V> {
  fn drop(&mut self) {
    let state = self.state.get_mut();
    if !state.conduits.is_empty() || !state.upstream.is_empty() {
      tracing::debug!(subject = self.kind, "subject dropped, severing subscribers");
    }
    let conduits = state.conduits.take();
    let upstream = std::mem::take(&mut state.upstream);
    for conduit in conduits {
      conduit.sever();
    }
    for subscription in upstream {
      subscription.cancel();
    }
  }
}

/// Offer one value to every conduit, cloning for all but the last.
fn offer_all<O, F, V>(conduits: Snapshot<Arc<Conduit<O, F, V>>>, value: O, sequence: u64)
where
  O: Clone + Send + 'static,
  F: Clone + Send + 'static,
  V: ValueSlot<O>,
{
  let mut iter = conduits.into_iter().peekable();
  while let Some(conduit) = iter.next() {
    if iter.peek().is_some() {
      conduit.offer(value.clone(), sequence);
    } else {
      conduit.offer(value, sequence);
      break;
    }
  }
}

fn finish_all<O, F, V>(conduits: Snapshot<Arc<Conduit<O, F, V>>>, completion: Completion<F>)
where
  O: Clone + Send + 'static,
  F: Clone + Send + 'static,
  V: ValueSlot<O>,
{
  let mut iter = conduits.into_iter().peekable();
  while let Some(conduit) = iter.next() {
    if iter.peek().is_some() {
      conduit.finish(completion.clone());
    } else {
      conduit.finish(completion);
      break;
    }
  }
}

// ============================================================================
// Conduit
// ============================================================================

/// The subscription a subject hands to one subscriber.
pub(crate) struct Conduit<O, F, V> {
  slot: usize,
  state: Mutex<ConduitState<O, F, V>>,
  downstream_lock: ReentrantMutex<()>,
}

struct ConduitState<O, F, V> {
  /// `None` once severed.
  parent: Option<Weak<SubjectCore<O, F, V>>>,
  downstream: Option<AnySubscriber<O, F>>,
  demand: Demand,
  delivered_current_value: bool,
  /// Sequence of the last value handed over by a replay.
  replayed: Option<u64>,
}

impl<O, F, V> Conduit<O, F, V> {
  fn new(
    slot: usize,
    parent: Weak<SubjectCore<O, F, V>>,
    downstream: AnySubscriber<O, F>,
  ) -> Self {
    Conduit {
      slot,
      state: Mutex::new(ConduitState {
        parent: Some(parent),
        downstream: Some(downstream),
        demand: Demand::none(),
        delivered_current_value: false,
        replayed: None,
      }),
      downstream_lock: ReentrantMutex::new(()),
    }
  }

  /// Drop both references without notifying downstream.
  fn sever(&self) {
    let downstream = {
      let mut state = self.state.lock();
      state.parent = None;
      state.downstream.take()
    };
    if downstream.is_some() {
      tracing::trace!(slot = self.slot, "conduit severed");
    }
  }
}

impl<O, F, V> Conduit<O, F, V>
where
  O: Clone + Send + 'static,
  F: Clone + Send + 'static,
  V: ValueSlot<O>,
{
  /// Deliver `value` if this conduit has outstanding demand.
  fn offer(&self, value: O, sequence: u64) {
    let downstream = {
      let mut state = self.state.lock();
      if state.replayed == Some(sequence) {
        return;
      }
      if state.downstream.is_none() || !state.demand.is_active() {
        state.delivered_current_value = false;
        return;
      }
      state.demand = state.demand.saturating_sub(1usize);
      state.delivered_current_value = true;
      state.downstream.clone()
    };
    if let Some(downstream) = downstream {
      self.deliver(&downstream, value);
    }
  }

  /// Hand one value to downstream, whose demand was already taken, and add
  /// whatever it asks for in return.
  fn deliver(&self, downstream: &AnySubscriber<O, F>, value: O) {
    let more = {
      let _guard = self.downstream_lock.lock();
      downstream.receive(value)
    };
    if more.is_active() {
      self.state.lock().demand += more;
    }
  }

  fn finish(&self, completion: Completion<F>) {
    let (downstream, parent) = {
      let mut state = self.state.lock();
      let Some(downstream) = state.downstream.take() else { return };
      (downstream, state.parent.take())
    };
    if let Some(parent) = parent.and_then(|p| p.upgrade()) {
      parent.disassociate(self.slot);
    }
    let _guard = self.downstream_lock.lock();
    downstream.receive_completion(completion);
  }
}

impl<O, F, V> Subscription for Conduit<O, F, V>
where
  O: Clone + Send + 'static,
  F: Clone + Send + 'static,
  V: ValueSlot<O>,
{
  fn request(&self, demand: Demand) {
    demand.assert_non_zero();
    // The replayed value is read and its demand taken under the conduit
    // lock, so a `send` of the same value racing this request is skipped.
    let (parent, replay) = {
      let mut state = self.state.lock();
      if state.downstream.is_none() {
        return;
      }
      state.demand += demand;
      let parent = state.parent.as_ref().and_then(Weak::upgrade);
      let mut replay = None;
      if !state.delivered_current_value {
        state.delivered_current_value = true;
        if let Some((value, sequence)) = parent.as_ref().and_then(|p| p.replay()) {
          state.demand = state.demand.saturating_sub(1usize);
          state.replayed = Some(sequence);
          replay = state.downstream.clone().map(|downstream| (downstream, value));
        }
      }
      (parent, replay)
    };
    tracing::trace!(slot = self.slot, %demand, "demand requested");

    let Some(parent) = parent else { return };
    parent.acknowledge_downstream_demand();
    drop(parent);
    if let Some((downstream, value)) = replay {
      self.deliver(&downstream, value);
    }
  }
}

impl<O, F, V> Cancellable for Conduit<O, F, V>
where
  O: Clone + Send + 'static,
  F: Clone + Send + 'static,
  V: ValueSlot<O>,
{
  fn cancel(&self) {
    let (downstream, parent) = {
      let mut state = self.state.lock();
      (state.downstream.take(), state.parent.take())
    };
    if downstream.is_none() {
      return;
    }
    tracing::trace!(slot = self.slot, "conduit cancelled");
    drop(downstream);
    if let Some(parent) = parent.and_then(|p| p.upgrade()) {
      parent.disassociate(self.slot);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::completion::Never;

  type Core = SubjectCore<i32, Never, ()>;

  fn counting(seen: Arc<Mutex<Vec<i32>>>, initial: Demand) -> AnySubscriber<i32, Never> {
    AnySubscriber::from_fns(
      move |s| {
        if initial.is_active() {
          s.request(initial)
        }
      },
      move |v| {
        seen.lock().push(v);
        Demand::none()
      },
      |_| {},
    )
  }

  #[rxcombine_macro::test]
  fn cancel_removes_the_conduit() {
    let core: Arc<Core> = SubjectCore::new("test", (), false);
    let slot_holder = Arc::new(Mutex::new(None::<AnySubscription>));
    let holder = slot_holder.clone();
    core.receive(AnySubscriber::from_fns(
      move |s| *holder.lock() = Some(s),
      |_| Demand::none(),
      |_| {},
    ));
    assert_eq!(core.with_state(|s| s.conduits.len()), 1);

    let subscription = slot_holder.lock().take();
    if let Some(subscription) = subscription {
      subscription.cancel();
      subscription.cancel();
    }
    assert_eq!(core.with_state(|s| s.conduits.len()), 0);
  }

  #[rxcombine_macro::test]
  fn dropping_the_core_severs_conduits() {
    let core: Arc<Core> = SubjectCore::new("test", (), false);
    let seen = Arc::new(Mutex::new(vec![]));
    core.receive(counting(seen.clone(), Demand::unlimited()));
    core.send(1);

    let conduit = core.with_state(|s| s.conduits.snapshot()[0].clone());
    drop(core);
    assert!(conduit.state.lock().downstream.is_none());
    assert!(conduit.state.lock().parent.is_none());
    conduit.request(Demand::max(1));
    conduit.cancel();
    assert_eq!(*seen.lock(), [1]);
  }

  #[rxcombine_macro::test]
  fn zero_demand_conduits_are_skipped() {
    let core: Arc<Core> = SubjectCore::new("test", (), false);
    let hungry = Arc::new(Mutex::new(vec![]));
    let idle = Arc::new(Mutex::new(vec![]));
    core.receive(counting(hungry.clone(), Demand::max(2)));
    core.receive(counting(idle.clone(), Demand::none()));
    for v in 0..5 {
      core.send(v);
    }
    assert_eq!(*hungry.lock(), [0, 1]);
    assert!(idle.lock().is_empty());
  }

  #[rxcombine_macro::test]
  fn replayed_value_is_not_delivered_again_by_a_racing_send() {
    let core = SubjectCore::<i32, Never, _>::new("test", Latest(0), true);
    let seen = Arc::new(Mutex::new(vec![]));
    core.receive(counting(seen.clone(), Demand::none()));
    let conduit = core.with_state(|s| s.conduits.snapshot()[0].clone());

    // A send that stored its value but has not reached the conduit yet.
    let sequence = core.with_state(|s| {
      s.current.store(&5);
      s.sequence += 1;
      s.sequence
    });
    conduit.request(Demand::max(2));
    conduit.offer(5, sequence);
    core.send(6);
    assert_eq!(*seen.lock(), [5, 6]);
  }
}
