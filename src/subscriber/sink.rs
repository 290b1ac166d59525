use std::sync::Arc;

use parking_lot::Mutex;

use super::Subscriber;
use crate::{
  completion::Completion,
  demand::Demand,
  subscription::{AnySubscription, Cancellable, SubscriptionStatus},
};

type ValueFn<Input> = Arc<dyn Fn(Input) + Send + Sync>;
type CompletionFn<Failure> = Box<dyn FnOnce(Completion<Failure>) + Send>;

/// A subscriber that requests unlimited values and hands each one to a
/// closure.
///
/// Usually created through [`Publisher::sink`](crate::publisher::Publisher)
/// or [`Publisher::sink_value`](crate::publisher::Publisher), which return
/// the [`AnyCancellable`](crate::subscription::AnyCancellable) that keeps it
/// alive. After completion or cancellation both closures are released.
pub struct Sink<Input, Failure> {
  state: Mutex<SinkState<Input, Failure>>,
}

struct SinkState<Input, Failure> {
  status: SubscriptionStatus,
  receive_value: Option<ValueFn<Input>>,
  receive_completion: Option<CompletionFn<Failure>>,
}

impl<Input, Failure> Sink<Input, Failure> {
  pub fn new(
    receive_completion: impl FnOnce(Completion<Failure>) + Send + 'static,
    receive_value: impl Fn(Input) + Send + Sync + 'static,
  ) -> Self {
    Sink {
      state: Mutex::new(SinkState {
        status: SubscriptionStatus::AwaitingSubscription,
        receive_value: Some(Arc::new(receive_value)),
        receive_completion: Some(Box::new(receive_completion)),
      }),
    }
  }
}

impl<Input, Failure> SinkState<Input, Failure> {
  /// Enter the terminal state, handing back what must be dropped or called
  /// once the lock is released.
  fn terminate(&mut self) -> (Option<AnySubscription>, SinkState<Input, Failure>) {
    let subscription = self.status.terminate();
    let released = SinkState {
      status: SubscriptionStatus::Terminal,
      receive_value: self.receive_value.take(),
      receive_completion: self.receive_completion.take(),
    };
    (subscription, released)
  }
}

impl<Input, Failure> Subscriber<Input, Failure> for Sink<Input, Failure>
where
  Input: Send,
  Failure: Send,
{
  fn receive_subscription(&self, subscription: AnySubscription) {
    let mut state = self.state.lock();
    if !matches!(state.status, SubscriptionStatus::AwaitingSubscription) {
      drop(state);
      tracing::trace!("sink already subscribed, cancelling the newcomer");
      subscription.cancel();
      return;
    }
    state.status = SubscriptionStatus::Subscribed(subscription.clone());
    drop(state);
    subscription.request(Demand::unlimited());
  }

  fn receive(&self, input: Input) -> Demand {
    let receive_value = self.state.lock().receive_value.clone();
    if let Some(receive_value) = receive_value {
      receive_value(input);
    }
    Demand::none()
  }

  fn receive_completion(&self, completion: Completion<Failure>) {
    let (_subscription, released) = self.state.lock().terminate();
    if let Some(receive_completion) = released.receive_completion {
      receive_completion(completion);
    }
  }
}

impl<Input, Failure> Cancellable for Sink<Input, Failure> {
  fn cancel(&self) {
    let (subscription, released) = {
      let mut state = self.state.lock();
      if !matches!(state.status, SubscriptionStatus::Subscribed(_)) {
        return;
      }
      state.terminate()
    };
    drop(released);
    if let Some(subscription) = subscription {
      subscription.cancel();
    }
  }
}
