//! Consume a publisher as a [`futures::Stream`].
//!
//! Every poll that finds nothing buffered requests exactly one value, so the
//! publisher only produces what the stream consumer actually pulls.
//!
//! ```rust
//! use futures::StreamExt;
//! use rxcombine::prelude::*;
//!
//! # async fn example() {
//! let subject = CurrentValueSubject::<i32, Never>::new(1);
//! let mut values = subject.values();
//! assert_eq!(values.next().await, Some(Ok(1)));
//! # }
//! ```

use std::{
  collections::VecDeque,
  pin::Pin,
  task::{Context as AsyncContext, Poll, Waker},
};

use futures::Stream;

use crate::{
  completion::Completion,
  demand::Demand,
  publisher::Publisher,
  rc::MutArc,
  subscriber::Subscriber,
  subscription::{AnySubscription, Cancellable, Subscription},
};

/// State shared between the subscriber and the stream.
struct ValuesState<T, E> {
  subscription: Option<AnySubscription>,
  /// Items waiting to be polled.
  queue: VecDeque<Result<T, E>>,
  waker: Option<Waker>,
  /// A value has been requested and not yet received.
  awaiting: bool,
  is_closed: bool,
}

impl<T, E> ValuesState<T, E> {
  fn wake(&mut self) {
    if let Some(waker) = self.waker.take() {
      waker.wake();
    }
  }
}

/// A `Stream` of the values of a publisher.
///
/// Created by [`Publisher::values`]. Yields `Ok` for each value and a final
/// `Err` if the publisher fails, then ends. Dropping the stream cancels the
/// subscription.
pub struct Values<T, E> {
  state: MutArc<ValuesState<T, E>>,
}

impl<T: Send + 'static, E: Send + 'static> Values<T, E> {
  pub(crate) fn new<P>(publisher: &P) -> Self
  where
    P: Publisher<Output = T, Failure = E> + ?Sized,
  {
    let state = MutArc::own(ValuesState {
      subscription: None,
      queue: VecDeque::new(),
      waker: None,
      awaiting: false,
      is_closed: false,
    });
    publisher.subscribe(ValuesSubscriber { state: state.clone() });
    Values { state }
  }
}

impl<T, E> Values<T, E> {
  fn try_next(&self) -> Option<Poll<Option<Result<T, E>>>> {
    let mut state = self.state.rc_deref_mut();
    if let Some(item) = state.queue.pop_front() {
      return Some(Poll::Ready(Some(item)));
    }
    if state.is_closed {
      return Some(Poll::Ready(None));
    }
    None
  }
}

impl<T, E> Stream for Values<T, E> {
  type Item = Result<T, E>;

  fn poll_next(self: Pin<&mut Self>, cx: &mut AsyncContext<'_>) -> Poll<Option<Self::Item>> {
    if let Some(ready) = self.try_next() {
      return ready;
    }

    let request = {
      let mut state = self.state.rc_deref_mut();
      state.waker = Some(cx.waker().clone());
      match state.subscription.clone() {
        Some(subscription) if !state.awaiting => {
          state.awaiting = true;
          Some(subscription)
        }
        _ => None,
      }
    };
    // A synchronous publisher answers inside `request`.
    if let Some(subscription) = request {
      subscription.request(Demand::max(1));
      if let Some(ready) = self.try_next() {
        return ready;
      }
    }
    Poll::Pending
  }
}

impl<T, E> Drop for Values<T, E> {
  fn drop(&mut self) {
    let subscription = {
      let mut state = self.state.rc_deref_mut();
      state.is_closed = true;
      state.subscription.take()
    };
    if let Some(subscription) = subscription {
      subscription.cancel();
    }
  }
}

struct ValuesSubscriber<T, E> {
  state: MutArc<ValuesState<T, E>>,
}

impl<T: Send, E: Send> Subscriber<T, E> for ValuesSubscriber<T, E> {
  fn receive_subscription(&self, subscription: AnySubscription) {
    let rejected = {
      let mut state = self.state.rc_deref_mut();
      if state.subscription.is_some() || state.is_closed {
        Some(subscription)
      } else {
        state.subscription = Some(subscription);
        state.wake();
        None
      }
    };
    if let Some(subscription) = rejected {
      subscription.cancel();
    }
  }

  fn receive(&self, value: T) -> Demand {
    let mut state = self.state.rc_deref_mut();
    state.queue.push_back(Ok(value));
    state.awaiting = false;
    state.wake();
    Demand::none()
  }

  fn receive_completion(&self, completion: Completion<E>) {
    let subscription = {
      let mut state = self.state.rc_deref_mut();
      if let Completion::Failure(e) = completion {
        state.queue.push_back(Err(e));
      }
      state.is_closed = true;
      state.wake();
      state.subscription.take()
    };
    drop(subscription);
  }
}

#[cfg(test)]
mod tests {
  use futures::{task::noop_waker, StreamExt};

  use super::*;
  use crate::prelude::*;

  #[rxcombine_macro::test(current)]
  async fn yields_every_value_then_ends() {
    let future = Future::<i32, Never>::new(|promise| promise.succeed(3));
    let collected: Vec<_> = future.values().collect().await;
    assert_eq!(collected, [Ok(3)]);
  }

  #[rxcombine_macro::test(current)]
  async fn outlives_a_temporary_future() {
    let collected: Vec<_> =
      Future::<i32, Never>::new(|promise| promise.succeed(3)).values().collect().await;
    assert_eq!(collected, [Ok(3)]);
  }

  #[rxcombine_macro::test(current)]
  async fn failure_is_the_last_item() {
    let future = Future::<i32, &'static str>::new(|promise| promise.fail("boom"));
    let mut values = future.values();
    assert_eq!(values.next().await, Some(Err("boom")));
    assert_eq!(values.next().await, None);
  }

  #[rxcombine_macro::test]
  fn requests_one_value_per_poll() {
    let subject = PassthroughSubject::<i32, Never>::new();
    let mut values = subject.values();
    let waker = noop_waker();
    let mut cx = AsyncContext::from_waker(&waker);

    // Nothing requested yet, so a send before the first poll is dropped.
    subject.send(0);
    assert!(Pin::new(&mut values).poll_next(&mut cx).is_pending());
    subject.send(1);
    subject.send(2);
    assert_eq!(Pin::new(&mut values).poll_next(&mut cx), Poll::Ready(Some(Ok(1))));
    assert!(Pin::new(&mut values).poll_next(&mut cx).is_pending());
    subject.send(3);
    subject.send_completion(Completion::Finished);
    assert_eq!(Pin::new(&mut values).poll_next(&mut cx), Poll::Ready(Some(Ok(3))));
    assert_eq!(Pin::new(&mut values).poll_next(&mut cx), Poll::Ready(None));
  }

  #[rxcombine_macro::test(threaded)]
  async fn wakes_when_a_value_arrives_later() {
    let subject = PassthroughSubject::<i32, Never>::new();
    let mut values = subject.values();
    let sender = subject.clone();
    let producer = tokio::spawn(async move {
      for v in 0..3 {
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        sender.send(v);
      }
    });
    assert_eq!(values.next().await, Some(Ok(0)));
    producer.await.unwrap();
  }

  #[rxcombine_macro::test]
  fn stays_pending_once_the_subject_is_dropped() {
    let subject = PassthroughSubject::<i32, Never>::new();
    let mut values = subject.values();
    let waker = noop_waker();
    let mut cx = AsyncContext::from_waker(&waker);

    assert!(Pin::new(&mut values).poll_next(&mut cx).is_pending());
    drop(subject);
    assert!(Pin::new(&mut values).poll_next(&mut cx).is_pending());
    assert!(Pin::new(&mut values).poll_next(&mut cx).is_pending());
  }

  #[rxcombine_macro::test]
  fn dropping_the_stream_cancels() {
    let subject = PassthroughSubject::<i32, Never>::new();
    let seen = MutArc::own(0usize);
    let s = seen.clone();
    let values = subject.values();
    let _token = subject.sink_value(move |_| *s.rc_deref_mut() += 1);
    drop(values);
    subject.send(1);
    assert_eq!(*seen.rc_deref_mut(), 1);
  }
}
