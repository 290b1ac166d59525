//! Await the result of a [`Future`](crate::future::Future) publisher.
//!
//! ```rust
//! use rxcombine::prelude::*;
//!
//! # async fn example() {
//! let future = Future::<i32, &str>::new(|promise| promise.succeed(42));
//! assert_eq!(future.value().await, Ok(42));
//! # }
//! ```

use std::{
  pin::Pin,
  task::{Context as TaskContext, Poll, Waker},
};

use crate::{
  completion::Completion,
  demand::Demand,
  publisher::Publisher,
  rc::MutArc,
  subscriber::Subscriber,
  subscription::{AnySubscription, Cancellable, Subscription},
};

/// Shared state between the future and its subscriber.
struct SharedState<T, E> {
  subscription: Option<AnySubscription>,
  result: Option<Result<T, E>>,
  waker: Option<Waker>,
  /// Set once the subscriber will not produce a result anymore.
  completed: bool,
}

impl<T, E> SharedState<T, E> {
  fn wake(&mut self) {
    if let Some(waker) = self.waker.take() {
      waker.wake();
    }
  }
}

/// A `std::future::Future` resolving to the value or failure of a
/// [`Future`](crate::future::Future) publisher.
///
/// Created by [`Future::value`](crate::future::Future::value). It subscribes
/// as soon as it is created and asks for a single value.
pub struct FutureValue<T, E> {
  shared: MutArc<SharedState<T, E>>,
}

impl<T: Send + 'static, E: Send + 'static> FutureValue<T, E> {
  pub(crate) fn new<P>(publisher: &P) -> Self
  where
    P: Publisher<Output = T, Failure = E> + ?Sized,
  {
    let shared =
      MutArc::own(SharedState { subscription: None, result: None, waker: None, completed: false });
    publisher.subscribe(FutureValueSubscriber { shared: shared.clone() });
    FutureValue { shared }
  }
}

impl<T, E> std::future::Future for FutureValue<T, E> {
  type Output = Result<T, E>;

  fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
    let mut shared = self.shared.rc_deref_mut();
    match shared.result.take() {
      Some(result) => Poll::Ready(result),
      None => {
        shared.waker = Some(cx.waker().clone());
        Poll::Pending
      }
    }
  }
}

impl<T, E> Drop for FutureValue<T, E> {
  fn drop(&mut self) {
    let subscription = {
      let mut shared = self.shared.rc_deref_mut();
      shared.completed = true;
      shared.subscription.take()
    };
    if let Some(subscription) = subscription {
      subscription.cancel();
    }
  }
}

struct FutureValueSubscriber<T, E> {
  shared: MutArc<SharedState<T, E>>,
}

impl<T: Send, E: Send> Subscriber<T, E> for FutureValueSubscriber<T, E> {
  fn receive_subscription(&self, subscription: AnySubscription) {
    {
      let mut shared = self.shared.rc_deref_mut();
      if shared.subscription.is_some() || shared.completed {
        drop(shared);
        subscription.cancel();
        return;
      }
      shared.subscription = Some(subscription.clone());
    }
    subscription.request(Demand::max(1));
  }

  fn receive(&self, value: T) -> Demand {
    let mut shared = self.shared.rc_deref_mut();
    if !shared.completed {
      shared.result = Some(Ok(value));
      shared.completed = true;
      shared.wake();
    }
    Demand::none()
  }

  fn receive_completion(&self, completion: Completion<E>) {
    let subscription = {
      let mut shared = self.shared.rc_deref_mut();
      if let Completion::Failure(e) = completion {
        if !shared.completed {
          shared.result = Some(Err(e));
          shared.completed = true;
          shared.wake();
        }
      } else if !shared.completed {
        tracing::debug!("publisher finished without a value, future stays pending");
      }
      shared.subscription.take()
    };
    drop(subscription);
  }
}
