use std::{fmt, sync::Arc};

use super::{
  subject_core::{Latest, SubjectCore},
  Subject,
};
use crate::{
  completion::Completion,
  publisher::Publisher,
  subscriber::{AnySubscriber, Subscriber},
  subscription::AnySubscription,
};

/// A subject that wraps a single value and publishes a new element whenever
/// the value changes.
///
/// A new subscriber receives the current value as soon as it requests
/// demand. A subscriber that ran out of demand and missed a value is handed
/// the latest value on its next request instead of the missed one.
///
/// Unlike [`PassthroughSubject`](super::PassthroughSubject), upstream
/// subscriptions attached with [`send_subscription`](Subject::send_subscription)
/// are asked for unlimited values straight away.
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use rxcombine::prelude::*;
///
/// let subject = CurrentValueSubject::<i32, Never>::new(112);
/// let seen = Arc::new(Mutex::new(vec![]));
/// let s = seen.clone();
/// let _token = subject.sink_value(move |v| s.lock().unwrap().push(v));
///
/// subject.set_value(113);
/// assert_eq!(subject.value(), 113);
/// assert_eq!(*seen.lock().unwrap(), [112, 113]);
/// ```
pub struct CurrentValueSubject<Output, Failure> {
  core: Arc<SubjectCore<Output, Failure, Latest<Output>>>,
}

impl<Output, Failure> CurrentValueSubject<Output, Failure>
where
  Output: Clone + Send + 'static,
  Failure: Clone + Send + 'static,
{
  pub fn new(value: Output) -> Self {
    CurrentValueSubject { core: SubjectCore::new("CurrentValueSubject", Latest(value), true) }
  }

  /// The latest value, including one assigned after completion.
  pub fn value(&self) -> Output { self.core.with_state(|state| state.current.0.clone()) }

  /// Replace the current value and publish it. After completion the value
  /// is still recorded but nothing is published.
  pub fn set_value(&self, value: Output) { self.core.set_value(value) }
}

impl<Output, Failure> Clone for CurrentValueSubject<Output, Failure> {
  fn clone(&self) -> Self { CurrentValueSubject { core: self.core.clone() } }
}

impl<Output, Failure> Publisher for CurrentValueSubject<Output, Failure>
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

impl<Output, Failure> Subject for CurrentValueSubject<Output, Failure>
where
  Output: Clone + Send + 'static,
  Failure: Clone + Send + 'static,
{
  #[inline]
  fn send(&self, value: Output) { self.core.send(value) }

  #[inline]
  fn send_completion(&self, completion: Completion<Failure>) { self.core.send_completion(completion) }

  #[inline]
  fn send_subscription(&self, subscription: AnySubscription) {
    self.core.send_subscription(subscription)
  }
}

impl<Output: fmt::Debug, Failure> fmt::Debug for CurrentValueSubject<Output, Failure>
where
  Output: Clone + Send + 'static,
  Failure: Clone + Send + 'static,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CurrentValueSubject").field("value", &self.value()).finish()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use parking_lot::Mutex;

  use super::*;
  use crate::prelude::*;

  struct Tracked {
    subscriptions: Mutex<Vec<AnySubscription>>,
    inputs: Mutex<Vec<i32>>,
    completions: Mutex<Vec<Completion<&'static str>>>,
  }

  impl Tracked {
    fn new() -> Arc<Self> {
      Arc::new(Tracked {
        subscriptions: Mutex::new(vec![]),
        inputs: Mutex::new(vec![]),
        completions: Mutex::new(vec![]),
      })
    }

    /// A subscriber that requests `initial` and answers the n-th value with
    /// `answers[n]`, or nothing once `answers` runs out.
    fn subscriber(
      self: &Arc<Self>,
      initial: Option<Demand>,
      answers: Vec<Demand>,
    ) -> AnySubscriber<i32, &'static str> {
      let (t1, t2, t3) = (self.clone(), self.clone(), self.clone());
      AnySubscriber::from_fns(
        move |s: AnySubscription| {
          t1.subscriptions.lock().push(s.clone());
          if let Some(d) = initial {
            s.request(d);
          }
        },
        move |v| {
          let mut inputs = t2.inputs.lock();
          inputs.push(v);
          answers.get(inputs.len() - 1).copied().unwrap_or(Demand::none())
        },
        move |c| t3.completions.lock().push(c),
      )
    }
  }

  #[rxcombine_macro::test]
  fn requesting_demand() {
    let initial_demands =
      [None, Some(Demand::max(1)), Some(Demand::max(2)), Some(Demand::max(10)), Some(Demand::unlimited())];
    let subsequent_demands = [
      vec![Demand::max(0); 5],
      vec![Demand::max(1); 10],
      vec![Demand::max(1), Demand::max(0), Demand::max(1), Demand::max(0)],
      vec![Demand::max(0), Demand::max(1), Demand::max(2)],
      vec![Demand::unlimited(), Demand::max(1)],
    ];

    let mut history = vec![];
    for initial in initial_demands {
      for answers in subsequent_demands.iter() {
        let tracked = Tracked::new();
        let cvs = CurrentValueSubject::<i32, &'static str>::new(112);
        cvs.set_value(cvs.value() - 1);

        cvs.subscribe(tracked.subscriber(initial, answers.clone()));
        assert_eq!(tracked.subscriptions.lock().len(), 1);
        assert_eq!(tracked.inputs.lock().first().copied(), initial.map(|_| 111));

        for _ in 0..20 {
          cvs.set_value(cvs.value() + 1);
        }
        cvs.set_value(cvs.value());
        cvs.send_completion(Completion::Finished);

        assert_eq!(tracked.completions.lock().len(), 1);
        history.push(tracked.inputs.lock().len());
      }
    }

    assert_eq!(
      history,
      [
        0, 0, 0, 0, 0, 1, 11, 2, 1, 22, 2, 12, 4, 5, 22, 10, 20, 12, 13, 22, 22, 22, 22, 22, 22
      ]
    );
  }

  #[rxcombine_macro::test]
  fn request_and_cancel_from_inside_the_value_callback() {
    let cvs = CurrentValueSubject::<i32, &'static str>::new(10);
    let tracked = Tracked::new();
    let (t1, t2, t3) = (tracked.clone(), tracked.clone(), tracked.clone());
    cvs.subscribe(AnySubscriber::<i32, &'static str>::from_fns(
      move |subscription| {
        t1.subscriptions.lock().push(subscription.clone());
        subscription.request(Demand::max(1));
      },
      move |v| {
        t2.inputs.lock().push(v);
        let subscription = t2.subscriptions.lock().first().cloned();
        if let Some(subscription) = subscription {
          if v == 2 {
            subscription.cancel();
          } else {
            subscription.request(Demand::max(1));
          }
        }
        Demand::none()
      },
      move |c| t3.completions.lock().push(c),
    ));

    for v in 0..5 {
      cvs.send(v);
    }
    cvs.send_completion(Completion::Finished);
    assert_eq!(*tracked.inputs.lock(), [10, 0, 1, 2]);
    assert!(tracked.completions.lock().is_empty());
    assert_eq!(cvs.value(), 4);
  }

  #[rxcombine_macro::test]
  fn replays_current_value_on_first_request() {
    let cvs = CurrentValueSubject::<i32, &'static str>::new(112);
    let tracked = Tracked::new();
    cvs.subscribe(tracked.subscriber(Some(Demand::max(1)), vec![]));
    assert_eq!(*tracked.inputs.lock(), [112]);
  }

  #[rxcombine_macro::test]
  fn nothing_is_delivered_without_a_request() {
    let cvs = CurrentValueSubject::<i32, &'static str>::new(0);
    let tracked = Tracked::new();
    cvs.subscribe(tracked.subscriber(None, vec![]));
    cvs.send(1);
    assert!(tracked.inputs.lock().is_empty());

    let subscription = tracked.subscriptions.lock()[0].clone();
    subscription.request(Demand::max(1));
    assert_eq!(*tracked.inputs.lock(), [1]);
  }

  #[rxcombine_macro::test]
  fn missed_value_is_replaced_by_the_latest() {
    let cvs = CurrentValueSubject::<i32, &'static str>::new(0);
    let tracked = Tracked::new();
    cvs.subscribe(tracked.subscriber(Some(Demand::max(1)), vec![]));
    cvs.send(1);
    cvs.send(2);
    let subscription = tracked.subscriptions.lock()[0].clone();
    subscription.request(Demand::max(1));
    // Already saw the latest, so the next request only raises demand.
    subscription.request(Demand::max(1));
    cvs.send(3);
    assert_eq!(*tracked.inputs.lock(), [0, 2, 3]);
  }

  #[rxcombine_macro::test]
  fn values_after_completion() {
    let cvs = CurrentValueSubject::<i32, &'static str>::new(112);
    let tracked = Tracked::new();
    let inner = cvs.clone();
    let t = tracked.clone();
    cvs.subscribe(AnySubscriber::<i32, &'static str>::from_fns(
      |s| s.request(Demand::unlimited()),
      move |v| {
        t.inputs.lock().push(v);
        Demand::none()
      },
      move |_| inner.set_value(42),
    ));

    cvs.set_value(44);
    assert_eq!(*tracked.inputs.lock(), [112, 44]);

    cvs.send_completion(Completion::Finished);
    assert_eq!(cvs.value(), 42);
    cvs.set_value(1201);
    cvs.send(7);
    assert_eq!(*tracked.inputs.lock(), [112, 44]);
    assert_eq!(cvs.value(), 1201);
  }

  #[rxcombine_macro::test]
  fn multiple_completions() {
    let cvs = CurrentValueSubject::<i32, &'static str>::new(0);
    let first = Tracked::new();
    let second = Tracked::new();
    cvs.subscribe(first.subscriber(Some(Demand::unlimited()), vec![]));
    cvs.subscribe(second.subscriber(Some(Demand::unlimited()), vec![]));
    cvs.send_completion(Completion::Failure("oops"));
    cvs.send_completion(Completion::Finished);
    assert_eq!(*first.completions.lock(), [Completion::Failure("oops")]);
    assert_eq!(*second.completions.lock(), [Completion::Failure("oops")]);
  }

  #[rxcombine_macro::test]
  fn upstream_is_asked_immediately() {
    #[derive(Default)]
    struct Upstream(AtomicUsize);
    impl Cancellable for Upstream {
      fn cancel(&self) {}
    }
    impl Subscription for Upstream {
      fn request(&self, demand: Demand) {
        assert!(demand.is_unlimited());
        self.0.fetch_add(1, Ordering::SeqCst);
      }
    }

    let cvs = CurrentValueSubject::<i32, &'static str>::new(0);
    let upstream = Arc::new(Upstream::default());
    cvs.send_subscription(upstream.clone());
    assert_eq!(upstream.0.load(Ordering::SeqCst), 1);
  }

  #[rxcombine_macro::test(threaded)]
  async fn concurrent_senders() {
    let cvs = CurrentValueSubject::<i32, &'static str>::new(0);
    let tracked = Tracked::new();
    cvs.subscribe(tracked.subscriber(Some(Demand::unlimited()), vec![]));

    let tasks: Vec<_> = (0..8)
      .map(|_| {
        let cvs = cvs.clone();
        tokio::task::spawn_blocking(move || {
          for v in 1..=100 {
            cvs.send(v);
          }
        })
      })
      .collect();
    for task in tasks {
      task.await.unwrap();
    }
    cvs.send_completion(Completion::Finished);

    assert_eq!(tracked.inputs.lock().len(), 801);
    assert_eq!(tracked.completions.lock().len(), 1);
  }
}
