use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::Subscriber;
use crate::{
  completion::Completion,
  demand::Demand,
  error::{violation, ProtocolViolation},
  subject::Subject,
  subscription::{AnySubscription, Cancellable, Subscription},
};

/// Feeds a subject from an upstream publisher.
///
/// On subscription it offers itself to the subject through
/// [`Subject::send_subscription`], so the subject decides how much to
/// request upstream. Values and the completion are forwarded to the subject.
/// Cancelling detaches the subject and cancels upstream.
///
/// Created by [`Publisher::subscribe_subject`](crate::publisher::Publisher).
pub struct SubjectSubscriber<S> {
  this: Weak<SubjectSubscriber<S>>,
  state: Mutex<SubjectSubscriberState<S>>,
}

struct SubjectSubscriberState<S> {
  subject: Option<Arc<S>>,
  upstream: Option<AnySubscription>,
}

impl<S: Subject + 'static> SubjectSubscriber<S> {
  pub fn new(subject: S) -> Arc<Self> {
    Arc::new_cyclic(|this| SubjectSubscriber {
      this: this.clone(),
      state: Mutex::new(SubjectSubscriberState {
        subject: Some(Arc::new(subject)),
        upstream: None,
      }),
    })
  }
}

impl<S: Subject + 'static> Subscriber<S::Output, S::Failure> for SubjectSubscriber<S> {
  fn receive_subscription(&self, subscription: AnySubscription) {
    let subject = {
      let mut state = self.state.lock();
      if state.upstream.is_some() {
        return;
      }
      let Some(subject) = state.subject.clone() else { return };
      state.upstream = Some(subscription);
      subject
    };
    if let Some(this) = self.this.upgrade() {
      subject.send_subscription(this);
    }
  }

  fn receive(&self, input: S::Output) -> Demand {
    let subject = {
      let state = self.state.lock();
      let Some(subject) = state.subject.clone() else { return Demand::none() };
      if state.upstream.is_none() {
        drop(state);
        violation(ProtocolViolation::ValueBeforeSubscription);
      }
      subject
    };
    subject.send(input);
    Demand::none()
  }

  fn receive_completion(&self, completion: Completion<S::Failure>) {
    let subject = {
      let mut state = self.state.lock();
      if state.subject.is_none() {
        return;
      }
      if state.upstream.is_none() {
        drop(state);
        violation(ProtocolViolation::UnexpectedCompletion);
      }
      state.subject.take()
    };
    if let Some(subject) = subject {
      subject.send_completion(completion);
    }
  }
}

impl<S: Subject + 'static> Subscription for SubjectSubscriber<S> {
  fn request(&self, demand: Demand) {
    let upstream = self.state.lock().upstream.clone();
    if let Some(upstream) = upstream {
      upstream.request(demand);
    }
  }
}

impl<S> Cancellable for SubjectSubscriber<S> {
  fn cancel(&self) {
    let (subject, upstream) = {
      let mut state = self.state.lock();
      if state.subject.is_none() || state.upstream.is_none() {
        return;
      }
      (state.subject.take(), state.upstream.take())
    };
    tracing::trace!("subject detached from its upstream");
    drop(subject);
    if let Some(upstream) = upstream {
      upstream.cancel();
    }
  }
}
