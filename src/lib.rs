//! # rxcombine: demand-driven reactive streams
//!
//! Publishers, subscribers and subjects with explicit backpressure: a
//! publisher only delivers as many values as its subscriber has requested.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use rxcombine::prelude::*;
//!
//! let subject = PassthroughSubject::<i32, Never>::new();
//! let seen = Arc::new(Mutex::new(vec![]));
//!
//! let s = seen.clone();
//! let token = subject.sink_value(move |v| s.lock().unwrap().push(v));
//! subject.send(1);
//! subject.send(2);
//! token.cancel();
//! subject.send(3);
//!
//! assert_eq!(*seen.lock().unwrap(), [1, 2]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Publisher`] | Produces values against demand, then at most one completion |
//! | [`Subscriber`] | Consumes a subscription, values and a completion |
//! | [`Subscription`] | Pulls values with `request` and stops them with `cancel` |
//! | [`Demand`] | How many more values a subscriber accepts |
//! | [`Subject`] | A publisher you push values into, shared by many subscribers |
//! | [`Future`] | A publisher of exactly one eventual result |
//!
//! Every call is synchronous and runs on the thread that made it; all types
//! are safe to share between threads. Callbacks may re-enter the producer
//! that invoked them.
//!
//! ## Feature Flags
//!
//! - **`futures-bridge`** (default): [`Publisher::values`] as a
//!   `futures::Stream` and [`Future::value`] as a `std::future::Future`.
//!
//! [`Publisher`]: publisher::Publisher
//! [`Publisher::values`]: publisher::Publisher::values
//! [`Subscriber`]: subscriber::Subscriber
//! [`Subscription`]: subscription::Subscription
//! [`Demand`]: demand::Demand
//! [`Subject`]: subject::Subject
//! [`Future`]: future::Future
//! [`Future::value`]: future::Future::value

pub mod completion;
pub mod demand;
pub mod error;
pub mod future;
pub mod identifier;
#[cfg(feature = "futures-bridge")]
pub mod ops;
pub mod prelude;
pub mod publisher;
pub mod rc;
pub mod subject;
pub mod subscriber;
pub mod subscription;

// Re-export the prelude module
pub use prelude::*;

// Bring the README into Cargo-driven doctests. This module is only compiled
// for rustdoc doctest builds.
#[cfg(doctest)]
mod __markdown_doctests {
  mod readme {
    #![doc = include_str!("../README.md")]
  }
}
