//! Bridges from publishers into `async` code.
//!
//! Both bridges are pull based: they request one value at a time, so a slow
//! consumer never lets the publisher run ahead of it.

pub mod into_future;
pub mod into_stream;

pub use into_future::FutureValue;
pub use into_stream::Values;
