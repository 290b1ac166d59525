use std::convert::Infallible;

/// The failure type of a producer that can only ever finish.
pub type Never = Infallible;

/// The terminal signal of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Completion<F> {
  Finished,
  Failure(F),
}

impl<F> Completion<F> {
  #[inline]
  pub fn is_finished(&self) -> bool { matches!(self, Completion::Finished) }

  #[inline]
  pub fn failure(&self) -> Option<&F> {
    match self {
      Completion::Finished => None,
      Completion::Failure(f) => Some(f),
    }
  }

  pub fn map_failure<G>(self, f: impl FnOnce(F) -> G) -> Completion<G> {
    match self {
      Completion::Finished => Completion::Finished,
      Completion::Failure(e) => Completion::Failure(f(e)),
    }
  }

  #[inline]
  pub fn into_result(self) -> Result<(), F> {
    match self {
      Completion::Finished => Ok(()),
      Completion::Failure(e) => Err(e),
    }
  }
}

impl<F> From<Result<(), F>> for Completion<F> {
  fn from(result: Result<(), F>) -> Self {
    match result {
      Ok(()) => Completion::Finished,
      Err(e) => Completion::Failure(e),
    }
  }
}

impl Completion<Never> {
  /// Widen a completion that cannot fail into any failure type.
  pub fn promote<F>(self) -> Completion<F> {
    match self {
      Completion::Finished => Completion::Finished,
      Completion::Failure(never) => match never {},
    }
  }
}
