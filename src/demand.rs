//! Demand: how many more values a subscriber is willing to receive.
//!
//! A demand is either a finite count or `unlimited`. Arithmetic saturates at
//! `unlimited`: adding to or multiplying an unlimited demand yields unlimited,
//! and so does any finite overflow. Subtracting from unlimited is unlimited.
//!
//! Subtracting more than a finite demand holds is a caller error. The `-`
//! operators `debug_assert!` against it and clamp to `none` in release builds;
//! [`Demand::saturating_sub`] is the quiet form.
//!
//! ```rust
//! use rxcombine::prelude::*;
//!
//! let d = Demand::max(3) + Demand::max(2);
//! assert_eq!(d, Demand::max(5));
//! assert_eq!(Demand::unlimited() + 7usize, Demand::unlimited());
//! assert_eq!(Demand::max(2).saturating_sub(Demand::max(9)), Demand::none());
//! ```

use std::{
  cmp::Ordering,
  fmt,
  ops::{Add, AddAssign, Mul, MulAssign, Sub, SubAssign},
};

use crate::error::{violation, DemandError, ProtocolViolation};

const UNLIMITED: usize = usize::MAX;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Demand(usize);

impl Demand {
  pub const NONE: Demand = Demand(0);
  pub const UNLIMITED: Demand = Demand(UNLIMITED);

  #[inline]
  pub const fn unlimited() -> Self { Self::UNLIMITED }

  #[inline]
  pub const fn none() -> Self { Self::NONE }

  /// A finite demand of `count` values. `usize::MAX` is treated as unlimited.
  #[inline]
  pub const fn max(count: usize) -> Self { Demand(count) }

  #[inline]
  pub const fn is_unlimited(self) -> bool { self.0 == UNLIMITED }

  #[inline]
  pub const fn is_none(self) -> bool { self.0 == 0 }

  /// Any positive or unlimited demand.
  #[inline]
  pub const fn is_active(self) -> bool { self.0 > 0 }

  /// The finite count, or `None` when unlimited.
  #[inline]
  pub const fn count(self) -> Option<usize> {
    if self.is_unlimited() { None } else { Some(self.0) }
  }

  /// Subtract, clamping a finite result at `none`.
  pub fn saturating_sub(self, rhs: impl Into<Demand>) -> Demand {
    let rhs = rhs.into();
    match (self.is_unlimited(), rhs.is_unlimited()) {
      (true, _) => self,
      (false, true) => Demand::NONE,
      (false, false) => Demand(self.0.saturating_sub(rhs.0)),
    }
  }

  #[inline]
  #[track_caller]
  pub(crate) fn assert_non_zero(self) {
    if self.is_none() {
      violation(ProtocolViolation::ZeroDemand);
    }
  }
}

impl Default for Demand {
  fn default() -> Self { Demand::NONE }
}

impl From<usize> for Demand {
  #[inline]
  fn from(count: usize) -> Self { Demand::max(count) }
}

impl TryFrom<i64> for Demand {
  type Error = DemandError;

  fn try_from(count: i64) -> Result<Self, Self::Error> {
    usize::try_from(count)
      .map(Demand::max)
      .map_err(|_| DemandError::Negative(count))
  }
}

// ============================================================================
// Arithmetic
// ============================================================================

impl<R: Into<Demand>> Add<R> for Demand {
  type Output = Demand;

  fn add(self, rhs: R) -> Demand {
    let rhs = rhs.into();
    if self.is_unlimited() || rhs.is_unlimited() {
      return Demand::UNLIMITED;
    }
    self.0.checked_add(rhs.0).map_or(Demand::UNLIMITED, Demand)
  }
}

impl<R: Into<Demand>> AddAssign<R> for Demand {
  fn add_assign(&mut self, rhs: R) { *self = *self + rhs; }
}

impl<R: Into<Demand>> Sub<R> for Demand {
  type Output = Demand;

  #[track_caller]
  fn sub(self, rhs: R) -> Demand {
    let rhs = rhs.into();
    debug_assert!(
      self.is_unlimited() || (!rhs.is_unlimited() && rhs.0 <= self.0),
      "demand underflow: {self} - {rhs}"
    );
    self.saturating_sub(rhs)
  }
}

impl<R: Into<Demand>> SubAssign<R> for Demand {
  #[track_caller]
  fn sub_assign(&mut self, rhs: R) { *self = *self - rhs; }
}

impl Mul<usize> for Demand {
  type Output = Demand;

  fn mul(self, rhs: usize) -> Demand {
    if self.is_unlimited() {
      return self;
    }
    self.0.checked_mul(rhs).map_or(Demand::UNLIMITED, Demand)
  }
}

impl MulAssign<usize> for Demand {
  fn mul_assign(&mut self, rhs: usize) { *self = *self * rhs; }
}

// ============================================================================
// Comparison with plain counts
// ============================================================================

impl PartialEq<usize> for Demand {
  fn eq(&self, other: &usize) -> bool { !self.is_unlimited() && self.0 == *other }
}

impl PartialEq<Demand> for usize {
  fn eq(&self, other: &Demand) -> bool { other == self }
}

impl PartialOrd<usize> for Demand {
  fn partial_cmp(&self, other: &usize) -> Option<Ordering> {
    if self.is_unlimited() { Some(Ordering::Greater) } else { self.0.partial_cmp(other) }
  }
}

impl PartialOrd<Demand> for usize {
  fn partial_cmp(&self, other: &Demand) -> Option<Ordering> {
    other.partial_cmp(self).map(Ordering::reverse)
  }
}

impl fmt::Display for Demand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_unlimited() { f.write_str("unlimited") } else { write!(f, "max({})", self.0) }
  }
}

impl fmt::Debug for Demand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(self, f) }
}
