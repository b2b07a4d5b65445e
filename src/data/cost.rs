//! # Saturating Correction Costs
//!
//! Costs are unsigned integers with a distinguished `INFTY` that is
//! absorbing under addition. Implemented as a newtype over `u32`; never
//! floating point, so cost comparisons are exact.

use std::fmt;
use std::ops::{Add, AddAssign};

/// Total correction weight of a (partial) solution.
///
/// Addition saturates at [`Cost::INFTY`], which therefore behaves as an
/// absorbing "no solution" value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cost(u32);

impl Cost {
    /// The zero cost
    pub const ZERO: Cost = Cost(0);

    /// The absorbing infinite cost
    pub const INFTY: Cost = Cost(u32::MAX);

    /// Create a finite cost
    #[inline]
    pub fn new(value: u32) -> Self {
        Cost(value)
    }

    /// Whether this cost is the absorbing infinity
    #[inline]
    pub fn is_infinite(self) -> bool {
        self == Cost::INFTY
    }

    /// The raw value (u32::MAX for infinity)
    #[inline]
    pub fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for Cost {
    #[inline]
    fn from(value: u32) -> Self {
        Cost(value)
    }
}

impl Add for Cost {
    type Output = Cost;

    #[inline]
    fn add(self, rhs: Cost) -> Cost {
        Cost(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Cost {
    #[inline]
    fn add_assign(&mut self, rhs: Cost) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            write!(f, "INFINITY")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
