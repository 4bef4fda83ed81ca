//! Fixed-point vcore quantities.
//!
//! Pod and socket capacities are specified to one decimal place (0.1
//! vcore granularity), so quantities are stored as integer tenths. Sums
//! and comparisons are exact, which keeps repeated validation runs
//! bit-identical.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A vcore quantity with one-decimal precision, stored as tenths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Vcores(i64);

impl Vcores {
    pub const ZERO: Vcores = Vcores(0);

    /// Build from raw tenths of a vcore.
    pub const fn from_tenths(tenths: i64) -> Self {
        Self(tenths)
    }

    /// Build from a whole number of vcores.
    pub const fn from_whole(vcores: i64) -> Self {
        Self(vcores * 10)
    }

    /// Build from a float, rounding to the nearest tenth.
    pub fn from_f64(vcores: f64) -> Self {
        Self((vcores * 10.0).round() as i64)
    }

    pub const fn tenths(self) -> i64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 10.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Subtraction clamped at zero.
    pub fn saturating_sub(self, rhs: Vcores) -> Vcores {
        Vcores(self.0.saturating_sub(rhs.0).max(0))
    }
}

impl Add for Vcores {
    type Output = Vcores;
    fn add(self, rhs: Vcores) -> Vcores {
        Vcores(self.0 + rhs.0)
    }
}

impl AddAssign for Vcores {
    fn add_assign(&mut self, rhs: Vcores) {
        self.0 += rhs.0;
    }
}

impl Sub for Vcores {
    type Output = Vcores;
    fn sub(self, rhs: Vcores) -> Vcores {
        Vcores(self.0 - rhs.0)
    }
}

impl Mul<u32> for Vcores {
    type Output = Vcores;
    fn mul(self, rhs: u32) -> Vcores {
        Vcores(self.0 * i64::from(rhs))
    }
}

impl Sum for Vcores {
    fn sum<I: Iterator<Item = Vcores>>(iter: I) -> Vcores {
        iter.fold(Vcores::ZERO, Add::add)
    }
}

impl fmt::Display for Vcores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 10 == 0 {
            write!(f, "{}", self.0 / 10)
        } else {
            write!(f, "{}.{}", self.0 / 10, (self.0 % 10).abs())
        }
    }
}

// On the wire a quantity is a plain JSON number in vcores ("14.5"), not
// tenths.
impl Serialize for Vcores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Vcores {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        if !value.is_finite() {
            return Err(serde::de::Error::custom("vcores must be a finite number"));
        }
        Ok(Vcores::from_f64(value))
    }
}
