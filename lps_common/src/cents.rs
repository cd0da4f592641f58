use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Sub},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

pub const ZAR_CURRENCY_CODE: &str = "ZAR";
pub const ZAR_CURRENCY_CODE_LOWER: &str = "zar";

//--------------------------------------       Cents        ----------------------------------------------------------
/// A monetary amount in minor currency units (South African cents).
///
/// Orders store their totals in major units (Rand), but the payment gateway reports and expects amounts in cents.
/// All amount comparisons in the reconciliation flow happen in this type, so the major-to-minor conversion is done
/// in exactly one place ([`Cents::from_rands`]).
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Cents(i64);

impl Cents {
    /// Convert a major-unit Rand amount into cents, rounding to the nearest cent.
    ///
    /// This is the canonical `round(total_amount * 100)` used when comparing a stored order total against a
    /// gateway-reported amount.
    pub fn from_rands(rands: f64) -> Self {
        Self((rands * 100.0).round() as i64)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn as_rands(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in cents: {0}")]
pub struct CentsConversionError(String);

impl TryFrom<u64> for Cents {
    type Error = CentsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(CentsConversionError(format!("Value {value} is too large to convert to Cents")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl FromStr for Cents {
    type Err = CentsConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self).map_err(|e| CentsConversionError(format!("{s} is not a valid amount. {e}")))
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rands = self.0 as f64 / 100.0;
        write!(f, "R{rands:0.2}")
    }
}

impl Add for Cents {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Cents {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}
