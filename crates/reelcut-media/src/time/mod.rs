//! Rational time values.
//!
//! Timestamps and durations are rational numbers (`value / timescale`) so
//! that edit arithmetic never drifts. Besides finite values the type carries
//! the sentinel values of the platform time type: positive and negative
//! infinity, indefinite, and invalid. Comparisons between finite values
//! cross-multiply at 128-bit width; floating point is used only for display.

mod range;

pub use range::{map_time, TimeRange};

use std::cmp::Ordering;
use std::fmt;

/// How to round when a value must be expressed at a coarser timescale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingMode {
    /// Round half away from zero. Used when retimestamping to a track's
    /// canonical timescale.
    #[default]
    HalfAwayFromZero,
    /// Truncate toward zero.
    TowardZero,
    /// Round up.
    TowardPositiveInfinity,
    /// Round down.
    TowardNegativeInfinity,
}

/// A rational timestamp or duration.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum RationalTime {
    /// A finite value of `value / timescale` seconds. `timescale` is always
    /// positive.
    Finite { value: i64, timescale: i32 },
    PositiveInfinity,
    NegativeInfinity,
    Indefinite,
    Invalid,
}

impl RationalTime {
    pub const ZERO: Self = Self::Finite {
        value: 0,
        timescale: 1,
    };

    /// Create a finite time. A non-positive timescale yields `Invalid`.
    pub fn new(value: i64, timescale: i32) -> Self {
        if timescale <= 0 {
            return Self::Invalid;
        }
        Self::Finite { value, timescale }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Self::Finite { .. })
    }

    /// Anything but `Invalid`.
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid)
    }

    pub fn is_indefinite(&self) -> bool {
        matches!(self, Self::Indefinite)
    }

    pub fn value(&self) -> Option<i64> {
        match self {
            Self::Finite { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn timescale(&self) -> Option<i32> {
        match self {
            Self::Finite { timescale, .. } => Some(*timescale),
            _ => None,
        }
    }

    /// Express this time at a different timescale.
    ///
    /// Finite values are rescaled with the given rounding mode; sentinel
    /// values pass through unchanged. A non-positive target yields `Invalid`.
    pub fn convert_scale(self, target: i32, mode: RoundingMode) -> Self {
        if target <= 0 {
            return Self::Invalid;
        }
        let Self::Finite { value, timescale } = self else {
            return self;
        };
        if timescale == target {
            return self;
        }
        let num = value as i128 * target as i128;
        from_i128(div_round(num, timescale as i128, mode), target)
    }

    /// Multiply by an integer count, saturating to the signed infinities on
    /// overflow.
    pub fn mul_i64(self, count: i64) -> Self {
        match self {
            Self::Finite { value, timescale } => {
                from_i128(value as i128 * count as i128, timescale)
            }
            Self::PositiveInfinity | Self::NegativeInfinity => match count.cmp(&0) {
                Ordering::Equal => Self::Invalid,
                Ordering::Greater => self,
                Ordering::Less => -self,
            },
            Self::Indefinite => Self::Indefinite,
            Self::Invalid => Self::Invalid,
        }
    }

    /// How many whole multiples of `step` fit into `self`.
    ///
    /// `None` unless both values are finite and `step` is non-zero.
    pub fn div_duration_floor(self, step: Self) -> Option<i64> {
        let Self::Finite { value, timescale } = self else {
            return None;
        };
        let Self::Finite {
            value: step_value,
            timescale: step_timescale,
        } = step
        else {
            return None;
        };
        if step_value == 0 {
            return None;
        }
        let num = value as i128 * step_timescale as i128;
        let den = step_value as i128 * timescale as i128;
        Some(num.div_euclid(den) as i64)
    }

    /// The smaller of two times. `Invalid` poisons the result.
    pub fn min(self, other: Self) -> Self {
        if !self.is_valid() || !other.is_valid() {
            return Self::Invalid;
        }
        match self.partial_cmp(&other) {
            Some(Ordering::Greater) => other,
            _ => self,
        }
    }

    /// The larger of two times. `Invalid` poisons the result.
    pub fn max(self, other: Self) -> Self {
        if !self.is_valid() || !other.is_valid() {
            return Self::Invalid;
        }
        match self.partial_cmp(&other) {
            Some(Ordering::Less) => other,
            _ => self,
        }
    }

    /// Approximate value in seconds. Display/diagnostic use only.
    pub fn seconds(&self) -> f64 {
        match self {
            Self::Finite { value, timescale } => *value as f64 / *timescale as f64,
            Self::PositiveInfinity => f64::INFINITY,
            Self::NegativeInfinity => f64::NEG_INFINITY,
            Self::Indefinite | Self::Invalid => f64::NAN,
        }
    }

    /// Format as `H:MM:SS.mmm`. Non-numeric values become `"nan"` or
    /// `"inf"` rather than propagating floating-point text.
    pub fn format_hms(&self) -> String {
        let seconds = self.seconds();
        if seconds.is_nan() {
            return "nan".to_string();
        }
        if seconds.is_infinite() {
            return "inf".to_string();
        }
        let sign = if seconds < 0.0 { "-" } else { "" };
        let total_millis = (seconds.abs() * 1000.0).round() as u64;
        let millis = total_millis % 1000;
        let total_secs = total_millis / 1000;
        let secs = total_secs % 60;
        let mins = (total_secs / 60) % 60;
        let hours = total_secs / 3600;
        format!("{sign}{hours}:{mins:02}:{secs:02}.{millis:03}")
    }
}

/// Build a finite time from a 128-bit numerator, saturating to the signed
/// infinities when the value does not fit.
fn from_i128(value: i128, timescale: i32) -> RationalTime {
    if value > i64::MAX as i128 {
        RationalTime::PositiveInfinity
    } else if value < i64::MIN as i128 {
        RationalTime::NegativeInfinity
    } else {
        RationalTime::Finite {
            value: value as i64,
            timescale,
        }
    }
}

/// Divide with the given rounding mode. `den` must be positive.
fn div_round(num: i128, den: i128, mode: RoundingMode) -> i128 {
    let negative = num < 0;
    let n = num.unsigned_abs();
    let d = den.unsigned_abs();
    let (q, r) = (n / d, n % d);
    let q = match mode {
        RoundingMode::TowardZero => q,
        RoundingMode::HalfAwayFromZero => {
            if r * 2 >= d {
                q + 1
            } else {
                q
            }
        }
        RoundingMode::TowardPositiveInfinity => {
            if !negative && r > 0 {
                q + 1
            } else {
                q
            }
        }
        RoundingMode::TowardNegativeInfinity => {
            if negative && r > 0 {
                q + 1
            } else {
                q
            }
        }
    };
    if negative {
        -(q as i128)
    } else {
        q as i128
    }
}

fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Ordering rank of the sentinel values: `-∞ < finite < indefinite < +∞`.
fn rank(t: &RationalTime) -> u8 {
    match t {
        RationalTime::NegativeInfinity => 0,
        RationalTime::Finite { .. } => 1,
        RationalTime::Indefinite => 2,
        RationalTime::PositiveInfinity => 3,
        RationalTime::Invalid => 4,
    }
}

impl PartialEq for RationalTime {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Finite {
                    value: v1,
                    timescale: t1,
                },
                Self::Finite {
                    value: v2,
                    timescale: t2,
                },
            ) => *v1 as i128 * *t2 as i128 == *v2 as i128 * *t1 as i128,
            // Invalid is never equal, not even to itself.
            (Self::Invalid, _) | (_, Self::Invalid) => false,
            (a, b) => rank(a) == rank(b),
        }
    }
}

impl PartialOrd for RationalTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if !self.is_valid() || !other.is_valid() {
            return None;
        }
        match (self, other) {
            (
                Self::Finite {
                    value: v1,
                    timescale: t1,
                },
                Self::Finite {
                    value: v2,
                    timescale: t2,
                },
            ) => {
                let lhs = *v1 as i128 * *t2 as i128;
                let rhs = *v2 as i128 * *t1 as i128;
                Some(lhs.cmp(&rhs))
            }
            (a, b) => Some(rank(a).cmp(&rank(b))),
        }
    }
}

impl std::ops::Add for RationalTime {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        use RationalTime::*;
        match (self, other) {
            (Invalid, _) | (_, Invalid) => Invalid,
            (Indefinite, _) | (_, Indefinite) => Indefinite,
            (PositiveInfinity, NegativeInfinity) | (NegativeInfinity, PositiveInfinity) => Invalid,
            (PositiveInfinity, _) | (_, PositiveInfinity) => PositiveInfinity,
            (NegativeInfinity, _) | (_, NegativeInfinity) => NegativeInfinity,
            (
                Finite {
                    value: v1,
                    timescale: t1,
                },
                Finite {
                    value: v2,
                    timescale: t2,
                },
            ) => {
                let g = gcd(t1 as i64, t2 as i64);
                let lcm = (t1 as i64 / g) * t2 as i64;
                if lcm <= i32::MAX as i64 {
                    // exact at the least common timescale
                    let num = v1 as i128 * (lcm / t1 as i64) as i128
                        + v2 as i128 * (lcm / t2 as i64) as i128;
                    from_i128(num, lcm as i32)
                } else {
                    // the exact denominator is unrepresentable; round into
                    // the finer of the two timescales
                    let target = t1.max(t2);
                    let a = self.convert_scale(target, RoundingMode::HalfAwayFromZero);
                    let b = other.convert_scale(target, RoundingMode::HalfAwayFromZero);
                    match (a, b) {
                        (
                            Finite { value: av, .. },
                            Finite { value: bv, .. },
                        ) => from_i128(av as i128 + bv as i128, target),
                        _ => a + b,
                    }
                }
            }
        }
    }
}

impl std::ops::Neg for RationalTime {
    type Output = Self;

    fn neg(self) -> Self {
        match self {
            Self::Finite { value, timescale } => from_i128(-(value as i128), timescale),
            Self::PositiveInfinity => Self::NegativeInfinity,
            Self::NegativeInfinity => Self::PositiveInfinity,
            other => other,
        }
    }
}

impl std::ops::Sub for RationalTime {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self + (-other)
    }
}

impl fmt::Display for RationalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite { value, timescale } => write!(f, "{}/{}", value, timescale),
            Self::PositiveInfinity => write!(f, "+inf"),
            Self::NegativeInfinity => write!(f, "-inf"),
            Self::Indefinite => write!(f, "indefinite"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}
