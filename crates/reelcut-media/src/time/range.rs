//! Time ranges and the linear mapping between them.

use super::{RationalTime, RoundingMode};

/// A half-open span of time: `[start, start + duration)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeRange {
    pub start: RationalTime,
    pub duration: RationalTime,
}

impl TimeRange {
    pub fn new(start: RationalTime, duration: RationalTime) -> Self {
        Self { start, duration }
    }

    /// Build a range from its endpoints.
    pub fn from_start_end(start: RationalTime, end: RationalTime) -> Self {
        Self {
            start,
            duration: end - start,
        }
    }

    pub fn end(&self) -> RationalTime {
        self.start + self.duration
    }

    pub fn is_empty(&self) -> bool {
        self.duration == RationalTime::ZERO
    }

    /// Valid ranges have finite endpoints and a non-negative duration.
    pub fn is_valid(&self) -> bool {
        self.start.is_finite() && self.duration.is_finite() && self.duration >= RationalTime::ZERO
    }

    /// Whether `t` falls inside the half-open range.
    pub fn contains(&self, t: RationalTime) -> bool {
        t >= self.start && t < self.end()
    }
}

/// Map `t` linearly from one range onto another:
/// `to.start + (t - from.start) * to.duration / from.duration`.
///
/// The scaling is exact rational arithmetic; rounding happens only if the
/// exact denominator cannot be carried in a timescale, in which case the
/// result is rounded half-away-from-zero into the finer of the target
/// range's timescales. A degenerate (zero-duration) source range maps every
/// time to `to.start`. Any non-finite input yields `Invalid`.
pub fn map_time(t: RationalTime, from: &TimeRange, to: &TimeRange) -> RationalTime {
    let (Some(tv), Some(tts)) = (t.value(), t.timescale()) else {
        return RationalTime::Invalid;
    };
    let (Some(fsv), Some(fsts)) = (from.start.value(), from.start.timescale()) else {
        return RationalTime::Invalid;
    };
    let (Some(fdv), Some(fdts)) = (from.duration.value(), from.duration.timescale()) else {
        return RationalTime::Invalid;
    };
    let (Some(tsv), Some(tsts)) = (to.start.value(), to.start.timescale()) else {
        return RationalTime::Invalid;
    };
    let (Some(tdv), Some(tdts)) = (to.duration.value(), to.duration.timescale()) else {
        return RationalTime::Invalid;
    };
    if fdv == 0 {
        return to.start;
    }

    // delta = t - from.start
    let delta = reduce(
        tv as i128 * fsts as i128 - fsv as i128 * tts as i128,
        tts as i128 * fsts as i128,
    );
    // scaled = delta * to.duration / from.duration
    let scaled = mul_ratio(delta, (tdv as i128, tdts as i128));
    let scaled = mul_ratio(scaled, (fdts as i128, fdv as i128));
    // result = to.start + scaled
    let num = tsv as i128 * scaled.1 + scaled.0 * tsts as i128;
    let den = tsts as i128 * scaled.1;
    rational_from(num, den, tsts.max(tdts))
}

/// Build a time from an exact fraction, rounding into `fallback_scale` only
/// when the reduced denominator cannot be a timescale.
fn rational_from(num: i128, den: i128, fallback_scale: i32) -> RationalTime {
    let (num, den) = reduce(num, den);
    if den <= i32::MAX as i128 && num >= i64::MIN as i128 && num <= i64::MAX as i128 {
        return RationalTime::new(num as i64, den as i32);
    }
    let rounded = super::div_round(
        num.saturating_mul(fallback_scale as i128),
        den,
        RoundingMode::HalfAwayFromZero,
    );
    if rounded > i64::MAX as i128 {
        RationalTime::PositiveInfinity
    } else if rounded < i64::MIN as i128 {
        RationalTime::NegativeInfinity
    } else {
        RationalTime::new(rounded as i64, fallback_scale)
    }
}

/// Multiply two fractions, cross-reducing first to keep magnitudes small.
fn mul_ratio(a: (i128, i128), b: (i128, i128)) -> (i128, i128) {
    let g1 = gcd128(a.0, b.1);
    let g2 = gcd128(b.0, a.1);
    ((a.0 / g1) * (b.0 / g2), (a.1 / g2) * (b.1 / g1))
}

/// Reduce a fraction and normalize the denominator to be positive.
fn reduce(num: i128, den: i128) -> (i128, i128) {
    let g = gcd128(num, den);
    let (num, den) = (num / g, den / g);
    if den < 0 {
        (-num, -den)
    } else {
        (num, den)
    }
}

fn gcd128(a: i128, b: i128) -> i128 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: (i64, i32), duration: (i64, i32)) -> TimeRange {
        TimeRange::new(
            RationalTime::new(start.0, start.1),
            RationalTime::new(duration.0, duration.1),
        )
    }

    #[test]
    fn test_end_and_empty() {
        let r = range((1, 2), (1, 4));
        assert_eq!(r.end(), RationalTime::new(3, 4));
        assert!(!r.is_empty());
        assert!(range((1, 1), (0, 1)).is_empty());
    }

    #[test]
    fn test_contains_is_half_open() {
        let r = range((0, 1), (1, 1));
        assert!(r.contains(RationalTime::ZERO));
        assert!(r.contains(RationalTime::new(999, 1000)));
        assert!(!r.contains(RationalTime::new(1, 1)));
        assert!(!r.contains(RationalTime::new(-1, 1000)));
    }

    #[test]
    fn test_validity() {
        assert!(range((0, 1), (1, 1)).is_valid());
        assert!(!range((0, 1), (-1, 1)).is_valid());
        let bad = TimeRange::new(RationalTime::Invalid, RationalTime::ZERO);
        assert!(!bad.is_valid());
    }

    #[test]
    fn test_map_time_identity() {
        let r = range((0, 1), (10, 1));
        let t = RationalTime::new(999, 1000);
        assert_eq!(map_time(t, &r, &r), t);
    }

    #[test]
    fn test_map_time_offset_ranges() {
        // track [1s, 2s) onto media [5s, 6s)
        let track = range((1, 1), (1, 1));
        let media = range((5, 1), (1, 1));
        let mapped = map_time(RationalTime::new(3, 2), &track, &media);
        assert_eq!(mapped, RationalTime::new(11, 2));
    }

    #[test]
    fn test_map_time_scaling() {
        // [0, 1s) onto [0, 2s): half-speed media
        let from = range((0, 1), (1, 1));
        let to = range((0, 1), (2, 1));
        let mapped = map_time(RationalTime::new(1, 4), &from, &to);
        assert_eq!(mapped, RationalTime::new(1, 2));
    }

    #[test]
    fn test_map_time_mixed_timescales_is_exact() {
        // track range at movie timescale 600, media range at 30
        let track = range((600, 600), (600, 600));
        let media = range((150, 30), (30, 30));
        let t = RationalTime::new(999, 600); // inside track range
        let mapped = map_time(t, &track, &media);
        // media = 5s + (999/600 - 1s) = 5s + 399/600
        assert_eq!(mapped, RationalTime::new(5, 1) + RationalTime::new(399, 600));
    }

    #[test]
    fn test_map_time_degenerate_source() {
        let from = range((2, 1), (0, 1));
        let to = range((7, 1), (3, 1));
        assert_eq!(map_time(RationalTime::new(2, 1), &from, &to), to.start);
    }

    #[test]
    fn test_map_time_invalid_input() {
        let r = range((0, 1), (1, 1));
        assert!(!map_time(RationalTime::Invalid, &r, &r).is_valid());
        assert!(!map_time(RationalTime::Indefinite, &r, &r).is_valid());
    }
}
