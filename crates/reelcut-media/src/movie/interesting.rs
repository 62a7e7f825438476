//! Nearest sample-aligned times across a movie's tracks.
//!
//! Scrub stepping wants the closest "interesting" time: the next or
//! previous timestamp where some track has a sample edge. Continuous audio
//! is exempt from sample cursors and contributes a fixed quarter-second
//! step instead.

use super::Movie;
use crate::time::{RationalTime, RoundingMode};

/// Granularity used when a caller's clock is too coarse to represent a
/// quarter second exactly.
const MIN_STEP_TIMESCALE: i32 = 240_000;

const QUARTER_SECOND: RationalTime = RationalTime::Finite {
    value: 1,
    timescale: 4,
};

impl Movie {
    /// The nearest sample-aligned time strictly after `after`, or `after`
    /// unchanged if no track offers one.
    ///
    /// Times below zero clamp to zero and times at or past the movie
    /// duration clamp to the duration, both immediately.
    pub fn next_interesting_time(&self, after: RationalTime) -> RationalTime {
        if !after.is_valid() {
            return after;
        }
        if after < RationalTime::ZERO {
            return RationalTime::ZERO;
        }
        if after >= self.duration {
            return self.duration;
        }

        let mut nearest: Option<RationalTime> = None;
        for track in &self.tracks {
            let candidate = if track.kind.is_audio() {
                quarter_second_step(after, true)
            } else {
                let mut cursor = track.sample_cursor_at(after);
                cursor.step_by_count(1);
                let stepped = cursor.presentation_time();
                // Some tracks (timecode, single-sample oddities) step
                // nowhere or the wrong way; only a strictly later time is
                // interesting.
                if stepped > after {
                    stepped
                } else {
                    continue;
                }
            };
            nearest = Some(match nearest {
                None => candidate,
                Some(best) => best.min(candidate),
            });
        }
        nearest.unwrap_or(after)
    }

    /// The nearest sample-aligned time strictly before `before`, or
    /// `before` unchanged if no track offers one.
    pub fn previous_interesting_time(&self, before: RationalTime) -> RationalTime {
        if !before.is_valid() {
            return before;
        }
        if before <= RationalTime::ZERO {
            return RationalTime::ZERO;
        }
        if before > self.duration {
            return self.duration;
        }

        let mut nearest: Option<RationalTime> = None;
        for track in &self.tracks {
            let candidate = if track.kind.is_audio() {
                quarter_second_step(before, false)
            } else {
                let mut cursor = track.sample_cursor_at(before);
                cursor.step_by_count(-1);
                let stepped = cursor.presentation_time();
                if stepped < before {
                    stepped
                } else {
                    continue;
                }
            };
            nearest = Some(match nearest {
                None => candidate,
                Some(best) => best.max(candidate),
            });
        }
        nearest.unwrap_or(before)
    }
}

/// A quarter second forward or backward from `t`.
///
/// Addition is exact rational arithmetic, so for the common clocks this is
/// simply `t ± 1/4`. A coarse clock that cannot represent a quarter second
/// is first raised to [`MIN_STEP_TIMESCALE`].
fn quarter_second_step(t: RationalTime, forward: bool) -> RationalTime {
    let step = if forward {
        QUARTER_SECOND
    } else {
        -QUARTER_SECOND
    };
    if let Some(timescale) = t.timescale() {
        if timescale % 4 != 0
            && timescale < MIN_STEP_TIMESCALE
            && MIN_STEP_TIMESCALE % timescale == 0
        {
            return t.convert_scale(MIN_STEP_TIMESCALE, RoundingMode::HalfAwayFromZero) + step;
        }
    }
    t + step
}
