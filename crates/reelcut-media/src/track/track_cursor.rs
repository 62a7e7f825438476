//! Track-level sample cursors.
//!
//! A [`TrackSampleCursor`] steps through a track's samples in presentation
//! order, translating between track time and media time through the track's
//! segment map. Segment boundaries live on the track time axis, so every
//! boundary comparison is made against the current segment's own media-range
//! image of that boundary.

use super::sample_cursor::TableSampleCursor;
use super::Track;
use crate::error::{Error, Result};
use crate::time::RationalTime;

/// Where a cursor currently stands.
///
/// `Unpositioned` is a valid terminal state, not an error: there is no
/// segment under the requested time (or the segment has no steppable
/// media), and stepping reports no further movement.
#[derive(Debug)]
enum Position<'t> {
    Unpositioned,
    Positioned {
        segment: usize,
        media_time: RationalTime,
        cursor: TableSampleCursor<'t>,
    },
}

/// A stateful cursor over one track's samples in presentation order.
///
/// Exclusively owned by the caller that constructed it; must not outlive
/// the track it was built from.
#[derive(Debug)]
pub struct TrackSampleCursor<'t> {
    track: &'t Track,
    presentation_time: RationalTime,
    position: Position<'t>,
}

impl<'t> TrackSampleCursor<'t> {
    pub(crate) fn new(track: &'t Track, track_time: RationalTime) -> Self {
        let mut this = Self {
            track,
            presentation_time: track_time,
            position: Position::Unpositioned,
        };
        let Some(index) = track.segments.segment_index_at(track_time) else {
            return this;
        };
        let Some(segment) = track.segments.get(index) else {
            return this;
        };
        // A gap segment has no media to map into; the cursor stays
        // unpositioned.
        let Some(media_time) = segment.track_to_media(track_time) else {
            return this;
        };
        let Some(cursor) = track.make_sample_cursor(media_time) else {
            return this;
        };
        this.position = Position::Positioned {
            segment: index,
            media_time,
            cursor,
        };
        this
    }

    /// Current track (presentation) time.
    pub fn presentation_time(&self) -> RationalTime {
        self.presentation_time
    }

    pub fn is_positioned(&self) -> bool {
        matches!(self.position, Position::Positioned { .. })
    }

    /// Index of the current segment, if positioned.
    pub fn segment_index(&self) -> Option<usize> {
        match &self.position {
            Position::Positioned { segment, .. } => Some(*segment),
            Position::Unpositioned => None,
        }
    }

    /// Current media time, if positioned.
    pub fn media_time(&self) -> Option<RationalTime> {
        match &self.position {
            Position::Positioned { media_time, .. } => Some(*media_time),
            Position::Unpositioned => None,
        }
    }

    /// Step by a signed number of samples in presentation order.
    ///
    /// No-op when unpositioned or when `count` is zero. Stepping past the
    /// first or last segment pins the cursor at the track's own start or
    /// end.
    pub fn step_by_count(&mut self, count: i64) {
        if count == 0 {
            return;
        }
        let (segment_index, current_media) = match &self.position {
            Position::Unpositioned => return,
            Position::Positioned {
                segment,
                media_time,
                ..
            } => (*segment, *media_time),
        };
        let forward = count > 0;
        let track = self.track;
        let Some(segment) = track.segments.get(segment_index) else {
            return;
        };
        let Some(media_range) = segment.media_range else {
            return;
        };

        // Step the per-sample cursor along the media timeline.
        let (moved, stepped) = match &mut self.position {
            Position::Positioned { cursor, .. } => {
                let moved = cursor.step_by_count(count);
                (moved, cursor.presentation_time())
            }
            Position::Unpositioned => return,
        };
        // The per-sample cursor pins at the media's first/last sample. When
        // it could not move, treat the segment's media boundary in the step
        // direction as the target and run the usual logic from there.
        let new_media = if moved == 0 || stepped == current_media {
            if forward {
                media_range.end()
            } else {
                media_range.start
            }
        } else {
            stepped
        };

        let inside = if forward {
            new_media < media_range.end()
        } else {
            new_media > media_range.start
        };
        if inside {
            let Some(new_track) = segment.media_to_track(new_media) else {
                return;
            };
            if new_track == self.presentation_time {
                // A degenerate one-sample segment cannot advance the track
                // clock by sample stepping; jump straight to the segment's
                // track-range edge in the step direction.
                let (track_time, media_time) = if forward {
                    (segment.track_range.end(), media_range.end())
                } else {
                    (segment.track_range.start, media_range.start)
                };
                self.update_position(segment_index, track_time, media_time);
            } else {
                self.update_position(segment_index, new_track, new_media);
            }
            return;
        }

        self.cross_into_adjacent(segment_index, forward);
    }

    /// Bulk-step to the end of the current storage chunk or the end of the
    /// current segment, whichever is fewer samples away (always at least
    /// one sample).
    ///
    /// Only defined for chunks with uniform sample durations; others report
    /// [`Error::NonUniformChunkDurations`] so the caller can choose a
    /// slower fallback.
    pub fn step_to_next_chunk_or_segment(&mut self) -> Result<RationalTime> {
        let (segment_index, media_time, uniform, remaining, duration) = match &self.position {
            Position::Unpositioned => return Ok(self.presentation_time),
            Position::Positioned {
                segment,
                media_time,
                cursor,
            } => (
                *segment,
                *media_time,
                cursor.chunk_has_uniform_sample_durations(),
                cursor.current_chunk_sample_count() - cursor.current_sample_index_in_chunk(),
                cursor.current_sample_duration(),
            ),
        };
        if !uniform {
            return Err(Error::NonUniformChunkDurations);
        }
        let track = self.track;
        let Some(segment) = track.segments.get(segment_index) else {
            return Ok(self.presentation_time);
        };
        let Some(media_range) = segment.media_range else {
            return Ok(self.presentation_time);
        };
        // Project the media time at the end of the chunk and compare it
        // against the segment boundary. The boundary is a track-time fact,
        // but its exact image on the media axis is the media-range end, so
        // the comparison can stay in media time.
        let chunk_end = media_time + duration.mul_i64(remaining as i64);
        let count = if chunk_end <= media_range.end() {
            remaining as i64
        } else {
            (media_range.end() - media_time)
                .div_duration_floor(duration)
                .unwrap_or(1)
        };
        self.step_by_count(count.max(1));
        Ok(self.presentation_time)
    }

    fn update_position(&mut self, segment: usize, track_time: RationalTime, media: RationalTime) {
        self.presentation_time = track_time;
        if let Position::Positioned {
            segment: current,
            media_time,
            ..
        } = &mut self.position
        {
            *current = segment;
            *media_time = media;
        }
    }

    /// Move into the nearest steppable segment in the given direction,
    /// skipping gaps; pin at the current segment's edge when there is none.
    fn cross_into_adjacent(&mut self, from: usize, forward: bool) {
        let track = self.track;
        let segments = track.segments.segments();
        let direction: isize = if forward { 1 } else { -1 };
        let mut i = from as isize + direction;
        while i >= 0 && (i as usize) < segments.len() {
            let index = i as usize;
            let segment = &segments[index];
            if let Some(media_range) = segment.media_range {
                let (track_time, media_time) = if forward {
                    (segment.track_range.start, media_range.start)
                } else {
                    (segment.track_range.end(), media_range.end())
                };
                if let Some(cursor) = track.make_sample_cursor(media_time) {
                    self.presentation_time = track_time;
                    self.position = Position::Positioned {
                        segment: index,
                        media_time,
                        cursor,
                    };
                    return;
                }
            }
            i += direction;
        }
        // No steppable segment beyond this one: pin at the track's own
        // start or end.
        let Some(segment) = segments.get(from) else {
            return;
        };
        if let Some(media_range) = segment.media_range {
            let (track_time, media_time) = if forward {
                (segment.track_range.end(), media_range.end())
            } else {
                (segment.track_range.start, media_range.start)
            };
            self.update_position(from, track_time, media_time);
        }
    }
}
