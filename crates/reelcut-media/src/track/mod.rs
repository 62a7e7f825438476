//! Tracks: segment maps, sample tables, and cursors.

pub mod sample_cursor;
pub mod sample_table;
pub mod segment;
pub mod track_cursor;

pub use sample_cursor::TableSampleCursor;
pub use sample_table::{ChunkEntry, SampleEntry, SampleTable, SampleTableBuilder};
pub use segment::{Segment, SegmentMap};
pub use track_cursor::TrackSampleCursor;

use crate::time::{RationalTime, TimeRange};
use reelcut_common::MediaKind;

/// One track of a movie: its media kind, timing, sample table, and the
/// segment map translating its media onto the track timeline.
#[derive(Debug, Clone)]
pub struct Track {
    /// Track ID from the container (0 when synthesized in memory).
    pub id: u32,
    /// The class of media this track carries.
    pub kind: MediaKind,
    /// Media timescale (ticks per second of the track's own media).
    pub timescale: i32,
    /// Media duration in timescale ticks.
    pub duration: u64,
    /// The track's media samples.
    pub sample_table: SampleTable,
    /// Ordered media-to-track time mappings.
    pub segments: SegmentMap,
}

impl Track {
    /// Create an empty track of the given kind.
    pub fn new(id: u32, kind: MediaKind, timescale: i32) -> Self {
        Self {
            id,
            kind,
            timescale,
            duration: 0,
            sample_table: SampleTable::default(),
            segments: SegmentMap::default(),
        }
    }

    /// The duration of the track's media on its own timeline.
    pub fn media_duration(&self) -> RationalTime {
        RationalTime::new(self.duration as i64, self.timescale)
    }

    /// The span of track time covered by the segment map.
    pub fn track_range(&self) -> TimeRange {
        TimeRange::from_start_end(RationalTime::ZERO, self.segments.track_end())
    }

    /// Position a per-sample cursor at the given media time, if the track
    /// has samples there.
    pub fn make_sample_cursor(&self, media_time: RationalTime) -> Option<TableSampleCursor<'_>> {
        TableSampleCursor::new(&self.sample_table, self.timescale, media_time)
    }

    /// Build a track-level cursor at the given track time.
    pub fn sample_cursor_at(&self, track_time: RationalTime) -> TrackSampleCursor<'_> {
        TrackSampleCursor::new(self, track_time)
    }
}
