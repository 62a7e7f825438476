//! Per-sample cursors over a sample table.

use super::sample_table::{SampleEntry, SampleTable};
use crate::time::{RationalTime, RoundingMode};

/// A cursor positioned on one media sample, steppable in decode order.
///
/// This is the sample-level primitive underneath [`TrackSampleCursor`]; it
/// knows nothing about segments or track time, only about the media's own
/// timeline.
///
/// [`TrackSampleCursor`]: super::TrackSampleCursor
#[derive(Debug, Clone)]
pub struct TableSampleCursor<'t> {
    table: &'t SampleTable,
    timescale: i32,
    index: u32,
}

impl<'t> TableSampleCursor<'t> {
    /// Position a cursor at the sample containing the given media time.
    ///
    /// Returns `None` if the table has no samples or the timescale is
    /// unusable; times outside the table clamp to its first or last sample.
    pub fn new(table: &'t SampleTable, timescale: i32, media_time: RationalTime) -> Option<Self> {
        if timescale <= 0 {
            return None;
        }
        // Containment wants the tick at or below the requested time.
        let ticks = media_time
            .convert_scale(timescale, RoundingMode::TowardNegativeInfinity)
            .value()?;
        let index = table.sample_containing(ticks)?;
        Some(Self {
            table,
            timescale,
            index,
        })
    }

    fn current(&self) -> &SampleEntry {
        &self.table.samples[self.index as usize]
    }

    /// Index of the current sample.
    pub fn sample_index(&self) -> u32 {
        self.index
    }

    /// Media presentation time of the current sample.
    pub fn presentation_time(&self) -> RationalTime {
        RationalTime::new(self.current().dts as i64, self.timescale)
    }

    /// Step by a signed number of samples, clamping at the table edges.
    /// Returns the signed count actually moved; 0 means the cursor was
    /// already pinned at the edge.
    pub fn step_by_count(&mut self, count: i64) -> i64 {
        let last = self.table.sample_count as i64 - 1;
        let target = (self.index as i64 + count).clamp(0, last);
        let moved = target - self.index as i64;
        self.index = target as u32;
        moved
    }

    /// Duration of the current sample.
    pub fn current_sample_duration(&self) -> RationalTime {
        RationalTime::new(self.current().duration as i64, self.timescale)
    }

    /// Number of samples in the current storage chunk.
    pub fn current_chunk_sample_count(&self) -> u32 {
        self.table
            .chunk(self.current().chunk)
            .map_or(1, |c| c.sample_count)
    }

    /// Position of the current sample within its chunk (0-based).
    pub fn current_sample_index_in_chunk(&self) -> u32 {
        self.current().index_in_chunk
    }

    /// Whether every sample in the current chunk has the same duration.
    pub fn chunk_has_uniform_sample_durations(&self) -> bool {
        self.table
            .chunk(self.current().chunk)
            .map_or(true, |c| c.uniform_durations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::sample_table::SampleTableBuilder;

    fn table_30fps(samples: u32) -> SampleTable {
        let mut builder = SampleTableBuilder::new();
        builder.set_time_to_sample(vec![(samples, 1)]);
        builder.set_sample_to_chunk(vec![(1, 10)]);
        builder.build()
    }

    #[test]
    fn test_cursor_positions_at_containing_sample() {
        let table = table_30fps(300);
        // 0.999s at 30 ticks/s falls inside sample 29
        let cursor =
            TableSampleCursor::new(&table, 30, RationalTime::new(999, 1000)).unwrap();
        assert_eq!(cursor.sample_index(), 29);
        assert_eq!(cursor.presentation_time(), RationalTime::new(29, 30));
    }

    #[test]
    fn test_cursor_clamps_outside_table() {
        let table = table_30fps(30);
        let before =
            TableSampleCursor::new(&table, 30, RationalTime::new(-5, 1)).unwrap();
        assert_eq!(before.sample_index(), 0);
        let after = TableSampleCursor::new(&table, 30, RationalTime::new(99, 1)).unwrap();
        assert_eq!(after.sample_index(), 29);
    }

    #[test]
    fn test_cursor_rejects_empty_table() {
        let table = SampleTableBuilder::new().build();
        assert!(TableSampleCursor::new(&table, 30, RationalTime::ZERO).is_none());
    }

    #[test]
    fn test_step_and_clamp() {
        let table = table_30fps(30);
        let mut cursor = TableSampleCursor::new(&table, 30, RationalTime::ZERO).unwrap();
        assert_eq!(cursor.step_by_count(5), 5);
        assert_eq!(cursor.sample_index(), 5);
        assert_eq!(cursor.step_by_count(-10), -5);
        assert_eq!(cursor.sample_index(), 0);
        assert_eq!(cursor.step_by_count(-1), 0);
        assert_eq!(cursor.step_by_count(100), 29);
        assert_eq!(cursor.step_by_count(1), 0);
    }

    #[test]
    fn test_chunk_queries() {
        let table = table_30fps(25); // chunks of 10, 10, 5
        let mut cursor = TableSampleCursor::new(&table, 30, RationalTime::ZERO).unwrap();
        assert_eq!(cursor.current_chunk_sample_count(), 10);
        assert_eq!(cursor.current_sample_index_in_chunk(), 0);
        assert!(cursor.chunk_has_uniform_sample_durations());

        cursor.step_by_count(14);
        assert_eq!(cursor.current_chunk_sample_count(), 10);
        assert_eq!(cursor.current_sample_index_in_chunk(), 4);

        cursor.step_by_count(10);
        assert_eq!(cursor.current_chunk_sample_count(), 5);
        assert_eq!(cursor.current_sample_index_in_chunk(), 4);
    }

    #[test]
    fn test_non_uniform_chunk_reported() {
        let mut builder = SampleTableBuilder::new();
        builder.set_time_to_sample(vec![(2, 100), (2, 50)]);
        builder.set_sample_to_chunk(vec![(1, 4)]);
        let table = builder.build();
        let cursor = TableSampleCursor::new(&table, 1000, RationalTime::ZERO).unwrap();
        assert!(!cursor.chunk_has_uniform_sample_durations());
    }
}
