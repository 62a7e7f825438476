//! Track segments: mappings from media time onto track time.

use crate::error::{Error, Result};
use crate::time::{map_time, RationalTime, TimeRange};

/// One contiguous edit: a media time range playing over a track time range.
///
/// A segment with no media range is a gap (an empty edit): nothing plays
/// there, and cursors step over it rather than fail on it.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    /// The span of the track's own media mapped by this segment, or `None`
    /// for a gap.
    pub media_range: Option<TimeRange>,
    /// The span of track time this segment occupies.
    pub track_range: TimeRange,
}

impl Segment {
    /// A segment playing `media_range` over `track_range`.
    pub fn new(media_range: TimeRange, track_range: TimeRange) -> Self {
        Self {
            media_range: Some(media_range),
            track_range,
        }
    }

    /// An empty edit occupying `track_range`.
    pub fn gap(track_range: TimeRange) -> Self {
        Self {
            media_range: None,
            track_range,
        }
    }

    pub fn is_gap(&self) -> bool {
        self.media_range.is_none()
    }

    /// Map a track time into this segment's media time.
    pub fn track_to_media(&self, track_time: RationalTime) -> Option<RationalTime> {
        self.media_range
            .as_ref()
            .map(|media| map_time(track_time, &self.track_range, media))
    }

    /// Map a media time back onto this segment's track time.
    pub fn media_to_track(&self, media_time: RationalTime) -> Option<RationalTime> {
        self.media_range
            .as_ref()
            .map(|media| map_time(media_time, media, &self.track_range))
    }
}

/// A track's ordered segment list.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentMap {
    segments: Vec<Segment>,
}

impl SegmentMap {
    /// Build a map from an ordered segment list.
    ///
    /// Segments must be ordered by track time and must not overlap; their
    /// ranges must be valid. Gaps between consecutive segments are legal.
    pub fn new(segments: Vec<Segment>) -> Result<Self> {
        for (i, segment) in segments.iter().enumerate() {
            if !segment.track_range.is_valid() {
                return Err(Error::invalid_segment_map(format!(
                    "segment {i} has an invalid track range"
                )));
            }
            if let Some(media) = &segment.media_range {
                if !media.is_valid() {
                    return Err(Error::invalid_segment_map(format!(
                        "segment {i} has an invalid media range"
                    )));
                }
            }
            if i > 0 {
                let prev_end = segments[i - 1].track_range.end();
                if segment.track_range.start < prev_end {
                    return Err(Error::invalid_segment_map(format!(
                        "segment {i} overlaps its predecessor"
                    )));
                }
            }
        }
        Ok(Self { segments })
    }

    /// The identity mapping: media time equals track time over `range`.
    pub fn identity(range: TimeRange) -> Self {
        Self {
            segments: vec![Segment::new(range, range)],
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Index of the segment whose track range contains the given time.
    pub fn segment_index_at(&self, track_time: RationalTime) -> Option<usize> {
        self.segments
            .iter()
            .position(|s| s.track_range.contains(track_time))
    }

    /// End of the last segment's track range, i.e. the track's own end.
    pub fn track_end(&self) -> RationalTime {
        self.segments
            .last()
            .map(|s| s.track_range.end())
            .unwrap_or(RationalTime::ZERO)
    }
}
