//! Reelcut-Media: container atom rewriting and track sample cursors.
//!
//! This crate is the engine core of the reelcut movie editor. It owns the
//! two low-level subsystems everything else builds on:
//!
//! # Modules
//!
//! - `time` - exact rational timestamps, ranges, and range mapping
//! - `atoms` - top-level atom scanning and safe in-place header rewriting
//! - `track` - segment maps, sample tables, and presentation-order cursors
//! - `movie` - the loaded movie model, registry, and interesting-time
//!   queries
//!
//! # Architecture
//!
//! Opening a movie scans the file's top-level atoms, walks the `moov`
//! children, and builds one [`Track`] per `trak`: media kind, timescale,
//! the sample table behind the per-sample cursor, and the edit-list-derived
//! [`SegmentMap`]. Interactive stepping runs on [`TrackSampleCursor`],
//! which translates between track time and media time across segment
//! boundaries; [`Movie::next_interesting_time`] and
//! [`Movie::previous_interesting_time`] fold the per-track cursors into a
//! single scrub target.
//!
//! Saving a header back goes through [`AtomRewriter`], which replaces one
//! top-level atom in place, covering shrinkage with `free` padding and
//! relocating growth to the end of the file without disturbing any other
//! atom.
//!
//! Everything here is synchronous and single-threaded; cursors are
//! exclusively owned by their creator, and the rewriter assumes it is the
//! only writer of its file.

pub mod atoms;
pub mod error;
pub mod movie;
pub mod time;
pub mod track;

pub use atoms::{Atom, AtomRewriter, AtomScanner, AtomType, Storage};
pub use error::{Error, Result};
pub use movie::{Movie, MovieEntry, MovieRegistry};
pub use time::{map_time, RationalTime, RoundingMode, TimeRange};
pub use track::{
    SampleTable, SampleTableBuilder, Segment, SegmentMap, TableSampleCursor, Track,
    TrackSampleCursor,
};
