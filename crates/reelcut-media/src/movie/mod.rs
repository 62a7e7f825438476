//! The in-memory movie model.

mod interesting;
mod loader;
mod registry;

pub use registry::{MovieEntry, MovieRegistry};

use crate::error::Result;
use crate::time::RationalTime;
use crate::track::Track;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// A loaded movie: the movie clock and its tracks.
///
/// The editing operations themselves (insert, remove, scale) live in the
/// movie-editing library on top; this model carries what the stepping and
/// rewriting engines need.
#[derive(Debug, Clone)]
pub struct Movie {
    /// Movie timescale (ticks per second of the movie clock).
    pub timescale: i32,
    /// Total duration on the movie clock.
    pub duration: RationalTime,
    /// All tracks, in container order.
    pub tracks: Vec<Track>,
}

impl Movie {
    /// Open and parse a movie file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }

    /// Parse a movie from any seekable source.
    pub fn parse<R: Read + Seek>(reader: R) -> Result<Self> {
        loader::parse_movie(reader)
    }

    /// An empty movie with the given timescale, for callers assembling a
    /// model in memory.
    pub fn empty(timescale: i32) -> Self {
        Self {
            timescale,
            duration: RationalTime::new(0, timescale.max(1)),
            tracks: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_movie() {
        let movie = Movie::empty(600);
        assert_eq!(movie.duration, RationalTime::ZERO);
        assert!(movie.tracks.is_empty());
    }
}
