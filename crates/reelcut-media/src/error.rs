//! Error types for reelcut-media.

use crate::atoms::AtomType;
use std::io;
use thiserror::Error;

/// Result type for reelcut-media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for reelcut-media operations.
///
/// An unpositioned track cursor is deliberately not represented here: a
/// cursor with no segment under it is a valid terminal state of the stepping
/// state machine, reported through the cursor itself.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The requested top-level atom is not present in the file.
    #[error("Atom not found: {0}")]
    AtomNotFound(AtomType),

    /// An atom needs an extended size field but no placeholder atom exists
    /// to absorb the larger header, so the rewrite cannot proceed.
    #[error("Atom {atom} of size {size} cannot be given an explicit size")]
    SizeOverflow { atom: AtomType, size: u64 },

    /// Malformed or unusable atom bytes.
    #[error("Invalid atom: {0}")]
    InvalidAtom(String),

    /// Invalid segment list for a track.
    #[error("Invalid segment map: {0}")]
    InvalidSegmentMap(String),

    /// Bulk chunk stepping was requested on storage whose current chunk has
    /// non-uniform sample durations. Callers wanting to continue must fall
    /// back to single-sample stepping.
    #[error("Current chunk does not have uniform sample durations")]
    NonUniformChunkDurations,

    /// Unsupported feature or structure.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    /// Create an invalid atom error.
    pub fn invalid_atom(msg: impl Into<String>) -> Self {
        Self::InvalidAtom(msg.into())
    }

    /// Create an invalid segment map error.
    pub fn invalid_segment_map(msg: impl Into<String>) -> Self {
        Self::InvalidSegmentMap(msg.into())
    }

    /// Create an unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}
