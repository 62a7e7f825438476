//! Reelcut-Common: Shared types and identifiers.
//!
//! This crate provides the vocabulary shared between the reelcut engine and
//! any outer layer (window management, playback, document handling):
//!
//! - **Typed IDs**: Type-safe UUID wrappers for open movies
//! - **Media kinds**: The classes of track media the editor understands
//!
//! # Examples
//!
//! ```
//! use reelcut_common::{MediaKind, MovieId};
//!
//! let id = MovieId::new();
//! assert!(MediaKind::Audio.is_audio());
//! assert_eq!(MediaKind::Timecode.to_string(), "timecode");
//! ```

pub mod ids;
pub mod types;

pub use ids::MovieId;
pub use types::MediaKind;
