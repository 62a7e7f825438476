//! Typed ID wrappers for type safety across reelcut.
//!
//! Open movies are referred to by value-typed IDs rather than raw UUIDs so
//! that an identifier for one kind of object cannot be passed where another
//! is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an open movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(Uuid);

impl MovieId {
    /// Generate a new random movie ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MovieId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for MovieId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<MovieId> for Uuid {
    fn from(id: MovieId) -> Self {
        id.0
    }
}

impl std::fmt::Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_id_creation() {
        let id1 = MovieId::new();
        let id2 = MovieId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_movie_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = MovieId::from(uuid);
        let uuid_back: Uuid = id.into();
        assert_eq!(uuid, uuid_back);
    }

    #[test]
    fn test_movie_id_serialization() {
        let id = MovieId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: MovieId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_movie_id_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        let id = MovieId::new();
        set.insert(id);
        assert!(set.contains(&id));
    }
}
