//! The open-movie registry.
//!
//! All open movies live in one registry value owned by the caller (the
//! document layer, a test, …). Movies are inserted on open and removed on
//! close; nothing here is ambient or global.

use super::Movie;
use crate::error::Result;
use reelcut_common::MovieId;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A registered movie and where it came from.
#[derive(Debug)]
pub struct MovieEntry {
    pub movie: Movie,
    /// Backing file, absent for movies that have never been saved.
    pub path: Option<PathBuf>,
}

/// Registry of open movies, keyed by typed ID.
#[derive(Debug, Default)]
pub struct MovieRegistry {
    movies: HashMap<MovieId, MovieEntry>,
}

impl MovieRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a movie file and register it.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<MovieId> {
        let movie = Movie::open(&path)?;
        let id = MovieId::new();
        self.movies.insert(
            id,
            MovieEntry {
                movie,
                path: Some(path.as_ref().to_path_buf()),
            },
        );
        Ok(id)
    }

    /// Register an in-memory movie (e.g. a brand new document).
    pub fn insert(&mut self, movie: Movie) -> MovieId {
        let id = MovieId::new();
        self.movies.insert(id, MovieEntry { movie, path: None });
        id
    }

    pub fn get(&self, id: MovieId) -> Option<&MovieEntry> {
        self.movies.get(&id)
    }

    pub fn get_mut(&mut self, id: MovieId) -> Option<&mut MovieEntry> {
        self.movies.get_mut(&id)
    }

    /// Remove a movie on close, returning its entry.
    pub fn remove(&mut self, id: MovieId) -> Option<MovieEntry> {
        self.movies.remove(&id)
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.movies.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// IDs of every open movie.
    pub fn ids(&self) -> impl Iterator<Item = MovieId> + '_ {
        self.movies.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut registry = MovieRegistry::new();
        assert!(registry.is_empty());

        let id = registry.insert(Movie::empty(600));
        assert!(registry.contains(id));
        assert_eq!(registry.len(), 1);
        assert!(registry.get(id).is_some());
        assert!(registry.get(id).unwrap().path.is_none());

        let entry = registry.remove(id).unwrap();
        assert_eq!(entry.movie.timescale, 600);
        assert!(!registry.contains(id));
        assert!(registry.remove(id).is_none());
    }

    #[test]
    fn test_distinct_ids() {
        let mut registry = MovieRegistry::new();
        let a = registry.insert(Movie::empty(600));
        let b = registry.insert(Movie::empty(600));
        assert_ne!(a, b);
        assert_eq!(registry.ids().count(), 2);
    }

    #[test]
    fn test_get_mut_allows_edits() {
        let mut registry = MovieRegistry::new();
        let id = registry.insert(Movie::empty(600));
        registry.get_mut(id).unwrap().movie.timescale = 1000;
        assert_eq!(registry.get(id).unwrap().movie.timescale, 1000);
    }
}
