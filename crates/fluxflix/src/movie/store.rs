use super::{Movie, MovieId};
use crate::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// A document collection of movies keyed by a store-generated id.
///
/// Implementations must be safe to share across request handlers. Reads
/// return owned snapshots; the order of [`list`](Self::list) is up to the
/// store.
pub trait MovieStore: Send + Sync {
    fn list(&self) -> Vec<Movie>;

    fn get_by_id(&self, id: &str) -> Option<Movie>;

    /// Movies whose title equals `title` exactly.
    fn find_by_title(&self, title: &str) -> Vec<Movie>;

    /// Inserts a draft under a fresh id, or replaces the document with the
    /// same id. Returns the stored document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingTitle`](crate::Error::MissingTitle) if the
    /// movie has a blank title.
    fn save(&self, movie: Movie) -> Result<Movie>;

    fn delete_all(&self);
}

#[derive(Default)]
struct Collection {
    documents: HashMap<MovieId, Movie>,
    // Insertion order of ids, so listings are stable.
    order: Vec<MovieId>,
}

/// In-process [`MovieStore`] assigning UUID v4 ids.
#[derive(Default)]
pub struct InMemoryMovieStore {
    collection: RwLock<Collection>,
}

impl InMemoryMovieStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.collection.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MovieStore for InMemoryMovieStore {
    fn list(&self) -> Vec<Movie> {
        let collection = self.collection.read();
        collection
            .order
            .iter()
            .filter_map(|id| collection.documents.get(id).cloned())
            .collect()
    }

    fn get_by_id(&self, id: &str) -> Option<Movie> {
        self.collection.read().documents.get(id).cloned()
    }

    fn find_by_title(&self, title: &str) -> Vec<Movie> {
        self.list()
            .into_iter()
            .filter(|movie| movie.title() == title)
            .collect()
    }

    fn save(&self, mut movie: Movie) -> Result<Movie> {
        movie.validate()?;

        let id = match movie.id() {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                movie.assign_id(id.clone());
                id
            }
        };

        let mut collection = self.collection.write();
        if collection.documents.insert(id.clone(), movie.clone()).is_none() {
            collection.order.push(id);
        }
        Ok(movie)
    }

    fn delete_all(&self) {
        let mut collection = self.collection.write();
        collection.documents.clear();
        collection.order.clear();
    }
}
