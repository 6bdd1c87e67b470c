use super::{Movie, MovieStore};
use futures::{Stream, stream};
use std::sync::Arc;

/// Read-side pass-through from the HTTP layer to a [`MovieStore`].
///
/// Sequences are built from a snapshot taken when the method is called and
/// handed out one document per poll.
#[derive(Clone)]
pub struct MovieQueryService {
    store: Arc<dyn MovieStore>,
}

impl MovieQueryService {
    pub fn new(store: Arc<dyn MovieStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn MovieStore> {
        &self.store
    }

    /// All movies currently in the store, in store-defined order.
    pub fn list_all(&self) -> impl Stream<Item = Movie> + Send + 'static {
        stream::iter(self.store.list())
    }

    /// Returns `None` when no movie has this id.
    pub fn get_by_id(&self, id: &str) -> Option<Movie> {
        self.store.get_by_id(id)
    }

    pub fn find_by_title(&self, title: &str) -> impl Stream<Item = Movie> + Send + 'static {
        stream::iter(self.store.find_by_title(title))
    }
}
