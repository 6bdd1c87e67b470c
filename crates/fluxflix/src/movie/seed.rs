use super::{Movie, MovieStore};
use crate::Result;

/// Titles loaded into the store when the service starts with demo data.
pub const DEMO_TITLES: [&str; 7] = [
    "The Silence of the Lambdas",
    "Back to the Future",
    "AEon Flux",
    "Meet the Fluxers",
    "The Fluxxinator",
    "Flux Gordon",
    "Y Tu Mono Tambien",
];

/// Replaces the contents of `store` with one movie per title.
///
/// Every title is validated before the store is touched, so a rejected list
/// leaves the existing collection in place. Running the seed again yields
/// the same set of titles, under fresh ids.
///
/// # Errors
///
/// Returns [`Error::MissingTitle`](crate::Error::MissingTitle) if any title is
/// blank.
pub fn seed_demo_data<S, I>(store: &S, titles: I) -> Result<Vec<Movie>>
where
    S: MovieStore + ?Sized,
    I: IntoIterator,
    I::Item: Into<String>,
{
    let drafts = titles
        .into_iter()
        .map(|title| {
            let draft = Movie::draft(title);
            draft.validate().map(|()| draft)
        })
        .collect::<Result<Vec<_>>>()?;

    store.delete_all();

    let mut saved = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let movie = store.save(draft)?;
        #[cfg(feature = "tracing")]
        tracing::info!(id = movie.id(), title = movie.title(), "Seeded movie");
        saved.push(movie);
    }
    Ok(saved)
}
