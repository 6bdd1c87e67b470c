use crate::{Error, Result};

/// Store-generated identifier of a [`Movie`].
pub type MovieId = String;

/// A movie document.
///
/// A movie built with [`Movie::draft`] has no id until a
/// [`MovieStore`](crate::MovieStore) assigns one on save.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Movie {
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    id: Option<MovieId>,
    title: String,
}

impl Movie {
    pub fn draft(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
        }
    }

    pub fn with_id(id: impl Into<MovieId>, title: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            title: title.into(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub const fn is_draft(&self) -> bool {
        self.id.is_none()
    }

    /// Checks the only rule a movie has to satisfy: a title must be present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingTitle`] if the title is empty or whitespace.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::MissingTitle);
        }
        Ok(())
    }

    pub(crate) fn assign_id(&mut self, id: MovieId) {
        self.id = Some(id);
    }
}
