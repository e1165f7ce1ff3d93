use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The page fetch failed; session state is as if it was never issued.
    #[error("search failed: {0}")]
    Fetch(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("session driver has shut down")]
    Closed,
}

impl SessionError {
    pub(crate) fn fetch<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SessionError::Fetch(Box::new(err))
    }
}
