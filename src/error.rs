use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Couldn't compile the selector: {0}")]
    Selector(String),

    #[error("Failed to fetch page {page}: {message}")]
    Network {
        page: u32,
        /// HTTP status when the server answered, `None` for transport failures.
        status: Option<u16>,
        message: String,
        timeout: bool,
    },

    #[error("No contracts were collected from {pages} page(s), nothing to export.")]
    NoRecords { pages: u32 },

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Csv Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl Error {
    /// Wraps a reqwest failure for a specific page.
    pub(crate) fn network(page: u32, err: &reqwest::Error) -> Self {
        Error::Network {
            page,
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
            timeout: err.is_timeout(),
        }
    }

    pub fn page(&self) -> Option<u32> {
        match self {
            Error::Network { page, .. } => Some(*page),
            _ => None,
        }
    }
}
