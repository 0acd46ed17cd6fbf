/// Core error type for the link bot.
///
/// Adapter crates map their specific errors into this type so the per-URL
/// pipeline can log and skip a failure without knowing where it came from.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid url: {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("could not resolve a filename for {0}")]
    FilenameUnresolved(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
