//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Each pipeline stage has its own error enum; the crate `Error` wraps them with a
//! stage label so callers always know which step of the pipeline failed.
use thiserror::Error;

pub use crate::core::params::ConfigError;
pub use crate::io::archive::ArchiveError;
pub use crate::io::gdal::RasterError;
pub use crate::net::auth::AuthError;
pub use crate::net::RequestError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("data request failed: {0}")]
    Request(#[from] RequestError),

    #[error("archive extraction failed: {0}")]
    Archive(#[from] ArchiveError),

    #[error("raster stacking failed: {0}")]
    Raster(#[from] RasterError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short name of the pipeline stage that produced this error.
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Auth(_) => "auth",
            Error::Request(_) => "request",
            Error::Archive(_) => "archive",
            Error::Raster(_) => "raster",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_label_is_in_message() {
        let err: Error = AuthError::MissingToken.into();
        assert_eq!(err.stage(), "auth");
        assert!(err.to_string().starts_with("authentication failed"));

        let err: Error = RasterError::NoTiles("/tmp/x".into()).into();
        assert_eq!(err.stage(), "raster");
        assert!(err.to_string().starts_with("raster stacking failed"));
    }
}
