use thiserror::Error;

/// Error from the live-data tool surface.
///
/// Every failure a caller can see falls into one of four kinds; the kind name
/// is part of the structured failure result, so variants are not added or
/// renamed lightly.
#[derive(Debug, Error)]
pub enum ArmError {
    /// Malformed or missing request parameter. Raised before any network I/O.
    #[error("invalid parameter: {0}")]
    Validation(String),

    /// Network failure, timeout, or non-success HTTP status from the archive.
    #[error("remote request failed: {0}")]
    Remote(String),

    /// The requested variable is absent from a successfully parsed file.
    #[error("{0}")]
    NotFound(String),

    /// Downloaded content is not a valid netCDF container.
    #[error("not a valid netCDF file: {0}")]
    Format(String),
}

impl ArmError {
    /// Stable kind name surfaced alongside the message in tool failures.
    pub fn kind(&self) -> &'static str {
        match self {
            ArmError::Validation(_) => "ValidationError",
            ArmError::Remote(_) => "RemoteError",
            ArmError::NotFound(_) => "NotFoundError",
            ArmError::Format(_) => "FormatError",
        }
    }
}

impl From<reqwest::Error> for ArmError {
    fn from(err: reqwest::Error) -> Self {
        // Keep the cause visible in the message. `reqwest::Error`'s Display
        // drops its source, which is where connect/timeout detail lives.
        let mut msg = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            msg.push_str(": ");
            msg.push_str(&cause.to_string());
            source = cause.source();
        }
        if err.is_timeout() {
            ArmError::Remote(format!("request timed out: {msg}"))
        } else {
            ArmError::Remote(msg)
        }
    }
}

impl From<netcdf::Error> for ArmError {
    fn from(err: netcdf::Error) -> Self {
        ArmError::Format(err.to_string())
    }
}

impl From<std::io::Error> for ArmError {
    fn from(err: std::io::Error) -> Self {
        // Scratch-file I/O while handing bytes to the netCDF reader.
        ArmError::Format(format!("scratch file I/O failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, ArmError>;
