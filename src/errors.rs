use thiserror::Error;

/// Structured error types for the service station.
///
/// Only construction can fail with a configuration error. Once a station is running the
/// synchronization core has no failure modes of its own; the remaining variants describe
/// problems with the threads that host it.
#[derive(Error, Debug)]
pub enum StationError {
    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("Failed to spawn thread {name}")]
    ThreadSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Thread {name} panicked")]
    ThreadPanicked { name: String },
}

impl StationError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub const fn is_invalid_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration { .. })
    }
}

pub type Result<T> = std::result::Result<T, StationError>;
