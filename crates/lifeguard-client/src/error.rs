//! Errors returned by the data access collaborator.

/// A collaborator call failed.
///
/// `Clone` so the in-memory backend can hand out the same injected failure
/// on every call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataAccessError {
    /// The referenced record does not exist.
    #[error("{resource} {id} not found")]
    NotFound {
        /// Kind of record ("shift", "flag", ...).
        resource: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The request never produced a response (connect, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The collaborator answered with a non-success status.
    #[error("server returned {status}: {}", message.as_deref().unwrap_or("no message"))]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message taken from the error body, when one was provided.
        message: Option<String>,
    },

    /// The response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
}

impl DataAccessError {
    /// Shorthand for [`DataAccessError::NotFound`].
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Shorthand for a [`DataAccessError::Server`] carrying a message.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: Some(message.into()),
        }
    }

    /// The message the collaborator supplied, suitable for showing to a user.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}
