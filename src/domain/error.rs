use thiserror::Error;

/// Core domain errors
///
/// The first three variants are transient and eligible for retry; see
/// [`DomainError::is_retryable`].
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("Request timed out: {message}")]
    Timeout {
        message: String,
        retry_after: Option<u64>,
    },

    #[error("Rate limit exceeded: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<u64>,
    },

    #[error("Server error (HTTP {status}): {message}")]
    Server {
        status: u16,
        message: String,
        retry_after: Option<u64>,
    },

    #[error("Client error (HTTP {status}): {message}")]
    Client { status: u16, message: String },

    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Invalid response: {message}")]
    Response { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn rate_limited(message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after,
        }
    }

    pub fn server(status: u16, message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Self::Server {
            status,
            message: message.into(),
            retry_after,
        }
    }

    pub fn client(status: u16, message: impl Into<String>) -> Self {
        Self::Client {
            status,
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn response(message: impl Into<String>) -> Self {
        Self::Response {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Classify a non-success HTTP status returned by a model backend
    pub fn from_status(status: u16, message: impl Into<String>, retry_after: Option<u64>) -> Self {
        match status {
            401 => Self::authentication(message),
            429 => Self::rate_limited(message, retry_after),
            500..=599 => Self::server(status, message, retry_after),
            _ => Self::client(status, message),
        }
    }

    /// Whether the failure is transient: timeouts, rate limits and 5xx responses
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::RateLimited { .. } | Self::Server { .. }
        )
    }

    /// Server-supplied wait hint in seconds, if any
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::Timeout { retry_after, .. }
            | Self::RateLimited { retry_after, .. }
            | Self::Server { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Short type name used in technical log lines
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "Timeout",
            Self::RateLimited { .. } => "RateLimited",
            Self::Server { .. } => "ServerError",
            Self::Client { .. } => "ClientError",
            Self::Authentication { .. } => "AuthenticationError",
            Self::Network { .. } => "NetworkError",
            Self::Response { .. } => "ResponseError",
            Self::Configuration { .. } => "ConfigurationError",
            Self::Validation { .. } => "ValidationError",
            Self::Internal { .. } => "InternalError",
        }
    }
}
