//! Caller-safe error reports
//!
//! Every failure that reaches a pipeline boundary is converted into an
//! [`ErrorReport`]. The report carries a category, a fixed user-facing
//! message and an optional retry hint. The raw error text is kept only for
//! logging and is never serialized.

use serde::{Deserialize, Serialize};
use tracing::error;

use super::DomainError;

const MSG_TIMEOUT: &str = "The AI service is taking too long to respond. Please try again.";
const MSG_RATE_LIMIT: &str = "The AI service is currently busy.";
const MSG_SERVER: &str = "The AI service is temporarily unavailable. Please try again later.";
const MSG_CLIENT: &str = "There was a problem with the request. Please try again.";
const MSG_CONFIG: &str = "AI service configuration problem. Please contact support.";
const MSG_NETWORK: &str = "Unable to connect to the AI service. Please check your connection.";
const MSG_RESPONSE: &str = "The AI service returned a response that could not be understood. Please try again.";
const MSG_UNKNOWN: &str = "An unexpected problem occurred. Please try again later.";

/// Error category exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Timeout,
    RateLimit,
    Api,
    Config,
    Network,
    Response,
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::RateLimit => "rate_limit",
            Self::Api => "api",
            Self::Config => "config",
            Self::Network => "network",
            Self::Response => "response",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable, caller-safe description of a failure
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    #[serde(rename = "error_type")]
    pub category: ErrorCategory,
    pub user_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(skip)]
    technical_details: String,
}

impl ErrorReport {
    fn new(category: ErrorCategory, user_message: impl Into<String>, technical: String) -> Self {
        Self {
            category,
            user_message: user_message.into(),
            retry_after: None,
            technical_details: technical,
        }
    }

    fn with_retry_after(mut self, retry_after: Option<u64>) -> Self {
        self.retry_after = retry_after;
        self
    }

    /// Translate a domain error into a report
    pub fn from_error(err: &DomainError) -> Self {
        let technical = format!("{}: {}", err.kind_name(), err);

        match err {
            DomainError::Timeout { retry_after, .. } => {
                Self::new(ErrorCategory::Timeout, MSG_TIMEOUT, technical)
                    .with_retry_after(*retry_after)
            }
            DomainError::RateLimited { retry_after, .. } => {
                let message = match retry_after {
                    Some(secs) if *secs > 0 => format!(
                        "{} Please wait {} seconds before trying again.",
                        MSG_RATE_LIMIT, secs
                    ),
                    _ => MSG_RATE_LIMIT.to_string(),
                };
                Self::new(ErrorCategory::RateLimit, message, technical)
                    .with_retry_after(*retry_after)
            }
            DomainError::Server { retry_after, .. } => {
                Self::new(ErrorCategory::Api, MSG_SERVER, technical).with_retry_after(*retry_after)
            }
            DomainError::Client { .. } | DomainError::Validation { .. } => {
                Self::new(ErrorCategory::Api, MSG_CLIENT, technical)
            }
            DomainError::Authentication { .. } | DomainError::Configuration { .. } => {
                Self::new(ErrorCategory::Config, MSG_CONFIG, technical)
            }
            DomainError::Network { .. } => Self::new(ErrorCategory::Network, MSG_NETWORK, technical),
            DomainError::Response { .. } => {
                Self::new(ErrorCategory::Response, MSG_RESPONSE, technical)
            }
            DomainError::Internal { .. } => Self::new(ErrorCategory::Unknown, MSG_UNKNOWN, technical),
        }
    }

    /// Translate any error. Total: unrecognised errors map to `unknown`.
    ///
    /// The source chain is searched for a [`DomainError`] first, so wrapped
    /// domain errors keep their category.
    pub fn from_any(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
        while let Some(e) = current {
            if let Some(domain) = e.downcast_ref::<DomainError>() {
                return Self::from_error(domain);
            }
            current = e.source();
        }

        if let Some(http) = err.downcast_ref::<reqwest::Error>() {
            let technical = format!("HttpError: {}", http);
            if http.is_timeout() {
                return Self::new(ErrorCategory::Timeout, MSG_TIMEOUT, technical);
            }
            if let Some(status) = http.status() {
                return Self::from_error(&DomainError::from_status(
                    status.as_u16(),
                    http.to_string(),
                    None,
                ));
            }
            if http.is_decode() {
                return Self::new(ErrorCategory::Response, MSG_RESPONSE, technical);
            }
            return Self::new(ErrorCategory::Network, MSG_NETWORK, technical);
        }

        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            let category = if io.kind() == std::io::ErrorKind::TimedOut {
                ErrorCategory::Timeout
            } else {
                ErrorCategory::Network
            };
            let message = if category == ErrorCategory::Timeout {
                MSG_TIMEOUT
            } else {
                MSG_NETWORK
            };
            return Self::new(category, message, format!("IoError: {}", io));
        }

        if let Some(json) = err.downcast_ref::<serde_json::Error>() {
            return Self::new(
                ErrorCategory::Response,
                MSG_RESPONSE,
                format!("JsonError: {}", json),
            );
        }

        Self::new(ErrorCategory::Unknown, MSG_UNKNOWN, format!("Unclassified: {}", err))
    }

    /// Raw error text, for logs only
    pub fn technical_details(&self) -> &str {
        &self.technical_details
    }

    /// Emit the technical details at error level
    pub fn log(&self) {
        error!(
            category = %self.category,
            details = %self.technical_details,
            "AI request failed: {}",
            self.user_message
        );
    }

    /// Caller-visible JSON form
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = serde_json::json!({
            "success": false,
            "error_type": self.category,
            "user_message": self.user_message,
        });

        if let Some(retry_after) = self.retry_after {
            value["retry_after"] = serde_json::json!(retry_after);
        }

        value
    }
}

impl From<&DomainError> for ErrorReport {
    fn from(err: &DomainError) -> Self {
        Self::from_error(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_errors() -> Vec<DomainError> {
        vec![
            DomainError::timeout("read timed out after 30s"),
            DomainError::rate_limited("429 Too Many Requests", Some(12)),
            DomainError::server(502, "upstream exploded: stack trace ...", None),
            DomainError::client(400, "{\"error\": \"bad field\"}"),
            DomainError::authentication("invalid api key sk-123"),
            DomainError::network("connection refused (os error 111)"),
            DomainError::response("missing choices"),
            DomainError::configuration("no base url"),
            DomainError::validation("empty prompt"),
            DomainError::internal("poisoned lock"),
        ]
    }

    #[test]
    fn test_category_mapping() {
        let categories: Vec<ErrorCategory> = all_errors()
            .iter()
            .map(|e| ErrorReport::from_error(e).category)
            .collect();

        assert_eq!(
            categories,
            vec![
                ErrorCategory::Timeout,
                ErrorCategory::RateLimit,
                ErrorCategory::Api,
                ErrorCategory::Api,
                ErrorCategory::Config,
                ErrorCategory::Network,
                ErrorCategory::Response,
                ErrorCategory::Config,
                ErrorCategory::Api,
                ErrorCategory::Unknown,
            ]
        );
    }

    #[test]
    fn test_user_message_never_leaks_raw_text() {
        for err in all_errors() {
            let report = ErrorReport::from_error(&err);
            let raw = err.to_string();

            assert!(!report.user_message.contains("Exception"));
            assert!(!report.user_message.contains("Error:"));
            assert!(!report.user_message.contains(&raw));
            assert!(report.technical_details().contains(&raw));

            let json = report.to_json().to_string();
            assert!(!json.contains(&raw));
        }
    }

    #[test]
    fn test_rate_limit_wait_hint() {
        let report = ErrorReport::from_error(&DomainError::rate_limited("busy", Some(12)));

        assert_eq!(report.retry_after, Some(12));
        assert!(report.user_message.starts_with("The AI service is currently busy"));
        assert!(report.user_message.contains("12 seconds"));
    }

    #[test]
    fn test_rate_limit_without_hint() {
        let report = ErrorReport::from_error(&DomainError::rate_limited("busy", None));

        assert_eq!(report.retry_after, None);
        assert_eq!(report.user_message, "The AI service is currently busy.");
    }

    #[test]
    fn test_from_any_is_total() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(ErrorReport::from_any(&io).category, ErrorCategory::Network);

        let io_timeout = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        assert_eq!(
            ErrorReport::from_any(&io_timeout).category,
            ErrorCategory::Timeout
        );

        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(ErrorReport::from_any(&json).category, ErrorCategory::Response);

        let fmt = std::fmt::Error;
        let report = ErrorReport::from_any(&fmt);
        assert_eq!(report.category, ErrorCategory::Unknown);
        assert_eq!(report.user_message, MSG_UNKNOWN);

        let domain = DomainError::timeout("x");
        assert_eq!(ErrorReport::from_any(&domain).category, ErrorCategory::Timeout);
    }

    #[test]
    fn test_to_json_shape() {
        let report = ErrorReport::from_error(&DomainError::server(503, "down", Some(4)));
        let json = report.to_json();

        assert_eq!(json["success"], false);
        assert_eq!(json["error_type"], "api");
        assert_eq!(json["retry_after"], 4);
        assert!(json.get("technical_details").is_none());
    }
}
