//! Error handling for Grantline Core.
//!
//! This module provides:
//! - A single error type with a machine-readable code and error chaining
//! - User-facing messages kept apart from detailed internal messages
//! - Severity classification driving log levels
//! - Error metrics through the `metrics` facade
//!
//! # Usage
//!
//! ```rust,ignore
//! use grantline_core::error::{GrantlineError, Result};
//!
//! fn engine_records(engine: &str) -> Result<Vec<u8>> {
//!     Err(GrantlineError::upstream_unavailable(engine, "connection refused"))
//! }
//! ```

use metrics::counter;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};

use crate::telemetry::metrics::ERRORS_TOTAL;

// ═══════════════════════════════════════════════════════════════════════════════
// Result Type Alias
// ═══════════════════════════════════════════════════════════════════════════════

/// A specialized Result type for Grantline operations.
pub type Result<T> = std::result::Result<T, GrantlineError>;

// ═══════════════════════════════════════════════════════════════════════════════
// Error Codes
// ═══════════════════════════════════════════════════════════════════════════════

/// Machine-readable error codes.
///
/// These codes are stable and can be used by callers for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Upstream Errors (1000-1099)
    UpstreamUnavailable,
    UpstreamFetchFailed,
    IdentityNotFound,

    // Input Errors (1100-1199)
    InvalidInput,

    // Serialization Errors (2200-2299)
    SerializationError,
    DeserializationError,

    // Configuration Errors (5000-5099)
    ConfigurationError,
    MissingConfiguration,
    InvalidConfiguration,

    // Internal Errors (9000-9099)
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error.
    pub const fn numeric_code(&self) -> u32 {
        match self {
            Self::UpstreamUnavailable => 1000,
            Self::UpstreamFetchFailed => 1001,
            Self::IdentityNotFound => 1002,

            Self::InvalidInput => 1100,

            Self::SerializationError => 2200,
            Self::DeserializationError => 2201,

            Self::ConfigurationError => 5000,
            Self::MissingConfiguration => 5001,
            Self::InvalidConfiguration => 5002,

            Self::InternalError => 9000,
        }
    }

    /// Whether the failed operation may succeed if the caller tries again.
    ///
    /// The core itself never retries; this is advisory for fetch strategies.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable)
    }

    /// Get the error category name.
    pub const fn category(&self) -> &'static str {
        match self {
            Self::UpstreamUnavailable | Self::UpstreamFetchFailed | Self::IdentityNotFound => {
                "upstream"
            }
            Self::InvalidInput => "input",
            Self::SerializationError | Self::DeserializationError => "serialization",
            Self::ConfigurationError | Self::MissingConfiguration | Self::InvalidConfiguration => {
                "configuration"
            }
            Self::InternalError => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Severity
// ═══════════════════════════════════════════════════════════════════════════════

/// Severity level for errors (affects logging).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Caller errors (bad input, unknown identity)
    Low,
    /// Operational issues (upstream temporarily unavailable)
    Medium,
    /// System errors (bad configuration, failed upstream queries)
    High,
    /// Bugs requiring immediate attention
    Critical,
}

impl ErrorSeverity {
    /// Get severity based on error code.
    pub const fn from_code(code: &ErrorCode) -> Self {
        match code {
            ErrorCode::InvalidInput | ErrorCode::IdentityNotFound => Self::Low,

            ErrorCode::UpstreamUnavailable => Self::Medium,

            ErrorCode::UpstreamFetchFailed
            | ErrorCode::SerializationError
            | ErrorCode::DeserializationError
            | ErrorCode::ConfigurationError
            | ErrorCode::MissingConfiguration
            | ErrorCode::InvalidConfiguration => Self::High,

            ErrorCode::InternalError => Self::Critical,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Details
// ═══════════════════════════════════════════════════════════════════════════════

/// Additional structured details about an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Additional context key-value pairs
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,

    /// Related entity ID (user, engine, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,

    /// Related entity type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
}

impl ErrorDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Main Error Type
// ═══════════════════════════════════════════════════════════════════════════════

/// The main error type for Grantline Core.
#[derive(Error, Debug)]
pub struct GrantlineError {
    /// Machine-readable error code
    code: ErrorCode,

    /// User-friendly error message
    user_message: Cow<'static, str>,

    /// Detailed internal message (for logging only)
    internal_message: Option<String>,

    /// Additional structured details
    details: ErrorDetails,

    /// The source error that caused this error
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl fmt::Display for GrantlineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.user_message)?;
        if let Some(ref internal) = self.internal_message {
            write!(f, " (internal: {})", internal)?;
        }
        Ok(())
    }
}

impl GrantlineError {
    // ─────────────────────────────────────────────────────────────────────────
    // Constructors
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a new error with code and user message.
    pub fn new(code: ErrorCode, user_message: impl Into<Cow<'static, str>>) -> Self {
        let error = Self {
            code,
            user_message: user_message.into(),
            internal_message: None,
            details: ErrorDetails::default(),
            source: None,
        };
        error.record_metrics();
        error
    }

    /// Create an error with both user and internal messages.
    pub fn with_internal(
        code: ErrorCode,
        user_message: impl Into<Cow<'static, str>>,
        internal_message: impl Into<String>,
    ) -> Self {
        let mut error = Self::new(code, user_message);
        error.internal_message = Some(internal_message.into());
        error
    }

    /// An upstream engine could not be reached.
    pub fn upstream_unavailable(engine: impl Into<String>, reason: impl Into<String>) -> Self {
        let engine = engine.into();
        Self::with_internal(
            ErrorCode::UpstreamUnavailable,
            format!("Authorization engine unavailable: {}", engine),
            reason,
        )
        .with_details(ErrorDetails::new().with_entity("engine", engine))
    }

    /// An upstream query returned an error.
    pub fn upstream_fetch_failed(engine: impl Into<String>, reason: impl Into<String>) -> Self {
        let engine = engine.into();
        Self::with_internal(
            ErrorCode::UpstreamFetchFailed,
            format!("Failed to fetch authorizations from engine: {}", engine),
            reason,
        )
        .with_details(ErrorDetails::new().with_entity("engine", engine))
    }

    /// No identity is known for the given user.
    pub fn identity_not_found(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        Self::new(
            ErrorCode::IdentityNotFound,
            format!("Identity not found: {}", user_id),
        )
        .with_details(ErrorDetails::new().with_entity("user", user_id))
    }

    /// Reject a configuration value.
    pub fn invalid_configuration(field: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfiguration, message.into()).with_context("field", field)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builder Methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Add error details.
    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = details;
        self
    }

    /// Add context to details.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.details.context.insert(key.into(), v);
        }
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn internal_message(&self) -> Option<&str> {
        self.internal_message.as_deref()
    }

    pub fn details(&self) -> &ErrorDetails {
        &self.details
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::from_code(&self.code)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Logging
    // ─────────────────────────────────────────────────────────────────────────

    /// Log this error with appropriate severity.
    pub fn log(&self) {
        let code = self.code.to_string();
        let category = self.code.category();

        match self.severity() {
            ErrorSeverity::Critical => {
                error!(
                    error_code = %code,
                    category = category,
                    user_message = %self.user_message,
                    internal_message = ?self.internal_message,
                    details = ?self.details,
                    source = ?self.source,
                    "CRITICAL ERROR"
                );
            }
            ErrorSeverity::High => {
                error!(
                    error_code = %code,
                    category = category,
                    user_message = %self.user_message,
                    internal_message = ?self.internal_message,
                    "High severity error"
                );
            }
            ErrorSeverity::Medium => {
                warn!(
                    error_code = %code,
                    category = category,
                    user_message = %self.user_message,
                    "Medium severity error"
                );
            }
            ErrorSeverity::Low => {
                tracing::debug!(
                    error_code = %code,
                    category = category,
                    user_message = %self.user_message,
                    "Low severity error"
                );
            }
        }
    }

    fn record_metrics(&self) {
        counter!(
            ERRORS_TOTAL,
            "code" => self.code.to_string(),
            "category" => self.code.category().to_string(),
            "severity" => format!("{:?}", self.severity()),
        )
        .increment(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// From Implementations for Common Error Types
// ═══════════════════════════════════════════════════════════════════════════════

/// Coalesced cache loads hand every waiter the same shared error. Waiters get
/// an owned copy with the same code and messages; the shared error becomes the
/// source so nothing is lost from the chain.
impl From<Arc<GrantlineError>> for GrantlineError {
    fn from(shared: Arc<GrantlineError>) -> Self {
        match Arc::try_unwrap(shared) {
            Ok(error) => error,
            Err(shared) => Self {
                code: shared.code,
                user_message: shared.user_message.clone(),
                internal_message: shared.internal_message.clone(),
                details: shared.details.clone(),
                source: Some(Box::new(shared)),
            },
        }
    }
}

impl From<serde_json::Error> for GrantlineError {
    fn from(error: serde_json::Error) -> Self {
        let (code, user_msg) = if error.is_data() || error.is_syntax() || error.is_eof() {
            (ErrorCode::DeserializationError, "Failed to parse JSON input")
        } else {
            (ErrorCode::SerializationError, "Failed to serialize JSON")
        };

        Self::with_internal(code, user_msg, error.to_string()).with_source(error)
    }
}

impl From<std::io::Error> for GrantlineError {
    fn from(error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let (code, user_msg) = match error.kind() {
            ErrorKind::NotFound => (ErrorCode::InvalidInput, "File or resource not found"),
            ErrorKind::TimedOut | ErrorKind::ConnectionRefused | ErrorKind::ConnectionReset => {
                (ErrorCode::UpstreamUnavailable, "Connection failed")
            }
            _ => (ErrorCode::InternalError, "An I/O error occurred"),
        };

        Self::with_internal(code, user_msg, error.to_string()).with_source(error)
    }
}

impl From<anyhow::Error> for GrantlineError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<GrantlineError>() {
            Ok(grantline_error) => grantline_error,
            Err(error) => Self::with_internal(
                ErrorCode::InternalError,
                "An internal error occurred",
                error.to_string(),
            ),
        }
    }
}

impl From<config::ConfigError> for GrantlineError {
    fn from(error: config::ConfigError) -> Self {
        let (code, user_msg) = match &error {
            config::ConfigError::NotFound(_) => (
                ErrorCode::MissingConfiguration,
                "Required configuration not found",
            ),
            config::ConfigError::PathParse(_) | config::ConfigError::FileParse { .. } => (
                ErrorCode::InvalidConfiguration,
                "Configuration file is invalid",
            ),
            _ => (ErrorCode::ConfigurationError, "Configuration error occurred"),
        };

        Self::with_internal(code, user_msg, error.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
