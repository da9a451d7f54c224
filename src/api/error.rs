//! API error types with HTTP status code mapping

use serde::Serialize;

use crate::core::error::EngineError;

/// Error codes that map to HTTP status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Council, field, year, contribution or issue not found (404)
    NotFound,
    /// Malformed request (400)
    BadRequest,
    /// Submitted value does not fit the field (400)
    InvalidValue,
    /// No caller identity supplied (401)
    Unauthorized,
    /// Tier does not permit the action (403)
    Forbidden,
    /// Contribution is not in a reviewable state (409)
    InvalidTransition,
    /// Another reviewer resolved the contribution first (409)
    AlreadyResolved,
    /// Direct apply gave up under contention; retry later (503)
    Contended,
    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::BadRequest | Self::InvalidValue => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::InvalidTransition | Self::AlreadyResolved => 409,
            Self::Contended => 503,
            Self::Internal => 500,
        }
    }

    /// Get the error code string
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::BadRequest => "BAD_REQUEST",
            Self::InvalidValue => "INVALID_VALUE",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::AlreadyResolved => "ALREADY_RESOLVED",
            Self::Contended => "CONTENDED",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

/// API error with code and message
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Error code (determines HTTP status)
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    /// Create an error with an explicit code
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a not found error
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Create a bad request error
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Create an unauthorized error
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Create an internal error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.code.status_code()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let code = match &err {
            EngineError::NotFound(_) => ErrorCode::NotFound,
            EngineError::Forbidden { .. } => ErrorCode::Forbidden,
            EngineError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            EngineError::AlreadyResolved { .. } => ErrorCode::AlreadyResolved,
            EngineError::Contended { .. } => ErrorCode::Contended,
            EngineError::InvalidValue { .. } => ErrorCode::InvalidValue,
            EngineError::Storage(_) => {
                log::error!("{err}");
                ErrorCode::Internal
            },
        };
        Self::new(code, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

/// Serializable error data for JSON responses
#[derive(Debug, Serialize)]
pub struct ApiErrorData {
    /// Error code string
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl From<&ApiError> for ApiErrorData {
    fn from(err: &ApiError) -> Self {
        Self {
            code: err.code.as_str().to_string(),
            message: err.message.clone(),
        }
    }
}
