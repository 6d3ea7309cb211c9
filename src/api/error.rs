use core::fmt::{self, Display, Formatter};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::codec::CodecError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    ValidationError,
    BadRequest,
    NotFound,
    Forbidden,
    Unauthorized,
    InternalServerError,
    NotAcceptable,
    RequestTimeout,
    GatewayTimeout,
    ServiceUnavailable,
    ClientRequestError,
    ConnectionError,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "ValidationError",
            ErrorCode::BadRequest => "BadRequest",
            ErrorCode::NotFound => "NotFound",
            ErrorCode::Forbidden => "Forbidden",
            ErrorCode::Unauthorized => "Unauthorized",
            ErrorCode::InternalServerError => "InternalServerError",
            ErrorCode::NotAcceptable => "NotAcceptable",
            ErrorCode::RequestTimeout => "RequestTimeout",
            ErrorCode::GatewayTimeout => "GatewayTimeout",
            ErrorCode::ServiceUnavailable => "ServiceUnavailable",
            ErrorCode::ClientRequestError => "ClientRequestError",
            ErrorCode::ConnectionError => "ConnectionError",
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error delivered to the client of a call
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl ApiError {
    #[inline]
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    #[inline]
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::new(ErrorCode::NotFound, "Procedure not found")
    }

    #[must_use]
    pub fn forbidden() -> Self {
        Self::new(ErrorCode::Forbidden, "Forbidden")
    }

    #[must_use]
    pub fn request_timeout() -> Self {
        Self::new(ErrorCode::RequestTimeout, "Request Timeout")
    }

    #[must_use]
    pub fn internal() -> Self {
        Self::new(ErrorCode::InternalServerError, "Internal Server Error")
    }

    /// Validation error carrying the issues reported by the input codec
    #[must_use]
    pub fn validation(err: &CodecError) -> Self {
        let error = Self::new(ErrorCode::ValidationError, format!("Input validation error: {err}"));
        match serde_json::to_value(err.issues()) {
            Ok(issues) => error.with_data(issues),
            Err(_) => error,
        }
    }
}
