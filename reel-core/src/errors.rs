//! Structured errors that travel inside `anyhow::Error`.
//!
//! Handlers return `ReelResult<T>`; wherever a `ReelError` sits in the
//! chain it decides the status code and the JSON body the client sees.
//! Anything else is reported as a `GeneralError`.

use std::fmt;

use anyhow::Error as AnyError;

pub type ReelResult<T> = std::result::Result<T, AnyError>;

/// The failure classes the gateway reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    Conflict,
    PayloadTooLarge,
    GeneralError,
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        self.describe().0
    }

    /// e.g. `"NotFound"`
    pub fn name(&self) -> &'static str {
        self.describe().1
    }

    /// e.g. `"not-found"`
    pub fn class_name(&self) -> &'static str {
        self.describe().2
    }

    fn describe(&self) -> (u16, &'static str, &'static str) {
        match self {
            Self::BadRequest => (400, "BadRequest", "bad-request"),
            Self::NotFound => (404, "NotFound", "not-found"),
            Self::Conflict => (409, "Conflict", "conflict"),
            Self::PayloadTooLarge => (413, "PayloadTooLarge", "payload-too-large"),
            Self::GeneralError => (500, "GeneralError", "general-error"),
        }
    }
}

/// An error with a client-facing kind and message.
///
/// `source` is kept for logs only and never rendered.
#[derive(Debug)]
pub struct ReelError {
    pub kind: ErrorKind,
    pub message: String,
    pub source: Option<AnyError>,
}

impl ReelError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PayloadTooLarge, message)
    }

    pub fn general_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, message)
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Find a `ReelError` anywhere in the chain of `err`.
    pub fn from_anyhow(err: &AnyError) -> Option<&ReelError> {
        err.chain().find_map(|cause| cause.downcast_ref::<ReelError>())
    }

    /// Same kind and message, without the source.
    pub fn sanitize_for_client(&self) -> ReelError {
        Self::new(self.kind, self.message.clone())
    }
}

impl fmt::Display for ReelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.kind.name(), self.code(), self.message)
    }
}

impl std::error::Error for ReelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| {
            let e: &(dyn std::error::Error + 'static) = e.as_ref();
            e
        })
    }
}

#[cfg(feature = "serde")]
impl ReelError {
    /// `{name, message, code, className}`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.kind.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.kind.class_name(),
        })
    }
}

/// `return Err(..)` with a `ReelError` built by the named constructor.
#[macro_export]
macro_rules! bail_reel {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::ReelError::$ctor($msg).into_anyhow());
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::ReelError::$ctor(format!($fmt, $($arg)*)).into_anyhow());
    };
}
