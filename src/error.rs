use std::fmt;

use glycowatch_shared::ErrorBody;

// =========================================================
// 错误类别 (Error kinds)
// =========================================================

/// What went wrong, independent of the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    /// Bad credentials. The user can retry.
    Auth,
    /// Signup input rejected, locally or by the server.
    Validation,
    /// Sensor provider or backend unavailable. Transient.
    Upstream,
    /// The predict call failed.
    Prediction,
    /// The server rejected the session token (401).
    SessionExpired,
    /// The request never produced a response.
    Transport,
    /// A response body did not match the expected shape.
    Serialization,
}

impl ClientErrorKind {
    /// Machine-readable code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientErrorKind::Auth => "AUTH_FAILED",
            ClientErrorKind::Validation => "INVALID_INPUT",
            ClientErrorKind::Upstream => "UPSTREAM_ERROR",
            ClientErrorKind::Prediction => "PREDICTION_FAILED",
            ClientErrorKind::SessionExpired => "SESSION_EXPIRED",
            ClientErrorKind::Transport => "NETWORK_ERROR",
            ClientErrorKind::Serialization => "JSON_PARSE_ERROR",
        }
    }

    /// Whether the user can fix the problem by changing their input.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, ClientErrorKind::Auth | ClientErrorKind::Validation)
    }
}

// =========================================================
// 错误上下文追踪 (Error spans)
// =========================================================

/// One step an error passed through, e.g. `api.predict`.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorSpan {
    pub operation: String,
    pub detail: Option<String>,
}

impl ErrorSpan {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: None,
        }
    }

    pub fn with_detail(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: Some(detail.into()),
        }
    }
}

// =========================================================
// 核心错误类型 (ClientError)
// =========================================================

/// Error returned by every fallible client operation.
///
/// `message` is what a view shows the user: the backend's `detail` when it
/// sent one, a fixed fallback otherwise.
#[derive(Debug)]
pub struct ClientError {
    pub kind: ClientErrorKind,
    pub message: String,
    /// HTTP status of the failing response, if there was one.
    pub status: Option<u16>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    spans: Vec<ErrorSpan>,
}

impl ClientError {
    pub fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            source: None,
            spans: Vec::new(),
        }
    }

    // --- Convenience constructors ---

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Auth, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Validation, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Upstream, message)
    }

    pub fn prediction(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Prediction, message)
    }

    pub fn session_expired() -> Self {
        Self::new(ClientErrorKind::SessionExpired, "Session expired").with_status(401)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Transport, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Serialization, message)
    }

    /// Builds an error from a non-success response.
    ///
    /// Uses the body's `detail` string when present, else `fallback`.
    pub fn from_response(kind: ClientErrorKind, status: u16, body: &str, fallback: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message().map(str::to_string))
            .unwrap_or_else(|| fallback.to_string());
        Self::new(kind, message).with_status(status)
    }

    // --- Context builders ---

    pub fn in_op(mut self, operation: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::new(operation));
        self
    }

    pub fn in_op_with(mut self, operation: impl Into<String>, detail: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::with_detail(operation, detail));
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    // --- Accessors ---

    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn spans(&self) -> &[ErrorSpan] {
        &self.spans
    }

    pub fn is_session_expired(&self) -> bool {
        self.kind == ClientErrorKind::SessionExpired
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_code(), self.message)?;

        if !self.spans.is_empty() {
            write!(f, " | trace: ")?;
            for (i, span) in self.spans.iter().enumerate() {
                if i > 0 {
                    write!(f, " -> ")?;
                }
                write!(f, "{}", span.operation)?;
                if let Some(detail) = &span.detail {
                    write!(f, "({})", detail)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::serialization(e.to_string()).with_source(e)
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn detail_string_becomes_message() {
        let err = ClientError::from_response(
            ClientErrorKind::Prediction,
            500,
            r#"{"detail":"Test samples not found"}"#,
            "Prediction failed",
        );
        assert_eq!(err.message(), "Test samples not found");
        assert_eq!(err.status, Some(500));
        assert_eq!(err.error_code(), "PREDICTION_FAILED");
    }

    #[test]
    fn missing_or_structured_detail_uses_fallback() {
        let bodies = [
            "",
            "<html>bad gateway</html>",
            r#"{"detail":[{"msg":"x"}]}"#,
            r#"{"detail":"  "}"#,
        ];
        for body in bodies {
            let err = ClientError::from_response(ClientErrorKind::Auth, 400, body, "Login failed");
            assert_eq!(err.message(), "Login failed", "body: {body}");
        }
    }

    #[test]
    fn display_includes_trace() {
        let err = ClientError::upstream("sensor offline")
            .in_op("api.latest_sensor_reading")
            .in_op_with("controller.refresh_sensor", "gen=3");
        assert_eq!(
            err.to_string(),
            "[UPSTREAM_ERROR] sensor offline | trace: api.latest_sensor_reading -> controller.refresh_sensor(gen=3)"
        );
    }

    #[test]
    fn json_errors_keep_their_source() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = ClientError::from(json_err);
        assert_eq!(err.kind, ClientErrorKind::Serialization);
        assert!(err.source().is_some());
    }
}
