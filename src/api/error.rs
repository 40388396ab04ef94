/// Failure of a single API call, classified the way the dashboard reacts to it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// No response arrived: connection refused, DNS failure, timeout.
    #[error("network error: {message}")]
    Network { message: String },

    /// HTTP 401 from an authenticated endpoint. The stored token has already
    /// been cleared when this is returned.
    #[error("authentication required")]
    Unauthorized,

    /// Any other non-2xx response. `message` is the server's `error` field
    /// when the body carried one.
    #[error("server returned {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Server { status: u16, message: Option<String> },

    /// A 2xx response whose body did not match the expected shape.
    #[error("unreadable response: {message}")]
    Decode { message: String },
}

impl ApiError {
    /// The text shown to the operator, with `fallback` for failures that
    /// carry no server message.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Network { .. } => "Network error. Please try again.".to_string(),
            Self::Unauthorized => "Session expired. Please log in again.".to_string(),
            Self::Server {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            Self::Server { .. } | Self::Decode { .. } => fallback.to_string(),
        }
    }

    /// Outcome tag used in the activity log.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Unauthorized => "unauthorized",
            Self::Server { .. } => "error",
            Self::Decode { .. } => "decode",
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Server { status, .. } => Some(*status),
            Self::Network { .. } | Self::Decode { .. } => None,
        }
    }
}
