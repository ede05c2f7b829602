use thiserror::Error;

// Outcome of a gateway call: the explanation text or a classified failure.
pub type AnalysisResult = Result<String, AnalysisFailure>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    MissingCredential,
    InvalidRequest,
    InvalidCredential,
    Unauthorized,
    ProviderRateLimited,
    ProviderServerError,
    ApiError,
    HttpError,
    EmptyResponse,
    NetworkError,
    RequestFailed,
    LocalRateLimited,
    // store or other infrastructure failure around the call
    Internal,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::MissingCredential => "missing_credential",
            FailureKind::InvalidRequest => "invalid_request",
            FailureKind::InvalidCredential => "invalid_credential",
            FailureKind::Unauthorized => "unauthorized",
            FailureKind::ProviderRateLimited => "provider_rate_limited",
            FailureKind::ProviderServerError => "provider_server_error",
            FailureKind::ApiError => "api_error",
            FailureKind::HttpError => "http_error",
            FailureKind::EmptyResponse => "empty_response",
            FailureKind::NetworkError => "network_error",
            FailureKind::RequestFailed => "request_failed",
            FailureKind::LocalRateLimited => "local_rate_limited",
            FailureKind::Internal => "internal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AnalysisFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl AnalysisFailure {
    fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn missing_credential() -> Self {
        Self::new(
            FailureKind::MissingCredential,
            "API key not configured. Please set your Gemini API key in the extension popup.",
        )
    }

    // Map a provider error code to its fixed message; unknown codes keep the
    // provider's own message.
    pub fn from_provider_code(code: Option<i64>, message: Option<&str>) -> Self {
        match code {
            Some(400) => Self::new(
                FailureKind::InvalidRequest,
                "Invalid request. Please check your text selection.",
            ),
            Some(401) => Self::new(
                FailureKind::InvalidCredential,
                "Invalid API key. Please check your Gemini API key.",
            ),
            Some(403) => Self::new(
                FailureKind::Unauthorized,
                "API key not authorized. Please check your API key permissions.",
            ),
            Some(429) => Self::new(
                FailureKind::ProviderRateLimited,
                "API rate limit exceeded. Please try again later.",
            ),
            Some(500) => Self::new(
                FailureKind::ProviderServerError,
                "Gemini API server error. Please try again.",
            ),
            _ => {
                let message = message.filter(|m| !m.is_empty()).unwrap_or("Unknown error occurred");
                Self::new(FailureKind::ApiError, format!("API Error: {}", message))
            }
        }
    }

    pub fn http(status: u16, status_text: &str) -> Self {
        Self::new(
            FailureKind::HttpError,
            format!("HTTP Error: {} - {}", status, status_text),
        )
    }

    pub fn empty_response() -> Self {
        Self::new(
            FailureKind::EmptyResponse,
            "No response received from AI service. Please try again.",
        )
    }

    pub fn network() -> Self {
        Self::new(
            FailureKind::NetworkError,
            "Network error. Please check your internet connection.",
        )
    }

    pub fn request_failed(reason: impl std::fmt::Display) -> Self {
        Self::new(FailureKind::RequestFailed, format!("Request failed: {}", reason))
    }

    pub fn local_rate_limited(max_requests: u32, window_phrase: &str) -> Self {
        Self::new(
            FailureKind::LocalRateLimited,
            format!(
                "Rate limit exceeded. You can make {} requests {}.",
                max_requests, window_phrase
            ),
        )
    }

    pub fn internal() -> Self {
        Self::new(FailureKind::Internal, "Failed to analyze text. Please try again.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_codes_map_to_fixed_kinds() {
        let cases = [
            (400, FailureKind::InvalidRequest),
            (401, FailureKind::InvalidCredential),
            (403, FailureKind::Unauthorized),
            (429, FailureKind::ProviderRateLimited),
            (500, FailureKind::ProviderServerError),
        ];
        for (code, kind) in cases {
            let failure =
                AnalysisFailure::from_provider_code(Some(code), Some("raw provider text"));
            assert_eq!(failure.kind, kind);
            assert!(!failure.message.contains("raw provider text"));
        }
    }

    #[test]
    fn unknown_codes_keep_the_provider_message() {
        let failure = AnalysisFailure::from_provider_code(Some(503), Some("overloaded"));
        assert_eq!(failure.kind, FailureKind::ApiError);
        assert_eq!(failure.message, "API Error: overloaded");

        let failure = AnalysisFailure::from_provider_code(None, None);
        assert_eq!(failure.message, "API Error: Unknown error occurred");
    }

    #[test]
    fn messages_render_verbatim() {
        assert_eq!(
            AnalysisFailure::http(502, "Bad Gateway").to_string(),
            "HTTP Error: 502 - Bad Gateway"
        );
        assert_eq!(
            AnalysisFailure::local_rate_limited(10, "per hour").to_string(),
            "Rate limit exceeded. You can make 10 requests per hour."
        );
        assert_eq!(
            AnalysisFailure::request_failed("boom").to_string(),
            "Request failed: boom"
        );
    }
}
