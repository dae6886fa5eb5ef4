use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageErrorCategory {
    UserActionRequired,
    TemporaryFailure,
    InternalFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("validation failed: {message}")]
    Validation { message: String },
    #[error("aspect ratio '{input}' is not a valid W/H descriptor")]
    InvalidAspectRatio { input: String },
    #[error("image endpoint rate limit reached")]
    RateLimited,
    #[error("image request timed out")]
    Timeout,
    #[error("image endpoint returned HTTP {status}")]
    Upstream { status: u16 },
    #[error("image transport failed: {message}")]
    Transport { message: String },
    #[error("image payload could not be decoded: {message}")]
    Decode { message: String },
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl ImageError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_aspect_ratio(input: impl Into<String>) -> Self {
        Self::InvalidAspectRatio {
            input: input.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ImageErrorCategory {
        match self {
            Self::Validation { .. } | Self::InvalidAspectRatio { .. } => {
                ImageErrorCategory::UserActionRequired
            }
            Self::RateLimited | Self::Timeout | Self::Upstream { .. } | Self::Transport { .. } => {
                ImageErrorCategory::TemporaryFailure
            }
            Self::Decode { .. } | Self::Internal { .. } => ImageErrorCategory::InternalFailure,
        }
    }

    /// Load failures are retried without distinguishing their cause; only
    /// pre-flight input problems and internal faults end an attempt loop
    /// immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited
                | Self::Timeout
                | Self::Upstream { .. }
                | Self::Transport { .. }
                | Self::Decode { .. }
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message } => {
                format!("Please review the generation settings: {message}")
            }
            Self::InvalidAspectRatio { input } => {
                format!("The aspect ratio '{input}' is not usable. Pick one of the offered ratios.")
            }
            Self::RateLimited => {
                "The image service is rate limiting requests. Please retry in a moment.".to_string()
            }
            Self::Timeout => "The image service did not respond in time.".to_string(),
            Self::Upstream { status } => {
                format!("The image service rejected the request (HTTP {status}).")
            }
            Self::Transport { message } => {
                format!("Could not reach the image service: {message}")
            }
            Self::Decode { message } => {
                format!("The image service returned unusable data: {message}")
            }
            Self::Internal { message } => {
                format!("An internal error occurred: {message}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ImageError, ImageErrorCategory};

    #[test]
    fn category_maps_user_action_errors() {
        assert_eq!(
            ImageError::validation("prompt must not be empty").category(),
            ImageErrorCategory::UserActionRequired
        );
        assert_eq!(
            ImageError::invalid_aspect_ratio("16/0").category(),
            ImageErrorCategory::UserActionRequired
        );
    }

    #[test]
    fn category_maps_temporary_and_internal_errors() {
        assert_eq!(
            ImageError::RateLimited.category(),
            ImageErrorCategory::TemporaryFailure
        );
        assert_eq!(
            ImageError::Upstream { status: 503 }.category(),
            ImageErrorCategory::TemporaryFailure
        );
        assert_eq!(
            ImageError::transport("connection reset").category(),
            ImageErrorCategory::TemporaryFailure
        );
        assert_eq!(
            ImageError::decode("empty body").category(),
            ImageErrorCategory::InternalFailure
        );
        assert_eq!(
            ImageError::internal("worker gone").category(),
            ImageErrorCategory::InternalFailure
        );
    }

    #[test]
    fn every_load_failure_kind_is_retryable() {
        assert!(ImageError::RateLimited.is_retryable());
        assert!(ImageError::Timeout.is_retryable());
        assert!(ImageError::Upstream { status: 404 }.is_retryable());
        assert!(ImageError::Upstream { status: 500 }.is_retryable());
        assert!(ImageError::transport("network down").is_retryable());
        assert!(ImageError::decode("not an image").is_retryable());
    }

    #[test]
    fn preflight_and_internal_errors_are_not_retryable() {
        assert!(!ImageError::validation("bad input").is_retryable());
        assert!(!ImageError::invalid_aspect_ratio("a/b").is_retryable());
        assert!(!ImageError::internal("poisoned state").is_retryable());
    }

    #[test]
    fn user_message_is_actionable() {
        assert!(
            ImageError::invalid_aspect_ratio("0/9")
                .user_message()
                .contains("0/9")
        );
        assert!(
            ImageError::Upstream { status: 502 }
                .user_message()
                .contains("502")
        );
        assert!(
            ImageError::RateLimited
                .user_message()
                .contains("rate limiting")
        );
    }
}
