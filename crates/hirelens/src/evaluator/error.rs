use thiserror::Error;

/// Failures evaluating a candidate with the language model.
///
/// Only [`RateLimited`](EvaluationError::RateLimited) and
/// [`Timeout`](EvaluationError::Timeout) are retried; everything else fails
/// the stage on the first occurrence.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("AI service rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("AI service timeout: {0}")]
    Timeout(String),

    #[error("AI service error (HTTP {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("AI service request failed: {0}")]
    Transport(String),

    #[error("Failed to parse AI response as JSON: {0}")]
    MalformedResponse(String),

    #[error("Missing required field in AI response: {0}")]
    MissingField(&'static str),

    #[error("Invalid overall_score: {0}. Must be integer 1-10.")]
    ScoreOutOfRange(String),

    #[error("Invalid recommendation: {0}")]
    InvalidRecommendation(String),

    #[error("AI service unavailable after {attempts} attempts: {last}")]
    Unavailable {
        attempts: u32,
        last: Box<EvaluationError>,
    },
}

impl EvaluationError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EvaluationError::RateLimited(_) | EvaluationError::Timeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_message_keeps_cause() {
        let err = EvaluationError::Unavailable {
            attempts: 3,
            last: Box::new(EvaluationError::RateLimited("HTTP 429".into())),
        };
        let text = err.to_string().to_lowercase();
        assert!(text.contains("rate limit"));
        assert!(text.contains("3 attempts"));
    }

    #[test]
    fn test_only_throttling_is_retryable() {
        assert!(EvaluationError::Timeout("slow".into()).is_retryable());
        assert!(EvaluationError::RateLimited("429".into()).is_retryable());
        assert!(!EvaluationError::MissingField("overall_score").is_retryable());
        assert!(!EvaluationError::Upstream {
            status: 500,
            message: "boom".into()
        }
        .is_retryable());
    }
}
