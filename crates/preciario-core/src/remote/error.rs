use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Sheet request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed sheet export: {0}")]
    Malformed(#[from] csv::Error),

    #[error("Sheet export has no {0} column")]
    MissingColumn(&'static str),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl FetchError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        FetchError::Status {
            status: status.as_u16(),
            body: Self::truncate_body(body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_truncates_body() {
        let body = "x".repeat(MAX_ERROR_BODY_LENGTH + 20);
        let err = FetchError::from_status(reqwest::StatusCode::NOT_FOUND, &body);
        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, 404);
                assert!(body.ends_with("(truncated, 520 total bytes)"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let body = "é".repeat(MAX_ERROR_BODY_LENGTH);
        let truncated = FetchError::truncate_body(&body);
        assert!(truncated.contains("truncated"));
    }
}
