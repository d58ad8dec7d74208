/// Errors that can occur when talking to the compute-instance API.
///
/// # Examples
///
/// ```rust
/// use auditmon_cloud::error::ComputeApiError;
///
/// let err = ComputeApiError::MalformedResponse("truncated XML".to_string());
/// assert!(err.to_string().contains("truncated"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ComputeApiError {
    /// Non-2xx status code from the compute API.
    #[error("ec2 API HTTP error: status={status}, body={body}")]
    HttpError { status: u16, body: String },

    /// An underlying HTTP transport error from `reqwest`.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// SigV4 request signing failed.
    #[error("Signing error: {0}")]
    SigningError(#[from] auditmon_common::sigv4::SigningError),

    /// A 2xx response whose body could not be parsed.
    #[error("Malformed ec2 response: {0}")]
    MalformedResponse(String),
}

/// Convenience type alias so callers can write `error::Result<T>`.
pub type Result<T> = std::result::Result<T, ComputeApiError>;
