/// Errors that can occur while talking to the AWS provisioning APIs.
///
/// The [`crate::MonitoringApi`] trait returns `anyhow::Result` so mock
/// implementations stay trivial; the AWS client internals use this typed
/// error and let `?` lift it into `anyhow` at the trait boundary.
///
/// # Examples
///
/// ```rust
/// use auditmon_provision::error::ProvisionError;
///
/// let err = ProvisionError::MalformedResponse {
///     service: "sns".to_string(),
///     detail: "missing TopicArn".to_string(),
/// };
/// assert!(err.to_string().contains("TopicArn"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// Non-2xx status code from an AWS API.
    #[error("{service} API HTTP error: status={status}, body={body}")]
    HttpError {
        service: String,
        status: u16,
        body: String,
    },

    /// An underlying HTTP transport error from `reqwest`.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// SigV4 request signing failed.
    #[error("Signing error: {0}")]
    SigningError(#[from] auditmon_common::sigv4::SigningError),

    /// A 2xx response whose body did not contain the expected fields.
    #[error("Malformed {service} response: {detail}")]
    MalformedResponse { service: String, detail: String },
}

/// Convenience type alias so callers can write `error::Result<T>`.
pub type Result<T> = std::result::Result<T, ProvisionError>;
