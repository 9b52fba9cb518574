//! Error types for the façade crate.

use thiserror::Error;

/// Errors that can occur during façade operations.
#[derive(Error, Debug)]
pub enum FacadeError {
    /// The credential was missing, malformed, or rejected by the API server.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A resource, ingress rule, or exec target does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Kubernetes API or transport error.
    #[error("Kubernetes API error: {0}")]
    Remote(kube::Error),

    /// The object returned by the API lacks a field the operation needs.
    #[error("unexpected object shape: {0}")]
    InvalidObject(String),

    /// Operation arguments could not be decoded.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The operation name is not part of the façade.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// An image reference could not be parsed.
    #[error("invalid image: {0}")]
    InvalidImage(#[from] kubedeck_core::CoreError),

    /// The interactive exec channel failed.
    #[error("exec failed: {0}")]
    Exec(String),

    /// Local I/O error (temporary kubeconfig files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<kube::Error> for FacadeError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(ref response) if response.code == 404 => {
                Self::NotFound(response.message.clone())
            }
            kube::Error::Api(ref response) if matches!(response.code, 401 | 403) => {
                Self::Auth(response.message.clone())
            }
            kube::Error::Auth(auth) => Self::Auth(auth.to_string()),
            other => Self::Remote(other),
        }
    }
}

impl FacadeError {
    /// Check if this error is retriable.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Remote(_) | Self::Exec(_))
    }

    /// Get the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Auth(_) => 401,
            Self::NotFound(_) => 404,
            Self::InvalidArguments(_) | Self::UnknownOperation(_) | Self::InvalidImage(_) => 400,
            Self::InvalidObject(_) => 422,
            Self::Remote(_) | Self::Exec(_) => 502,
            Self::Io(_) => 500,
        }
    }
}

/// Whether a raw client error means the bearer credential expired or was revoked.
#[must_use]
pub fn is_token_expired(err: &kube::Error) -> bool {
    match err {
        kube::Error::Api(response) => response.code == 401,
        kube::Error::Auth(_) => true,
        _ => false,
    }
}

/// A specialized Result type for façade operations.
pub type Result<T> = std::result::Result<T, FacadeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("status {code}"),
            reason: String::new(),
            code,
        })
    }

    #[test]
    fn api_404_becomes_not_found() {
        let err = FacadeError::from(api_error(404));
        assert!(matches!(err, FacadeError::NotFound(_)));
        assert_eq!(err.http_status_code(), 404);
    }

    #[test]
    fn api_401_becomes_auth() {
        assert!(is_token_expired(&api_error(401)));
        assert!(!is_token_expired(&api_error(500)));
        assert!(matches!(
            FacadeError::from(api_error(401)),
            FacadeError::Auth(_)
        ));
    }

    #[test]
    fn other_api_errors_are_remote() {
        let err = FacadeError::from(api_error(500));
        assert!(matches!(err, FacadeError::Remote(_)));
        assert!(err.is_retriable());
        assert_eq!(err.http_status_code(), 502);
    }
}
