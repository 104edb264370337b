use service_core::error::AppError;
use thiserror::Error;

/// Errors surfaced by group and membership operations. Messages are safe to
/// return to API consumers; backend details are logged where they occur.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("User is not authorized to perform this action.")]
    Forbidden,

    #[error("Function not valid for federated login.")]
    UnsupportedInFederatedMode,

    #[error("Group {group} already exists. Try to edit the existing one.")]
    AlreadyExists { group: String },

    #[error("{message}")]
    BackendUnavailable {
        operation: &'static str,
        target: String,
        message: String,
    },
}

impl DirectoryError {
    pub fn status_code(&self) -> u16 {
        match self {
            DirectoryError::Unauthenticated(_) => 401,
            DirectoryError::Forbidden => 403,
            DirectoryError::UnsupportedInFederatedMode => 404,
            DirectoryError::AlreadyExists { .. } => 400,
            DirectoryError::BackendUnavailable { .. } => 502,
        }
    }

    /// Wraps a backend fault, logging the underlying error with its context.
    pub fn backend(
        operation: &'static str,
        target: impl Into<String>,
        message: impl Into<String>,
        source: &dyn std::error::Error,
    ) -> Self {
        let target = target.into();
        tracing::error!(
            operation = operation,
            resource = %target,
            error = %source,
            "Directory backend call failed"
        );
        DirectoryError::BackendUnavailable {
            operation,
            target,
            message: message.into(),
        }
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        let message = err.to_string();
        match err {
            DirectoryError::Unauthenticated(_) => AppError::Unauthorized(anyhow::anyhow!(message)),
            DirectoryError::Forbidden => AppError::Forbidden(anyhow::anyhow!(message)),
            DirectoryError::UnsupportedInFederatedMode => {
                AppError::NotFound(anyhow::anyhow!(message))
            }
            DirectoryError::AlreadyExists { .. } => AppError::BadRequest(anyhow::anyhow!(message)),
            DirectoryError::BackendUnavailable { .. } => AppError::BadGateway(message),
        }
    }
}
