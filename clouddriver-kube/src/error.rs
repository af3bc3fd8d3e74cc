use std::time::Duration;

use http::StatusCode;
use k8s_openapi::serde_json;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller supplied a parameter that cannot be interpreted.
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("account store unavailable: {0}")]
    AccountStore(String),

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("{kind} {name} not found in {account}/{namespace}")]
    NotFound {
        account: String,
        namespace: String,
        kind: String,
        name: String,
    },

    #[error("resource kind not served by cluster: {0}")]
    UnknownKind(String),

    #[error("discovery has not completed for account {0}")]
    NotDiscovered(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    #[error(transparent)]
    Kube(#[from] kube::Error),

    #[error(transparent)]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            after,
        }
    }

    /// HTTP status a request handler should answer with when this error
    /// aborts a whole request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidInput { .. } | Error::UnknownKind(_) => StatusCode::BAD_REQUEST,
            Error::AccountNotFound(_) | Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Error::AccountStore(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Kube(_) | Error::NotDiscovered(_) => StatusCode::BAD_GATEWAY,
            Error::Kubeconfig(_) | Error::Json(_) | Error::Yaml(_) | Error::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}
