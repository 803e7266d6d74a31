use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use owo_colors::OwoColorize;

/// Wire error kinds named in §7; the `__type` value is what AWS SDK clients
/// switch on, so the variant name IS the wire contract.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    ClusterNotFound(String),
    #[error("{0}")]
    ServiceNotFound(String),
    #[error("{0}")]
    TaskDefinitionNotFound(String),
    #[error("cluster still has active services")]
    ClusterContainsServices,
    #[error("cluster still has non-stopped tasks")]
    ClusterContainsTasks,
    #[error("service is not ACTIVE")]
    ServiceNotActive,
    #[error("{0}")]
    InvalidParameter(String),
    #[error("{0}")]
    Client(String),
    #[error("{0}")]
    Server(String),
    #[error("unknown operation {0:?}")]
    UnknownOperation(String),
    #[error(transparent)]
    ConcurrentModification(#[from] kecs_store::StoreError),
    #[error("dependency unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ApiError {
    fn wire_type(&self) -> &'static str {
        match self {
            ApiError::ClusterNotFound(_) => "ClusterNotFoundException",
            ApiError::ServiceNotFound(_) => "ServiceNotFoundException",
            ApiError::TaskDefinitionNotFound(_) => "TaskDefinitionNotFoundException",
            ApiError::ClusterContainsServices => "ClusterContainsServicesException",
            ApiError::ClusterContainsTasks => "ClusterContainsTasksException",
            ApiError::ServiceNotActive => "ServiceNotActiveException",
            ApiError::InvalidParameter(_) => "InvalidParameterException",
            ApiError::Client(_) => "ClientException",
            ApiError::Server(_) => "ServerException",
            ApiError::UnknownOperation(_) => "UnknownOperation",
            ApiError::ConcurrentModification(e) => match e {
                kecs_store::StoreError::ConcurrentModification { .. } => "ConcurrentModification",
                kecs_store::StoreError::InvalidToken => "InvalidParameterException",
                kecs_store::StoreError::NotFound(_) => "ClientException",
                _ => "ServerException",
            },
            ApiError::ServiceUnavailable(_) => "ServiceUnavailable",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::ClusterNotFound(_)
            | ApiError::ServiceNotFound(_)
            | ApiError::TaskDefinitionNotFound(_) => StatusCode::BAD_REQUEST,
            ApiError::ClusterContainsServices
            | ApiError::ClusterContainsTasks
            | ApiError::ServiceNotActive
            | ApiError::InvalidParameter(_)
            | ApiError::Client(_)
            | ApiError::UnknownOperation(_) => StatusCode::BAD_REQUEST,
            ApiError::ConcurrentModification(kecs_store::StoreError::ConcurrentModification { .. }) => StatusCode::CONFLICT,
            ApiError::ConcurrentModification(_) => StatusCode::BAD_REQUEST,
            ApiError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        eprintln!("{}", format!("{self}").red());
        let body = serde_json::json!({"__type": self.wire_type(), "message": self.to_string()});
        (self.status(), Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
