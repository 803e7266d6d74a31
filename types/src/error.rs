use serde::Serialize;

/// Wire error taxonomy. `wire_name` is the `__type` value AWS clients match
/// on; `http_status` is the HTTP status the front end must return.
#[derive(Debug, Clone, thiserror::Error, Serialize)]
#[serde(tag = "kind")]
pub enum ApiError {
    #[error("cluster not found: {arn}")]
    ClusterNotFound { arn: String },

    #[error("service not found: {arn}")]
    ServiceNotFound { arn: String },

    #[error("task definition not found: {arn}")]
    TaskDefinitionNotFound { arn: String },

    #[error("cluster {arn} still contains active services")]
    ClusterContainsServices { arn: String },

    #[error("cluster {arn} still contains non-stopped tasks")]
    ClusterContainsTasks { arn: String },

    #[error("service {arn} is not ACTIVE")]
    ServiceNotActive { arn: String },

    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("client error: {message}")]
    Client { message: String },

    #[error("server error: {message}")]
    Server { message: String },

    #[error("unknown operation: {target}")]
    UnknownOperation { target: String },

    #[error("concurrent modification of {arn}")]
    ConcurrentModification { arn: String },

    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String },
}

impl ApiError {
    /// The `__type` value written into the AWS JSON-1.1 error body.
    pub fn wire_name(&self) -> &'static str {
        match self {
            ApiError::ClusterNotFound { .. } => "ClusterNotFoundException",
            ApiError::ServiceNotFound { .. } => "ServiceNotFoundException",
            ApiError::TaskDefinitionNotFound { .. } => "TaskDefinitionNotFoundException",
            ApiError::ClusterContainsServices { .. } => "ClusterContainsServicesException",
            ApiError::ClusterContainsTasks { .. } => "ClusterContainsTasksException",
            ApiError::ServiceNotActive { .. } => "ServiceNotActiveException",
            ApiError::InvalidParameter { .. } => "InvalidParameterException",
            ApiError::Client { .. } => "ClientException",
            ApiError::Server { .. } => "ServerException",
            ApiError::UnknownOperation { .. } => "UnknownOperation",
            ApiError::ConcurrentModification { .. } => "ConcurrentModification",
            ApiError::ServiceUnavailable { .. } => "ServiceUnavailable",
        }
    }

    /// HTTP status code this error maps to.
    pub fn http_status(&self) -> u16 {
        match self {
            ApiError::ClusterNotFound { .. }
            | ApiError::ServiceNotFound { .. }
            | ApiError::TaskDefinitionNotFound { .. } => 400,
            ApiError::ClusterContainsServices { .. }
            | ApiError::ClusterContainsTasks { .. }
            | ApiError::ServiceNotActive { .. }
            | ApiError::InvalidParameter { .. }
            | ApiError::Client { .. }
            | ApiError::UnknownOperation { .. } => 400,
            ApiError::ConcurrentModification { .. } => 409,
            ApiError::ServiceUnavailable { .. } => 503,
            ApiError::Server { .. } => 500,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}
