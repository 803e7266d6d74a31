pub mod args;
pub mod cli;
pub mod metrics;
pub mod progress;
mod request_context;
pub mod shutdown;

pub use request_context::*;

/// Annotations the translator stamps onto every Kubernetes object it creates,
/// used by the controller to recognize and reconcile KECS-owned resources.
pub mod annotations {
    pub const CLUSTER_ARN: &str = "kecs.dev/cluster-arn";
    pub const SERVICE_ARN: &str = "kecs.dev/service-arn";
    pub const TASK_ARN: &str = "kecs.dev/task-arn";
    pub const TASK_DEFINITION_ARN: &str = "kecs.dev/task-definition-arn";
    pub const MANAGED_BY: &str = "kecs.dev/managed-by";
}

pub fn init_tracing() {
    let disable_colors = ["1", "true"].contains(
        &std::env::var("NO_COLOR")
            .unwrap_or_default()
            .to_lowercase()
            .as_str(),
    );
    owo_colors::set_override(!disable_colors);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    install_rustls_provider();
}

pub fn install_rustls_provider() {
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .expect("install aws-lc-rs provider");
}

pub mod response {
    use std::fmt::{Debug, Display};

    use anyhow::Error;
    use axum::Json;
    use axum::response::{IntoResponse, Response};
    use http::StatusCode;
    use owo_colors::OwoColorize;

    pub fn print_error<T>(e: T)
    where
        T: Into<Error> + Display + Debug,
    {
        eprintln!(
            "{}",
            format!("{:?}", e.into())
                .split('\n')
                .map(|s| s.red().to_string())
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }

    pub fn print_warning<T>(e: T)
    where
        T: Into<Error> + Display + Debug,
    {
        eprintln!(
            "{}",
            format!("{:?}", e.into())
                .split('\n')
                .map(|s| s.yellow().to_string())
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }

    pub fn err_resp<T>(e: T, code: StatusCode) -> Response
    where
        T: Into<Error> + Display + Debug,
    {
        let reason = format!("{e}");
        print_error(e);
        (code, Json(serde_json::json!({"message": reason}))).into_response()
    }

    pub fn not_found<T>(e: T) -> Response
    where
        T: Into<Error> + Display + Debug,
    {
        err_resp(e, StatusCode::NOT_FOUND)
    }

    pub fn conflict<T>(e: T) -> Response
    where
        T: Into<Error> + Display + Debug,
    {
        err_resp(e, StatusCode::CONFLICT)
    }

    pub fn bad_request<T>(e: T) -> Response
    where
        T: Into<Error> + Display + Debug,
    {
        err_resp(e, StatusCode::BAD_REQUEST)
    }

    pub fn internal_server_error<T>(e: T) -> Response
    where
        T: Into<Error> + Display + Debug,
    {
        err_resp(e, StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn service_unavailable<T>(e: T) -> Response
    where
        T: Into<Error> + Display + Debug,
    {
        err_resp(e, StatusCode::SERVICE_UNAVAILABLE)
    }
}
