//! Minimal `ServiceDiscovery` (Cloud Map) stub: enough for SDK clients that
//! probe the namespace before registering a service to get a well-formed,
//! empty answer rather than an error.

use serde_json::Value;

use crate::app::AppContext;
use crate::error::{ApiError, ApiResult};

pub async fn dispatch(_ctx: &AppContext, operation: &str, _body: Value) -> ApiResult<Value> {
    match operation {
        "ListNamespaces" => Ok(serde_json::json!({"Namespaces": []})),
        "ListServices" => Ok(serde_json::json!({"Services": []})),
        other => Err(ApiError::UnknownOperation(other.to_string())),
    }
}
