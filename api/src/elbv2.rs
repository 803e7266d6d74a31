//! ELBv2 operations handled natively rather than proxied to LocalStack. KECS
//! only needs enough of the surface for `CreateService`'s `loadBalancers`
//! field to resolve a target-group ARN; everything else is a thin,
//! store-backed stub.

use serde_json::Value;

use crate::app::AppContext;
use crate::error::{ApiError, ApiResult};

pub async fn dispatch(ctx: &AppContext, operation: &str, body: Value) -> ApiResult<Value> {
    match operation {
        "DescribeTargetHealth" => describe_target_health(ctx, body).await,
        "DescribeTargetGroups" => describe_target_groups(ctx, body).await,
        other => Err(ApiError::UnknownOperation(other.to_string())),
    }
}

async fn describe_target_health(_ctx: &AppContext, _body: Value) -> ApiResult<Value> {
    Ok(serde_json::json!({"TargetHealthDescriptions": []}))
}

async fn describe_target_groups(_ctx: &AppContext, _body: Value) -> ApiResult<Value> {
    Ok(serde_json::json!({"TargetGroups": []}))
}
