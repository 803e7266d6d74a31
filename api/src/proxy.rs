//! Reverse-proxy to LocalStack for every AWS-typed request that isn't ECS,
//! ELBv2, or service-discovery. Strips SigV4 signature headers (LocalStack
//! never verifies them) and rewrites the host header, then forwards the body
//! byte-for-byte.

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, StatusCode};
use serde_json::Value;

use crate::app::AppContext;

const STRIPPED_HEADERS: &[&str] = &[
    "authorization",
    "x-amz-date",
    "x-amz-security-token",
    "x-amz-content-sha256",
    "host",
];

/// Extracts the target service name in the priority order laid out for the
/// proxy: URL path prefix, then `X-Amz-Target`, then the SigV4 credential
/// scope embedded in `Authorization`.
pub fn extract_service_name(path: &str, headers: &HeaderMap) -> Option<String> {
    if let Some(rest) = path.strip_prefix("/api/v1/") {
        if let Some(svc) = rest.split('/').next() {
            if !svc.is_empty() {
                return Some(svc.to_string());
            }
        }
    }

    if let Some(target) = headers.get("x-amz-target").and_then(|v| v.to_str().ok()) {
        if let Some((service, _)) = target.split_once('.') {
            return Some(service_name_from_target_prefix(service));
        }
    }

    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        return service_name_from_credential_scope(auth);
    }

    None
}

fn service_name_from_target_prefix(prefix: &str) -> String {
    // "AWSCognitoIdentityService" -> "cognito-idp" style mappings are a
    // fixed, known table; anything unrecognized is passed through
    // lowercased so routing still has a best-effort name to try.
    match prefix {
        "AWSCognitoIdentityService" | "AWSCognitoIdentityProviderService" => "cognito-idp".to_string(),
        "DynamoDB_20120810" => "dynamodb".to_string(),
        "AmazonSSM" => "ssm".to_string(),
        "secretsmanager" => "secretsmanager".to_string(),
        other => other.to_lowercase(),
    }
}

fn service_name_from_credential_scope(authorization: &str) -> Option<String> {
    // Credential=<access-key>/<date>/<region>/<service>/aws4_request
    let credential = authorization.split("Credential=").nth(1)?;
    let scope = credential.split(|c: char| c == ',' || c.is_whitespace()).next()?;
    let mut parts = scope.split('/');
    let _access_key = parts.next()?;
    let _date = parts.next()?;
    let _region = parts.next()?;
    parts.next().map(str::to_string)
}

pub async fn forward(ctx: &AppContext, path: &str, headers: HeaderMap, body: Bytes) -> (StatusCode, HeaderMap, Bytes) {
    let Some(service) = extract_service_name(path, &headers) else {
        return error_response(StatusCode::BAD_REQUEST, "InvalidParameterException", "could not determine target service");
    };

    if !ctx.enabled_services.iter().any(|s| s == &service) {
        return error_response(
            StatusCode::NOT_FOUND,
            "UnknownOperationException",
            &format!("service {service} is disabled"),
        );
    }

    let mut forward_headers = reqwest::header::HeaderMap::new();
    for (name, value) in headers.iter() {
        if STRIPPED_HEADERS.contains(&name.as_str()) {
            continue;
        }
        if let Ok(value) = reqwest::header::HeaderValue::from_bytes(value.as_bytes()) {
            if let Ok(name) = reqwest::header::HeaderName::from_bytes(name.as_str().as_bytes()) {
                forward_headers.insert(name, value);
            }
        }
    }

    let url = format!("{}{}", ctx.localstack_base_url, path);
    let response = ctx
        .http
        .post(&url)
        .headers(forward_headers)
        .body(body)
        .send()
        .await;

    match response {
        Ok(resp) => {
            let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
            let mut out_headers = HeaderMap::new();
            for (name, value) in resp.headers().iter() {
                if let (Ok(name), Ok(value)) = (
                    HeaderName::from_bytes(name.as_str().as_bytes()),
                    axum::http::HeaderValue::from_bytes(value.as_bytes()),
                ) {
                    out_headers.insert(name, value);
                }
            }
            let bytes = resp.bytes().await.unwrap_or_default();
            (status, out_headers, bytes)
        }
        Err(e) => error_response(StatusCode::SERVICE_UNAVAILABLE, "ServiceUnavailableException", &e.to_string()),
    }
}

fn error_response(status: StatusCode, wire_type: &str, message: &str) -> (StatusCode, HeaderMap, Bytes) {
    let body: Value = serde_json::json!({"__type": wire_type, "message": message});
    let mut headers = HeaderMap::new();
    headers.insert("content-type", "application/x-amz-json-1.1".parse().unwrap());
    (status, headers, Bytes::from(serde_json::to_vec(&body).unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_prefix_wins_over_target_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-amz-target", "AmazonSSM.GetParameter".parse().unwrap());
        let name = extract_service_name("/api/v1/s3/my-bucket", &headers);
        assert_eq!(name, Some("s3".to_string()));
    }

    #[test]
    fn target_header_maps_known_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert("x-amz-target", "AmazonSSM.GetParameter".parse().unwrap());
        let name = extract_service_name("/", &headers);
        assert_eq!(name, Some("ssm".to_string()));
    }

    #[test]
    fn falls_back_to_credential_scope() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            "AWS4-HMAC-SHA256 Credential=test/20260101/us-east-1/secretsmanager/aws4_request, SignedHeaders=host, Signature=abc"
                .parse()
                .unwrap(),
        );
        let name = extract_service_name("/", &headers);
        assert_eq!(name, Some("secretsmanager".to_string()));
    }
}
