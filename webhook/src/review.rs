//! `AdmissionReview` request/response shapes for the `admission.k8s.io/v1`
//! API — hand-written rather than pulled from a generated crate, the same
//! tradeoff the rest of this codebase makes for the ECS wire.

use base64::Engine;
use k8s_openapi::api::core::v1::Pod;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::patch;

#[derive(Debug, Deserialize)]
pub struct AdmissionReview {
    pub request: AdmissionRequest,
}

#[derive(Debug, Deserialize)]
pub struct AdmissionRequest {
    pub uid: String,
    pub object: Value,
}

#[derive(Debug, Serialize)]
pub struct AdmissionReviewResponse {
    #[serde(rename = "apiVersion")]
    pub api_version: &'static str,
    pub kind: &'static str,
    pub response: AdmissionResponse,
}

#[derive(Debug, Serialize)]
pub struct AdmissionResponse {
    pub uid: String,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "patchType")]
    pub patch_type: Option<&'static str>,
}

/// Builds the admission response for one request; never rejects a pod
/// outright (a malformed or undecodable pod is simply left unmutated), since
/// this webhook only injects, it never validates.
pub fn review(body: &AdmissionReview, localstack_dns: &str) -> AdmissionReviewResponse {
    let uid = body.request.uid.clone();
    let pod: Option<Pod> = serde_json::from_value(body.request.object.clone()).ok();

    let patch = pod.as_ref().and_then(|p| patch::build_patch(p, localstack_dns));

    match patch {
        Some(patch) if !patch.0.is_empty() => {
            let encoded = serde_json::to_vec(&patch).unwrap_or_default();
            AdmissionReviewResponse {
                api_version: "admission.k8s.io/v1",
                kind: "AdmissionReview",
                response: AdmissionResponse {
                    uid,
                    allowed: true,
                    patch: Some(base64::engine::general_purpose::STANDARD.encode(encoded)),
                    patch_type: Some("JSONPatch"),
                },
            }
        }
        _ => AdmissionReviewResponse {
            api_version: "admission.k8s.io/v1",
            kind: "AdmissionReview",
            response: AdmissionResponse { uid, allowed: true, patch: None, patch_type: None },
        },
    }
}
