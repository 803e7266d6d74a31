//! Self-signed CA + server certificate for the admission webhook's TLS
//! listener, persisted as a Secret in `kecs-system` so it survives restarts
//! and so the `MutatingWebhookConfiguration`'s `caBundle` stays stable.

use std::collections::BTreeMap;

use base64::Engine;
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, PostParams};
use rcgen::generate_simple_self_signed;

use crate::error::{Error, Result};

pub const SECRET_NAME: &str = "kecs-webhook-tls";
pub const SECRET_NAMESPACE: &str = "kecs-system";

pub struct ServingCert {
    pub ca_bundle_base64: String,
    pub cert_pem: String,
    pub key_pem: String,
}

/// Returns the existing cert from the Secret if present, else generates a
/// fresh self-signed cert for `dns_name` and persists it.
pub async fn ensure(client: &kube::Client, dns_name: &str) -> Result<ServingCert> {
    let api: Api<Secret> = Api::namespaced(client.clone(), SECRET_NAMESPACE);

    if let Ok(existing) = api.get(SECRET_NAME).await {
        if let Some(data) = existing.data {
            if let (Some(cert), Some(key), Some(ca)) =
                (data.get("tls.crt"), data.get("tls.key"), data.get("ca.crt"))
            {
                return Ok(ServingCert {
                    ca_bundle_base64: base64::engine::general_purpose::STANDARD.encode(&ca.0),
                    cert_pem: String::from_utf8_lossy(&cert.0).into_owned(),
                    key_pem: String::from_utf8_lossy(&key.0).into_owned(),
                });
            }
        }
    }

    let generated = generate(dns_name)?;
    let mut data = BTreeMap::new();
    data.insert("tls.crt".to_string(), ByteString(generated.cert_pem.clone().into_bytes()));
    data.insert("tls.key".to_string(), ByteString(generated.key_pem.clone().into_bytes()));
    data.insert(
        "ca.crt".to_string(),
        ByteString(
            base64::engine::general_purpose::STANDARD
                .decode(&generated.ca_bundle_base64)
                .unwrap_or_default(),
        ),
    );

    let secret = Secret {
        metadata: k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
            name: Some(SECRET_NAME.to_string()),
            namespace: Some(SECRET_NAMESPACE.to_string()),
            ..Default::default()
        },
        data: Some(data),
        ..Default::default()
    };

    match api.create(&PostParams::default(), &secret).await {
        Ok(_) => Ok(generated),
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            // Lost a race with another replica; the Secret it wrote wins.
            let existing = api.get(SECRET_NAME).await.map_err(Error::Kube)?;
            let data = existing.data.ok_or_else(|| Error::CertEncoding("webhook secret has no data".to_string()))?;
            let cert = data.get("tls.crt").ok_or_else(|| Error::CertEncoding("missing tls.crt".to_string()))?;
            let key = data.get("tls.key").ok_or_else(|| Error::CertEncoding("missing tls.key".to_string()))?;
            let ca = data.get("ca.crt").ok_or_else(|| Error::CertEncoding("missing ca.crt".to_string()))?;
            Ok(ServingCert {
                ca_bundle_base64: base64::engine::general_purpose::STANDARD.encode(&ca.0),
                cert_pem: String::from_utf8_lossy(&cert.0).into_owned(),
                key_pem: String::from_utf8_lossy(&key.0).into_owned(),
            })
        }
        Err(e) => Err(Error::Kube(e)),
    }
}

fn generate(dns_name: &str) -> Result<ServingCert> {
    let cert_key = generate_simple_self_signed(vec![dns_name.to_string()])
        .map_err(|e| Error::CertEncoding(e.to_string()))?;
    let ca_bundle_base64 = base64::engine::general_purpose::STANDARD.encode(cert_key.cert.pem());
    let cert_pem = cert_key.cert.pem();
    let key_pem = cert_key.key_pair.serialize_pem();
    Ok(ServingCert { ca_bundle_base64, cert_pem, key_pem })
}
