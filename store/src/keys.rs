//! Key encodings for the `main` and `index` trees. Every primary row is
//! keyed by its ARN; every secondary index row maps an index key to the
//! primary ARN so index maintenance is a single extra point write inside
//! the same transaction as the row itself.

pub fn primary(arn: &str) -> Vec<u8> {
    arn.as_bytes().to_vec()
}

pub fn idx_cluster_name(cluster_arn: &str, name: &str) -> Vec<u8> {
    format!("idx/cluster_name/{cluster_arn}/{name}").into_bytes()
}

pub fn idx_family_revision(family: &str, revision: u32) -> Vec<u8> {
    format!("idx/family_rev/{family}/{revision:010}").into_bytes()
}

pub fn idx_family_prefix(family: &str) -> Vec<u8> {
    format!("idx/family_rev/{family}/").into_bytes()
}

pub fn idx_family_revision_root() -> Vec<u8> {
    b"idx/family_rev/".to_vec()
}

pub fn idx_service_status(service_arn: &str, status: &str, task_arn: &str) -> Vec<u8> {
    format!("idx/svc_status/{service_arn}/{status}/{task_arn}").into_bytes()
}

pub fn idx_service_status_prefix(service_arn: &str, status: &str) -> Vec<u8> {
    format!("idx/svc_status/{service_arn}/{status}/").into_bytes()
}

pub fn idx_tag(resource_arn: &str, key: &str) -> Vec<u8> {
    format!("idx/tags/{resource_arn}/{key}").into_bytes()
}

pub fn idx_tag_prefix(resource_arn: &str) -> Vec<u8> {
    format!("idx/tags/{resource_arn}/").into_bytes()
}

pub fn idx_cluster_prefix(kind: &str) -> Vec<u8> {
    format!("idx/list/{kind}/").into_bytes()
}

pub fn idx_list(kind: &str, sort_key: &str) -> Vec<u8> {
    format!("idx/list/{kind}/{sort_key}").into_bytes()
}

pub fn event_key(id: u64) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_revision_keys_sort_numerically() {
        let a = idx_family_revision("web", 2);
        let b = idx_family_revision("web", 10);
        assert!(a < b, "zero-padded revisions must sort lexicographically in id order");
    }

    #[test]
    fn event_keys_sort_by_id() {
        assert!(event_key(1) < event_key(2));
        assert!(event_key(99) < event_key(100));
    }
}
