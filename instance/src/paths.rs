use std::path::PathBuf;

/// `~/.kecs`, overridable with `KECS_DATA_DIR` for tests and CI.
pub fn kecs_root() -> PathBuf {
    if let Ok(dir) = std::env::var("KECS_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/root".to_string());
    PathBuf::from(home).join(".kecs")
}

pub fn instance_dir(instance: &str) -> PathBuf {
    kecs_root().join("instances").join(instance)
}

pub fn data_dir(instance: &str) -> PathBuf {
    instance_dir(instance).join("data")
}

pub fn kubeconfig_path(instance: &str) -> PathBuf {
    instance_dir(instance).join("kubeconfig.yaml")
}

pub fn k3d_cluster_name(instance: &str) -> String {
    format!("kecs-{instance}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_paths_nest_under_kecs_root() {
        unsafe {
            std::env::set_var("KECS_DATA_DIR", "/tmp/kecs-test-root");
        }
        assert_eq!(data_dir("default"), PathBuf::from("/tmp/kecs-test-root/instances/default/data"));
        assert_eq!(k3d_cluster_name("default"), "kecs-default");
        unsafe {
            std::env::remove_var("KECS_DATA_DIR");
        }
    }
}
