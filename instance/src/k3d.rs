use tokio::process::Command;

use crate::error::{Error, Result};
use crate::paths;

/// Host-port mappings for one instance's k3d cluster, wired to the
/// `NodePort`s the control-plane Service and Traefik gateway bind to.
#[derive(Debug, Clone, Copy)]
pub struct PortMappings {
    pub api_port: u16,
    pub admin_port: u16,
    pub gateway_port: u16,
}

impl PortMappings {
    /// `--port host:nodePort@loadbalancer` arguments for `k3d cluster create`.
    fn args(&self) -> Vec<String> {
        vec![
            format!("--port={}:30080@loadbalancer", self.api_port),
            format!("--port={}:30081@loadbalancer", self.admin_port),
            format!("--port={}:30890@loadbalancer", self.gateway_port),
        ]
    }
}

/// Runs k3d/kubectl as external collaborators; this module owns no
/// cluster-runtime logic of its own, only the shell-out contract.
async fn run(tool: &'static str, args: &[String]) -> Result<String> {
    let output = Command::new(tool)
        .args(args)
        .output()
        .await
        .map_err(|source| Error::Spawn { tool, source })?;
    if !output.status.success() {
        return Err(Error::CommandFailed {
            tool,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub async fn cluster_exists(instance: &str) -> Result<bool> {
    let name = paths::k3d_cluster_name(instance);
    match run("k3d", &["cluster".to_string(), "list".to_string(), name, "--no-headers".to_string()]).await {
        Ok(out) => Ok(!out.trim().is_empty()),
        Err(Error::CommandFailed { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

pub async fn create_cluster(instance: &str, ports: PortMappings) -> Result<()> {
    let name = paths::k3d_cluster_name(instance);
    let data_dir = paths::data_dir(instance);
    tokio::fs::create_dir_all(&data_dir).await?;

    let mut args = vec!["cluster".to_string(), "create".to_string(), name];
    args.extend(ports.args());
    args.push(format!(
        "--volume={}:/var/lib/kecs/data",
        data_dir.display()
    ));
    args.push("--k3s-arg=--disable=traefik@server:*".to_string());
    run("k3d", &args).await?;
    write_kubeconfig(instance).await
}

pub async fn start_cluster(instance: &str) -> Result<()> {
    let name = paths::k3d_cluster_name(instance);
    run("k3d", &["cluster".to_string(), "start".to_string(), name]).await?;
    write_kubeconfig(instance).await
}

pub async fn stop_cluster(instance: &str) -> Result<()> {
    let name = paths::k3d_cluster_name(instance);
    run("k3d", &["cluster".to_string(), "stop".to_string(), name]).await?;
    Ok(())
}

pub async fn delete_cluster(instance: &str) -> Result<()> {
    let name = paths::k3d_cluster_name(instance);
    run("k3d", &["cluster".to_string(), "delete".to_string(), name]).await?;
    Ok(())
}

async fn write_kubeconfig(instance: &str) -> Result<()> {
    let name = paths::k3d_cluster_name(instance);
    let kubeconfig = run(
        "k3d",
        &["kubeconfig".to_string(), "get".to_string(), name],
    )
    .await?;
    tokio::fs::write(paths::kubeconfig_path(instance), kubeconfig).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_mappings_render_loadbalancer_args() {
        let ports = PortMappings {
            api_port: 5373,
            admin_port: 5374,
            gateway_port: 4566,
        };
        let args = ports.args();
        assert!(args.iter().any(|a| a == "--port=5373:30080@loadbalancer"));
        assert!(args.iter().any(|a| a == "--port=4566:30890@loadbalancer"));
    }
}
