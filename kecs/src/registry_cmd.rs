use anyhow::{Context, Result, bail};
use kecs_common::args::{RegistryAction, RegistryArgs};
use tokio::process::Command;

const REGISTRY_NAME: &str = "kecs-registry.localhost";
const REGISTRY_PORT: &str = "5050";

/// Local image registry used by dev-mode instances so `kecs start --dev` can
/// push freshly built images without a real registry account. Shells out to
/// k3d's own registry subcommand rather than driving the Docker API directly.
pub async fn run(args: RegistryArgs) -> Result<()> {
    match args.action {
        RegistryAction::Start => {
            run_k3d(&[
                "registry",
                "create",
                REGISTRY_NAME,
                "--port",
                REGISTRY_PORT,
            ])
            .await?;
            println!("registry listening on localhost:{REGISTRY_PORT}");
        }
        RegistryAction::Stop => {
            run_k3d(&["registry", "delete", REGISTRY_NAME]).await?;
        }
        RegistryAction::Status => {
            let output = run_k3d(&["registry", "list", "--no-headers"]).await?;
            if output.contains(REGISTRY_NAME) {
                println!("registry '{REGISTRY_NAME}' is running");
            } else {
                println!("registry '{REGISTRY_NAME}' is not running");
            }
        }
    }
    Ok(())
}

async fn run_k3d(args: &[&str]) -> Result<String> {
    let output = Command::new("k3d")
        .args(args)
        .output()
        .await
        .context("spawning k3d")?;
    if !output.status.success() {
        bail!("k3d {} failed: {}", args.join(" "), String::from_utf8_lossy(&output.stderr));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
