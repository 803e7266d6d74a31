use anyhow::{Context, Result};
use kecs_common::args::KubeconfigGetArgs;

/// Emits the instance's kubeconfig, optionally rewriting the cluster's
/// `server` address to loopback — k3d clusters bind the API server to the
/// host's localhost interface, so `--raw` is only useful when connecting
/// from another container sharing the host network.
pub async fn get(args: KubeconfigGetArgs) -> Result<()> {
    let path = kecs_instance::paths::kubeconfig_path(&args.instance);
    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("reading kubeconfig for instance '{}'", args.instance))?;

    let rendered = if args.raw {
        raw
    } else {
        raw.replace("0.0.0.0", "127.0.0.1")
    };

    match args.output {
        Some(path) => tokio::fs::write(&path, rendered).await.with_context(|| format!("writing kubeconfig to {path}"))?,
        None => print!("{rendered}"),
    }
    Ok(())
}
