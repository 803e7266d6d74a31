use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use kecs_common::cli::{Cli, Commands, KubeconfigCommand};
use kecs_common::progress::ProgressBus;
use kecs_instance::PortMappings;
use owo_colors::OwoColorize;

mod container_mode;
mod kubeconfig_cmd;
mod registry_cmd;

#[tokio::main]
async fn main() -> Result<()> {
    kecs_common::init_tracing();

    if std::env::var("KECS_CONTAINER_MODE").map(|v| v == "true").unwrap_or(false) {
        return container_mode::run().await;
    }

    let cli = Cli::parse();
    match cli.command {
        Commands::Start(args) => {
            let store_path = kecs_instance::paths::data_dir(&args.instance).join("store");
            tokio::fs::create_dir_all(&store_path).await.context("creating instance data directory")?;
            let store = Arc::new(kecs_store::Store::open(&store_path).context("opening instance store")?);
            let progress = ProgressBus::default();
            let ports = PortMappings { api_port: args.api_port, admin_port: args.admin_port, gateway_port: args.gateway_port };
            let mut enabled_services: Vec<String> = kecs_instance::localstack::DEFAULT_ENABLED_SERVICES
                .iter()
                .map(|s| s.to_string())
                .collect();
            if args.no_localstack {
                enabled_services.clear();
            }
            kecs_instance::lifecycle::start(store, &progress, &args.instance, ports, enabled_services)
                .await
                .context("starting instance")?;
            println!(
                "{}",
                format!(
                    "kecs is listening on http://localhost:{} (admin http://localhost:{})",
                    args.gateway_port, args.admin_port
                )
                .green()
            );
        }
        Commands::Stop(args) => {
            let progress = ProgressBus::default();
            kecs_instance::lifecycle::stop(&progress, &args.instance).await.context("stopping instance")?;
        }
        Commands::Destroy(args) => {
            if !args.force {
                eprintln!(
                    "{}",
                    "pass --force to confirm destroying this instance's cluster".yellow()
                );
                return Ok(());
            }
            let progress = ProgressBus::default();
            kecs_instance::lifecycle::destroy(&progress, &args.instance).await.context("destroying instance")?;
            if args.delete_data {
                let dir = kecs_instance::paths::instance_dir(&args.instance);
                if dir.exists() {
                    tokio::fs::remove_dir_all(&dir).await.context("deleting instance data directory")?;
                }
            }
        }
        Commands::Kubeconfig { action } => match action {
            KubeconfigCommand::Get(args) => kubeconfig_cmd::get(args).await?,
        },
        Commands::Registry(args) => registry_cmd::run(args).await?,
    }
    Ok(())
}
