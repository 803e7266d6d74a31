use clap::{Parser, Subcommand};

use crate::args::{DestroyArgs, GlobalArgs, KubeconfigGetArgs, RegistryArgs, StartArgs, StopArgs};

#[derive(Parser, Debug)]
#[command(name = "kecs", version, about = "Local Kubernetes-backed emulator of ECS and ELBv2")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create (or resume) an instance's k3d cluster and start serving the ECS/ELBv2 API.
    Start(StartArgs),
    /// Stop an instance's k3d cluster, preserving its data directory.
    Stop(StopArgs),
    /// Stop an instance and optionally delete its data directory.
    Destroy(DestroyArgs),
    /// Kubeconfig management for a running instance.
    Kubeconfig {
        #[command(subcommand)]
        action: KubeconfigCommand,
    },
    /// Local image registry used by dev-mode instances.
    Registry(RegistryArgs),
}

#[derive(Subcommand, Debug)]
pub enum KubeconfigCommand {
    /// Emit a kubeconfig for the named instance with loopback addresses rewritten.
    Get(KubeconfigGetArgs),
}
