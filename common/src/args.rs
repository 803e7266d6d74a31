use clap::Parser;

/// Flags shared by every subcommand; mirrors the environment variables an
/// operator would set once for a whole KECS install.
#[derive(Parser, Debug, Clone)]
pub struct GlobalArgs {
    /// Root directory under which per-instance data (`<data_dir>/instances/<name>/data`) lives.
    #[arg(long, env = "KECS_DATA_DIR")]
    pub data_dir: Option<String>,

    /// Re-attach to existing k3d clusters and reconcile Deployments/Services on startup.
    #[arg(long, env = "KECS_AUTO_RECOVER_STATE", default_value_t = true)]
    pub auto_recover_state: bool,

    /// Run against an in-memory fake Kubernetes client instead of k3d; used by integration tests.
    #[arg(long, env = "KECS_TEST_MODE", default_value_t = false)]
    pub test_mode: bool,

    /// Set when this process is itself running inside the in-cluster control-plane pod.
    #[arg(long, env = "KECS_CONTAINER_MODE", default_value_t = false)]
    pub container_mode: bool,

    /// Accepted for compatibility with older installs; has no effect.
    #[arg(long, env = "KECS_KEEP_CLUSTERS_ON_SHUTDOWN")]
    pub keep_clusters_on_shutdown: Option<bool>,
}

#[derive(Parser, Debug, Clone)]
pub struct StartArgs {
    #[arg(long, env = "KECS_INSTANCE", default_value = "default")]
    pub instance: String,

    #[arg(long, env = "KECS_API_PORT", default_value_t = 5373)]
    pub api_port: u16,

    #[arg(long, env = "KECS_ADMIN_PORT", default_value_t = 5374)]
    pub admin_port: u16,

    #[arg(long, env = "KECS_GATEWAY_PORT", default_value_t = 4566)]
    pub gateway_port: u16,

    #[arg(long, env = "KECS_NO_LOCALSTACK", default_value_t = false)]
    pub no_localstack: bool,

    #[arg(long, env = "KECS_NO_TRAEFIK", default_value_t = false)]
    pub no_traefik: bool,

    /// Skip the in-cluster admission webhook and run the API server only; fast inner-loop mode.
    #[arg(long, env = "KECS_DEV", default_value_t = false)]
    pub dev: bool,

    /// Create-or-resume timeout, in seconds.
    #[arg(long, env = "KECS_START_TIMEOUT_SECS", default_value_t = 600)]
    pub timeout_secs: u64,
}

#[derive(Parser, Debug, Clone)]
pub struct StopArgs {
    #[arg(long, env = "KECS_INSTANCE", default_value = "default")]
    pub instance: String,
}

#[derive(Parser, Debug, Clone)]
pub struct DestroyArgs {
    #[arg(long, env = "KECS_INSTANCE", default_value = "default")]
    pub instance: String,

    #[arg(long, default_value_t = false)]
    pub delete_data: bool,

    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct KubeconfigGetArgs {
    pub instance: String,

    #[arg(short = 'o', long)]
    pub output: Option<String>,

    #[arg(long, default_value_t = false)]
    pub raw: bool,
}

#[derive(Parser, Debug, Clone, clap::ValueEnum)]
pub enum RegistryAction {
    Start,
    Stop,
    Status,
}

#[derive(Parser, Debug, Clone)]
pub struct RegistryArgs {
    pub action: RegistryAction,
}
