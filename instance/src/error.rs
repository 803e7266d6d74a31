#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{tool} exited with {status}: {stderr}")]
    CommandFailed {
        tool: &'static str,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Kube(#[from] kube::Error),
    #[error(transparent)]
    Store(#[from] kecs_store::StoreError),
    #[error("timed out after {0:?} waiting for {1}")]
    Timeout(std::time::Duration, &'static str),
    #[error("failed to load kubeconfig: {0}")]
    Kubeconfig(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
