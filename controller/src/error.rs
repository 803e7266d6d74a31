#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Kube(#[from] kube::Error),
    #[error(transparent)]
    Store(#[from] kecs_store::StoreError),
    #[error("reconciled object has no namespace")]
    MissingNamespace,
    #[error("reconciled object has no {0} annotation")]
    MissingAnnotation(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
