pub mod control_plane;
pub mod error;
pub mod gateway;
pub mod k3d;
mod k8s;
pub mod kubeconfig;
pub mod lifecycle;
pub mod localstack;
pub mod paths;
pub mod recovery;

pub use error::{Error, Result};
pub use k3d::PortMappings;
