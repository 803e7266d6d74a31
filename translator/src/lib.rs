pub mod deployment;
pub mod naming;
pub mod overrides;
pub mod pod;

pub use deployment::build_deployment;
pub use overrides::{ContainerOverride, RunTaskOverrides};
pub use pod::{build_pod, build_pod_template, log_group_annotations};
