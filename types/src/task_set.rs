use serde::{Deserialize, Serialize};

use crate::arn::Arn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskSetStatus {
    Active,
    Draining,
    Primary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StabilityStatus {
    Steady,
    Stabilizing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSet {
    pub id: String,
    pub arn: Arn,
    pub service_arn: Arn,
    pub task_definition_arn: Arn,
    pub scale_percent: f64,
    pub status: TaskSetStatus,
    pub computed_desired_count: u32,
    pub stability_status: StabilityStatus,
}
