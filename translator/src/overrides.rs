use kecs_types::KeyValuePair;

/// `RunTask`-time overrides; applied to the base translation and never
/// persisted back onto the task definition.
#[derive(Debug, Clone, Default)]
pub struct RunTaskOverrides {
    pub container_overrides: Vec<ContainerOverride>,
}

#[derive(Debug, Clone)]
pub struct ContainerOverride {
    pub name: String,
    pub command: Option<Vec<String>>,
    pub environment: Option<Vec<KeyValuePair>>,
    pub cpu: Option<u32>,
    pub memory: Option<u32>,
}

impl RunTaskOverrides {
    pub fn for_container(&self, name: &str) -> Option<&ContainerOverride> {
        self.container_overrides.iter().find(|o| o.name == name)
    }
}
