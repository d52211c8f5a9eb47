//! Container records and name matching

use serde::{Deserialize, Serialize};

/// One running container as listed by the runtime.
///
/// Deserializes from the Docker Engine list shape,
/// e.g. `{"Names": ["/edgeAgent"], "Id": "a1"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSummary {
    #[serde(rename = "Id")]
    pub id: String,

    #[serde(rename = "Names", default)]
    pub names: Vec<String>,
}

impl ContainerSummary {
    /// True when any of the container's names contains `target`
    pub fn matches(&self, target: &str) -> bool {
        self.names.iter().any(|name| name.contains(target))
    }
}

/// Return the id of the first container whose name contains `target`.
///
/// `None` means "not found yet", which is a normal state while a module is
/// being pulled and started.
pub fn find_container<'a>(containers: &'a [ContainerSummary], target: &str) -> Option<&'a str> {
    containers
        .iter()
        .find(|c| c.matches(target))
        .map(|c| c.id.as_str())
}
