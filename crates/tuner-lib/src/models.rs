//! Core data models shared between discovery and synthesis

use k8s_openapi::api::core::v1::Node;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::topology::NumaTopology;

/// Label marking a node as schedulable for virtual machines
pub const VM_SCHEDULABLE_LABEL: &str = "kubevirt.io/schedulable";

/// Label marking a node with the static CPU manager enabled
pub const CPU_MANAGER_LABEL: &str = "cpumanager";

/// Reference to the agent pod that serves the capability document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRef {
    pub namespace: String,
    pub name: String,
}

impl AgentRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for AgentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// The parts of a node object the synthesizers read
#[derive(Debug, Clone, Default)]
pub struct NodeResources {
    pub name: String,
    pub allocatable: BTreeMap<String, Quantity>,
    pub labels: BTreeMap<String, String>,
}

impl NodeResources {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an allocatable resource (builder style, mostly for tests)
    pub fn with_allocatable(mut self, resource: impl Into<String>, quantity: impl Into<String>) -> Self {
        self.allocatable
            .insert(resource.into(), Quantity(quantity.into()));
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    fn label_is_true(&self, key: &str) -> bool {
        self.labels.get(key).map(String::as_str) == Some("true")
    }
}

impl From<&Node> for NodeResources {
    fn from(node: &Node) -> Self {
        Self {
            name: node.metadata.name.clone().unwrap_or_default(),
            allocatable: node
                .status
                .as_ref()
                .and_then(|s| s.allocatable.clone())
                .unwrap_or_default(),
            labels: node.metadata.labels.clone().unwrap_or_default(),
        }
    }
}

/// One requested SR-IOV device, positioned by its place in the request list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRequest {
    pub index: usize,
    pub pf_name: String,
    pub resource: String,
}

impl DeviceRequest {
    /// Number the requested resources in order, labelling each `pf<index>`
    pub fn from_resources<S: AsRef<str>>(resources: &[S]) -> Vec<DeviceRequest> {
        resources
            .iter()
            .enumerate()
            .map(|(index, resource)| DeviceRequest {
                index,
                pf_name: format!("pf{}", index),
                resource: resource.as_ref().to_string(),
            })
            .collect()
    }

    /// Name shared by the policy and attachment manifests of this device
    pub fn manifest_name(&self, node_name: &str) -> String {
        format!("{}-{}", node_name, self.index)
    }
}

/// What was discovered about a node before synthesis
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub name: String,
    pub resources: BTreeMap<String, Quantity>,
    pub numa_topology: NumaTopology,
    pub vm_enabled: bool,
    pub cpu_manager_enabled: bool,
}

impl NodeInfo {
    pub fn discover(node: &NodeResources, topology: &NumaTopology) -> Self {
        Self {
            name: node.name.clone(),
            resources: node.allocatable.clone(),
            numa_topology: topology.clone(),
            vm_enabled: node.label_is_true(VM_SCHEDULABLE_LABEL),
            cpu_manager_enabled: node.label_is_true(CPU_MANAGER_LABEL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::NodeStatus;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    #[test]
    fn test_device_requests_are_numbered_in_order() {
        let devices = DeviceRequest::from_resources(&["resA", "resB"]);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].pf_name, "pf0");
        assert_eq!(devices[1].pf_name, "pf1");
        assert_eq!(devices[1].resource, "resB");
        assert_eq!(devices[1].manifest_name("n1"), "n1-1");
    }

    #[test]
    fn test_node_resources_from_node_object() {
        let node = Node {
            metadata: ObjectMeta {
                name: Some("worker-1".into()),
                labels: Some(BTreeMap::from([(
                    VM_SCHEDULABLE_LABEL.to_string(),
                    "true".to_string(),
                )])),
                ..Default::default()
            },
            status: Some(NodeStatus {
                allocatable: Some(BTreeMap::from([(
                    "example.com/sriov".to_string(),
                    Quantity("4".into()),
                )])),
                ..Default::default()
            }),
            ..Default::default()
        };

        let resources = NodeResources::from(&node);
        assert_eq!(resources.name, "worker-1");
        assert_eq!(
            resources.allocatable.get("example.com/sriov"),
            Some(&Quantity("4".into()))
        );

        let info = NodeInfo::discover(&resources, &NumaTopology::default());
        assert!(info.vm_enabled);
        assert!(!info.cpu_manager_enabled);
    }

    #[test]
    fn test_node_without_status_has_empty_inventory() {
        let node = Node::default();
        let resources = NodeResources::from(&node);
        assert!(resources.allocatable.is_empty());
        assert!(resources.name.is_empty());
    }

    #[test]
    fn test_agent_ref_display() {
        assert_eq!(AgentRef::new("kubevirt", "virt-handler-x").to_string(), "kubevirt/virt-handler-x");
    }
}
