//! Machine config pool for the dedicated node

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use serde::Serialize;

use super::{pool_metadata, pool_selector, TypeMeta, MACHINE_CONFIG_API_VERSION};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineConfigPool {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    pub metadata: ObjectMeta,
    pub spec: MachineConfigPoolSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineConfigPoolSpec {
    pub machine_config_selector: LabelSelector,
    pub node_selector: LabelSelector,
    pub paused: bool,
    /// Nodes allowed to be unavailable at once during an update
    pub max_unavailable: IntOrString,
}

/// A pool named after the node, rolling one machine at a time
pub fn machine_config_pool(node_name: &str) -> MachineConfigPool {
    MachineConfigPool {
        type_meta: TypeMeta::new(MACHINE_CONFIG_API_VERSION, "MachineConfigPool"),
        metadata: pool_metadata(node_name, None),
        spec: MachineConfigPoolSpec {
            machine_config_selector: pool_selector(),
            node_selector: pool_selector(),
            paused: false,
            max_unavailable: IntOrString::Int(1),
        },
    }
}
