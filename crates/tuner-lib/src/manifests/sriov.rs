//! SR-IOV node policy and network per requested device

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Serialize;
use std::collections::BTreeMap;

use super::{pool_labels, pool_metadata, TypeMeta, SRIOV_API_VERSION};
use crate::error::Result;
use crate::inventory::allocatable_count;
use crate::models::{DeviceRequest, NodeResources};

/// Namespace watched by the SR-IOV network operator
pub const SRIOV_NAMESPACE: &str = "sriov-network-operator";

/// VFs are bound to vfio so they can be passed through to guests
pub const DEVICE_TYPE: &str = "vfio-pci";

pub const MTU: u32 = 9000;

pub const POLICY_PRIORITY: u32 = 90;

/// Namespace the network attachment definition is created in
pub const NETWORK_NAMESPACE: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SriovNetworkNodePolicy {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    pub metadata: ObjectMeta,
    pub spec: SriovNetworkNodePolicySpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SriovNetworkNodePolicySpec {
    pub device_type: String,
    pub mtu: u32,
    pub nic_selector: SriovNetworkNicSelector,
    pub num_vfs: u64,
    pub priority: u32,
    pub resource_name: String,
    pub node_selector: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SriovNetworkNicSelector {
    pub pf_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SriovNetwork {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    pub metadata: ObjectMeta,
    pub spec: SriovNetworkSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SriovNetworkSpec {
    pub ipam: String,
    pub network_namespace: String,
    pub resource_name: String,
    pub spoof_chk: String,
}

/// Node policy creating as many VFs as the node reports for `resource_name`
pub fn sriov_network_node_policy(
    name: &str,
    pf_name: &str,
    resource_name: &str,
    node: &NodeResources,
) -> Result<SriovNetworkNodePolicy> {
    let num_vfs = allocatable_count(node, resource_name)?;

    Ok(SriovNetworkNodePolicy {
        type_meta: TypeMeta::new(SRIOV_API_VERSION, "SriovNetworkNodePolicy"),
        metadata: pool_metadata(name, Some(SRIOV_NAMESPACE)),
        spec: SriovNetworkNodePolicySpec {
            device_type: DEVICE_TYPE.to_string(),
            mtu: MTU,
            nic_selector: SriovNetworkNicSelector {
                pf_names: vec![pf_name.to_string()],
            },
            num_vfs,
            priority: POLICY_PRIORITY,
            resource_name: resource_name.to_string(),
            node_selector: pool_labels(),
        },
    })
}

/// Network attachment for the VFs of `resource_name`, spoof checking off
pub fn sriov_network(name: &str, resource_name: &str) -> SriovNetwork {
    SriovNetwork {
        type_meta: TypeMeta::new(SRIOV_API_VERSION, "SriovNetwork"),
        metadata: pool_metadata(name, Some(SRIOV_NAMESPACE)),
        spec: SriovNetworkSpec {
            ipam: "{}".to_string(),
            network_namespace: NETWORK_NAMESPACE.to_string(),
            resource_name: resource_name.to_string(),
            spoof_chk: "off".to_string(),
        },
    }
}

/// Policy and network for one device, both named `<node>-<index>`
pub fn network_pair(
    device: &DeviceRequest,
    node: &NodeResources,
) -> Result<(SriovNetworkNodePolicy, SriovNetwork)> {
    let name = device.manifest_name(&node.name);
    let policy = sriov_network_node_policy(&name, &device.pf_name, &device.resource, node)?;
    let network = sriov_network(&name, &device.resource);
    Ok((policy, network))
}
