//! Manifest synthesis
//!
//! Builds the configuration objects that dedicate a node to latency
//! sensitive virtual machines:
//! - a machine config pool owning the node
//! - a machine config with IOMMU and huge page kernel arguments
//! - a kubelet config reserving one NUMA cell for system daemons
//! - an SR-IOV node policy and network per requested device
//!
//! Every builder is a pure function of its inputs. All manifests carry the
//! pool marker label and no owner references; each run produces them from
//! scratch.

mod encode;
mod kubelet;
mod pool;
mod sriov;
mod tuning;


pub use encode::{EncodeFormat, ManifestEncoder};
pub use kubelet::{
    kubelet_config, KubeletConfig, KubeletConfigSpec, KubeletCpuConfiguration,
    CPU_MANAGER_POLICY, CPU_MANAGER_RECONCILE_PERIOD,
};
pub use pool::{machine_config_pool, MachineConfigPool, MachineConfigPoolSpec};
pub use sriov::{
    network_pair, sriov_network, sriov_network_node_policy, SriovNetwork, SriovNetworkNicSelector,
    SriovNetworkNodePolicy, SriovNetworkNodePolicySpec, SriovNetworkSpec, SRIOV_NAMESPACE,
};
pub use tuning::{machine_config, IgnitionConfig, MachineConfig, MachineConfigSpec, KERNEL_ARGUMENTS};

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{Result, TunerError};
use crate::models::{DeviceRequest, NodeResources};
use crate::topology::{NumaTopology, ReservationPolicy};

/// Label identifying the dedicated node pool and everything belonging to it
pub const POOL_ROLE_LABEL: &str = "node-role.kubernetes.io/sap";

/// API group version of the machine config operator types
pub const MACHINE_CONFIG_API_VERSION: &str = "machineconfiguration.openshift.io/v1";

/// API group version of the SR-IOV operator types
pub const SRIOV_API_VERSION: &str = "sriovnetwork.openshift.io/v1";

/// The `apiVersion`/`kind` pair at the top of every manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMeta {
    pub api_version: String,
    pub kind: String,
}

impl TypeMeta {
    pub(crate) fn new(api_version: &str, kind: &str) -> Self {
        Self {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
        }
    }
}

/// Any manifest this crate produces, in output order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Manifest {
    Pool(MachineConfigPool),
    Tuning(MachineConfig),
    KubeletReservation(KubeletConfig),
    NetworkPolicy(SriovNetworkNodePolicy),
    NetworkAttachment(SriovNetwork),
}

impl Manifest {
    pub fn kind(&self) -> &str {
        match self {
            Manifest::Pool(m) => &m.type_meta.kind,
            Manifest::Tuning(m) => &m.type_meta.kind,
            Manifest::KubeletReservation(m) => &m.type_meta.kind,
            Manifest::NetworkPolicy(m) => &m.type_meta.kind,
            Manifest::NetworkAttachment(m) => &m.type_meta.kind,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Manifest::Pool(m) => &m.metadata,
            Manifest::Tuning(m) => &m.metadata,
            Manifest::KubeletReservation(m) => &m.metadata,
            Manifest::NetworkPolicy(m) => &m.metadata,
            Manifest::NetworkAttachment(m) => &m.metadata,
        }
    }

    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    /// The reserved CPU list, for the kubelet reservation only
    pub fn reserved_system_cpus(&self) -> Option<&str> {
        match self {
            Manifest::KubeletReservation(m) => Some(&m.spec.kubelet_config.reserved_system_cpus),
            _ => None,
        }
    }
}

/// Build the full manifest set for a node.
///
/// Order: pool, tuning, kubelet reservation, then one policy/network pair
/// per device in request order. The first failing device aborts the whole
/// set.
pub fn synthesize(
    node: &NodeResources,
    topology: &NumaTopology,
    devices: &[DeviceRequest],
    policy: ReservationPolicy,
) -> Result<Vec<Manifest>> {
    if topology.is_empty() {
        return Err(TunerError::NoNumaTopology);
    }

    let mut manifests = vec![
        Manifest::Pool(machine_config_pool(&node.name)),
        Manifest::Tuning(machine_config(&node.name)),
        Manifest::KubeletReservation(kubelet_config(&node.name, topology, policy)?),
    ];

    for device in devices {
        let (policy, network) = network_pair(device, node)?;
        manifests.push(Manifest::NetworkPolicy(policy));
        manifests.push(Manifest::NetworkAttachment(network));
    }

    Ok(manifests)
}

pub(crate) fn pool_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(POOL_ROLE_LABEL.to_string(), String::new())])
}

pub(crate) fn pool_selector() -> LabelSelector {
    LabelSelector {
        match_labels: Some(pool_labels()),
        ..Default::default()
    }
}

pub(crate) fn pool_metadata(name: &str, namespace: Option<&str>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        labels: Some(pool_labels()),
        ..Default::default()
    }
}
