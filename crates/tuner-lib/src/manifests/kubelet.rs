//! Kubelet config reserving a NUMA cell for system daemons

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use serde::Serialize;
use std::time::Duration;

use super::{pool_metadata, pool_selector, TypeMeta, MACHINE_CONFIG_API_VERSION};
use crate::error::Result;
use crate::topology::{NumaTopology, ReservationPolicy};

pub const CPU_MANAGER_POLICY: &str = "static";

pub const CPU_MANAGER_RECONCILE_PERIOD: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KubeletConfig {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    pub metadata: ObjectMeta,
    pub spec: KubeletConfigSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KubeletConfigSpec {
    pub machine_config_pool_selector: LabelSelector,
    pub kubelet_config: KubeletCpuConfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KubeletCpuConfiguration {
    pub cpu_manager_policy: String,
    pub cpu_manager_reconcile_period: String,
    #[serde(rename = "reservedSystemCPUs")]
    pub reserved_system_cpus: String,
}

/// Reserve every CPU of the cell chosen by `policy`, in reported order.
///
/// Fails with `NoNumaTopology` on an empty topology instead of indexing it.
pub fn kubelet_config(
    node_name: &str,
    topology: &NumaTopology,
    policy: ReservationPolicy,
) -> Result<KubeletConfig> {
    let cell = policy.select(topology)?;
    let reserved = cell
        .cpus
        .iter()
        .map(|cpu| cpu.id.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    Ok(KubeletConfig {
        type_meta: TypeMeta::new(MACHINE_CONFIG_API_VERSION, "KubeletConfig"),
        metadata: pool_metadata(node_name, None),
        spec: KubeletConfigSpec {
            machine_config_pool_selector: pool_selector(),
            kubelet_config: KubeletCpuConfiguration {
                cpu_manager_policy: CPU_MANAGER_POLICY.to_string(),
                cpu_manager_reconcile_period: format_duration(CPU_MANAGER_RECONCILE_PERIOD),
                reserved_system_cpus: reserved,
            },
        },
    })
}

/// Render a duration the way the kubelet config parser expects (`5s`, `250ms`)
fn format_duration(duration: Duration) -> String {
    if duration.subsec_millis() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
