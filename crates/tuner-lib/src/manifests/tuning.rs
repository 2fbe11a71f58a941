//! Machine config carrying the kernel boot parameters

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Serialize;

use super::{pool_metadata, TypeMeta, MACHINE_CONFIG_API_VERSION};

/// Ignition config format version understood by the machine config operator
pub const IGNITION_VERSION: &str = "3.1.0";

/// IOMMU pass-through plus 2800 pre-allocated 1G huge pages
pub const KERNEL_ARGUMENTS: &str =
    "intel_iommu=on iommu=pt kvm.nx_huge_pages=off default_hugepagesz=1G hugepagesz=1G hugepages=2800";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineConfig {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    pub metadata: ObjectMeta,
    pub spec: MachineConfigSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineConfigSpec {
    #[serde(rename = "osImageURL")]
    pub os_image_url: String,
    pub config: IgnitionConfig,
    pub kernel_arguments: Vec<String>,
    pub extensions: Vec<String>,
    pub fips: bool,
    pub kernel_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IgnitionConfig {
    pub version: String,
}

pub fn machine_config(node_name: &str) -> MachineConfig {
    MachineConfig {
        type_meta: TypeMeta::new(MACHINE_CONFIG_API_VERSION, "MachineConfig"),
        metadata: pool_metadata(node_name, None),
        spec: MachineConfigSpec {
            os_image_url: String::new(),
            config: IgnitionConfig {
                version: IGNITION_VERSION.to_string(),
            },
            kernel_arguments: vec![KERNEL_ARGUMENTS.to_string()],
            extensions: Vec::new(),
            fips: false,
            kernel_type: String::new(),
        },
    }
}
