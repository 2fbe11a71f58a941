//! Observability helpers for node tuning runs
//!
//! Provides structured tracing events for each stage of a run. Output
//! formatting (JSON or text) is chosen by the subscriber the binary installs.

use tracing::{info, warn};

use crate::models::{AgentRef, NodeInfo};

/// Structured logger for tuning events
///
/// Every event carries the node name so runs against several nodes can be
/// told apart in aggregated logs.
#[derive(Clone)]
pub struct StructuredLogger {
    node_name: String,
}

impl StructuredLogger {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
        }
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// Log the start of a run
    pub fn log_run_started(&self, version: &str, devices: usize) {
        info!(
            event = "run_started",
            node = %self.node_name,
            version = %version,
            sriov_devices = devices,
            "Rendering node configuration"
        );
    }

    /// Log the agent chosen for the capability fetch
    pub fn log_agent_selected(&self, agent: &AgentRef) {
        info!(
            event = "agent_selected",
            node = %self.node_name,
            agent = %agent,
            "Located node agent"
        );
    }

    /// Log the topology and labels discovered on the node
    pub fn log_discovery(&self, info: &NodeInfo) {
        info!(
            event = "node_discovered",
            node = %self.node_name,
            numa_cells = info.numa_topology.len(),
            cpus = info.numa_topology.cpu_count(),
            resources = info.resources.len(),
            vm_enabled = info.vm_enabled,
            cpu_manager_enabled = info.cpu_manager_enabled,
            "Discovered node capabilities"
        );

        if !info.vm_enabled {
            warn!(
                event = "node_not_vm_schedulable",
                node = %self.node_name,
                "Node is not marked schedulable for virtual machines"
            );
        }
    }

    /// Log the CPUs picked for system reservation
    pub fn log_reservation(&self, policy: &str, reserved: &str) {
        info!(
            event = "cpus_reserved",
            node = %self.node_name,
            policy = %policy,
            reserved = %reserved,
            "Selected reserved system CPUs"
        );
    }

    /// Log the completed manifest set
    pub fn log_manifests(&self, count: usize, format: &str) {
        info!(
            event = "manifests_rendered",
            node = %self.node_name,
            manifests = count,
            format = %format,
            "Rendered node manifests"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeResources;
    use crate::topology::NumaTopology;

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-node");
        assert_eq!(logger.node_name(), "test-node");
    }

    #[test]
    fn test_logging_without_subscriber() {
        let logger = StructuredLogger::new("test-node");
        let info = NodeInfo::discover(&NodeResources::new("test-node"), &NumaTopology::default());
        logger.log_run_started("0.1.0", 2);
        logger.log_agent_selected(&AgentRef::new("kubevirt", "virt-handler-1"));
        logger.log_discovery(&info);
        logger.log_reservation("last", "4, 5, 6");
        logger.log_manifests(5, "yaml");
    }
}
