//! Capability document retrieval from the node agent
//!
//! This module locates the agent pod scheduled on a node and runs a
//! read-only command in it to obtain the host capability document. The
//! cluster side sits behind [`AgentRuntime`] so the streaming logic can be
//! exercised without a cluster.

mod cluster;
mod stream;


pub use cluster::{KubeAgentRuntime, DEFAULT_AGENT_CONTAINER, DEFAULT_AGENT_LABEL_SELECTOR};
pub use stream::{capture_output, merge_streams, CapturedOutput};

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::AsyncWrite;
use tracing::debug;

use crate::error::{ExecError, Result, TunerError};
use crate::models::AgentRef;
use crate::topology::{parse_capabilities, NumaTopology};

/// Default namespace the agent pods run in
pub const DEFAULT_AGENT_NAMESPACE: &str = "kubevirt";

/// Where the agent keeps the capability document
pub const DEFAULT_CAPABILITIES_PATH: &str = "/var/lib/kubevirt-node-labeller/capabilities.xml";

/// Default in-process pipe capacity in bytes
pub const DEFAULT_PIPE_BUFFER_BYTES: usize = 64 * 1024;

/// Cluster operations the fetcher depends on
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// List agent pods placed on `node` in `namespace`
    async fn list_agents(&self, node: &str, namespace: &str) -> Result<Vec<AgentRef>>;

    /// Run `command` in `agent`, writing stdout and stderr into `sink`
    /// as the output arrives
    async fn exec(
        &self,
        agent: &AgentRef,
        command: &[String],
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> std::result::Result<(), ExecError>;
}

/// Settings for locating the agent and reading the document
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub namespace: String,
    pub capabilities_path: String,
    pub pipe_buffer_bytes: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_AGENT_NAMESPACE.to_string(),
            capabilities_path: DEFAULT_CAPABILITIES_PATH.to_string(),
            pipe_buffer_bytes: DEFAULT_PIPE_BUFFER_BYTES,
        }
    }
}

impl FetchSettings {
    /// The read-only command run inside the agent
    pub fn command(&self) -> Vec<String> {
        vec!["cat".to_string(), self.capabilities_path.clone()]
    }
}

/// Pick the single agent for a node out of the discovery result
pub fn select_agent(node: &str, namespace: &str, mut agents: Vec<AgentRef>) -> Result<AgentRef> {
    match agents.len() {
        0 => Err(TunerError::AgentNotFound {
            node: node.to_string(),
            namespace: namespace.to_string(),
        }),
        1 => Ok(agents.remove(0)),
        count => Err(TunerError::AmbiguousAgent {
            node: node.to_string(),
            count,
        }),
    }
}

/// Fetches and decodes the capability document for a node
pub struct CapabilityFetcher {
    runtime: Arc<dyn AgentRuntime>,
    settings: FetchSettings,
}

impl CapabilityFetcher {
    pub fn new(runtime: Arc<dyn AgentRuntime>, settings: FetchSettings) -> Self {
        Self { runtime, settings }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Find the one agent pod running on `node`
    pub async fn locate_agent(&self, node: &str) -> Result<AgentRef> {
        let namespace = &self.settings.namespace;
        let agents = self.runtime.list_agents(node, namespace).await?;
        debug!(node = %node, matches = agents.len(), "Listed agent pods");
        select_agent(node, namespace, agents)
    }

    /// Run the capability command in `agent` and keep whatever it wrote
    pub async fn capture(&self, agent: &AgentRef) -> CapturedOutput {
        capture_output(
            Arc::clone(&self.runtime),
            agent.clone(),
            self.settings.command(),
            self.settings.pipe_buffer_bytes,
        )
        .await
    }

    /// The raw capability document, only if the command succeeded
    pub async fn fetch_document(&self, node: &str) -> Result<Vec<u8>> {
        let agent = self.locate_agent(node).await?;
        debug!(node = %node, agent = %agent, "Reading capability document");
        self.capture(&agent).await.into_result(&agent)
    }

    /// Fetch and parse the NUMA topology of `node`
    pub async fn fetch_topology(&self, node: &str) -> Result<NumaTopology> {
        let document = self.fetch_document(node).await?;
        parse_capabilities(&document)
    }
}
