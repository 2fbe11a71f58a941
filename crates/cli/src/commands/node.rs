//! `atlanta node`: render tuning manifests for one node

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tuner_lib::manifests::synthesize;
use tuner_lib::topology::parse_capabilities;
use tuner_lib::{
    CapabilityFetcher, DeviceRequest, KubeAgentRuntime, ManifestEncoder, NodeInfo, NodeResources,
    StructuredLogger,
};

use crate::client::{get_node, ConnectionOptions};
use crate::config::TunerConfig;
use crate::output::{print_summary, OutputFormat};
use crate::{Cli, NodeArgs};

/// Everything the node command needs, resolved from flags and config
#[derive(Debug)]
pub struct NodeOptions {
    pub nodes: Vec<String>,
    /// Set by `validate`
    node: Option<String>,
    pub devices: Vec<String>,
    pub connection: ConnectionOptions,
    pub config: TunerConfig,
    pub format: OutputFormat,
    pub summary: bool,
}

impl NodeOptions {
    /// Merge command line flags over the loaded configuration
    pub fn complete(cli: &Cli, args: &NodeArgs) -> Result<Self> {
        let mut config = TunerConfig::load()?;

        if let Some(namespace) = &cli.namespace {
            config.namespace = namespace.clone();
        }
        if let Some(policy) = args.reserve_cell {
            config.reserved_cell = policy;
        }

        Ok(Self {
            nodes: args.nodes.clone(),
            node: None,
            devices: args.sriov.clone(),
            connection: ConnectionOptions {
                kubeconfig: cli.kubeconfig.as_ref().map(Into::into),
                context: cli.context.clone(),
            },
            config,
            format: cli.format,
            summary: args.summary,
        })
    }

    /// Exactly one node name is accepted
    pub fn validate(&mut self) -> Result<()> {
        match self.nodes.as_slice() {
            [] => bail!("please provide a node name"),
            [node] => {
                self.node = Some(node.clone());
                Ok(())
            }
            _ => bail!("please provide only one node name"),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let node_name = self
            .node
            .as_deref()
            .context("node options must be validated before running")?;
        let logger = StructuredLogger::new(node_name);
        logger.log_run_started(env!("CARGO_PKG_VERSION"), self.devices.len());

        let client = self.connection.connect().await?;
        let node = NodeResources::from(&get_node(&client, node_name).await?);

        let runtime = KubeAgentRuntime::new(client)
            .with_label_selector(self.config.agent_label_selector.as_str())
            .with_container(self.config.agent_container.as_str());
        let fetcher = CapabilityFetcher::new(Arc::new(runtime), self.config.fetch_settings());

        let agent = fetcher.locate_agent(node_name).await?;
        logger.log_agent_selected(&agent);

        let capture = fetcher.capture(&agent);
        let output = match self.config.exec_timeout() {
            Some(limit) => tokio::time::timeout(limit, capture)
                .await
                .map_err(|_| timeout_error(&agent.to_string(), limit))?,
            None => capture.await,
        };
        let document = output.into_result(&agent)?;
        debug!(bytes = document.len(), "Capability document received");

        let topology = parse_capabilities(&document)
            .with_context(|| format!("Failed to read capabilities of node {}", node_name))?;

        let info = NodeInfo::discover(&node, &topology);
        logger.log_discovery(&info);

        let devices = DeviceRequest::from_resources(&self.devices);
        let policy = self.config.reserved_cell;
        let manifests = synthesize(&node, &topology, &devices, policy)?;

        let reserved = policy.position(&topology)?;
        let reserved_cpus = manifests
            .iter()
            .find_map(|m| m.reserved_system_cpus())
            .unwrap_or_default();
        logger.log_reservation(&policy.to_string(), reserved_cpus);

        if self.summary {
            print_summary(&info, Some(reserved), &devices, &node);
        }

        let encoder = ManifestEncoder::new(self.format.into());
        let rendered = encoder.encode(&manifests)?;
        print!("{}", rendered);

        logger.log_manifests(manifests.len(), &encoder.format().to_string());
        info!(node = %node_name, "Done");
        Ok(())
    }
}

fn timeout_error(agent: &str, limit: Duration) -> anyhow::Error {
    anyhow::anyhow!(
        "timed out after {}s reading capability document from agent {}",
        limit.as_secs(),
        agent
    )
}
