//! Kubernetes API client setup and node lookup

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Node;
use kube::api::Api;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::PathBuf;
use tracing::debug;

/// How to reach the API server
#[derive(Debug, Clone, Default)]
pub struct ConnectionOptions {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

impl ConnectionOptions {
    /// Resolve the client configuration.
    ///
    /// An explicit kubeconfig or context is honored as given; otherwise the
    /// usual inference applies (`KUBECONFIG`, `~/.kube/config`, in-cluster).
    async fn client_config(&self) -> Result<Config> {
        let options = KubeConfigOptions {
            context: self.context.clone(),
            ..Default::default()
        };

        match (&self.kubeconfig, &self.context) {
            (Some(path), _) => {
                let kubeconfig = Kubeconfig::read_from(path)
                    .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;
                Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .context("Invalid kubeconfig")
            }
            (None, Some(_)) => Config::from_kubeconfig(&options)
                .await
                .context("Invalid kubeconfig context"),
            (None, None) => Config::infer()
                .await
                .context("Could not infer Kubernetes configuration"),
        }
    }

    /// Create a client for the configured cluster
    pub async fn connect(&self) -> Result<Client> {
        let config = self.client_config().await?;
        debug!(cluster_url = %config.cluster_url, "Connecting to Kubernetes API");
        Client::try_from(config).context("Failed to create Kubernetes client")
    }
}

/// Fetch a node object by name
pub async fn get_node(client: &Client, name: &str) -> Result<Node> {
    let nodes: Api<Node> = Api::all(client.clone());
    nodes
        .get(name)
        .await
        .with_context(|| format!("Failed to get node {}", name))
}
