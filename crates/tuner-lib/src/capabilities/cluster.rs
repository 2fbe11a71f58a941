//! Kubernetes implementation of the agent runtime

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use kube::api::{Api, AttachParams, ListParams};
use kube::Client;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::{merge_streams, AgentRuntime};
use crate::error::{ExecError, Result};
use crate::models::AgentRef;

/// Label selector matching the KubeVirt node handler pods
pub const DEFAULT_AGENT_LABEL_SELECTOR: &str = "kubevirt.io=virt-handler";

/// Container inside the agent pod that can read the document
pub const DEFAULT_AGENT_CONTAINER: &str = "virt-handler";

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Talks to the API server for pod discovery and exec
pub struct KubeAgentRuntime {
    client: Client,
    label_selector: String,
    container: String,
}

impl KubeAgentRuntime {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            label_selector: DEFAULT_AGENT_LABEL_SELECTOR.to_string(),
            container: DEFAULT_AGENT_CONTAINER.to_string(),
        }
    }

    pub fn with_label_selector(mut self, selector: impl Into<String>) -> Self {
        self.label_selector = selector.into();
        self
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = container.into();
        self
    }
}

#[async_trait]
impl AgentRuntime for KubeAgentRuntime {
    async fn list_agents(&self, node: &str, namespace: &str) -> Result<Vec<AgentRef>> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = agent_list_params(node, &self.label_selector);

        let list = pods.list(&params).await?;
        Ok(list
            .items
            .into_iter()
            .map(|pod| {
                AgentRef::new(
                    pod.metadata
                        .namespace
                        .unwrap_or_else(|| namespace.to_string()),
                    pod.metadata.name.unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn exec(
        &self,
        agent: &AgentRef,
        command: &[String],
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> std::result::Result<(), ExecError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &agent.namespace);
        let params = AttachParams::default()
            .container(self.container.as_str())
            .stdin(false)
            .stdout(true)
            .stderr(true)
            .tty(false);

        let mut process = pods
            .exec(&agent.name, command.to_vec(), &params)
            .await
            .map_err(|e| ExecError::Transport(e.to_string()))?;

        let status = process.take_status();
        let stdout: BoxedReader = match process.stdout() {
            Some(out) => Box::new(out),
            None => Box::new(tokio::io::empty()),
        };
        let stderr: BoxedReader = match process.stderr() {
            Some(err) => Box::new(err),
            None => Box::new(tokio::io::empty()),
        };

        let written = merge_streams(stdout, stderr, sink).await?;
        debug!(agent = %agent, bytes = written, "Remote command output finished");

        let status = match status {
            Some(status) => status.await,
            None => None,
        };
        process
            .join()
            .await
            .map_err(|e| ExecError::Transport(e.to_string()))?;

        check_status(status)
    }
}

/// Agent pods scheduled on `node` that carry the agent label
fn agent_list_params(node: &str, label_selector: &str) -> ListParams {
    ListParams::default()
        .fields(&format!("spec.nodeName={}", node))
        .labels(label_selector)
}

/// Interpret the exec status object sent when the remote command exits
fn check_status(status: Option<Status>) -> std::result::Result<(), ExecError> {
    match status {
        Some(status) if status.status.as_deref() == Some("Failure") => {
            let reason = status
                .message
                .or(status.reason)
                .unwrap_or_else(|| "unknown failure".to_string());
            Err(ExecError::CommandFailed(reason))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_list_params_select_node_and_label() {
        let params = agent_list_params("n1", DEFAULT_AGENT_LABEL_SELECTOR);
        assert_eq!(params.field_selector.as_deref(), Some("spec.nodeName=n1"));
        assert_eq!(params.label_selector.as_deref(), Some("kubevirt.io=virt-handler"));
    }

    #[test]
    fn test_agent_list_params_custom_selector() {
        let params = agent_list_params("worker-3", "app=node-agent,tier=system");
        assert_eq!(params.field_selector.as_deref(), Some("spec.nodeName=worker-3"));
        assert_eq!(params.label_selector.as_deref(), Some("app=node-agent,tier=system"));
    }

    #[test]
    fn test_success_status() {
        let status = Status {
            status: Some("Success".into()),
            ..Default::default()
        };
        assert!(check_status(Some(status)).is_ok());
        assert!(check_status(None).is_ok());
    }

    #[test]
    fn test_failure_status_carries_message() {
        let status = Status {
            status: Some("Failure".into()),
            message: Some("command terminated with non-zero exit code".into()),
            reason: Some("NonZeroExitCode".into()),
            ..Default::default()
        };
        match check_status(Some(status)) {
            Err(ExecError::CommandFailed(msg)) => assert!(msg.contains("non-zero exit code")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_failure_status_falls_back_to_reason() {
        let status = Status {
            status: Some("Failure".into()),
            reason: Some("NonZeroExitCode".into()),
            ..Default::default()
        };
        match check_status(Some(status)) {
            Err(ExecError::CommandFailed(msg)) => assert_eq!(msg, "NonZeroExitCode"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
