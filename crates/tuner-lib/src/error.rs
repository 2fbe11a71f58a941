//! Error types for node tuning

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T, E = TunerError> = std::result::Result<T, E>;

/// Errors surfaced by capability retrieval and manifest synthesis.
///
/// None of these are retried; every variant is returned straight to the
/// caller, which decides how to present it.
#[derive(Error, Debug)]
pub enum TunerError {
    #[error("no agent pod found on node {node} in namespace {namespace}")]
    AgentNotFound { node: String, namespace: String },

    #[error("expected to find one agent pod on node {node}, found {count}")]
    AmbiguousAgent { node: String, count: usize },

    #[error("capability command failed in {agent} after {drained} bytes of output: {source}{}", format_tail(.tail))]
    Execution {
        agent: String,
        drained: usize,
        tail: String,
        #[source]
        source: ExecError,
    },

    #[error("malformed capability document: {0}")]
    MalformedCapabilityDocument(String),

    #[error("capability document reports no NUMA cells")]
    NoNumaTopology,

    #[error("reservation cell {index} is out of range, topology has {cells} cells")]
    CellOutOfRange { index: usize, cells: usize },

    #[error("node {node} has no resource {resource}")]
    ResourceNotFound { node: String, resource: String },

    #[error("failed to convert resource availability for resource {resource}: {quantity} is not a whole count")]
    NonIntegralResource { resource: String, quantity: String },

    #[error("failed to encode manifests: {0}")]
    Encode(String),

    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

/// Failure of the remote command itself, as opposed to discovery or parsing
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("exec transport error: {0}")]
    Transport(String),

    #[error("remote command failed: {0}")]
    CommandFailed(String),

    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("execution task ended without reporting a status")]
    Aborted,
}

fn format_tail(tail: &str) -> String {
    if tail.is_empty() {
        String::new()
    } else {
        format!(" (output ended with: {})", tail)
    }
}

impl From<serde_yaml::Error> for TunerError {
    fn from(err: serde_yaml::Error) -> Self {
        TunerError::Encode(err.to_string())
    }
}

impl From<serde_json::Error> for TunerError {
    fn from(err: serde_json::Error) -> Self {
        TunerError::Encode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_message_includes_tail() {
        let err = TunerError::Execution {
            agent: "kubevirt/virt-handler-abc".into(),
            drained: 12,
            tail: "No such file".into(),
            source: ExecError::CommandFailed("exit code 1".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("virt-handler-abc"));
        assert!(msg.contains("12 bytes"));
        assert!(msg.contains("No such file"));
    }

    #[test]
    fn test_execution_message_without_tail() {
        let err = TunerError::Execution {
            agent: "ns/pod".into(),
            drained: 0,
            tail: String::new(),
            source: ExecError::Aborted,
        };
        assert!(!err.to_string().contains("output ended with"));
    }
}
