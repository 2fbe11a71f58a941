//! Node tuning library for latency-sensitive virtualized workloads
//!
//! This crate provides the core functionality for:
//! - Fetching the hardware capability document from the node agent
//! - Parsing the NUMA topology out of that document
//! - Reading allocatable resources off the node object
//! - Synthesizing pool, tuning, kubelet and SR-IOV manifests

pub mod capabilities;
pub mod error;
pub mod inventory;
pub mod manifests;
pub mod models;
pub mod observability;
pub mod topology;

pub use capabilities::{AgentRuntime, CapabilityFetcher, FetchSettings, KubeAgentRuntime};
pub use error::{ExecError, Result, TunerError};
pub use manifests::{EncodeFormat, Manifest, ManifestEncoder};
pub use models::*;
pub use observability::StructuredLogger;
pub use topology::{Cell, Cpu, NumaTopology, ReservationPolicy};
