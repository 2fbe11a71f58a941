//! Capability document decoding

use serde::Deserialize;

use super::{Cell, Cpu, NumaTopology};
use crate::error::{Result, TunerError};

#[derive(Debug, Deserialize)]
struct CapabilitiesDoc {
    host: Option<HostDoc>,
}

#[derive(Debug, Deserialize)]
struct HostDoc {
    topology: Option<TopologyDoc>,
}

#[derive(Debug, Deserialize)]
struct TopologyDoc {
    cells: Option<CellsDoc>,
}

#[derive(Debug, Deserialize)]
struct CellsDoc {
    #[serde(rename = "cell", default)]
    cells: Vec<CellDoc>,
}

#[derive(Debug, Deserialize)]
struct CellDoc {
    #[serde(rename = "@id")]
    id: Option<u32>,
    cpus: Option<CpusDoc>,
}

#[derive(Debug, Deserialize)]
struct CpusDoc {
    #[serde(rename = "cpu", default)]
    cpus: Vec<CpuDoc>,
}

#[derive(Debug, Deserialize)]
struct CpuDoc {
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "@socket_id")]
    socket_id: Option<u32>,
    #[serde(rename = "@core_id")]
    core_id: Option<u32>,
    #[serde(rename = "@siblings")]
    siblings: Option<String>,
}

/// Decode the NUMA section of a capability document.
///
/// A document without a `host/topology/cells` section yields an empty
/// topology; callers that need a cell must check for that.
pub fn parse_capabilities(document: &[u8]) -> Result<NumaTopology> {
    let text = std::str::from_utf8(document)
        .map_err(|e| TunerError::MalformedCapabilityDocument(e.to_string()))?;

    let caps: CapabilitiesDoc = quick_xml::de::from_str(text)
        .map_err(|e| TunerError::MalformedCapabilityDocument(e.to_string()))?;

    let cells = caps
        .host
        .and_then(|h| h.topology)
        .and_then(|t| t.cells)
        .map(|c| c.cells)
        .unwrap_or_default();

    Ok(NumaTopology::new(
        cells
            .into_iter()
            .map(|cell| Cell {
                id: cell.id,
                cpus: cell
                    .cpus
                    .map(|c| c.cpus)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|cpu| Cpu {
                        id: cpu.id,
                        socket_id: cpu.socket_id,
                        core_id: cpu.core_id,
                        siblings: cpu.siblings,
                    })
                    .collect(),
            })
            .collect(),
    ))
}
