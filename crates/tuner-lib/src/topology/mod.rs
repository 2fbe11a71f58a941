//! NUMA topology extracted from the host capability document
//!
//! The agent on each node publishes a libvirt-style capabilities XML
//! document. Only the `host/topology/cells` section is of interest here:
//! every `cell` becomes a [`Cell`] and every `cpus/cpu` inside it a [`Cpu`],
//! both kept in document order.

mod parser;

#[cfg(test)]
mod tests;

pub use parser::parse_capabilities;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TunerError};

/// A single logical CPU as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cpu {
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub core_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub siblings: Option<String>,
}

impl Cpu {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            socket_id: None,
            core_id: None,
            siblings: None,
        }
    }
}

/// A NUMA cell and the CPUs local to it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cell {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub cpus: Vec<Cpu>,
}

impl Cell {
    /// Build a cell from bare CPU ids
    pub fn from_cpu_ids(id: Option<u32>, cpu_ids: &[u32]) -> Self {
        Self {
            id,
            cpus: cpu_ids.iter().copied().map(Cpu::new).collect(),
        }
    }

    pub fn cpu_ids(&self) -> Vec<u32> {
        self.cpus.iter().map(|c| c.id).collect()
    }
}

/// Ordered NUMA cells of one host. Immutable once parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NumaTopology {
    cells: Vec<Cell>,
}

impl NumaTopology {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Topology from plain CPU id lists, cell ids assigned by position
    pub fn from_cpu_lists(lists: &[&[u32]]) -> Self {
        Self::new(
            lists
                .iter()
                .enumerate()
                .map(|(i, ids)| Cell::from_cpu_ids(Some(i as u32), ids))
                .collect(),
        )
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cpu_count(&self) -> usize {
        self.cells.iter().map(|c| c.cpus.len()).sum()
    }
}

/// Which NUMA cell hosts the CPUs reserved for the system
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum ReservationPolicy {
    /// The last cell in reported order
    #[default]
    LastCell,
    /// A cell picked by its position in the reported order
    Cell(usize),
}

impl ReservationPolicy {
    /// Position of the selected cell in reported order.
    ///
    /// An empty topology is `NoNumaTopology` regardless of policy.
    pub fn position(&self, topology: &NumaTopology) -> Result<usize> {
        let cells = topology.len();
        match self {
            _ if cells == 0 => Err(TunerError::NoNumaTopology),
            ReservationPolicy::LastCell => Ok(cells - 1),
            ReservationPolicy::Cell(index) if *index < cells => Ok(*index),
            ReservationPolicy::Cell(index) => Err(TunerError::CellOutOfRange {
                index: *index,
                cells,
            }),
        }
    }

    /// Resolve the policy against a topology
    pub fn select<'a>(&self, topology: &'a NumaTopology) -> Result<&'a Cell> {
        let position = self.position(topology)?;
        Ok(&topology.cells()[position])
    }
}

impl FromStr for ReservationPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "last" => Ok(ReservationPolicy::LastCell),
            other => other
                .parse::<usize>()
                .map(ReservationPolicy::Cell)
                .map_err(|_| format!("invalid reservation cell '{}', expected 'last' or an index", s)),
        }
    }
}

impl TryFrom<String> for ReservationPolicy {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ReservationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationPolicy::LastCell => write!(f, "last"),
            ReservationPolicy::Cell(index) => write!(f, "{}", index),
        }
    }
}
