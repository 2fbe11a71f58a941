//! Output formatting utilities
//!
//! Manifests are the only thing written to stdout; messages and summaries
//! go to stderr so the output can be piped straight into `oc apply -f -`.

use clap::ValueEnum;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};
use tuner_lib::inventory::allocatable_count;
use tuner_lib::{DeviceRequest, EncodeFormat, NodeInfo, NodeResources};

/// Output format for rendered manifests
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// YAML list (default)
    #[default]
    Yaml,
    /// JSON array
    Json,
}

impl From<OutputFormat> for EncodeFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Yaml => EncodeFormat::Yaml,
            OutputFormat::Json => EncodeFormat::Json,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Row for the NUMA cell table
#[derive(Tabled)]
struct CellRow {
    #[tabled(rename = "Cell")]
    cell: String,
    #[tabled(rename = "CPUs")]
    cpus: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Reserved")]
    reserved: String,
}

/// Row for the SR-IOV device table
#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "PF")]
    pf: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "VFs")]
    vfs: String,
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a summary of what was discovered and what will be provisioned
pub fn print_summary(
    info: &NodeInfo,
    reserved_cell: Option<usize>,
    devices: &[DeviceRequest],
    node: &NodeResources,
) {
    eprintln!("{}", "Node Summary".bold());
    eprintln!("{}", "=".repeat(50));
    eprintln!("Node:                 {}", info.name.cyan());
    eprintln!("VM schedulable:       {}", yes_no(info.vm_enabled));
    eprintln!("CPU manager enabled:  {}", yes_no(info.cpu_manager_enabled));
    eprintln!();

    let cells: Vec<CellRow> = info
        .numa_topology
        .cells()
        .iter()
        .enumerate()
        .map(|(position, cell)| CellRow {
            cell: cell
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| format!("#{}", position)),
            cpus: format_cpu_list(&cell.cpu_ids()),
            count: cell.cpus.len(),
            reserved: if reserved_cell == Some(position) {
                "yes".green().to_string()
            } else {
                String::new()
            },
        })
        .collect();
    eprintln!("{}", Table::new(cells).with(Style::rounded()));

    if devices.is_empty() {
        return;
    }

    let rows: Vec<DeviceRow> = devices
        .iter()
        .map(|device| DeviceRow {
            name: device.manifest_name(&node.name),
            pf: device.pf_name.clone(),
            resource: device.resource.clone(),
            vfs: allocatable_count(node, &device.resource)
                .map(|n| n.to_string())
                .unwrap_or_else(|_| "-".to_string()),
        })
        .collect();
    eprintln!();
    eprintln!("{}", Table::new(rows).with(Style::rounded()));
}

fn yes_no(value: bool) -> String {
    if value {
        "yes".green().to_string()
    } else {
        "no".yellow().to_string()
    }
}

/// Collapse consecutive CPU ids into ranges, e.g. `0-3,8,10-11`
pub fn format_cpu_list(ids: &[u32]) -> String {
    let mut parts = Vec::new();
    let mut iter = ids.iter().copied().peekable();

    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{}-{}", start, end));
        }
    }

    parts.join(",")
}
