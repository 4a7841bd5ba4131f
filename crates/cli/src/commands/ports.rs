//! `ports` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::PortsArgs;

/// Execute the `ports` command
pub fn run_ports(args: &PortsArgs) -> Result<()> {
    let ports = ingestion::available_ports().context("Failed to list serial ports")?;
    info!(count = ports.len(), "Serial ports enumerated");

    if args.json {
        let json =
            serde_json::to_string_pretty(&ports).context("Failed to serialize port list")?;
        println!("{}", json);
        return Ok(());
    }

    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }

    println!("\n=== Serial Ports ({}) ===\n", ports.len());
    for port in &ports {
        print!("  {} [{}]", port.port_name, port.port_type);
        if let (Some(vid), Some(pid)) = (port.vid, port.pid) {
            print!(" {:04x}:{:04x}", vid, pid);
        }
        if let Some(ref product) = port.product {
            print!(" {}", product);
        }
        if let Some(ref manufacturer) = port.manufacturer {
            print!(" ({})", manufacturer);
        }
        println!();
    }
    println!();

    Ok(())
}
