use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use wtgahrs_transport::available_ports;

use crate::cmd::PortsArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct PortOutput {
    name: String,
    kind: String,
}

pub fn run(_args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let ports: Vec<PortOutput> = available_ports()
        .map_err(|err| transport_error("port enumeration failed", err))?
        .into_iter()
        .map(|p| PortOutput {
            name: p.name,
            kind: p.kind,
        })
        .collect();

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&ports).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "TYPE"]);
            for port in &ports {
                table.add_row(vec![port.name.as_str(), port.kind.as_str()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if ports.is_empty() {
                println!("no serial ports found");
            }
            for port in &ports {
                println!("{}  {}", port.name, port.kind);
            }
        }
    }

    Ok(SUCCESS)
}
