use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use wtgahrs_frame::Records;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct RecordsOutput<'a> {
    source: &'a str,
    timestamp: String,
    records: &'a Records,
}

/// Print one decode pass's records. Empty record sets print nothing.
pub fn print_records(records: &Records, source: &str, format: OutputFormat) {
    if records.is_empty() {
        return;
    }

    match format {
        OutputFormat::Json => {
            let out = RecordsOutput {
                source,
                timestamp: now_unix_seconds(),
                records,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            println!("{}", records_table(records));
        }
        OutputFormat::Pretty => {
            for (channel, value) in records.iter() {
                println!("{channel}: {value}");
            }
        }
    }
}

fn records_table(records: &Records) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["CHANNEL", "VALUES"]);
    for (channel, value) in records.iter() {
        table.add_row(vec![channel.to_string(), value.to_string()]);
    }
    table
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use wtgahrs_frame::DecodedValue;

    use super::*;

    #[test]
    fn table_has_row_per_channel() {
        let mut records = Records::new();
        records.insert("angles", DecodedValue::Scaled(vec![1.5, 0.0, -2.5]));
        records.insert("lon_lat", DecodedValue::Scaled(vec![116.25, 39.5]));

        let rendered = records_table(&records).to_string();
        assert!(rendered.contains("angles"));
        assert!(rendered.contains("[116.25, 39.5]"));
    }

    #[test]
    fn json_nests_records() {
        let mut records = Records::new();
        records.insert("magnetic_field", DecodedValue::Scaled(vec![0.5, 0.25, -1.0]));
        let out = RecordsOutput {
            source: "capture.bin",
            timestamp: "0".to_string(),
            records: &records,
        };

        let json: serde_json::Value = serde_json::to_value(&out).unwrap();
        assert_eq!(json["source"], "capture.bin");
        assert_eq!(json["records"]["magnetic_field"][1], 0.25);
    }
}
