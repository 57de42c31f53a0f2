//! Output formatting for CLI responses

use std::collections::BTreeMap;
use std::path::Path;

use colored::Colorize;
use fgfs_generic::{FieldConversion, FieldMap, StatusSnapshot};
use fgfs_registry::Value;
use serde::Serialize;
use serde_json::json;

use crate::error::CliError;

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format output as JSON: {e}"),
    }
}

/// Print error in JSON format
pub fn print_error_json(error: &CliError) {
    print_json(&json!({
        "success": false,
        "error": {
            "message": error.to_string(),
        }
    }));
}

/// Print error in human-readable format
pub fn print_error_human(error: &CliError) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = std::error::Error::source(error);
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

fn conversion_label(conversion: &FieldConversion) -> String {
    match conversion {
        FieldConversion::None => "-".to_string(),
        FieldConversion::Apply(conversion) => conversion.to_string(),
        FieldConversion::Defective(err) => format!("defective ({err})"),
    }
}

/// Print a loaded descriptor
pub fn print_field_map(path: &Path, fields: &FieldMap, separator: char, json: bool) {
    if json {
        print_json(&json!({
            "success": true,
            "descriptor": path.display().to_string(),
            "separator": separator.to_string(),
            "properties": fields.len(),
            "defective": fields.defective_count(),
            "fields": fields.fields(),
        }));
        return;
    }

    println!("{} {}", "Descriptor:".bold(), path.display());
    println!("  Separator: {separator:?}");
    println!("  Properties: {}", fields.len());
    for field in fields {
        let key = field.key.as_deref().unwrap_or("<unnamed>");
        let line = format!(
            "  [{:>3}] {:<12} {}",
            field.position,
            key,
            conversion_label(&field.conversion)
        );
        if field.conversion.is_defective() {
            println!("{}", line.red());
        } else if field.key.is_none() {
            println!("{}", line.dimmed());
        } else {
            println!("{line}");
        }
    }
}

/// Print a periodic status line
pub fn print_status(status: &StatusSnapshot, json: bool) {
    if json {
        match serde_json::to_string(status) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("Failed to format status as JSON: {e}"),
        }
        return;
    }

    println!(
        "{} {} frames={} written={} conversion_errors={} write_errors={} receive_errors={}",
        "status".cyan(),
        status.state,
        status.messages.received,
        status.counters.fields_written,
        status.counters.conversion_errors,
        status.counters.write_errors,
        status.counters.receive_errors,
    );
}

/// Print the final status and every registry value
pub fn print_final(status: &StatusSnapshot, values: &BTreeMap<String, Value>, json: bool) {
    if json {
        print_json(&json!({
            "success": true,
            "status": status,
            "values": values,
        }));
        return;
    }

    println!("{}", "Final status:".bold());
    println!("  State: {}", status.state);
    println!(
        "  Properties: {} (bound {}, unbound {}, defective {})",
        status.properties, status.bound, status.unbound, status.defective
    );
    println!(
        "  Messages: received {}, sent {}",
        status.messages.received, status.messages.sent
    );
    println!(
        "  Frames: malformed {}, oversized {}",
        status.counters.malformed_frames, status.counters.oversized_frames
    );
    println!("{}", "Values:".bold());
    for (key, value) in values {
        println!("  {key:<12} {value}");
    }
}
