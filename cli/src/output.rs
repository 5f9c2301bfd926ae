//! Output formatting utilities

use anyhow::Result;
use serde_json::json;
use tablediff_core::{Config, DiffRecord, DiffSummary, Row, Schema, Side};

/// Pretty printer for tablediff output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Print a single diff record
    pub fn print_record(record: &DiffRecord, schema: &Schema) {
        match record {
            DiffRecord::Identical { left, .. } => {
                println!("= {}", left.key);
            }
            DiffRecord::Different {
                left,
                right,
                columns,
            } => {
                println!("~ {} ({} columns changed)", left.key, columns.len());
                for (i, &column) in columns.iter().enumerate() {
                    let marker = if i == columns.len() - 1 { "└─" } else { "├─" };
                    println!(
                        "  {} {}: {} → {}",
                        marker,
                        schema.column_name(column),
                        left.columns[column],
                        right.columns[column]
                    );
                }
            }
            DiffRecord::Unmatched { row, side } => {
                let marker = match side {
                    Side::Left => "-",
                    Side::Right => "+",
                };
                println!("{marker} {} [{}]", row.key, format_columns(row, schema));
            }
        }
    }

    /// Print record counts
    pub fn print_summary(summary: &DiffSummary) {
        println!();
        if summary.has_differences() {
            println!("🔍 Diff Results: {} differences", summary.total() - summary.identical);
        } else {
            println!("✅ Tables are identical");
        }
        println!("├─ Identical: {}", summary.identical);
        println!("├─ Different: {}", summary.different);
        println!("├─ Left only: {}", summary.left_only);
        println!("└─ Right only: {}", summary.right_only);
    }

    pub fn print_config(config: &Config) -> Result<()> {
        println!("⚙️  Effective configuration");
        print!("{}", toml::to_string_pretty(config)?);
        Ok(())
    }
}

/// JSON lines formatter
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn print_record(record: &DiffRecord) -> Result<()> {
        println!("{}", serde_json::to_string(record)?);
        Ok(())
    }

    pub fn print_summary(summary: &DiffSummary) -> Result<()> {
        println!("{}", json!({ "kind": "summary", "summary": summary }));
        Ok(())
    }

    pub fn print_config(config: &Config) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(config)?);
        Ok(())
    }
}

fn format_columns(row: &Row, schema: &Schema) -> String {
    row.columns
        .iter()
        .enumerate()
        .map(|(i, value)| format!("{}={}", schema.column_name(i), value))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablediff_core::{Key, Value};

    #[test]
    fn test_format_columns_uses_schema_names() {
        let schema = Schema::new(vec!["id".to_string()], vec!["name".to_string()]);
        let row = Row::new(
            Key::scalar(1),
            vec![Value::Text("Alice".to_string()), Value::Int(30)],
        );
        assert_eq!(format_columns(&row, &schema), "name='Alice', #1=30");
    }
}
