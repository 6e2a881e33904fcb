//! Server health command

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, HealthStatus};
use crate::output::{color_status, format_timestamp, print_json, print_rows, OutputFormat};

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Last Check")]
    last_check: String,
}

/// Show server and component health
pub async fn health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let (_, result): (_, HealthStatus) = client.get_with_status("healthz").await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!("{} {}", "Server status:".bold(), color_status(&result.status));
            println!();

            let rows: Vec<ComponentRow> = result
                .components
                .iter()
                .map(|(name, component)| ComponentRow {
                    name: name.clone(),
                    status: color_status(&component.status),
                    message: component.message.clone().unwrap_or_default(),
                    last_check: format_timestamp(component.last_check_timestamp),
                })
                .collect();
            print_rows(rows);
        }
    }

    Ok(())
}
