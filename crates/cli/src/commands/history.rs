//! Trend and history commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, HistoryResult, TrendAnalysis};
use crate::output::{
    format_cost, format_latency, format_percent, format_timestamp, print_json, print_rows,
    OutputFormat,
};

/// Row for trends table
#[derive(Tabled)]
struct TrendRow {
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Samples")]
    samples: usize,
    #[tabled(rename = "Mean Latency")]
    mean_latency: String,
    #[tabled(rename = "Latency σ")]
    latency_std_dev: String,
    #[tabled(rename = "Mean Cost")]
    mean_cost: String,
    #[tabled(rename = "Success")]
    success_rate: String,
    #[tabled(rename = "Savings vs Cheapest")]
    savings: String,
}

/// Row for history table
#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Measured")]
    measured_at: String,
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Latency")]
    latency: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Success")]
    success_rate: String,
}

/// Show cost trends over the retained history
pub async fn trends(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result: TrendAnalysis = client.get("api/v1/trends").await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!("{}", "Cost Trends".bold());
            println!("{}", "=".repeat(50));
            println!("Samples:                {}", result.total_samples);
            println!(
                "Cheapest provider:      {}",
                result.cheapest_provider.to_uppercase().green().bold()
            );
            println!();

            let rows: Vec<TrendRow> = result
                .providers
                .iter()
                .map(|(provider, trend)| TrendRow {
                    provider: provider.to_uppercase(),
                    samples: trend.samples,
                    mean_latency: format_latency(trend.response_time_ms.as_ref().map(|s| s.mean)),
                    latency_std_dev: format_latency(
                        trend.response_time_ms.as_ref().map(|s| s.std_dev),
                    ),
                    mean_cost: format_cost(trend.cost_per_invocation.mean),
                    success_rate: format_percent(trend.mean_success_rate),
                    savings: format!("{:.1}%", trend.savings_vs_cheapest_percent),
                })
                .collect();
            print_rows(rows);
        }
    }

    Ok(())
}

/// Show retained measurements, newest last
pub async fn history(
    client: &ApiClient,
    provider: Option<String>,
    limit: usize,
    format: OutputFormat,
) -> Result<()> {
    let mut query = vec![("limit", limit.to_string())];
    if let Some(p) = provider {
        query.push(("provider", p));
    }

    let result: HistoryResult = client.get_query("api/v1/history", &query).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            let rows: Vec<HistoryRow> = result
                .metrics
                .iter()
                .map(|m| HistoryRow {
                    measured_at: format_timestamp(m.measured_at),
                    provider: m.provider.to_uppercase(),
                    region: m.region.clone(),
                    latency: format_latency(m.response_time_ms),
                    cost: format_cost(m.cost_per_invocation),
                    success_rate: format_percent(m.success_rate),
                })
                .collect();
            print_rows(rows);

            println!(
                "{}",
                format!(
                    "{} of {} entries retained",
                    result.stats.entries, result.stats.capacity
                )
                .dimmed()
            );
        }
    }

    Ok(())
}
