//! Probe, recommendation and query commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, QueryAnswer, QueryRequest, Recommendation, RoundResult, ScoredOption};
use crate::output::{
    color_score, format_cost, format_latency, format_percent, format_timestamp, print_info,
    print_json, print_rows, print_success, print_warning, OutputFormat,
};

/// Row for probe results table
#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Latency")]
    latency: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Availability")]
    availability: String,
    #[tabled(rename = "Measured")]
    measured_at: String,
}

/// Row for ranked options table
#[derive(Tabled)]
struct OptionRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Latency")]
    latency: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Availability")]
    availability: String,
}

fn option_rows(options: &[ScoredOption]) -> Vec<OptionRow> {
    options
        .iter()
        .enumerate()
        .map(|(i, o)| OptionRow {
            rank: i + 1,
            provider: o.provider.to_uppercase(),
            region: o.region.clone(),
            score: color_score(o.efficiency_score),
            latency: format_latency(Some(o.response_time_ms)),
            cost: format_cost(o.cost_per_invocation),
            availability: format_percent(o.availability),
        })
        .collect()
}

/// Run one probe round on the server
pub async fn probe(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result: RoundResult = client.post("api/v1/rounds", &serde_json::json!({})).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            let rows: Vec<MetricRow> = result
                .metrics
                .iter()
                .map(|m| MetricRow {
                    provider: m.provider.to_uppercase(),
                    region: m.region.clone(),
                    status: match &m.failure {
                        None => "up".green().to_string(),
                        Some(failure) => failure.describe().red().to_string(),
                    },
                    latency: format_latency(m.response_time_ms),
                    cost: format_cost(m.cost_per_invocation),
                    availability: format_percent(m.availability),
                    measured_at: format_timestamp(m.measured_at),
                })
                .collect();
            print_rows(rows);

            let total = result.metrics.len();
            if result.available == total {
                print_success(&format!("All {} providers reachable", total));
            } else if result.available == 0 {
                print_warning("No providers reachable");
            } else {
                print_warning(&format!("{} of {} providers reachable", result.available, total));
            }
        }
    }

    Ok(())
}

/// Show the current recommendation
pub async fn recommend(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result: Recommendation = client.get("api/v1/recommendation").await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!("{}", "Recommendation".bold());
            println!("{}", "=".repeat(50));
            println!(
                "Provider:               {}",
                result.provider.to_uppercase().cyan().bold()
            );
            println!("Efficiency score:       {}", color_score(result.efficiency_score));
            println!();
            println!("{}", result.reasoning);
            println!();

            println!("{}", "All options".bold());
            print_rows(option_rows(&result.all_options));
        }
    }

    Ok(())
}

/// Ask the optimizer a natural-language question
pub async fn ask(client: &ApiClient, question: &str, format: OutputFormat) -> Result<()> {
    let request = QueryRequest {
        query: question.to_string(),
    };
    let result: QueryAnswer = client.post("api/v1/query", &request).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            print_info(&format!("Intent: {}", result.intent));
            println!();
            println!("{}", result.answer);

            if !result.options.is_empty() {
                println!();
                print_rows(option_rows(&result.options));
            }
        }
    }

    Ok(())
}
