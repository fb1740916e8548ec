//! Historical comparison commands

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, ComparisonPoint, HistogramBin, HourlyMean};
use crate::output::{format_kw, print_table, print_warning, OutputFormat};

#[derive(Tabled, serde::Serialize)]
struct ComparisonRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Actual (kW)")]
    actual: String,
    #[tabled(rename = "Predicted (kW)")]
    predicted: String,
    #[tabled(rename = "Error (kW)")]
    error: String,
}

#[derive(Tabled, serde::Serialize)]
struct HourlyRow {
    #[tabled(rename = "Hour")]
    hour: u32,
    #[tabled(rename = "Mean Actual (kW)")]
    actual: String,
    #[tabled(rename = "Mean Predicted (kW)")]
    predicted: String,
    #[tabled(rename = "Samples")]
    samples: usize,
}

#[derive(Tabled, serde::Serialize)]
struct HistogramRow {
    #[tabled(rename = "Range (kW)")]
    range: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "")]
    bar: String,
}

/// Fetch actual-vs-predicted pairs.
pub async fn comparison(
    client: &ApiClient,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let path = match limit {
        Some(limit) => format!("api/v1/history/comparison?limit={}", limit),
        None => "api/v1/history/comparison".to_string(),
    };
    let points: Vec<ComparisonPoint> = client.get(&path).await?;

    if points.is_empty() {
        print_warning("Historical sample is empty");
        return Ok(());
    }

    let rows: Vec<ComparisonRow> = points
        .iter()
        .map(|p| ComparisonRow {
            index: p.index,
            actual: format_kw(p.actual_kw),
            predicted: format_kw(p.predicted_kw),
            error: format_kw(p.predicted_kw - p.actual_kw),
        })
        .collect();

    print_table(&rows, format);
    Ok(())
}

/// Mean actual and predicted consumption by hour of day.
pub async fn hourly(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let hours: Vec<HourlyMean> = client.get("api/v1/history/hourly").await?;

    let rows: Vec<HourlyRow> = hours
        .iter()
        .map(|h| HourlyRow {
            hour: h.hour,
            actual: format_kw(h.mean_actual_kw),
            predicted: format_kw(h.mean_predicted_kw),
            samples: h.samples,
        })
        .collect();

    print_table(&rows, format);
    Ok(())
}

/// Histogram of recorded consumption values.
pub async fn histogram(client: &ApiClient, bins: usize, format: OutputFormat) -> Result<()> {
    let path = format!("api/v1/history/histogram?bins={}", bins);
    let histogram: Vec<HistogramBin> = client.get(&path).await?;

    let max_count = histogram.iter().map(|b| b.count).max().unwrap_or(0);
    let rows: Vec<HistogramRow> = histogram
        .iter()
        .map(|b| HistogramRow {
            range: format!("{} - {}", format_kw(b.lower_kw), format_kw(b.upper_kw)),
            count: b.count,
            bar: bar(b.count, max_count),
        })
        .collect();

    print_table(&rows, format);
    Ok(())
}

/// Scale a count to a fixed-width text bar.
fn bar(count: usize, max_count: usize) -> String {
    const WIDTH: usize = 40;
    if max_count == 0 {
        return String::new();
    }
    let filled = count * WIDTH / max_count;
    "█".repeat(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(0, 10), "");
        assert_eq!(bar(10, 10).chars().count(), 40);
        assert_eq!(bar(5, 10).chars().count(), 20);
        assert_eq!(bar(3, 0), "");
    }
}
