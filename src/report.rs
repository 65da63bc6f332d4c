//! Plain-text rendering of dashboard sections for the terminal.

use std::fmt::Write;

use serde_json::Value;

use crate::dataset::{Chart, Dataset, KeyMetrics};
use crate::query_catalog::{CatalogQuery, QueryResult};

pub const NO_RESULTS: &str = "No results found for the selected query.";

pub fn render_metrics(metrics: &KeyMetrics) -> String {
    let mut out = String::from("Key Metrics\n");
    let _ = writeln!(out, "  Total Police Stops   {}", metrics.total_stops);
    let _ = writeln!(out, "  Total Arrests        {}", metrics.arrests);
    let _ = writeln!(out, "  Total Warnings       {}", metrics.warnings);
    let _ = writeln!(out, "  Drug Related Stops   {}", metrics.drug_related_stops);
    out
}

pub fn render_chart(chart: &Chart) -> String {
    let mut out = format!("{}\n", chart.title);
    if chart.is_empty() {
        let _ = writeln!(out, "  No data available for {} chart.", chart.title);
        return out;
    }
    let width = chart.slices.iter().map(|s| s.label.chars().count()).max().unwrap_or(0);
    for slice in &chart.slices {
        let bar = "#".repeat(((slice.share * 40.0).round() as usize).max(1));
        let _ = writeln!(
            out,
            "  {:<width$}  {:>6}  {:>5.1}%  {}",
            slice.label,
            slice.count,
            slice.share * 100.0,
            bar,
        );
    }
    out
}

pub fn render_query(query: CatalogQuery, result: &QueryResult) -> String {
    let mut out = format!("{}\n", query.title());
    if result.is_empty() {
        let _ = writeln!(out, "  {NO_RESULTS}");
        return out;
    }
    let rows: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    out.push_str(&render_table(&result.columns, &rows));
    out
}

pub fn render_records(dataset: &Dataset) -> String {
    let columns = [
        "stop_date",
        "stop_time",
        "county_name",
        "driver_gender",
        "driver_age",
        "driver_race",
        "search_conducted",
        "search_type",
        "drugs_related_stop",
        "stop_duration",
        "violation",
        "stop_outcome",
        "vehicle_number",
    ]
    .map(String::from);
    let rows: Vec<Vec<String>> = dataset
        .iter()
        .map(|r| {
            vec![
                r.stop_date.to_string(),
                r.stop_time.format("%H:%M").to_string(),
                r.county_name.clone(),
                r.driver_gender.to_string(),
                r.driver_age.to_string(),
                r.driver_race.clone(),
                u8::from(r.search_conducted).to_string(),
                r.search_type.clone(),
                u8::from(r.drugs_related_stop).to_string(),
                r.stop_duration.clone(),
                r.violation.clone(),
                r.stop_outcome.clone(),
                r.vehicle_number.clone().unwrap_or_default(),
            ]
        })
        .collect();
    let mut out = String::from("Police Logs Overview\n");
    out.push_str(&render_table(&columns, &rows));
    out
}

fn render_table(columns: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, columns, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);
    for row in rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(out, "  {}", line.trim_end());
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() => format!("{f:.4}"),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
