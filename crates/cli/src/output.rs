use crate::error::CliError;
use engine_config::settings::{StateBackend, ValidatedConfig, validated::redact_url};
use engine_core::metrics::MetricsSnapshot;
use model::transfer::{request::WriteMode, summary::TransferSummary, watermark::WatermarkRecord};
use serde::Serialize;
use std::fmt::Write;

#[derive(Serialize)]
struct RunReport<'a> {
    tables: &'a [TransferSummary],
    metrics: &'a MetricsSnapshot,
}

pub fn print_summaries(
    summaries: &[TransferSummary],
    metrics: &MetricsSnapshot,
    as_json: bool,
) -> Result<(), CliError> {
    if as_json {
        let report = RunReport {
            tables: summaries,
            metrics,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_summaries(summaries, metrics));
    }
    Ok(())
}

fn render_summaries(summaries: &[TransferSummary], metrics: &MetricsSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<32} {:<7} {:>10} {:>10} {:>8} {:>10} {:>12}",
        "Table", "Status", "Rows", "Pending", "Batches", "Rows/s", "Elapsed ms"
    );
    let _ = writeln!(out, "{}", "-".repeat(95));

    for s in summaries {
        let status = match (s.success, s.test_mode) {
            (true, true) => "TEST",
            (true, false) => "OK",
            (false, _) => "FAILED",
        };
        let _ = writeln!(
            out,
            "{:<32} {:<7} {:>10} {:>10} {:>8} {:>10.0} {:>12}",
            s.qualified_table(),
            status,
            s.rows_processed,
            s.total_rows_to_process,
            s.batches_processed,
            s.rows_per_second,
            s.elapsed_ms
        );
        if let Some(wm) = s.committed_watermark {
            let _ = writeln!(out, "    watermark -> {wm}");
        }
        if let Some(err) = &s.error_message {
            let _ = writeln!(out, "    error: {err}");
        }
    }

    let _ = writeln!(
        out,
        "\n{} rows in {} batches | {} tables ok, {} failed",
        metrics.rows_copied,
        metrics.batches_processed,
        metrics.tables_succeeded,
        metrics.tables_failed
    );
    out
}

pub fn print_watermarks(records: &[WatermarkRecord], as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No watermarks stored.");
        return Ok(());
    }

    println!(
        "{:<48} {:<32} {}",
        "Stream", "Last value", "Last updated"
    );
    println!("{}", "-".repeat(110));
    for record in records {
        println!(
            "{:<48} {:<32} {}",
            record.key.to_string(),
            record.last_value.to_string(),
            record.last_updated.to_rfc3339()
        );
    }
    Ok(())
}

pub fn print_validated(config: &ValidatedConfig) {
    print!("{}", render_validated(config));
}

fn render_validated(config: &ValidatedConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<16} {}", "Source", redact_url(&config.source.url));
    let _ = writeln!(out, "{:<16} {}", "Destination", redact_url(&config.destination.url));
    let state = match &config.state {
        StateBackend::Destination { schema, table } => format!("destination {schema}.{table}"),
        StateBackend::Sled { path } => format!("sled {}", path.display()),
    };
    let _ = writeln!(out, "{:<16} {}", "Watermarks", state);
    let _ = writeln!(out, "{:<16} {}", "Parallelism", config.parallelism);

    for req in &config.requests {
        let mode = match &req.write_mode {
            WriteMode::Append => "append".to_string(),
            WriteMode::Upsert { keys } => format!("upsert ({})", keys.join(", ")),
        };
        let _ = writeln!(out, "\n{}", req.key());
        let _ = writeln!(
            out,
            "  target       {}.{}",
            req.target_schema(),
            req.target_table()
        );
        let _ = writeln!(out, "  order by     {}", req.order_by_column());
        let _ = writeln!(out, "  filter       {}", req.filter.as_deref().unwrap_or("-"));
        let _ = writeln!(
            out,
            "  batch        {} (report every {})",
            req.batch_size, req.reporting_frequency
        );
        let _ = writeln!(out, "  mode         {mode}");
        if req.test_mode {
            let _ = writeln!(out, "  test mode");
        }
    }
    out
}
