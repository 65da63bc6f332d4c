use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use elasticsearch::params::Refresh;
use tracing_subscriber::EnvFilter;

use stop_ledger::config::{Cli, Command, StoreArgs};
use stop_ledger::data_store::{DataStore, Snapshot};
use stop_ledger::estimator::predict;
use stop_ledger::query_catalog::CatalogQuery;
use stop_ledger::report;
use stop_ledger::server;
use stop_ledger::stop_record::StopRecord;
use stop_ledger::submission::{PredictionSummary, StopSubmission};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Load {
            csv_file,
            throttle,
            batch_size,
        } => load_stop_log(&cli.store, &csv_file, throttle, batch_size).await,
        Command::Queries => {
            for query in CatalogQuery::ALL {
                println!("{:<22} {}", query.id(), query.title());
            }
            Ok(())
        }
        Command::Overview { records } => show_overview(cli.store.open()?, records).await,
        Command::Query { name } => run_query(cli.store.open()?, &name).await,
        Command::Predict(args) => predict_stop(cli.store.open()?, args.into()).await,
        Command::Serve { bind } => Ok(server::serve(cli.store.open()?, bind).await?),
    }
}

async fn show_overview(store: Arc<dyn DataStore>, records: bool) -> anyhow::Result<()> {
    let snapshot = Snapshot::take(store.as_ref()).await;
    print_notice(&snapshot);
    let dataset = &snapshot.dataset;
    if records {
        println!("{}", report::render_records(dataset));
    }
    println!("{}", report::render_metrics(&dataset.metrics()));
    println!("{}", report::render_chart(&dataset.violation_chart()));
    println!("{}", report::render_chart(&dataset.gender_chart()));
    println!("Stop Durations: {}", dataset.stop_durations().join(", "));
    Ok(())
}

async fn run_query(store: Arc<dyn DataStore>, name: &str) -> anyhow::Result<()> {
    let query = CatalogQuery::lookup(name)?;
    let snapshot = Snapshot::take(store.as_ref()).await;
    print_notice(&snapshot);
    let result = query.execute(&snapshot.dataset);
    print!("{}", report::render_query(query, &result));
    Ok(())
}

async fn predict_stop(store: Arc<dyn DataStore>, submission: StopSubmission) -> anyhow::Result<()> {
    let snapshot = Snapshot::take(store.as_ref()).await;
    print_notice(&snapshot);
    let candidate = submission.validate(&snapshot.dataset.stop_durations())?;
    let prediction = predict(&snapshot.dataset, &candidate);
    tracing::info!(matched = prediction.matched_records, "prediction ready");
    println!("{}", PredictionSummary::new(&submission, &prediction));
    Ok(())
}

fn print_notice(snapshot: &Snapshot) {
    if let Some(notice) = &snapshot.notice {
        eprintln!("warning: {notice}");
    }
}

async fn load_stop_log(
    store_args: &StoreArgs,
    csv_file: &Path,
    throttle: usize,
    batch_size: usize,
) -> anyhow::Result<()> {
    let start = Instant::now();
    let store = store_args.elastic_store()?;
    let log = StopRecord::load_csv(csv_file)
        .with_context(|| format!("failed to read {}", csv_file.display()))?;
    if log.skipped_rows > 0 {
        tracing::warn!(skipped = log.skipped_rows, "unreadable rows left out of the load");
    }
    tracing::info!(records = log.records.len(), index = store.index(), "loading stop log");

    let totals = store
        .bulk_loader()
        .with_batch_size(batch_size)
        .with_throttle(throttle)
        .with_refresh(Refresh::WaitFor)
        .load(&log.records)
        .await?;

    let duration = start.elapsed();
    println!("Total Records: {:?}", totals.num_total);
    println!("Total Created: {:?}", totals.num_created);
    println!("Total Failed: {:?}", totals.num_failed);
    println!("Duration: {duration:?}");
    let records_per_second = totals.num_total as f64 / duration.as_secs_f64().max(f64::EPSILON);
    println!("Records Per Second: {records_per_second:.0}");
    Ok(())
}
