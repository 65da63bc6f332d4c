//! Command-line and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use elasticsearch::auth::Credentials;

use crate::csv_store::CsvStore;
use crate::data_store::DataStore;
use crate::elastic_store::{ElasticStore, DEFAULT_INDEX};
use crate::error::DashboardError;
use crate::stop_record::{parse_stop_time, Gender};
use crate::submission::StopSubmission;

/// Traffic-stop ledger: browse the police log, run canned queries and
/// estimate the outcome of a new stop.
#[derive(Parser, Debug)]
#[command(name = "stop-ledger")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Read the stop log from a CSV export
    #[arg(long, env = "STOP_LEDGER_CSV", global = true, conflicts_with = "elastic_url")]
    pub csv: Option<PathBuf>,

    /// Read the stop log from an Elasticsearch cluster
    #[arg(long, env = "STOP_LEDGER_ELASTIC_URL", global = true)]
    pub elastic_url: Option<String>,

    #[arg(long, env = "STOP_LEDGER_INDEX", global = true, default_value = DEFAULT_INDEX)]
    pub index: String,

    #[arg(long, env = "STOP_LEDGER_ELASTIC_USER", global = true)]
    pub elastic_user: Option<String>,

    #[arg(long, env = "STOP_LEDGER_ELASTIC_PASSWORD", global = true, hide_env_values = true)]
    pub elastic_password: Option<String>,

    /// Documents fetched per search request
    #[arg(long, global = true, default_value_t = 1_000)]
    pub page_size: usize,
}

impl StoreArgs {
    pub fn elastic_store(&self) -> Result<ElasticStore, DashboardError> {
        let url = self.elastic_url.clone().ok_or_else(|| {
            DashboardError::Config("--elastic-url (or STOP_LEDGER_ELASTIC_URL) is required".into())
        })?;
        let mut builder = ElasticStore::builder()
            .with_uri(url)
            .with_index(self.index.clone())
            .with_page_size(self.page_size);
        match (&self.elastic_user, &self.elastic_password) {
            (Some(user), Some(password)) => {
                let credentials = Credentials::Basic(user.clone(), password.clone());
                builder = builder.with_credentials(credentials);
            }
            (None, None) => {}
            _ => {
                return Err(DashboardError::Config(
                    "--elastic-user and --elastic-password must be given together".into(),
                ))
            }
        }
        builder.build()
    }

    /// Opens whichever store was configured.
    pub fn open(&self) -> Result<Arc<dyn DataStore>, DashboardError> {
        if let Some(path) = &self.csv {
            return Ok(Arc::new(CsvStore::new(path.clone())));
        }
        if self.elastic_url.is_some() {
            return Ok(Arc::new(self.elastic_store()?));
        }
        Err(DashboardError::Config(
            "no stop log configured: pass --csv <PATH> or --elastic-url <URL>".into(),
        ))
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show key metrics, charts and the stop duration choices
    Overview {
        /// Also print every record
        #[arg(long)]
        records: bool,
    },

    /// List the available canned queries
    Queries,

    /// Run one canned query by title or id
    Query {
        name: String,
    },

    /// Estimate violation and outcome for a new stop
    Predict(PredictArgs),

    /// Serve the dashboard as a JSON API
    Serve {
        #[arg(long, env = "STOP_LEDGER_BIND", default_value = "0.0.0.0:8080")]
        bind: SocketAddr,
    },

    /// Bulk-load a stop log CSV into the Elasticsearch index
    Load {
        #[arg(long)]
        csv_file: PathBuf,

        /// Bulk requests in flight at once
        #[arg(long, default_value_t = 1)]
        throttle: usize,

        #[arg(long, default_value_t = 10_000)]
        batch_size: usize,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    #[arg(long)]
    pub stop_date: NaiveDate,
    #[arg(long, value_parser = parse_stop_time)]
    pub stop_time: chrono::NaiveTime,
    #[arg(long)]
    pub county_name: String,
    #[arg(long)]
    pub driver_gender: Gender,
    #[arg(long)]
    pub driver_age: u32,
    #[arg(long)]
    pub driver_race: String,
    #[arg(long, action = ArgAction::Set, value_parser = parse_flag)]
    pub search_conducted: bool,
    #[arg(long)]
    pub search_type: String,
    #[arg(long, action = ArgAction::Set, value_parser = parse_flag)]
    pub drugs_related_stop: bool,
    #[arg(long)]
    pub stop_duration: String,
    #[arg(long)]
    pub vehicle_number: String,
}

impl From<PredictArgs> for StopSubmission {
    fn from(args: PredictArgs) -> Self {
        StopSubmission {
            stop_date: args.stop_date,
            stop_time: args.stop_time,
            county_name: args.county_name,
            driver_gender: args.driver_gender,
            driver_age: args.driver_age,
            driver_race: args.driver_race,
            search_conducted: args.search_conducted,
            search_type: args.search_type,
            drugs_related_stop: args.drugs_related_stop,
            stop_duration: args.stop_duration,
            vehicle_number: args.vehicle_number,
        }
    }
}

fn parse_flag(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(format!("expected 0/1 or true/false, got '{other}'")),
    }
}
