//! Command-line driver for Bulk API 2.0 jobs.
//!
//! Reads the session from `SF_INSTANCE_URL`, `SF_ACCESS_TOKEN` and
//! optionally `SF_API_VERSION`.
//!
//! ```sh
//! bulkjobs load Account insert accounts.csv
//! bulkjobs load Account upsert accounts.csv --external-id External_Id__c
//! bulkjobs query --all "SELECT Id, Name FROM Account"
//! bulkjobs jobs query
//! ```
//!
//! Set `RUST_LOG=sf_bulkjobs=debug` to see every request and poll.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use sf_bulkjobs::{BulkApiClient, BulkOperation, JobKind, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};
use sf_bulkjobs_auth::SalesforceCredentials;

#[derive(Parser)]
#[command(name = "bulkjobs", version, about = "Run Salesforce Bulk API 2.0 jobs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Give up on a job that has not finished after this many seconds
    #[arg(long, global = true, env = "BULKJOBS_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Initial delay between status checks, in milliseconds
    #[arg(long, global = true, env = "BULKJOBS_POLL_INTERVAL_MS", default_value_t = DEFAULT_POLL_INTERVAL.as_millis() as u64)]
    poll_interval_ms: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a CSV file as an ingest job and report per-row results
    Load {
        /// Target object, e.g. Account
        object: String,

        /// insert, update, upsert, delete or hardDelete
        #[arg(value_parser = parse_ingest_operation)]
        operation: BulkOperation,

        /// CSV file with a header row of field names
        file: PathBuf,

        /// External id field, required for upsert
        #[arg(long)]
        external_id: Option<String>,
    },

    /// Run a SOQL query and print each row as a JSON line
    Query {
        /// SOQL text
        soql: String,

        /// Include deleted and archived records (queryAll)
        #[arg(long)]
        all: bool,
    },

    /// List the jobs visible to the session
    Jobs {
        #[arg(value_enum, default_value = "ingest")]
        kind: Kind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    Ingest,
    Query,
}

impl From<Kind> for JobKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Ingest => JobKind::Ingest,
            Kind::Query => JobKind::Query,
        }
    }
}

fn parse_ingest_operation(value: &str) -> Result<BulkOperation, String> {
    let operation: BulkOperation = value.parse().map_err(|e| format!("{e}"))?;
    if !operation.is_ingest() {
        return Err(format!("'{operation}' is a query operation; use the query command"));
    }
    Ok(operation)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let creds = SalesforceCredentials::from_env().unwrap_or_else(|e| fail(e));
    let client = BulkApiClient::from_credentials(&creds)
        .unwrap_or_else(|e| fail(e))
        .with_timeout(Duration::from_secs(cli.timeout_secs))
        .with_poll_interval(Duration::from_millis(cli.poll_interval_ms));

    let result = match cli.command {
        Commands::Load {
            object,
            operation,
            file,
            external_id,
        } => load(&client, &object, operation, &file, external_id.as_deref()).await,
        Commands::Query { soql, all } => query(&client, &soql, all).await,
        Commands::Jobs { kind } => jobs(&client, kind.into()).await,
    };

    if let Err(message) = result {
        fail(message);
    }
}

async fn load(
    client: &BulkApiClient,
    object: &str,
    operation: BulkOperation,
    file: &Path,
    external_id: Option<&str>,
) -> Result<(), String> {
    let payload = std::fs::read(file).map_err(|e| format!("cannot read {}: {e}", file.display()))?;

    let outcome = client
        .execute_ingest_with_results(object, operation, payload, external_id)
        .await
        .map_err(|e| e.to_string())?;

    let summary = &outcome.summary;
    println!(
        "job {} {}: {} processed, {} failed ({:.1}% success)",
        summary.job_id,
        summary.state,
        summary.records_processed,
        summary.records_failed,
        summary.success_rate() * 100.0
    );
    println!(
        "{} created, {} unprocessed",
        outcome.results.created_count(),
        outcome.results.unprocessed.len()
    );
    for error in outcome.results.errors() {
        println!("  failed: {error}");
    }
    Ok(())
}

async fn query(client: &BulkApiClient, soql: &str, include_deleted: bool) -> Result<(), String> {
    let rows = client
        .execute_query(soql, include_deleted)
        .await
        .map_err(|e| e.to_string())?;

    for row in &rows {
        println!("{}", serde_json::to_string(row).map_err(|e| e.to_string())?);
    }
    eprintln!("{} rows", rows.len());
    Ok(())
}

async fn jobs(client: &BulkApiClient, kind: JobKind) -> Result<(), String> {
    let jobs = client.jobs().list_jobs(kind).await.map_err(|e| e.to_string())?;
    for job in &jobs {
        let created = job
            .created_at()
            .map(|t| t.with_timezone(&chrono::Utc).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        println!(
            "{}  {:<14} {:<10} {:<20} {}",
            job.id,
            job.state,
            job.operation,
            job.object.as_deref().unwrap_or("-"),
            created
        );
    }
    Ok(())
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {message}");
    std::process::exit(1);
}
