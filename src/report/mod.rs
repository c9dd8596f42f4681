//!
//! Report generation: fetch, flatten, write.
//!
//! A run fails when the cluster identity or the entity listing can't be fetched. Nothing is
//! written in that case. Failing volume metrics calls only degrade the affected rows, their
//! statistics columns are reported as not available.
use crate::extract::{Lookup, NOT_AVAILABLE};
use crate::schema::Entity;
use crate::{api, Client, Config, Result};
use futures_util::stream::{self, StreamExt};
use serde_json::{Map, Value};
use std::path::PathBuf;

pub mod csv_writer;

pub use crate::schema::ReportKind;

/// Where and how a report is produced
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Directory for the default file names
    pub output_dir: PathBuf,
    /// Explicit output file, overrides `output_dir`
    pub output_path: Option<PathBuf>,
    /// Concurrent volume metrics requests, 1 fetches them one at a time
    pub metrics_concurrency: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            output_path: None,
            metrics_concurrency: 1,
        }
    }
}

impl ReportOptions {
    /// Options from the run configuration
    #[must_use]
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            output_dir: cfg.output_dir.clone(),
            output_path: None,
            metrics_concurrency: cfg.metrics_concurrency,
        }
    }

    /// Output file for `kind`
    #[must_use]
    pub fn path(&self, kind: ReportKind) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| self.output_dir.join(kind.file_name()))
    }
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    /// Report type
    pub kind: ReportKind,
    /// File written
    pub path: PathBuf,
    /// Number of data rows
    pub rows: usize,
    /// Entities whose metrics could not be fetched
    pub degraded: Vec<String>,
    /// When the data was fetched
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

impl ReportOutcome {
    /// Completed, but some rows lack their metrics
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Fetch everything for `kind` and write the report
#[tracing::instrument(skip(client, options), fields(path = %options.path(kind).display()))]
pub async fn generate(
    client: &Client,
    kind: ReportKind,
    options: &ReportOptions,
) -> Result<ReportOutcome> {
    let generated_at = chrono::Utc::now();
    let cluster = api::cluster(client).await?;
    let cluster_name = cluster.name();
    tracing::info!("Cluster: {}", cluster_name);

    let fields = kind.api_fields();
    tracing::info!("Fetching {} with fields: {}", kind, fields.join(","));
    let records = match kind {
        ReportKind::Aggregates => api::aggregates(client, fields).await?,
        ReportKind::Volumes => api::volumes(client, fields).await?,
    }
    .records;

    if records.is_empty() {
        tracing::warn!("No {} found, writing an empty report", kind);
    }

    let (statistics, degraded) = if kind.fetches_metrics() {
        fetch_statistics(client, &records, options.metrics_concurrency).await
    } else {
        (vec![Map::new(); records.len()], Vec::new())
    };

    let rows: Vec<Vec<String>> = records
        .iter()
        .zip(&statistics)
        .map(|(record, statistics)| {
            kind.row(&Entity {
                cluster: cluster_name,
                record,
                statistics,
            })
        })
        .collect();

    let path = options.path(kind);
    csv_writer::write(&path, &kind.headers(), &rows)?;
    tracing::info!("Report generated: {}", path.display());

    Ok(ReportOutcome {
        kind,
        path,
        rows: rows.len(),
        degraded,
        generated_at,
    })
}

/// Metrics statistics per record, in record order, plus the names of the records
/// that got an empty object because their lookup failed.
async fn fetch_statistics(
    client: &Client,
    records: &[Value],
    concurrency: usize,
) -> (Vec<Map<String, Value>>, Vec<String>) {
    let results: Vec<std::result::Result<Map<String, Value>, String>> = stream::iter(records)
        .map(|record| entity_statistics(client, record))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut degraded = Vec::new();
    let statistics = results
        .into_iter()
        .map(|r| {
            r.unwrap_or_else(|name| {
                degraded.push(name);
                Map::new()
            })
        })
        .collect();
    (statistics, degraded)
}

async fn entity_statistics(
    client: &Client,
    record: &Value,
) -> std::result::Result<Map<String, Value>, String> {
    let name = record.text_or("name", NOT_AVAILABLE);
    let Some(uuid) = record.get("uuid").and_then(Value::as_str) else {
        tracing::warn!("Volume {} has no uuid, metrics not available", name);
        return Err(name);
    };

    match api::volume_metrics(client, uuid).await {
        Ok(metrics) => Ok(metrics.statistics),
        Err(e) => {
            tracing::warn!("Failed to get metrics for volume {} ({}): {}", name, uuid, e);
            Err(name)
        }
    }
}
