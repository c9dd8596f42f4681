//!
//! Column tables for the reports. Header and data rows are both produced from these tables.
//!
use crate::extract::{self, Lookup, NOT_AVAILABLE};
use serde_json::{Map, Value};

/// Where a column gets its value from
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Source {
    /// The cluster name
    Cluster,
    /// Record value rendered as text
    Text {
        /// Dotted path in the record
        path: &'static str,
        /// Used when the record lacks the value
        default: &'static str,
    },
    /// Record byte count as GB
    Gb(&'static str),
    /// `part` as a percentage of `total`
    Percent {
        /// Dotted path of the part
        part: &'static str,
        /// Dotted path of the total
        total: &'static str,
    },
    /// `total - used`, both converted to GB first
    GbRemaining {
        /// Dotted path of the total
        total: &'static str,
        /// Dotted path of the used amount
        used: &'static str,
    },
    /// `100 - used %`
    PercentRemaining {
        /// Dotted path of the used amount
        used: &'static str,
        /// Dotted path of the total
        total: &'static str,
    },
    /// Key in the volume metrics statistics
    Statistic(&'static str),
    /// Not exposed by the API
    Unavailable,
}

/// One report column
#[derive(Clone, Copy, Debug)]
pub struct Column {
    /// Header text
    pub header: &'static str,
    /// Value source
    pub source: Source,
}

const fn col(header: &'static str, source: Source) -> Column {
    Column { header, source }
}

const fn text(path: &'static str) -> Source {
    Source::Text {
        path,
        default: NOT_AVAILABLE,
    }
}

/// Everything one row is extracted from
#[derive(Clone, Copy, Debug)]
pub struct Entity<'a> {
    /// Cluster name
    pub cluster: &'a str,
    /// Raw API record
    pub record: &'a Value,
    /// Supplemental statistics, empty for aggregates or when the metrics call failed
    pub statistics: &'a Map<String, Value>,
}

impl Column {
    /// Render this column for `entity`
    #[must_use]
    pub fn cell(&self, entity: &Entity<'_>) -> String {
        let record = entity.record;
        match self.source {
            Source::Cluster => entity.cluster.to_string(),
            Source::Text { path, default } => record.text_or(path, default),
            Source::Gb(path) => extract::format_number(extract::bytes_to_gb(record.number(path))),
            Source::Percent { part, total } => extract::format_number(extract::percentage(
                record.number(part),
                record.number(total),
            )),
            Source::GbRemaining { total, used } => {
                let total = extract::bytes_to_gb(record.number(total));
                let used = extract::bytes_to_gb(record.number(used));
                extract::format_number(extract::round2(total - used))
            }
            Source::PercentRemaining { used, total } => {
                let used = extract::percentage(record.number(used), record.number(total));
                extract::format_number(extract::round2(100.0 - used))
            }
            Source::Statistic(key) => entity.statistics.text_or(key, NOT_AVAILABLE),
            Source::Unavailable => NOT_AVAILABLE.to_string(),
        }
    }
}

/// Report types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// Aggregate capacity
    Aggregates,
    /// Volume capacity, including per volume metrics
    Volumes,
}

impl ReportKind {
    /// Column table
    #[must_use]
    pub const fn columns(self) -> &'static [Column] {
        match self {
            Self::Aggregates => AGGREGATE_COLUMNS,
            Self::Volumes => VOLUME_COLUMNS,
        }
    }

    /// Header row
    #[must_use]
    pub fn headers(self) -> Vec<&'static str> {
        self.columns().iter().map(|c| c.header).collect()
    }

    /// Fields requested from the listing endpoint
    #[must_use]
    pub const fn api_fields(self) -> &'static [&'static str] {
        match self {
            Self::Aggregates => AGGREGATE_FIELDS,
            Self::Volumes => VOLUME_FIELDS,
        }
    }

    /// Default output file name
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Aggregates => "netapp_aggregates_report.csv",
            Self::Volumes => "netapp_volume_capacity_report.csv",
        }
    }

    /// Whether each entity needs a metrics lookup
    #[must_use]
    pub const fn fetches_metrics(self) -> bool {
        matches!(self, Self::Volumes)
    }

    /// Flatten one entity into a row
    #[must_use]
    pub fn row(self, entity: &Entity<'_>) -> Vec<String> {
        self.columns().iter().map(|c| c.cell(entity)).collect()
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aggregates => f.write_str("aggregates"),
            Self::Volumes => f.write_str("volumes"),
        }
    }
}

const AGGREGATE_FIELDS: &[&str] = &[
    "name",
    "node.name",
    "state",
    "raid_type",
    "snaplock_type",
    "block_storage.primary.size",
    "block_storage.primary.used",
    "block_storage.primary.available",
    "block_storage.cloud_storage.used",
    "block_storage.cloud_storage.name",
    "block_storage.snapshots.size",
    "block_storage.snapshots.used",
];

const PRIMARY_SIZE: &str = "block_storage.primary.size";
const PRIMARY_USED: &str = "block_storage.primary.used";
const PRIMARY_AVAILABLE: &str = "block_storage.primary.available";
const SNAPSHOT_SIZE: &str = "block_storage.snapshots.size";
const SNAPSHOT_USED: &str = "block_storage.snapshots.used";

const AGGREGATE_COLUMNS: &[Column] = &[
    col("Cluster", Source::Cluster),
    // ONTAP has no HA pair on the aggregate, the owning node stands in
    col("HA Pair", text("node.name")),
    col("Aggregate", text("name")),
    col("Total Data Capacity (GB)", Source::Gb(PRIMARY_SIZE)),
    col("Used Data Capacity (GB)", Source::Gb(PRIMARY_USED)),
    col(
        "Used Data %",
        Source::Percent {
            part: PRIMARY_USED,
            total: PRIMARY_SIZE,
        },
    ),
    col("Available Data Capacity (GB)", Source::Gb(PRIMARY_AVAILABLE)),
    col(
        "Available Data %",
        Source::Percent {
            part: PRIMARY_AVAILABLE,
            total: PRIMARY_SIZE,
        },
    ),
    col("Daily Growth Rate %", Source::Unavailable),
    col("Days To Full", Source::Unavailable),
    col("Space Full Threshold (%)", Source::Unavailable),
    col("Space Nearly Full Threshold (%)", Source::Unavailable),
    col("Growth Rate Threshold (%)", Source::Unavailable),
    col("Growth Rate Sensitivity Threshold", Source::Unavailable),
    col("Days Until Full Threshold", Source::Unavailable),
    col("Snapshot Reserve Total Capacity (GB)", Source::Gb(SNAPSHOT_SIZE)),
    col("Snapshot Reserve Used Capacity (GB)", Source::Gb(SNAPSHOT_USED)),
    col(
        "Snapshot Reserve Used %",
        Source::Percent {
            part: SNAPSHOT_USED,
            total: SNAPSHOT_SIZE,
        },
    ),
    col(
        "Snapshot Reserve Available Capacity (GB)",
        Source::GbRemaining {
            total: SNAPSHOT_SIZE,
            used: SNAPSHOT_USED,
        },
    ),
    col(
        "Snapshot Reserve Available %",
        Source::PercentRemaining {
            used: SNAPSHOT_USED,
            total: SNAPSHOT_SIZE,
        },
    ),
    col("Snapshot Copies Reserve Full Threshold (%)", Source::Unavailable),
    col("Overcommitted Capacity %", Source::Unavailable),
    col("Overcommitted Threshold (%)", Source::Unavailable),
    col("Nearly Overcommitted Threshold (%)", Source::Unavailable),
    col("Type", text("type")),
    col("RAID Type", text("raid_type")),
    col("Aggregate State", text("state")),
    col(
        "SnapLock Type",
        Source::Text {
            path: "snaplock_type",
            default: "none",
        },
    ),
    col(
        "Cloud Tier Space Used (GB)",
        Source::Gb("block_storage.cloud_storage.used"),
    ),
    col("Cloud Tier", text("block_storage.cloud_storage.name")),
];

const VOLUME_FIELDS: &[&str] = &["uuid", "name", "svm.name", "state", "space", "configuration"];

const VOLUME_COLUMNS: &[Column] = &[
    col("Cluster", Source::Cluster),
    col("Storage Virtual Machine", text("svm.name")),
    col("Volume", text("name")),
    col("Total Data Capacity", Source::Gb("space.size")),
    col("Used Data Capacity", Source::Gb("space.used")),
    col(
        "Used Data %",
        Source::Percent {
            part: "space.used",
            total: "space.size",
        },
    ),
    col("Available Data Capacity", Source::Gb("space.available")),
    col(
        "Available Data %",
        Source::Percent {
            part: "space.available",
            total: "space.size",
        },
    ),
    col("Daily Growth Rate %", Source::Statistic("daily_growth_rate")),
    col("Days To Full", Source::Statistic("days_to_full")),
    col("Space Full Threshold %", Source::Statistic("space_full_threshold")),
    col(
        "Space Nearly Full Threshold %",
        Source::Statistic("space_nearly_full_threshold"),
    ),
    col("Growth Rate Threshold %", Source::Statistic("growth_rate_threshold")),
    col(
        "Growth Rate Sensitivity Threshold",
        Source::Statistic("growth_rate_sensitivity_threshold"),
    ),
    col(
        "Days Until Full Threshold",
        Source::Statistic("days_until_full_threshold"),
    ),
    col("Snapshot Overflow %", Source::Statistic("snapshot_overflow")),
    col(
        "Snapshot Reserve Used Capacity",
        Source::Statistic("snapshot_reserve_used"),
    ),
    col(
        "Snapshot Reserve Used %",
        Source::Statistic("snapshot_reserve_used_pct"),
    ),
    col(
        "Snapshot Reserve Available Capacity",
        Source::Statistic("snapshot_reserve_available"),
    ),
    col(
        "Snapshot Reserve Available %",
        Source::Statistic("snapshot_reserve_available_pct"),
    ),
    col(
        "Snapshot Reserve Total Capacity",
        Source::Statistic("snapshot_reserve_total"),
    ),
    col(
        "Snapshot Copies Reserve Full Threshold %",
        Source::Statistic("snapshot_copies_reserve_full_threshold"),
    ),
    col(
        "Snapshot Copies Count Threshold",
        Source::Statistic("snapshot_copies_count_threshold"),
    ),
    col(
        "Snapshot Copies Days Until Full Threshold",
        Source::Statistic("snapshot_copies_days_until_full_threshold"),
    ),
    col("Number Of Inodes", Source::Statistic("number_of_inodes")),
    col("Inode Utilization %", Source::Statistic("inode_utilization_pct")),
    col("Inodes Full Threshold", Source::Statistic("inodes_full_threshold")),
    col(
        "Inodes Nearly Full Threshold",
        Source::Statistic("inodes_nearly_full_threshold"),
    ),
    col(
        "Quota Committed Capacity",
        Source::Statistic("quota_committed_capacity"),
    ),
    col(
        "Quota Overcommitted Capacity",
        Source::Statistic("quota_overcommitted_capacity"),
    ),
    col(
        "Quota Overcommitted Threshold %",
        Source::Statistic("quota_overcommitted_threshold_pct"),
    ),
    col(
        "Quota Nearly Overcommitted Threshold %",
        Source::Statistic("quota_nearly_overcommitted_threshold_pct"),
    ),
    col("Snapshot Autodelete", text("configuration.snapshot_autodelete")),
    col("Deduplication", text("configuration.deduplication_enabled")),
    col(
        "Deduplication Space Savings",
        Source::Statistic("deduplication_space_savings"),
    ),
    col("Compression", text("configuration.compression_enabled")),
    col(
        "Compression Space Savings",
        Source::Statistic("compression_space_savings"),
    ),
    col("Caching Policy", text("configuration.caching_policy")),
    col(
        "Cache Retention Priority",
        text("configuration.cache_retention_priority"),
    ),
    col("Thin Provisioned", text("configuration.thin_provisioned")),
    col("Autogrow", text("configuration.autogrow")),
    col("Space Guarantee", text("configuration.space_guarantee")),
    col("State", text("state")),
    col("SnapLock Type", text("configuration.snaplock_type")),
    col("Expiry Date", text("configuration.expiry_date")),
    col("Tiering Policy", text("configuration.tiering_policy")),
];
