//!
//! Calls against the cluster management REST API.
//!
//! NOTE: Records are kept as raw JSON, the reports only look up the keys they need.
use crate::{Client, Result};
use serde::Deserialize;

const CLUSTER: &str = "api/cluster";
const AGGREGATES: &str = "api/storage/aggregates";
const VOLUMES: &str = "api/storage/volumes";

/// Cluster name used when the API does not return one
pub const UNKNOWN_CLUSTER: &str = "Unknown_Cluster";

/// Returned from /api/cluster
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Cluster {
    /// Cluster name
    pub name: Option<String>,
}

impl Cluster {
    /// Cluster name, or [`UNKNOWN_CLUSTER`]
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN_CLUSTER)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Href {
    href: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Links {
    next: Option<Href>,
}

/// A collection response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordList {
    /// Records on this page
    #[serde(default)]
    pub records: Vec<serde_json::Value>,
    /// Number of records the API says it returned
    pub num_records: Option<u64>,
    #[serde(default, rename = "_links")]
    links: Links,
}

impl RecordList {
    /// Cursor to the next page, if the API truncated the listing
    #[must_use]
    pub fn next_page(&self) -> Option<&str> {
        self.links.next.as_ref().and_then(|n| n.href.as_deref())
    }

    /// Whether more records exist than this page holds. Further pages are never fetched.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.next_page().is_some()
            || self
                .num_records
                .is_some_and(|n| n > self.records.len() as u64)
    }
}

/// Returned from /api/storage/volumes/{uuid}/metrics
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VolumeMetrics {
    /// Statistics object, empty when the API leaves it out
    #[serde(default)]
    pub statistics: serde_json::Map<String, serde_json::Value>,
}

/// Fetch the cluster identity
#[tracing::instrument(skip(client))]
pub async fn cluster(client: &Client) -> Result<Cluster> {
    let cluster: Cluster = client.get_json(CLUSTER, Some(&[("fields", "name")])).await?;
    tracing::debug!("cluster {:?}", cluster);
    Ok(cluster)
}

/// List aggregates with the requested fields
#[tracing::instrument(skip(client))]
pub async fn aggregates(client: &Client, fields: &[&str]) -> Result<RecordList> {
    let fields = fields.join(",");
    let list: RecordList = client
        .get_json(
            AGGREGATES,
            Some(&[("fields", fields.as_str()), ("return_timeout", "60")]),
        )
        .await?;
    warn_if_truncated("aggregates", &list);
    Ok(list)
}

/// List volumes with the requested fields
#[tracing::instrument(skip(client))]
pub async fn volumes(client: &Client, fields: &[&str]) -> Result<RecordList> {
    let fields = fields.join(",");
    let list: RecordList = client
        .get_json(VOLUMES, Some(&[("fields", fields.as_str())]))
        .await?;
    warn_if_truncated("volumes", &list);
    Ok(list)
}

/// Fetch the metrics of a single volume
pub async fn volume_metrics(client: &Client, uuid: &str) -> Result<VolumeMetrics> {
    client
        .get_json(&format!("{VOLUMES}/{uuid}/metrics"), None)
        .await
}

fn warn_if_truncated(what: &str, list: &RecordList) {
    tracing::debug!("{} {} records", list.records.len(), what);
    if list.is_truncated() {
        tracing::warn!(
            "{} listing holds more than the {} records returned (next: {:?}), only the first page is reported",
            what,
            list.records.len(),
            list.next_page()
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::MockApi;
    use crate::Credentials;
    use serde_json::json;

    #[test]
    fn record_list_truncation() {
        let list: RecordList = serde_json::from_value(json!({
            "records": [{"name": "aggr1"}],
            "num_records": 1,
        }))
        .unwrap();
        assert!(!list.is_truncated());

        let list: RecordList = serde_json::from_value(json!({
            "records": [{"name": "aggr1"}],
            "num_records": 1,
            "_links": {"next": {"href": "/api/storage/aggregates?start.uuid=abc"}},
        }))
        .unwrap();
        assert!(list.is_truncated());
        assert_eq!(list.next_page(), Some("/api/storage/aggregates?start.uuid=abc"));

        let list: RecordList = serde_json::from_value(json!({
            "records": [{"name": "aggr1"}],
            "num_records": 5,
        }))
        .unwrap();
        assert!(list.is_truncated());
        assert_eq!(list.next_page(), None);

        let list: RecordList = serde_json::from_value(json!({})).unwrap();
        assert!(list.records.is_empty());
        assert!(!list.is_truncated());
    }

    #[test]
    fn cluster_name_default() {
        assert_eq!(Cluster::default().name(), UNKNOWN_CLUSTER);
        let cluster: Cluster = serde_json::from_value(json!({"name": "cl01"})).unwrap();
        assert_eq!(cluster.name(), "cl01");
    }

    #[tokio::test]
    async fn requests_carry_fields_and_auth() {
        let api = MockApi::default();
        api.set_json("/api/cluster", 200, &json!({"name": "cl01"}));
        api.set_json("/api/storage/aggregates", 200, &json!({"records": []}));
        let url = api.start();

        let client = Client::builder()
            .no_proxy()
            .build(&url, Credentials::basic("admin", "secret"))
            .unwrap();

        assert_eq!(cluster(&client).await.unwrap().name(), "cl01");
        aggregates(&client, &["name", "node.name"]).await.unwrap();

        let requests = api.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].query.get("fields").map(String::as_str), Some("name"));
        assert_eq!(
            requests[1].query.get("fields").map(String::as_str),
            Some("name,node.name")
        );
        assert_eq!(
            requests[1].query.get("return_timeout").map(String::as_str),
            Some("60")
        );
        // admin:secret
        assert_eq!(
            requests[0].authorization.as_deref(),
            Some("Basic YWRtaW46c2VjcmV0")
        );
    }

    #[tokio::test]
    async fn bearer_token_auth() {
        let api = MockApi::default();
        api.set_json("/api/cluster", 200, &json!({"name": "cl01"}));
        let url = api.start();

        let client = Client::builder()
            .no_proxy()
            .build(&url, Credentials::token("tok"))
            .unwrap();
        cluster(&client).await.unwrap();
        assert_eq!(
            api.requests()[0].authorization.as_deref(),
            Some("Bearer tok")
        );
    }

    #[tokio::test]
    async fn metrics_without_statistics() {
        let api = MockApi::default();
        api.set_json("/api/storage/volumes/u1/metrics", 200, &json!({"records": []}));
        api.set_content("/api/storage/volumes/u2/metrics", 500, "internal error");
        let url = api.start();

        let client = Client::builder()
            .no_proxy()
            .build(&url, Credentials::basic("admin", "secret"))
            .unwrap();

        let metrics = volume_metrics(&client, "u1").await.unwrap();
        assert!(metrics.statistics.is_empty());

        let err = volume_metrics(&client, "u2").await.unwrap_err();
        assert_eq!(err.status(), Some(500));
    }
}
