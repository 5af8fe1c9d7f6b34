//! Port implementations over the org adapters.

use crate::ports::{FlowSource, OverrideStore};
use async_trait::async_trait;
use flowscan_org::{LocalFlowSource, OrgClient};
use flowscan_types::{FlowMetadata, FlowRecord, OverrideRecord};

/// A live org: flows from the Tooling API, overrides from custom metadata.
///
/// The client is blocking; each call runs to completion on the polling thread.
pub struct OrgSource {
    client: OrgClient,
    search_limit: u32,
}

impl OrgSource {
    pub fn new(client: OrgClient, search_limit: u32) -> Self {
        Self {
            client,
            search_limit,
        }
    }

    pub fn api_version(&self) -> &str {
        self.client.api_version()
    }
}

#[async_trait]
impl FlowSource for OrgSource {
    async fn fetch_flow_list(&self, search_term: Option<&str>) -> anyhow::Result<Vec<FlowRecord>> {
        self.client.fetch_flow_list(search_term, self.search_limit)
    }

    async fn fetch_flow_metadata(&self, version_id: &str) -> anyhow::Result<FlowMetadata> {
        self.client.fetch_flow_metadata(version_id)
    }
}

#[async_trait]
impl OverrideStore for OrgSource {
    async fn fetch_stored_overrides(&self) -> anyhow::Result<Vec<OverrideRecord>> {
        self.client.fetch_override_records()
    }
}

/// Flows exported to a local directory.
pub struct LocalSource {
    inner: LocalFlowSource,
    search_limit: usize,
}

impl LocalSource {
    pub fn new(inner: LocalFlowSource, search_limit: u32) -> Self {
        Self {
            inner,
            search_limit: usize::try_from(search_limit).unwrap_or(usize::MAX),
        }
    }
}

#[async_trait]
impl FlowSource for LocalSource {
    async fn fetch_flow_list(&self, search_term: Option<&str>) -> anyhow::Result<Vec<FlowRecord>> {
        let mut records = self.inner.list(search_term)?;
        records.truncate(self.search_limit);
        Ok(records)
    }

    async fn fetch_flow_metadata(&self, version_id: &str) -> anyhow::Result<FlowMetadata> {
        self.inner.metadata(version_id)
    }
}

/// Overrides known up front, e.g. from the config file.
#[derive(Clone, Debug, Default)]
pub struct StaticOverrides(pub Vec<OverrideRecord>);

#[async_trait]
impl OverrideStore for StaticOverrides {
    async fn fetch_stored_overrides(&self) -> anyhow::Result<Vec<OverrideRecord>> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn static_overrides_are_returned_as_is() {
        let store = StaticOverrides(vec![OverrideRecord {
            rule_name: "A".to_string(),
            severity: Some("error".to_string()),
            expression: None,
            disabled: None,
        }]);
        let got = block_on(store.fetch_stored_overrides()).expect("overrides");
        assert_eq!(got, store.0);
        assert!(block_on(StaticOverrides::default().fetch_stored_overrides())
            .expect("empty")
            .is_empty());
    }
}
