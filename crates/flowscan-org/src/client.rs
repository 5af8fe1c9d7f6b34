//! Blocking REST client for the org's query endpoints.

use crate::records::{flow_metadata_from_value, flow_records_from_values};
use crate::soql::{
    NAMESPACE_QUERY, OverrideObject, flow_list_query, flow_metadata_query, namespace_from_record,
};
use anyhow::Context;
use flowscan_types::{FlowMetadata, FlowRecord, OverrideRecord};
use reqwest::Url;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for one org.
#[derive(Clone, Debug)]
pub struct OrgConfig {
    /// e.g. `https://example.my.salesforce.com`
    pub instance_url: String,
    pub access_token: String,
    /// e.g. `60.0`
    pub api_version: String,
}

/// Which query endpoint to use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryApi {
    /// `/services/data/vXX/query`
    Data,
    /// `/services/data/vXX/tooling/query`
    Tooling,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryPage {
    #[serde(default)]
    records: Vec<Value>,
    #[serde(default)]
    next_records_url: Option<String>,
}

pub struct OrgClient {
    http: Client,
    base: Url,
    access_token: String,
    api_version: String,
}

impl OrgClient {
    pub fn new(config: OrgConfig) -> anyhow::Result<Self> {
        let base = Url::parse(&config.instance_url)
            .with_context(|| format!("invalid instance url: {}", config.instance_url))?;
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("flowscan/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            base,
            access_token: config.access_token,
            api_version: config.api_version,
        })
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Run a query and follow `nextRecordsUrl` until the result is complete.
    pub fn query_all(&self, api: QueryApi, soql: &str) -> anyhow::Result<Vec<Value>> {
        let mut url = self.query_url(api)?;
        url.query_pairs_mut().append_pair("q", soql);

        let mut records = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next.take() {
            let page = self.get_page(&url)?;
            records.extend(page.records);
            if let Some(path) = page.next_records_url {
                next = Some(
                    self.base
                        .join(&path)
                        .with_context(|| format!("invalid nextRecordsUrl: {path}"))?,
                );
            }
        }
        Ok(records)
    }

    /// Flow definitions, optionally filtered by a name search.
    pub fn fetch_flow_list(
        &self,
        search_term: Option<&str>,
        limit: u32,
    ) -> anyhow::Result<Vec<FlowRecord>> {
        let soql = flow_list_query(search_term, limit);
        let values = self
            .query_all(QueryApi::Tooling, &soql)
            .context("query flow definitions")?;
        Ok(flow_records_from_values(values))
    }

    /// Metadata of one flow version.
    pub fn fetch_flow_metadata(&self, version_id: &str) -> anyhow::Result<FlowMetadata> {
        let soql = flow_metadata_query(version_id)
            .with_context(|| format!("invalid flow version id: {version_id}"))?;
        let record = self
            .query_all(QueryApi::Tooling, &soql)
            .context("query flow metadata")?
            .into_iter()
            .next()
            .with_context(|| format!("no flow version with id {version_id}"))?;
        flow_metadata_from_value(record).context("parse flow metadata record")
    }

    /// Rule overrides stored as custom metadata in the org.
    pub fn fetch_override_records(&self) -> anyhow::Result<Vec<OverrideRecord>> {
        let org = self
            .query_all(QueryApi::Data, NAMESPACE_QUERY)
            .context("query org namespace")?;
        let namespace = namespace_from_record(org.first());
        let object = OverrideObject::new(namespace.as_deref());
        let records = self
            .query_all(QueryApi::Data, &object.query())
            .with_context(|| format!("query {}", object.object))?;
        Ok(records.iter().filter_map(|r| object.to_override(r)).collect())
    }

    fn query_url(&self, api: QueryApi) -> anyhow::Result<Url> {
        let path = match api {
            QueryApi::Data => format!("/services/data/v{}/query", self.api_version),
            QueryApi::Tooling => format!("/services/data/v{}/tooling/query", self.api_version),
        };
        self.base
            .join(&path)
            .with_context(|| format!("build query url {path}"))
    }

    fn get_page(&self, url: &Url) -> anyhow::Result<QueryPage> {
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.access_token)
            .send()
            .with_context(|| format!("GET {}", url.path()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            anyhow::bail!("GET {} failed with {status}: {}", url.path(), truncate(&body, 500));
        }
        response
            .json::<QueryPage>()
            .with_context(|| format!("decode response of GET {}", url.path()))
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
