// src/sink/supabase.rs

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::{Client, RequestBuilder};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::OrderTable;
use crate::config::RemoteConfig;
use crate::schema::OrderRecord;

/// Columns read back when verifying an upload.
const VERIFY_COLUMNS: &str = "id,date,client,price,profit";

/// A PostgREST table behind a Supabase project, accessed with the blocking client.
pub struct SupabaseTable {
    client: Client,
    endpoint: Url,
    key: String,
}

impl SupabaseTable {
    /// The client has no request timeout: a stalled call blocks the run.
    pub fn connect(cfg: &RemoteConfig, table: &str) -> Result<Self> {
        let endpoint = table_endpoint(&cfg.url, table)?;
        debug!(%endpoint, "remote table");
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            endpoint,
            key: cfg.key.clone(),
        })
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.key).bearer_auth(&self.key)
    }
}

impl OrderTable for SupabaseTable {
    fn insert(&mut self, batch: &[OrderRecord]) -> Result<()> {
        self.authed(self.client.post(self.endpoint.clone()))
            .header("Prefer", "return=minimal")
            .json(batch)
            .send()
            .with_context(|| format!("POST {}", self.endpoint))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", self.endpoint))?;
        Ok(())
    }

    fn latest(&mut self, limit: usize) -> Result<Vec<serde_json::Value>> {
        let limit = limit.to_string();
        self.authed(self.client.get(self.endpoint.clone()))
            .query(&[
                ("select", VERIFY_COLUMNS),
                ("order", "date.desc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .with_context(|| format!("GET {}", self.endpoint))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", self.endpoint))?
            .json()
            .with_context(|| format!("Reading rows from {}", self.endpoint))
    }

    fn count(&mut self) -> Result<u64> {
        let resp = self
            .authed(self.client.head(self.endpoint.clone()))
            .query(&[("select", "*")])
            .header("Prefer", "count=exact")
            .send()
            .with_context(|| format!("HEAD {}", self.endpoint))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", self.endpoint))?;

        let range = resp
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .ok_or_else(|| anyhow!("no Content-Range in count response"))?
            .to_str()
            .context("Content-Range is not text")?;
        content_range_total(range).ok_or_else(|| anyhow!("unexpected Content-Range {:?}", range))
    }
}

/// `https://x.supabase.co` + `orders` → `https://x.supabase.co/rest/v1/orders`.
pub fn table_endpoint(base: &str, table: &str) -> Result<Url> {
    let mut url = Url::parse(base.trim()).with_context(|| format!("parsing {}", base))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.join(&format!("rest/v1/{}", table))
        .with_context(|| format!("joining table {} onto {}", table, base))
}

/// Total from a PostgREST `Content-Range` header: `0-24/312` or `*/312`.
pub fn content_range_total(header: &str) -> Option<u64> {
    let (_, total) = header.trim().rsplit_once('/')?;
    total.parse().ok()
}
