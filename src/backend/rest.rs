//! Hosted backend REST client
//!
//! Speaks the PostgREST dialect exposed under `/rest/v1`. Row-level
//! security is enforced server-side from the bearer token, so the
//! filters sent here only narrow what the server already allows.
//!
//! The client does not hold a realtime socket; writes made through it
//! are published to its own [`ChangeHub`], which keeps every live view
//! in this process in step with its own changes.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

use super::{
    Backend, BackendError, BackendResult, ChangeEvent, ChangeHub, ChangeKind, ChannelSpec, Filter,
    Query, Subscription,
};
use crate::model::Table;

/// Connection settings for the hosted backend
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Project URL (e.g., "https://xyz.supabase.co")
    pub url: String,
    /// Public anonymous key, sent as `apikey`
    pub anon_key: String,
    /// User access token; falls back to the anon key when absent
    pub access_token: Option<String>,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
            access_token: None,
            request_timeout_ms: 10000,
        }
    }
}

/// REST client for the hosted backend
pub struct RestBackend {
    client: Client,
    config: RestConfig,
    hub: ChangeHub,
}

/// Error body returned by PostgREST
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    error: Option<String>,
    details: Option<String>,
}

impl RestBackend {
    pub fn new(config: RestConfig) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            config,
            hub: ChangeHub::default(),
        })
    }

    /// Check that the REST endpoint answers
    pub async fn health_check(&self) -> BackendResult<()> {
        let url = format!("{}/rest/v1/", self.base_url());
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(classify)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(BackendError::Unavailable)
        }
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url(), table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .config
            .access_token
            .as_deref()
            .unwrap_or(&self.config.anon_key);

        request
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", token))
    }

    /// Parse a representation response into the first returned row
    async fn single_row(response: Response, table: Table) -> BackendResult<Value> {
        let rows: Vec<Value> = check(response).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(format!("no {} row returned", table)))
    }
}

#[async_trait]
impl Backend for RestBackend {
    fn name(&self) -> &str {
        "rest"
    }

    async fn select(&self, table: Table, query: &Query) -> BackendResult<Vec<Value>> {
        let url = format!("{}?{}", self.table_url(table), encode_query(query));
        tracing::debug!(table = %table, url = %url, "Select");

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(classify)?;

        Ok(check(response).await?.json().await?)
    }

    async fn insert(&self, table: Table, row: Value) -> BackendResult<Value> {
        let response = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(classify)?;

        let inserted = Self::single_row(response, table).await?;
        if let Some(id) = value_id(&inserted) {
            self.hub.publish(&ChangeEvent::new(
                table,
                ChangeKind::Insert,
                id,
                inserted.clone(),
            ));
        }
        Ok(inserted)
    }

    async fn update(&self, table: Table, id: Uuid, patch: Value) -> BackendResult<Value> {
        let url = format!("{}?id=eq.{}", self.table_url(table), id);
        let response = self
            .authorized(self.client.patch(&url))
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await
            .map_err(classify)?;

        let updated = Self::single_row(response, table).await?;
        self.hub.publish(&ChangeEvent::new(
            table,
            ChangeKind::Update,
            id,
            updated.clone(),
        ));
        Ok(updated)
    }

    async fn delete(&self, table: Table, id: Uuid) -> BackendResult<()> {
        let url = format!("{}?id=eq.{}", self.table_url(table), id);
        let response = self
            .authorized(self.client.delete(&url))
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(classify)?;

        let removed: Vec<Value> = check(response).await?.json().await?;
        if let Some(record) = removed.into_iter().next() {
            self.hub
                .publish(&ChangeEvent::new(table, ChangeKind::Delete, id, record));
        }
        Ok(())
    }

    async fn subscribe(&self, spec: ChannelSpec) -> BackendResult<Subscription> {
        Ok(self.hub.open(spec)?)
    }
}

fn classify(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout
    } else if err.is_connect() {
        BackendError::Unavailable
    } else {
        BackendError::Request(err)
    }
}

/// Turn a non-success response into an API error carrying the server's message
async fn check(response: Response) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .ok()
        .and_then(|body| body.message.or(body.error).or(body.details))
        .unwrap_or(text);

    if status.as_u16() == 404 {
        return Err(BackendError::NotFound(message));
    }
    Err(BackendError::Api {
        status: status.as_u16(),
        message,
    })
}

fn value_id(row: &Value) -> Option<Uuid> {
    row.get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}

fn filter_operand(filter: &Filter) -> String {
    match &filter.value {
        Value::Null => "is.null".to_string(),
        Value::String(s) => format!("eq.{}", s),
        other => format!("eq.{}", other),
    }
}

/// Encode a query as PostgREST URL parameters
pub(crate) fn encode_query(query: &Query) -> String {
    let mut params = vec!["select=*".to_string()];

    for filter in &query.filters {
        params.push(format!(
            "{}={}",
            urlencoding::encode(&filter.column),
            urlencoding::encode(&filter_operand(filter))
        ));
    }

    if !query.any_of.is_empty() {
        let alternatives: Vec<String> = query
            .any_of
            .iter()
            .map(|f| {
                let operand = filter_operand(f);
                format!("{}.{}", f.column, operand)
            })
            .collect();
        params.push(format!(
            "or={}",
            urlencoding::encode(&format!("({})", alternatives.join(",")))
        ));
    }

    if !query.order.is_empty() {
        let order: Vec<String> = query
            .order
            .iter()
            .map(|o| {
                format!(
                    "{}.{}",
                    o.column,
                    if o.ascending { "asc" } else { "desc" }
                )
            })
            .collect();
        params.push(format!("order={}", order.join(",")));
    }

    if let Some(limit) = query.limit {
        params.push(format!("limit={}", limit));
    }

    params.join("&")
}
