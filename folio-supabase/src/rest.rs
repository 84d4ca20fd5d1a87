//! Data Store over the hosted PostgREST endpoint.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, warn};

use folio_core::{DataStore, Filter, FolioError, FolioResult, Query, Row};

use crate::client::{status_error, SupabaseClient};

#[derive(Clone, Debug)]
pub struct PostgrestStore {
    client: SupabaseClient,
}

impl PostgrestStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    async fn send(&self, request: RequestBuilder, context: String) -> FolioResult<Vec<Row>> {
        let response = self
            .client
            .authorized(request)
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(|e| {
                warn!("{} failed to reach the data store: {}", context, e);
                FolioError::unavailable(format!("{context}: data store unreachable")).with_source(e)
            })?;

        read_rows(response, &context).await
    }
}

async fn read_rows(response: Response, context: &str) -> FolioResult<Vec<Row>> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!("{} rejected with {}", context, status);
        return Err(status_error(status, context, &body));
    }

    let body = response.text().await.map_err(|e| {
        FolioError::unavailable(format!("{context}: response body lost")).with_source(e)
    })?;
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<Value>(&body)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Ok(row),
                other => Err(FolioError::bad_gateway(format!(
                    "{context}: expected row object, got {other}"
                ))),
            })
            .collect(),
        Value::Object(row) => Ok(vec![row]),
        other => Err(FolioError::bad_gateway(format!(
            "{context}: unexpected response {other}"
        ))),
    }
}

/// Render one filter value in PostgREST operator syntax.
fn filter_value(value: &Value) -> String {
    match value {
        Value::Null => "is.null".to_string(),
        Value::String(s) => format!("eq.{s}"),
        other => format!("eq.{other}"),
    }
}

/// Query-string pairs for a filter: `column=eq.value`.
pub fn filter_params(filter: &Filter) -> Vec<(String, String)> {
    filter
        .eq
        .iter()
        .map(|(column, value)| (column.clone(), filter_value(value)))
        .collect()
}

/// Query-string pairs for a select: `select=*`, filters, `order=a.asc,b.desc`.
pub fn select_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(filter_params(&query.filter));

    if !query.order.is_empty() {
        let order = query
            .order
            .iter()
            .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
            .collect::<Vec<_>>()
            .join(",");
        params.push(("order".to_string(), order));
    }
    params
}

#[async_trait]
impl DataStore for PostgrestStore {
    async fn select(&self, table: &str, query: &Query) -> FolioResult<Vec<Row>> {
        debug!("select {} {:?}", table, query);
        let request = self
            .client
            .http()
            .get(self.client.rest_url(table))
            .query(&select_params(query));
        self.send(request, format!("select {table}")).await
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> FolioResult<Vec<Row>> {
        debug!("insert {} ({} rows)", table, rows.len());
        let request = self
            .client
            .http()
            .post(self.client.rest_url(table))
            .json(&rows);
        self.send(request, format!("insert {table}")).await
    }

    async fn update(&self, table: &str, patch: Row, filter: &Filter) -> FolioResult<Vec<Row>> {
        debug!("update {} {:?}", table, filter);
        let request = self
            .client
            .http()
            .patch(self.client.rest_url(table))
            .query(&filter_params(filter))
            .json(&patch);
        self.send(request, format!("update {table}")).await
    }

    async fn delete(&self, table: &str, filter: &Filter) -> FolioResult<Vec<Row>> {
        debug!("delete {} {:?}", table, filter);
        let request = self
            .client
            .http()
            .delete(self.client.rest_url(table))
            .query(&filter_params(filter));
        self.send(request, format!("delete {table}")).await
    }
}
