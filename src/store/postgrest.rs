use crate::config::StoreConfig;
use crate::intent::Operator;
use crate::store::{rows_from_json, EmployeeStore, Row, StoreError, StoreFilter};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

/// Supabase-style PostgREST client for the employee table.
pub struct PostgrestStore {
    client: reqwest::Client,
    base_url: String,
    table: String,
}

impl PostgrestStore {
    pub fn new(config: &StoreConfig, table: &str) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let apikey = HeaderValue::from_str(key)
                .map_err(|e| StoreError::ConfigError(format!("invalid API key: {}", e)))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| StoreError::ConfigError(format!("invalid API key: {}", e)))?;
            headers.insert("apikey", apikey);
            headers.insert(AUTHORIZATION, bearer);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            table: table.to_string(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, function)
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, StoreError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::ResponseError(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            error!("Store responded with status code: {} - {}", status, body);
            return Err(StoreError::ResponseError(format!(
                "Store responded with status code: {}",
                status
            )));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|e| StoreError::ResponseError(format!("Failed to parse store response: {}", e)))
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `select` plus one `column=op.value` pair per filter.
pub fn query_params(columns: &[String], filters: &[StoreFilter]) -> Vec<(String, String)> {
    let select = if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(",")
    };

    let mut params = vec![("select".to_string(), select)];
    for filter in filters {
        let expr = match (&filter.value, filter.operator) {
            (Value::Null, Operator::Eq) => "is.null".to_string(),
            (value, op) => format!("{}.{}", op.as_str(), scalar_text(value)),
        };
        params.push((filter.column.clone(), expr));
    }
    params
}

/// Total from a `Content-Range` header such as `0-24/1250` or `*/1250`.
pub fn parse_content_range(header: &str) -> Option<u64> {
    let (_, total) = header.rsplit_once('/')?;
    total.trim().parse().ok()
}

#[async_trait]
impl EmployeeStore for PostgrestStore {
    async fn select(&self, columns: &[String], filters: &[StoreFilter]) -> Result<Vec<Row>, StoreError> {
        let params = query_params(columns, filters);
        debug!("Selecting from {} with {:?}", self.table, params);

        let response = self
            .client
            .get(self.table_url())
            .query(&params)
            .send()
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        rows_from_json(Self::read_json(response).await?)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let response = self
            .client
            .head(self.table_url())
            .query(&[("select", "*")])
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::ResponseError(format!(
                "Store responded with status code: {}",
                response.status()
            )));
        }

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| StoreError::ResponseError("missing or invalid Content-Range".to_string()))
    }

    async fn rpc(&self, function: &str, params: &Value) -> Result<Vec<Row>, StoreError> {
        debug!("Calling store function {} with {}", function, params);

        let response = self
            .client
            .post(self.rpc_url(function))
            .json(params)
            .send()
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        rows_from_json(Self::read_json(response).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter(column: &str, operator: Operator, value: Value) -> StoreFilter {
        StoreFilter {
            column: column.to_string(),
            operator,
            value,
        }
    }

    #[test]
    fn select_all_without_columns() {
        assert_eq!(query_params(&[], &[]), vec![("select".to_string(), "*".to_string())]);
    }

    #[test]
    fn filters_use_postgrest_operators() {
        let params = query_params(
            &["full_name".to_string(), "base_salary".to_string()],
            &[
                filter("full_name", Operator::Ilike, json!("%ahmed%")),
                filter("base_salary", Operator::Gte, json!(12000)),
                filter("has_loan", Operator::Eq, json!(true)),
                filter("position", Operator::Eq, json!(null)),
            ],
        );
        assert_eq!(
            params,
            vec![
                ("select".to_string(), "full_name,base_salary".to_string()),
                ("full_name".to_string(), "ilike.%ahmed%".to_string()),
                ("base_salary".to_string(), "gte.12000".to_string()),
                ("has_loan".to_string(), "eq.true".to_string()),
                ("position".to_string(), "is.null".to_string()),
            ]
        );
    }

    #[test]
    fn content_range_totals() {
        assert_eq!(parse_content_range("0-24/1250"), Some(1250));
        assert_eq!(parse_content_range("*/1250"), Some(1250));
        assert_eq!(parse_content_range("0-24/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[test]
    fn urls_ignore_trailing_slash() {
        let config = StoreConfig {
            url: "https://example.supabase.co/".to_string(),
            api_key: Some("anon-key".to_string()),
            timeout_secs: 5,
        };
        let store = PostgrestStore::new(&config, "qag_employees").unwrap();
        assert_eq!(store.table_url(), "https://example.supabase.co/rest/v1/qag_employees");
        assert_eq!(
            store.rpc_url("get_counts_by_dimension"),
            "https://example.supabase.co/rest/v1/rpc/get_counts_by_dimension"
        );
    }
}
