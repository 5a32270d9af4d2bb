//! Maps each intent to exactly one store call (or none).

use crate::intent::{Condition, Intent};
use crate::schema::EmployeeSchema;
use crate::store::{EmployeeStore, Row, StoreError, StoreFilter};
use serde_json::{json, Value};
use tracing::debug;

pub const RPC_COUNTS_BY_DIMENSION: &str = "get_counts_by_dimension";
pub const RPC_CONDITIONAL_COUNTS_BY_DIMENSION: &str = "get_conditional_counts_by_dimension";
pub const RPC_AGGREGATE_BY_DIMENSION: &str = "get_aggregate_by_dimension";
pub const RPC_ORDERED_EMPLOYEES: &str = "get_ordered_employees";
pub const RPC_TOP_CATEGORY_BY_METRIC: &str = "get_top_category_by_metric";
pub const RPC_TOP_EMPLOYEES_BY_TOTAL_COMPENSATION: &str = "get_top_employees_by_total_compensation";

#[derive(Debug, Clone, PartialEq)]
pub enum StorePlan {
    /// Nothing to ask the store; the answer is an empty result.
    Empty,
    /// Nothing to ask the store; the intent is answered without data.
    NoCall,
    Select {
        columns: Vec<String>,
        filters: Vec<StoreFilter>,
    },
    Count,
    Rpc {
        function: &'static str,
        params: Value,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Rows(Vec<Row>),
    Count(u64),
    Nothing,
}

impl QueryResult {
    pub fn rows(&self) -> &[Row] {
        match self {
            QueryResult::Rows(rows) => rows,
            QueryResult::Count(_) | QueryResult::Nothing => &[],
        }
    }
}

fn store_filters(conditions: &[Condition]) -> Vec<StoreFilter> {
    conditions
        .iter()
        .map(|c| StoreFilter {
            column: c.column.clone(),
            operator: c.operator,
            value: c.store_value(),
        })
        .collect()
}

/// The filter list as the conditional-count function expects it.
fn rpc_filters(conditions: &[Condition]) -> Value {
    Value::Array(
        conditions
            .iter()
            .map(|c| {
                json!({
                    "column": c.column,
                    "operator": c.operator.as_str(),
                    "value": c.store_value(),
                })
            })
            .collect(),
    )
}

pub fn plan(intent: &Intent, schema: &EmployeeSchema) -> StorePlan {
    match intent {
        Intent::Filter { conditions, .. } if conditions.is_empty() => StorePlan::Empty,
        Intent::Filter {
            conditions,
            columns,
        } => {
            let mut columns = columns.clone();
            if !columns.is_empty() && !columns.contains(&schema.name_column) {
                columns.insert(0, schema.name_column.clone());
            }
            StorePlan::Select {
                columns,
                filters: store_filters(conditions),
            }
        }
        Intent::TotalCount => StorePlan::Count,
        Intent::OrderedList {
            order_by_column,
            ascending,
            limit,
        } => StorePlan::Rpc {
            function: RPC_ORDERED_EMPLOYEES,
            params: json!({
                "order_by_column": order_by_column,
                "is_ascending": ascending,
                "limit_count": limit,
            }),
        },
        Intent::HighestTotalCompensation { limit } => StorePlan::Rpc {
            function: RPC_TOP_EMPLOYEES_BY_TOTAL_COMPENSATION,
            params: json!({ "limit_count": limit }),
        },
        Intent::AggregateCount { dimension } => StorePlan::Rpc {
            function: RPC_COUNTS_BY_DIMENSION,
            params: json!({ "dimension_column": dimension }),
        },
        Intent::ConditionalAggregateCount {
            dimension,
            conditions,
        } => StorePlan::Rpc {
            function: RPC_CONDITIONAL_COUNTS_BY_DIMENSION,
            params: json!({
                "dimension_column": dimension,
                "filters": rpc_filters(conditions),
            }),
        },
        Intent::AggregateMetric {
            metric,
            metric_column,
            dimension,
        } => StorePlan::Rpc {
            function: RPC_AGGREGATE_BY_DIMENSION,
            params: json!({
                "metric_column": metric_column,
                "dimension_column": dimension,
                "metric_type": metric.as_str(),
            }),
        },
        Intent::FindTopGroup {
            dimension,
            metric,
            metric_column,
            ranking,
        } => StorePlan::Rpc {
            function: RPC_TOP_CATEGORY_BY_METRIC,
            params: json!({
                "dimension_column": dimension,
                "metric_column": metric_column,
                "metric_type": metric.as_str(),
                "is_descending": ranking.is_descending(),
            }),
        },
        Intent::Unsupported { .. } => StorePlan::NoCall,
    }
}

/// Runs a plan. Issues at most one store call.
pub async fn execute(store: &dyn EmployeeStore, plan: StorePlan) -> Result<QueryResult, StoreError> {
    match plan {
        StorePlan::Empty => Ok(QueryResult::Rows(Vec::new())),
        StorePlan::NoCall => Ok(QueryResult::Nothing),
        StorePlan::Select { columns, filters } => {
            let rows = store.select(&columns, &filters).await?;
            debug!("Select returned {} rows", rows.len());
            Ok(QueryResult::Rows(rows))
        }
        StorePlan::Count => Ok(QueryResult::Count(store.count().await?)),
        StorePlan::Rpc { function, params } => {
            let rows = store.rpc(function, &params).await?;
            debug!("{} returned {} rows", function, rows.len());
            Ok(QueryResult::Rows(rows))
        }
    }
}
