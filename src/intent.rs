//! Typed intents and the validator that turns a model classification
//! (untrusted JSON) into one of them.

use crate::schema::EmployeeSchema;
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Filter,
    TotalCount,
    OrderedList,
    HighestTotalCompensation,
    AggregateCount,
    ConditionalAggregateCount,
    AggregateMetric,
    FindTopGroup,
    Unsupported,
}

impl IntentKind {
    pub const ALL: [IntentKind; 9] = [
        IntentKind::Filter,
        IntentKind::TotalCount,
        IntentKind::OrderedList,
        IntentKind::HighestTotalCompensation,
        IntentKind::AggregateCount,
        IntentKind::ConditionalAggregateCount,
        IntentKind::AggregateMetric,
        IntentKind::FindTopGroup,
        IntentKind::Unsupported,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::Filter => "filter",
            IntentKind::TotalCount => "total_count",
            IntentKind::OrderedList => "ordered_list",
            IntentKind::HighestTotalCompensation => "highest_total_compensation",
            IntentKind::AggregateCount => "aggregate_count",
            IntentKind::ConditionalAggregateCount => "conditional_aggregate_count",
            IntentKind::AggregateMetric => "aggregate_metric",
            IntentKind::FindTopGroup => "find_top_group",
            IntentKind::Unsupported => "unsupported",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Intents whose rows are remembered for follow-up questions.
    pub fn is_list_producing(&self) -> bool {
        matches!(
            self,
            IntentKind::Filter | IntentKind::OrderedList | IntentKind::HighestTotalCompensation
        )
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the grammar shown to the model. The validator below accepts
/// exactly these names and fields.
pub struct IntentGrammar {
    pub kind: IntentKind,
    pub description: &'static str,
    pub shape: &'static str,
}

pub const INTENT_GRAMMAR: &[IntentGrammar] = &[
    IntentGrammar {
        kind: IntentKind::Filter,
        description: "Find specific employees, or specific fields of an employee, matching conditions.",
        shape: r#"{"intent": "filter", "conditions": [{"column": "...", "operator": "eq|gt|gte|lt|lte|ilike", "value": ...}], "columns": ["..."]}"#,
    },
    IntentGrammar {
        kind: IntentKind::TotalCount,
        description: "How many employees there are in total.",
        shape: r#"{"intent": "total_count"}"#,
    },
    IntentGrammar {
        kind: IntentKind::OrderedList,
        description: "Top or bottom N employees ordered by one column.",
        shape: r#"{"intent": "ordered_list", "order_by_column": "...", "ascending": false, "limit": 5}"#,
    },
    IntentGrammar {
        kind: IntentKind::HighestTotalCompensation,
        description: "Employees with the highest salary plus all allowances combined.",
        shape: r#"{"intent": "highest_total_compensation", "limit": 5}"#,
    },
    IntentGrammar {
        kind: IntentKind::AggregateCount,
        description: "Number of employees in each group of a column.",
        shape: r#"{"intent": "aggregate_count", "dimension": "..."}"#,
    },
    IntentGrammar {
        kind: IntentKind::ConditionalAggregateCount,
        description: "Number of employees in each group of a column, restricted by conditions.",
        shape: r#"{"intent": "conditional_aggregate_count", "dimension": "...", "conditions": [{"column": "...", "operator": "...", "value": ...}]}"#,
    },
    IntentGrammar {
        kind: IntentKind::AggregateMetric,
        description: "Sum, average, minimum or maximum of a numeric column for each group of another column.",
        shape: r#"{"intent": "aggregate_metric", "metric": "sum|avg|min|max", "metric_column": "...", "dimension": "..."}"#,
    },
    IntentGrammar {
        kind: IntentKind::FindTopGroup,
        description: "The single group with the highest or lowest aggregate of a numeric column.",
        shape: r#"{"intent": "find_top_group", "dimension": "...", "metric": "sum|avg|min|max", "metric_column": "...", "ranking": "highest|lowest"}"#,
    },
    IntentGrammar {
        kind: IntentKind::Unsupported,
        description: "Anything that cannot be answered from the employee table.",
        shape: r#"{"intent": "unsupported", "reason": "..."}"#,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Ilike,
}

impl Operator {
    pub const ALL: [Operator; 6] = [
        Operator::Eq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Ilike,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Ilike => "ilike",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
}

impl Condition {
    /// The value as it must be sent to the store: `ilike` patterns match
    /// anywhere in the column.
    pub fn store_value(&self) -> Value {
        match self.operator {
            Operator::Ilike => {
                let raw = match &self.value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Value::String(format!("%{}%", raw))
            }
            _ => self.value.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Sum,
    Avg,
    Min,
    Max,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Sum => "sum",
            Metric::Avg => "avg",
            Metric::Min => "min",
            Metric::Max => "max",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sum" | "total" => Some(Metric::Sum),
            "avg" | "average" | "mean" => Some(Metric::Avg),
            "min" | "minimum" => Some(Metric::Min),
            "max" | "maximum" => Some(Metric::Max),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ranking {
    Highest,
    Lowest,
}

impl Ranking {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "highest" | "top" | "max" | "most" => Some(Ranking::Highest),
            "lowest" | "bottom" | "min" | "least" => Some(Ranking::Lowest),
            _ => None,
        }
    }

    pub fn is_descending(&self) -> bool {
        matches!(self, Ranking::Highest)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Filter {
        conditions: Vec<Condition>,
        columns: Vec<String>,
    },
    TotalCount,
    OrderedList {
        order_by_column: String,
        ascending: bool,
        limit: u32,
    },
    HighestTotalCompensation {
        limit: u32,
    },
    AggregateCount {
        dimension: String,
    },
    ConditionalAggregateCount {
        dimension: String,
        conditions: Vec<Condition>,
    },
    AggregateMetric {
        metric: Metric,
        metric_column: String,
        dimension: String,
    },
    FindTopGroup {
        dimension: String,
        metric: Metric,
        metric_column: String,
        ranking: Ranking,
    },
    Unsupported {
        reason: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntentError {
    NotAnObject,
    UnknownIntent(String),
    MissingParameter {
        intent: IntentKind,
        parameter: &'static str,
    },
    InvalidParameter {
        intent: IntentKind,
        parameter: &'static str,
        value: String,
    },
    UnknownColumn {
        intent: IntentKind,
        column: String,
    },
}

impl fmt::Display for IntentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntentError::NotAnObject => write!(f, "classification is not a JSON object"),
            IntentError::UnknownIntent(name) => write!(f, "unknown intent '{}'", name),
            IntentError::MissingParameter { intent, parameter } => {
                write!(f, "intent '{}' is missing '{}'", intent, parameter)
            }
            IntentError::InvalidParameter {
                intent,
                parameter,
                value,
            } => write!(
                f,
                "intent '{}' has invalid '{}': {}",
                intent, parameter, value
            ),
            IntentError::UnknownColumn { intent, column } => {
                write!(f, "intent '{}' references unknown column '{}'", intent, column)
            }
        }
    }
}

impl Error for IntentError {}

/// Reads classification fields leniently and checks every column against
/// the schema.
struct FieldReader<'a> {
    kind: IntentKind,
    fields: &'a Map<String, Value>,
    schema: &'a EmployeeSchema,
}

impl<'a> FieldReader<'a> {
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    fn text(&self, key: &'static str) -> Result<Option<String>, IntentError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
            Some(other) => Err(self.invalid(key, other)),
        }
    }

    fn required_text(&self, key: &'static str) -> Result<String, IntentError> {
        self.text(key)?.ok_or(IntentError::MissingParameter {
            intent: self.kind,
            parameter: key,
        })
    }

    fn column(&self, key: &'static str) -> Result<String, IntentError> {
        let name = self.required_text(key)?;
        self.known_column(name)
    }

    fn known_column(&self, name: String) -> Result<String, IntentError> {
        if self.schema.has_column(&name) {
            Ok(name)
        } else {
            Err(IntentError::UnknownColumn {
                intent: self.kind,
                column: name,
            })
        }
    }

    fn bool_or(&self, key: &'static str, default: bool) -> Result<bool, IntentError> {
        match self.get(key) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "asc" | "ascending" => Ok(true),
                "false" | "desc" | "descending" => Ok(false),
                _ => Err(self.invalid(key, &Value::String(s.clone()))),
            },
            Some(other) => Err(self.invalid(key, other)),
        }
    }

    fn limit(&self) -> Result<u32, IntentError> {
        let raw = match self.get("limit") {
            None => return Ok(DEFAULT_LIMIT),
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(_) => None,
        };
        match raw {
            Some(n) if n.is_finite() => Ok((n.round().max(1.0) as u32).min(MAX_LIMIT)),
            _ => Err(self.invalid("limit", self.fields.get("limit").unwrap_or(&Value::Null))),
        }
    }

    fn metric(&self) -> Result<Metric, IntentError> {
        let name = self.required_text("metric")?;
        Metric::from_name(&name).ok_or_else(|| self.invalid("metric", &Value::String(name)))
    }

    fn ranking(&self) -> Result<Ranking, IntentError> {
        match self.text("ranking")? {
            None => Ok(Ranking::Highest),
            Some(name) => Ranking::from_name(&name)
                .ok_or_else(|| self.invalid("ranking", &Value::String(name))),
        }
    }

    fn columns(&self) -> Result<Vec<String>, IntentError> {
        match self.get("columns") {
            None => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(vec![self.known_column(s.trim().to_string())?]),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => self.known_column(s.trim().to_string()),
                    other => Err(self.invalid("columns", other)),
                })
                .collect(),
            Some(other) => Err(self.invalid("columns", other)),
        }
    }

    fn conditions(&self) -> Result<Vec<Condition>, IntentError> {
        let items = match self.get("conditions") {
            None => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            // A lone condition object is accepted as a one-element list
            Some(single @ Value::Object(_)) => return Ok(vec![self.condition(single)?]),
            Some(other) => return Err(self.invalid("conditions", other)),
        };
        items.iter().map(|item| self.condition(item)).collect()
    }

    fn condition(&self, item: &Value) -> Result<Condition, IntentError> {
        let obj = item
            .as_object()
            .ok_or_else(|| self.invalid("conditions", item))?;
        let column = match obj.get("column") {
            Some(Value::String(s)) if !s.trim().is_empty() => self.known_column(s.trim().to_string())?,
            _ => {
                return Err(IntentError::MissingParameter {
                    intent: self.kind,
                    parameter: "conditions.column",
                });
            }
        };
        let operator = match obj.get("operator") {
            None | Some(Value::Null) => Operator::Eq,
            Some(Value::String(s)) => Operator::from_name(s)
                .ok_or_else(|| self.invalid("conditions.operator", &Value::String(s.clone())))?,
            Some(other) => return Err(self.invalid("conditions.operator", other)),
        };
        Ok(Condition {
            column,
            operator,
            value: obj.get("value").cloned().unwrap_or(Value::Null),
        })
    }

    fn invalid(&self, parameter: &'static str, value: &Value) -> IntentError {
        IntentError::InvalidParameter {
            intent: self.kind,
            parameter,
            value: value.to_string(),
        }
    }
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::Filter { .. } => IntentKind::Filter,
            Intent::TotalCount => IntentKind::TotalCount,
            Intent::OrderedList { .. } => IntentKind::OrderedList,
            Intent::HighestTotalCompensation { .. } => IntentKind::HighestTotalCompensation,
            Intent::AggregateCount { .. } => IntentKind::AggregateCount,
            Intent::ConditionalAggregateCount { .. } => IntentKind::ConditionalAggregateCount,
            Intent::AggregateMetric { .. } => IntentKind::AggregateMetric,
            Intent::FindTopGroup { .. } => IntentKind::FindTopGroup,
            Intent::Unsupported { .. } => IntentKind::Unsupported,
        }
    }

    /// Validates a classification object against the intent grammar and the
    /// employee schema.
    pub fn from_classification(
        classification: &Value,
        schema: &EmployeeSchema,
    ) -> Result<Intent, IntentError> {
        let fields = classification.as_object().ok_or(IntentError::NotAnObject)?;
        let name = match fields.get("intent") {
            Some(Value::String(s)) => s.trim().to_ascii_lowercase(),
            Some(other) => return Err(IntentError::UnknownIntent(other.to_string())),
            None => return Err(IntentError::UnknownIntent(String::new())),
        };
        let kind = IntentKind::from_name(&name).ok_or(IntentError::UnknownIntent(name))?;
        let r = FieldReader {
            kind,
            fields,
            schema,
        };

        let intent = match kind {
            IntentKind::Filter => Intent::Filter {
                conditions: r.conditions()?,
                columns: r.columns()?,
            },
            IntentKind::TotalCount => Intent::TotalCount,
            IntentKind::OrderedList => Intent::OrderedList {
                order_by_column: r.column("order_by_column")?,
                ascending: r.bool_or("ascending", false)?,
                limit: r.limit()?,
            },
            IntentKind::HighestTotalCompensation => {
                Intent::HighestTotalCompensation { limit: r.limit()? }
            }
            IntentKind::AggregateCount => Intent::AggregateCount {
                dimension: r.column("dimension")?,
            },
            IntentKind::ConditionalAggregateCount => Intent::ConditionalAggregateCount {
                dimension: r.column("dimension")?,
                conditions: r.conditions()?,
            },
            IntentKind::AggregateMetric => Intent::AggregateMetric {
                metric: r.metric()?,
                metric_column: r.column("metric_column")?,
                dimension: r.column("dimension")?,
            },
            IntentKind::FindTopGroup => Intent::FindTopGroup {
                dimension: r.column("dimension")?,
                metric: r.metric()?,
                metric_column: r.column("metric_column")?,
                ranking: r.ranking()?,
            },
            IntentKind::Unsupported => Intent::Unsupported {
                reason: r.text("reason").ok().flatten(),
            },
        };
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<Intent, IntentError> {
        Intent::from_classification(&value, &EmployeeSchema::default())
    }

    #[test]
    fn grammar_covers_every_intent_once() {
        for kind in IntentKind::ALL {
            let entries: Vec<_> = INTENT_GRAMMAR.iter().filter(|g| g.kind == kind).collect();
            assert_eq!(entries.len(), 1, "grammar entries for {}", kind);
            let tag = format!(r#""intent": "{}""#, kind.as_str());
            assert!(entries[0].shape.contains(&tag), "shape of {}", kind);
        }
    }

    #[test]
    fn parses_ordered_list() {
        let intent = parse(json!({
            "intent": "ordered_list",
            "order_by_column": "base_salary",
            "ascending": false,
            "limit": 3
        }))
        .unwrap();
        assert_eq!(
            intent,
            Intent::OrderedList {
                order_by_column: "base_salary".to_string(),
                ascending: false,
                limit: 3,
            }
        );
    }

    #[test]
    fn lenient_defaults_and_coercions() {
        let intent = parse(json!({
            "intent": "ordered_list",
            "order_by_column": "housing_allowance",
            "ascending": "true",
            "limit": "500"
        }))
        .unwrap();
        assert_eq!(
            intent,
            Intent::OrderedList {
                order_by_column: "housing_allowance".to_string(),
                ascending: true,
                limit: MAX_LIMIT,
            }
        );

        let intent = parse(json!({"intent": "highest_total_compensation"})).unwrap();
        assert_eq!(intent, Intent::HighestTotalCompensation { limit: DEFAULT_LIMIT });
    }

    #[test]
    fn missing_required_parameter_is_reported() {
        let err = parse(json!({"intent": "aggregate_count"})).unwrap_err();
        assert_eq!(
            err,
            IntentError::MissingParameter {
                intent: IntentKind::AggregateCount,
                parameter: "dimension",
            }
        );

        let err = parse(json!({"intent": "ordered_list", "limit": 3})).unwrap_err();
        assert!(matches!(err, IntentError::MissingParameter { parameter: "order_by_column", .. }));
    }

    #[test]
    fn unknown_columns_are_rejected() {
        let err = parse(json!({"intent": "aggregate_count", "dimension": "shoe_size"})).unwrap_err();
        assert!(matches!(err, IntentError::UnknownColumn { .. }));

        let err = parse(json!({
            "intent": "filter",
            "conditions": [{"column": "password", "operator": "eq", "value": "x"}]
        }))
        .unwrap_err();
        assert!(matches!(err, IntentError::UnknownColumn { .. }));
    }

    #[test]
    fn filter_conditions_and_columns() {
        let intent = parse(json!({
            "intent": "filter",
            "conditions": [
                {"column": "full_name", "operator": "ilike", "value": "ahmed"},
                {"column": "base_salary", "operator": "GTE", "value": 10000},
                {"column": "rank", "value": "Captain"}
            ],
            "columns": ["remaining_loan_balance"]
        }))
        .unwrap();
        let Intent::Filter { conditions, columns } = intent else {
            panic!("expected filter");
        };
        assert_eq!(conditions.len(), 3);
        assert_eq!(conditions[0].operator, Operator::Ilike);
        assert_eq!(conditions[1].operator, Operator::Gte);
        assert_eq!(conditions[2].operator, Operator::Eq);
        assert_eq!(columns, vec!["remaining_loan_balance".to_string()]);
    }

    #[test]
    fn filter_without_conditions_is_valid() {
        let intent = parse(json!({"intent": "filter"})).unwrap();
        assert_eq!(
            intent,
            Intent::Filter {
                conditions: vec![],
                columns: vec![]
            }
        );
    }

    #[test]
    fn bad_operator_is_invalid() {
        let err = parse(json!({
            "intent": "filter",
            "conditions": [{"column": "rank", "operator": "like", "value": "x"}]
        }))
        .unwrap_err();
        assert!(matches!(err, IntentError::InvalidParameter { parameter: "conditions.operator", .. }));
    }

    #[test]
    fn find_top_group_ranking() {
        let intent = parse(json!({
            "intent": "find_top_group",
            "dimension": "rank",
            "metric": "average",
            "metric_column": "base_salary",
            "ranking": "lowest"
        }))
        .unwrap();
        assert_eq!(
            intent,
            Intent::FindTopGroup {
                dimension: "rank".to_string(),
                metric: Metric::Avg,
                metric_column: "base_salary".to_string(),
                ranking: Ranking::Lowest,
            }
        );
        assert!(Ranking::Highest.is_descending());
        assert!(!Ranking::Lowest.is_descending());
    }

    #[test]
    fn unknown_intent_name() {
        let err = parse(json!({"intent": "delete_everyone"})).unwrap_err();
        assert_eq!(err, IntentError::UnknownIntent("delete_everyone".to_string()));
        assert_eq!(parse(json!([])).unwrap_err(), IntentError::NotAnObject);
    }

    #[test]
    fn unsupported_keeps_reason() {
        let intent = parse(json!({"intent": "unsupported", "reason": "Weather is not employee data."})).unwrap();
        assert_eq!(
            intent,
            Intent::Unsupported {
                reason: Some("Weather is not employee data.".to_string())
            }
        );
        let intent = parse(json!({"intent": "unsupported", "reason": 42})).unwrap();
        assert_eq!(intent, Intent::Unsupported { reason: None });
    }

    #[test]
    fn ilike_values_are_wrapped() {
        let c = Condition {
            column: "position".to_string(),
            operator: Operator::Ilike,
            value: json!("engineer"),
        };
        assert_eq!(c.store_value(), json!("%engineer%"));

        let c = Condition {
            column: "rank".to_string(),
            operator: Operator::Ilike,
            value: json!(7),
        };
        assert_eq!(c.store_value(), json!("%7%"));

        let c = Condition {
            column: "rank".to_string(),
            operator: Operator::Eq,
            value: json!("Major"),
        };
        assert_eq!(c.store_value(), json!("Major"));
    }

    #[test]
    fn list_producing_intents() {
        let list: Vec<_> = IntentKind::ALL.into_iter().filter(|k| k.is_list_producing()).collect();
        assert_eq!(
            list,
            vec![
                IntentKind::Filter,
                IntentKind::OrderedList,
                IntentKind::HighestTotalCompensation
            ]
        );
    }
}
