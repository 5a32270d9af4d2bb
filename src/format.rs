//! Turns query results into the Arabic or English message shown to the user.

use crate::intent::{Intent, Metric, Ranking};
use crate::router::QueryResult;
use crate::schema::{EmployeeSchema, LoanRole};
use crate::store::Row;
use crate::util::lang::Language;
use crate::util::numbers::{format_float, format_integer, format_number};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    ListSummary,
    Record,
    Ranking,
    Count,
    Analysis,
    Empty,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedResponse {
    pub response_type: ResponseType,
    pub message: String,
}

impl FormattedResponse {
    fn new(response_type: ResponseType, message: String) -> Self {
        Self {
            response_type,
            message,
        }
    }
}

pub fn no_matches(lang: Language) -> FormattedResponse {
    let message = match lang {
        Language::Arabic => "لم يتم العثور على سجلات مطابقة.",
        Language::English => "No matching records found.",
    };
    FormattedResponse::new(ResponseType::Empty, message.to_string())
}

pub fn processing_error(lang: Language) -> FormattedResponse {
    let message = match lang {
        Language::Arabic => "حدث خطأ أثناء معالجة طلبك.",
        Language::English => "An error occurred while processing your request.",
    };
    FormattedResponse::new(ResponseType::Error, message.to_string())
}

pub fn generic_failure(lang: Language) -> FormattedResponse {
    let message = match lang {
        Language::Arabic => "تعذر معالجة الطلب.",
        Language::English => "Could not process the request.",
    };
    FormattedResponse::new(ResponseType::Error, message.to_string())
}

fn not_available(lang: Language) -> &'static str {
    match lang {
        Language::Arabic => "غير متوفر",
        Language::English => "N/A",
    }
}

/// Human-readable rendering of a single field value.
pub fn display_value(value: &Value, lang: Language) -> String {
    if let Some(number) = format_number(value) {
        return number;
    }
    match value {
        Value::Null => not_available(lang).to_string(),
        Value::Bool(b) => match (*b, lang) {
            (true, Language::Arabic) => "نعم".to_string(),
            (false, Language::Arabic) => "لا".to_string(),
            (true, Language::English) => "Yes".to_string(),
            (false, Language::English) => "No".to_string(),
        },
        Value::String(s) if s.trim().is_empty() => not_available(lang).to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    }
}

pub fn row_name(row: &Row, schema: &EmployeeSchema, lang: Language) -> String {
    match row.get(&schema.name_column) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => match lang {
            Language::Arabic => "الموظف".to_string(),
            Language::English => "The employee".to_string(),
        },
    }
}

fn category(row: &Row, lang: Language) -> String {
    match row.get("category") {
        None | Some(Value::Null) => match lang {
            Language::Arabic => "غير محدد".to_string(),
            Language::English => "Unspecified".to_string(),
        },
        Some(value) => display_value(value, lang),
    }
}

fn field(row: &Row, key: &str, lang: Language) -> String {
    row.get(key)
        .map(|v| display_value(v, lang))
        .unwrap_or_else(|| not_available(lang).to_string())
}

/// Fields worth showing for a row, in schema order followed by any
/// columns the schema does not know about.
fn visible_fields<'a>(row: &'a Row, schema: &'a EmployeeSchema) -> Vec<(&'a str, &'a Value)> {
    let mut fields: Vec<(&str, &Value)> = schema
        .visible_columns()
        .filter_map(|col| row.get(&col.name).map(|v| (col.name.as_str(), v)))
        .collect();
    fields.extend(
        row.iter()
            .filter(|(key, _)| !schema.has_column(key))
            .map(|(key, value)| (key.as_str(), value)),
    );
    fields
}

/// One row as `label -> display value`, bookkeeping fields omitted.
pub fn detailed_record(row: &Row, schema: &EmployeeSchema, lang: Language) -> Map<String, Value> {
    visible_fields(row, schema)
        .into_iter()
        .map(|(key, value)| (schema.label(key, lang), Value::String(display_value(value, lang))))
        .collect()
}

fn underlined(title: String) -> String {
    let rule = "=".repeat(title.chars().count());
    format!("{}\n{}", title, rule)
}

fn metric_label(metric: Metric, lang: Language) -> &'static str {
    match (metric, lang) {
        (Metric::Sum, Language::English) => "Total",
        (Metric::Avg, Language::English) => "Average",
        (Metric::Min, Language::English) => "Minimum",
        (Metric::Max, Language::English) => "Maximum",
        (Metric::Sum, Language::Arabic) => "مجموع",
        (Metric::Avg, Language::Arabic) => "متوسط",
        (Metric::Min, Language::Arabic) => "أدنى",
        (Metric::Max, Language::Arabic) => "أعلى",
    }
}

fn ranking_label(ranking: Ranking, lang: Language) -> &'static str {
    match (ranking, lang) {
        (Ranking::Highest, Language::English) => "highest",
        (Ranking::Lowest, Language::English) => "lowest",
        (Ranking::Highest, Language::Arabic) => "الأعلى",
        (Ranking::Lowest, Language::Arabic) => "الأدنى",
    }
}

fn no_data_line(lang: Language) -> &'static str {
    match lang {
        Language::Arabic => "لا توجد بيانات.",
        Language::English => "No data available.",
    }
}

fn format_loan(
    row: &Row,
    schema: &EmployeeSchema,
    name: &str,
    lang: Language,
) -> String {
    let first_value = |role: LoanRole| {
        schema
            .columns_with_loan_role(role)
            .find_map(|col| row.get(&col.name).filter(|v| !v.is_null()))
    };
    let flag = first_value(LoanRole::Flag).and_then(truthy);
    let balance = first_value(LoanRole::Balance);
    let amount = first_value(LoanRole::Amount);

    let has_loan = flag.unwrap_or_else(|| {
        balance
            .or(amount)
            .and_then(numeric)
            .is_some_and(|v| v > 0.0)
    });

    match (has_loan, balance, amount, lang) {
        (false, _, _, Language::English) => format!("{} does not have a loan.", name),
        (false, _, _, Language::Arabic) => format!("لا يوجد لدى {} أي قرض.", name),
        (true, Some(b), _, Language::English) => format!(
            "{} has a loan with a remaining balance of {}.",
            name,
            display_value(b, lang)
        ),
        (true, Some(b), _, Language::Arabic) => {
            format!("لدى {} قرض برصيد متبقٍ قدره {}.", name, display_value(b, lang))
        }
        (true, None, Some(a), Language::English) => {
            format!("{} has a loan of {}.", name, display_value(a, lang))
        }
        (true, None, Some(a), Language::Arabic) => {
            format!("لدى {} قرض بقيمة {}.", name, display_value(a, lang))
        }
        (true, None, None, Language::English) => format!("{} has a loan.", name),
        (true, None, None, Language::Arabic) => format!("لدى {} قرض.", name),
    }
}

fn format_single_record(
    row: &Row,
    columns: &[String],
    schema: &EmployeeSchema,
    lang: Language,
) -> FormattedResponse {
    let name = row_name(row, schema, lang);
    let requested: Vec<&str> = columns
        .iter()
        .map(String::as_str)
        .filter(|c| *c != schema.name_column && row.contains_key(*c))
        .collect();

    if requested.iter().any(|c| schema.loan_role(c).is_some()) {
        return FormattedResponse::new(ResponseType::Record, format_loan(row, schema, &name, lang));
    }

    let (header, fields) = if requested.is_empty() {
        let header = match lang {
            Language::Arabic => format!("إليك تفاصيل {}:", name),
            Language::English => format!("Here are the details for {}:", name),
        };
        let fields = visible_fields(row, schema)
            .into_iter()
            .filter(|(key, _)| *key != schema.name_column)
            .collect::<Vec<_>>();
        (header, fields)
    } else {
        let fields = requested
            .iter()
            .filter_map(|c| row.get(*c).map(|v| (*c, v)))
            .collect::<Vec<_>>();
        (format!("{}:", name), fields)
    };

    let mut lines = vec![header];
    for (key, value) in fields {
        lines.push(format!("- {}: {}", schema.label(key, lang), display_value(value, lang)));
    }
    FormattedResponse::new(ResponseType::Record, lines.join("\n"))
}

fn format_record_list(
    rows: &[Row],
    columns: &[String],
    schema: &EmployeeSchema,
    lang: Language,
) -> FormattedResponse {
    let count = format_integer(rows.len() as i128);
    let mut lines = vec![match lang {
        Language::Arabic => format!("لقد وجدت {} موظفًا مطابقًا:", count),
        Language::English => format!("I found {} matching employees:", count),
    }];

    let extra: Vec<&String> = columns.iter().filter(|c| **c != schema.name_column).collect();
    for (i, row) in rows.iter().enumerate() {
        let mut line = format!("{}. {}", i + 1, row_name(row, schema, lang));
        let details: Vec<String> = extra
            .iter()
            .filter_map(|c| {
                row.get(c.as_str())
                    .map(|v| format!("{}: {}", schema.label(c, lang), display_value(v, lang)))
            })
            .collect();
        if !details.is_empty() {
            line.push_str(" - ");
            line.push_str(&details.join(", "));
        }
        lines.push(line);
    }

    lines.push(String::new());
    lines.push(match lang {
        Language::Arabic => "يمكنك السؤال عن أي منهم بالاسم لمزيد من التفاصيل.".to_string(),
        Language::English => "Ask me about any of them by name for more details.".to_string(),
    });
    FormattedResponse::new(ResponseType::ListSummary, lines.join("\n"))
}

fn format_ordered_list(
    rows: &[Row],
    order_by_column: &str,
    ascending: bool,
    schema: &EmployeeSchema,
    lang: Language,
) -> FormattedResponse {
    let count = format_integer(rows.len() as i128);
    let label = schema.label(order_by_column, lang);
    let header = match (ascending, lang) {
        (false, Language::English) => format!("Top {} employees by {}:", count, label),
        (true, Language::English) => format!("Bottom {} employees by {}:", count, label),
        (false, Language::Arabic) => format!("أعلى {} موظفين حسب {}:", count, label),
        (true, Language::Arabic) => format!("أدنى {} موظفين حسب {}:", count, label),
    };

    let mut lines = vec![header];
    for (i, row) in rows.iter().enumerate() {
        lines.push(format!(
            "{}. {}: {}",
            i + 1,
            row_name(row, schema, lang),
            field(row, order_by_column, lang)
        ));
    }
    FormattedResponse::new(ResponseType::Ranking, lines.join("\n"))
}

/// `total_compensation` as returned by the store, or the sum of the
/// compensation columns present in the row.
fn total_compensation(row: &Row, schema: &EmployeeSchema, lang: Language) -> String {
    if let Some(value) = row.get("total_compensation").filter(|v| !v.is_null()) {
        return display_value(value, lang);
    }
    let parts: Vec<f64> = schema
        .columns
        .iter()
        .filter(|c| c.compensation)
        .filter_map(|c| row.get(&c.name).and_then(numeric))
        .collect();
    if parts.is_empty() {
        not_available(lang).to_string()
    } else {
        format_float(parts.iter().sum())
    }
}

fn format_top_compensation(rows: &[Row], schema: &EmployeeSchema, lang: Language) -> FormattedResponse {
    let count = format_integer(rows.len() as i128);
    let mut lines = vec![match lang {
        Language::Arabic => format!("أعلى {} موظفين من حيث إجمالي التعويضات:", count),
        Language::English => format!("Top {} employees by total compensation:", count),
    }];
    for (i, row) in rows.iter().enumerate() {
        lines.push(format!(
            "{}. {}: {}",
            i + 1,
            row_name(row, schema, lang),
            total_compensation(row, schema, lang)
        ));
    }
    FormattedResponse::new(ResponseType::Ranking, lines.join("\n"))
}

fn format_group_lines(title: String, rows: &[Row], value_key: &str, lang: Language) -> FormattedResponse {
    let mut lines = vec![underlined(title)];
    if rows.is_empty() {
        lines.push(no_data_line(lang).to_string());
    }
    for row in rows {
        lines.push(format!("- {}: {}", category(row, lang), field(row, value_key, lang)));
    }
    FormattedResponse::new(ResponseType::Analysis, lines.join("\n"))
}

fn format_counts(rows: &[Row], dimension: &str, schema: &EmployeeSchema, lang: Language) -> FormattedResponse {
    let dim = schema.label(dimension, lang);
    let title = match lang {
        Language::Arabic => format!("تحليل العدد حسب {}", dim),
        Language::English => format!("Analysis of Count by {}", dim),
    };
    format_group_lines(title, rows, "count", lang)
}

fn format_metric(
    rows: &[Row],
    metric: Metric,
    metric_column: &str,
    dimension: &str,
    schema: &EmployeeSchema,
    lang: Language,
) -> FormattedResponse {
    let metric_name = metric_label(metric, lang);
    let column = schema.label(metric_column, lang);
    let dim = schema.label(dimension, lang);
    let title = match lang {
        Language::Arabic => format!("تحليل {} {} حسب {}", metric_name, column, dim),
        Language::English => format!("Analysis of {} {} by {}", metric_name, column, dim),
    };
    format_group_lines(title, rows, "value", lang)
}

fn format_top_group(
    rows: &[Row],
    dimension: &str,
    metric: Metric,
    metric_column: &str,
    ranking: Ranking,
    schema: &EmployeeSchema,
    lang: Language,
) -> FormattedResponse {
    let Some(row) = rows.first() else {
        let message = match lang {
            Language::Arabic => "تعذر تحديد المجموعة المطلوبة لهذا الاستعلام.",
            Language::English => "Could not determine a top group for this query.",
        };
        return FormattedResponse::new(ResponseType::Analysis, message.to_string());
    };

    let dim = schema.label(dimension, lang);
    let column = schema.label(metric_column, lang);
    let metric_name = metric_label(metric, lang);
    let rank = ranking_label(ranking, lang);
    let group = category(row, lang);
    let value = field(row, "value", lang);

    let message = match lang {
        Language::Arabic => format!(
            "{} التي لديها {} {} {} هي '{}'، بقيمة {}.",
            dim, rank, metric_name, column, group, value
        ),
        Language::English => format!(
            "The {} with the {} {} {} is '{}', with a value of {}.",
            dim, rank, metric_name, column, group, value
        ),
    };
    FormattedResponse::new(ResponseType::Analysis, message)
}

/// Renders the outcome of one turn.
pub fn format_response(
    intent: &Intent,
    result: &QueryResult,
    schema: &EmployeeSchema,
    lang: Language,
) -> FormattedResponse {
    let rows = result.rows();
    if intent.kind().is_list_producing() && rows.is_empty() {
        return no_matches(lang);
    }

    match intent {
        Intent::Filter { columns, .. } => match rows {
            [row] => format_single_record(row, columns, schema, lang),
            _ => format_record_list(rows, columns, schema, lang),
        },
        Intent::OrderedList {
            order_by_column,
            ascending,
            ..
        } => format_ordered_list(rows, order_by_column, *ascending, schema, lang),
        Intent::HighestTotalCompensation { .. } => format_top_compensation(rows, schema, lang),
        Intent::TotalCount => match result {
            QueryResult::Count(total) => {
                let total = format_integer(*total as i128);
                let message = match lang {
                    Language::Arabic => format!("يوجد إجمالي {} موظف.", total),
                    Language::English => format!("There are a total of {} employees.", total),
                };
                FormattedResponse::new(ResponseType::Count, message)
            }
            _ => generic_failure(lang),
        },
        Intent::AggregateCount { dimension }
        | Intent::ConditionalAggregateCount { dimension, .. } => {
            format_counts(rows, dimension, schema, lang)
        }
        Intent::AggregateMetric {
            metric,
            metric_column,
            dimension,
        } => format_metric(rows, *metric, metric_column, dimension, schema, lang),
        Intent::FindTopGroup {
            dimension,
            metric,
            metric_column,
            ranking,
        } => format_top_group(rows, dimension, *metric, metric_column, *ranking, schema, lang),
        Intent::Unsupported { reason } => {
            let message = match (reason, lang) {
                (Some(reason), _) => reason.clone(),
                (None, Language::Arabic) => "عذرًا، لا يمكنني الإجابة على هذا النوع من الأسئلة.".to_string(),
                (None, Language::English) => "I am unable to answer that type of question.".to_string(),
            };
            FormattedResponse::new(ResponseType::Error, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{Condition, Operator};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const BOTH: [Language; 2] = [Language::English, Language::Arabic];

    fn schema() -> EmployeeSchema {
        EmployeeSchema::default()
    }

    fn rows(values: Vec<Value>) -> QueryResult {
        QueryResult::Rows(values.into_iter().map(|v| v.as_object().cloned().unwrap()).collect())
    }

    fn name_filter(columns: &[&str]) -> Intent {
        Intent::Filter {
            conditions: vec![Condition {
                column: "full_name".to_string(),
                operator: Operator::Ilike,
                value: json!("ahmed"),
            }],
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn employee() -> Value {
        json!({
            "id": 7,
            "full_name": "Ahmed Al-Kuwari",
            "rank": "Captain",
            "position": "Pilot",
            "base_salary": 18500,
            "housing_allowance": 6000.5,
            "has_loan": true,
            "remaining_loan_balance": 42000,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    #[test]
    fn every_intent_renders_non_empty_in_both_languages() {
        let s = schema();
        let list = rows(vec![employee(), json!({"full_name": "Sara", "base_salary": 9000})]);
        let groups = rows(vec![json!({"category": "Captain", "count": 12, "value": 15000.25})]);
        let cases = vec![
            (name_filter(&[]), list.clone()),
            (name_filter(&[]), rows(vec![employee()])),
            (
                Intent::OrderedList {
                    order_by_column: "base_salary".to_string(),
                    ascending: false,
                    limit: 2,
                },
                list.clone(),
            ),
            (Intent::HighestTotalCompensation { limit: 2 }, list.clone()),
            (Intent::TotalCount, QueryResult::Count(1250)),
            (Intent::AggregateCount { dimension: "rank".to_string() }, groups.clone()),
            (
                Intent::ConditionalAggregateCount {
                    dimension: "rank".to_string(),
                    conditions: vec![],
                },
                groups.clone(),
            ),
            (
                Intent::AggregateMetric {
                    metric: Metric::Avg,
                    metric_column: "base_salary".to_string(),
                    dimension: "rank".to_string(),
                },
                groups.clone(),
            ),
            (
                Intent::FindTopGroup {
                    dimension: "rank".to_string(),
                    metric: Metric::Sum,
                    metric_column: "housing_allowance".to_string(),
                    ranking: Ranking::Highest,
                },
                groups.clone(),
            ),
            (Intent::Unsupported { reason: None }, QueryResult::Nothing),
        ];

        for (intent, result) in &cases {
            for lang in BOTH {
                let formatted = format_response(intent, result, &s, lang);
                assert!(!formatted.message.trim().is_empty(), "{:?} in {}", intent, lang);
            }
        }
    }

    #[test]
    fn empty_list_results_short_circuit() {
        let s = schema();
        for intent in [
            name_filter(&["base_salary"]),
            Intent::HighestTotalCompensation { limit: 3 },
            Intent::OrderedList {
                order_by_column: "rank".to_string(),
                ascending: true,
                limit: 3,
            },
        ] {
            assert_eq!(format_response(&intent, &rows(vec![]), &s, Language::English), no_matches(Language::English));
            assert_eq!(format_response(&intent, &rows(vec![]), &s, Language::Arabic), no_matches(Language::Arabic));
        }
    }

    #[test]
    fn total_count_sentence() {
        let formatted = format_response(&Intent::TotalCount, &QueryResult::Count(1250), &schema(), Language::English);
        assert_eq!(formatted.message, "There are a total of 1,250 employees.");
        let formatted = format_response(&Intent::TotalCount, &QueryResult::Count(1250), &schema(), Language::Arabic);
        assert_eq!(formatted.message, "يوجد إجمالي 1,250 موظف.");
    }

    #[test]
    fn ordered_list_lines() {
        let intent = Intent::OrderedList {
            order_by_column: "base_salary".to_string(),
            ascending: false,
            limit: 3,
        };
        let result = rows(vec![
            json!({"full_name": "Ahmed", "base_salary": 30000}),
            json!({"full_name": "Sara", "base_salary": 25000.5}),
            json!({"full_name": "Omar", "base_salary": 21000}),
        ]);
        let formatted = format_response(&intent, &result, &schema(), Language::English);
        assert_eq!(
            formatted.message,
            "Top 3 employees by Base Salary:\n1. Ahmed: 30,000\n2. Sara: 25,000.50\n3. Omar: 21,000"
        );

        let ascending = Intent::OrderedList {
            order_by_column: "base_salary".to_string(),
            ascending: true,
            limit: 3,
        };
        let formatted = format_response(&ascending, &result, &schema(), Language::Arabic);
        assert!(formatted.message.starts_with("أدنى 3 موظفين حسب الراتب الأساسي:"));
    }

    #[test]
    fn loan_questions_get_loan_phrasing() {
        let s = schema();
        let intent = name_filter(&["remaining_loan_balance"]);

        let formatted = format_response(&intent, &rows(vec![employee()]), &s, Language::English);
        assert_eq!(formatted.message, "Ahmed Al-Kuwari has a loan with a remaining balance of 42,000.");

        let no_loan = json!({"full_name": "Sara", "has_loan": false, "remaining_loan_balance": 0});
        let formatted = format_response(&intent, &rows(vec![no_loan.clone()]), &s, Language::English);
        assert_eq!(formatted.message, "Sara does not have a loan.");
        let formatted = format_response(&intent, &rows(vec![no_loan]), &s, Language::Arabic);
        assert_eq!(formatted.message, "لا يوجد لدى Sara أي قرض.");

        let flag_only = name_filter(&["has_loan"]);
        let formatted = format_response(
            &flag_only,
            &rows(vec![json!({"full_name": "Omar", "has_loan": true})]),
            &s,
            Language::English,
        );
        assert_eq!(formatted.message, "Omar has a loan.");
    }

    #[test]
    fn loan_presence_inferred_from_balance_without_flag() {
        let intent = name_filter(&["remaining_loan_balance"]);
        let formatted = format_response(
            &intent,
            &rows(vec![json!({"full_name": "Omar", "remaining_loan_balance": "1500.75"})]),
            &schema(),
            Language::English,
        );
        assert_eq!(formatted.message, "Omar has a loan with a remaining balance of 1,500.75.");
    }

    #[test]
    fn requested_fields_are_listed() {
        let intent = name_filter(&["rank", "base_salary"]);
        let formatted = format_response(&intent, &rows(vec![employee()]), &schema(), Language::English);
        assert_eq!(formatted.message, "Ahmed Al-Kuwari:\n- Rank: Captain\n- Base Salary: 18,500");
        assert_eq!(formatted.response_type, ResponseType::Record);
    }

    #[test]
    fn full_record_hides_bookkeeping_fields() {
        let formatted = format_response(&name_filter(&[]), &rows(vec![employee()]), &schema(), Language::English);
        assert_eq!(
            formatted.message,
            "Here are the details for Ahmed Al-Kuwari:\n\
             - Rank: Captain\n\
             - Position: Pilot\n\
             - Base Salary: 18,500\n\
             - Housing Allowance: 6,000.50\n\
             - Has Loan: Yes\n\
             - Remaining Loan Balance: 42,000"
        );
        assert!(!formatted.message.contains("2024-01-01"));
    }

    #[test]
    fn multiple_rows_list_names_with_hint() {
        let result = rows(vec![
            json!({"full_name": "Ahmed", "base_salary": 18500}),
            json!({"full_name": "Sara", "base_salary": 9000}),
        ]);
        let formatted = format_response(&name_filter(&[]), &result, &schema(), Language::English);
        assert_eq!(
            formatted.message,
            "I found 2 matching employees:\n1. Ahmed\n2. Sara\n\nAsk me about any of them by name for more details."
        );

        let formatted = format_response(&name_filter(&["base_salary"]), &result, &schema(), Language::English);
        assert!(formatted.message.contains("1. Ahmed - Base Salary: 18,500"));
        assert_eq!(formatted.response_type, ResponseType::ListSummary);
    }

    #[test]
    fn aggregate_titles_and_lines() {
        let result = rows(vec![
            json!({"category": "Captain", "count": 1200}),
            json!({"category": null, "count": 3}),
        ]);
        let formatted = format_response(
            &Intent::AggregateCount { dimension: "rank".to_string() },
            &result,
            &schema(),
            Language::English,
        );
        assert_eq!(
            formatted.message,
            "Analysis of Count by Rank\n=========================\n- Captain: 1,200\n- Unspecified: 3"
        );

        let metric = rows(vec![json!({"category": "Pilot", "value": 15250.333})]);
        let formatted = format_response(
            &Intent::AggregateMetric {
                metric: Metric::Avg,
                metric_column: "base_salary".to_string(),
                dimension: "position".to_string(),
            },
            &metric,
            &schema(),
            Language::English,
        );
        assert_eq!(
            formatted.message,
            "Analysis of Average Base Salary by Position\n===========================================\n- Pilot: 15,250.33"
        );
    }

    #[test]
    fn top_group_sentence() {
        let intent = Intent::FindTopGroup {
            dimension: "rank".to_string(),
            metric: Metric::Avg,
            metric_column: "housing_allowance".to_string(),
            ranking: Ranking::Highest,
        };
        let result = rows(vec![json!({"category": "Colonel", "value": 12000})]);
        let en = format_response(&intent, &result, &schema(), Language::English);
        assert_eq!(
            en.message,
            "The Rank with the highest Average Housing Allowance is 'Colonel', with a value of 12,000."
        );
        let ar = format_response(&intent, &result, &schema(), Language::Arabic);
        assert_eq!(ar.message, "الرتبة التي لديها الأعلى متوسط بدل السكن هي 'Colonel'، بقيمة 12,000.");
    }

    #[test]
    fn top_group_arabic_falls_back_to_english_labels() {
        let intent = Intent::FindTopGroup {
            dimension: "position".to_string(),
            metric: Metric::Max,
            metric_column: "other_allowances".to_string(),
            ranking: Ranking::Lowest,
        };
        let result = rows(vec![json!({"category": "Clerk", "value": 50})]);
        let ar = format_response(&intent, &result, &schema(), Language::Arabic);
        assert!(ar.message.contains("Other Allowances"));
        assert!(ar.message.contains("الأدنى"));

        let empty = format_response(&intent, &rows(vec![]), &schema(), Language::English);
        assert_eq!(empty.message, "Could not determine a top group for this query.");
    }

    #[test]
    fn unsupported_echoes_reason() {
        let intent = Intent::Unsupported {
            reason: Some("I can only answer questions about employees.".to_string()),
        };
        let formatted = format_response(&intent, &QueryResult::Nothing, &schema(), Language::English);
        assert_eq!(formatted.message, "I can only answer questions about employees.");
        assert_eq!(formatted.response_type, ResponseType::Error);

        let fallback = format_response(&Intent::Unsupported { reason: None }, &QueryResult::Nothing, &schema(), Language::English);
        assert_eq!(fallback.message, "I am unable to answer that type of question.");
    }

    #[test]
    fn highest_total_compensation_uses_store_total_or_sums_columns() {
        let result = rows(vec![
            json!({"full_name": "Ahmed", "total_compensation": 31000}),
            json!({"full_name": "Sara", "base_salary": 20000, "housing_allowance": 5000.5}),
        ]);
        let formatted = format_response(&Intent::HighestTotalCompensation { limit: 2 }, &result, &schema(), Language::English);
        assert_eq!(
            formatted.message,
            "Top 2 employees by total compensation:\n1. Ahmed: 31,000\n2. Sara: 25,000.50"
        );
    }

    #[test]
    fn detailed_record_uses_localized_labels() {
        let row = employee().as_object().cloned().unwrap();
        let record = detailed_record(&row, &schema(), Language::Arabic);
        assert_eq!(record["الرتبة"], json!("Captain"));
        assert_eq!(record["الراتب الأساسي"], json!("18,500"));
        assert_eq!(record["لديه قرض"], json!("نعم"));
        assert!(!record.contains_key("ID"));
    }
}
