use crate::intent::{INTENT_GRAMMAR, Operator};
use crate::schema::{ColumnKind, EmployeeSchema};

/// Upper bound on names echoed back to the model as conversation context.
pub const MAX_CONTEXT_NAMES: usize = 50;

fn kind_name(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Text => "text",
        ColumnKind::Number => "number",
        ColumnKind::Date => "date",
        ColumnKind::Boolean => "boolean",
    }
}

/// Builds the system prompt from the intent grammar and the employee schema.
pub fn build_system_prompt(schema: &EmployeeSchema) -> String {
    let mut prompt = String::from(
        r#"### Instructions:
You classify questions about employees, written in Arabic or English, into exactly one intent
and extract its parameters. Respond with a single JSON object and nothing else.

Adhere to these rules:
- **Use only the column names listed below**, spelled exactly as shown.
- Names of people, ranks and positions are matched with the "ilike" operator.
- "Highest paid" means ordering by base_salary descending unless total compensation is asked for.
- If the question refers to people from the previous answer ("he", "she", "they", "هو", "هم"),
  use the names in the conversation context to build the conditions.
- If the question cannot be answered from the employee table, use the "unsupported" intent
  and give a short reason in the language of the question.

"#,
    );

    prompt.push_str("### Intents:\n");
    for grammar in INTENT_GRAMMAR {
        prompt.push_str(&format!(
            "- {}: {}\n  {}\n",
            grammar.kind.as_str(),
            grammar.description,
            grammar.shape
        ));
    }

    let operators = Operator::ALL
        .iter()
        .map(|op| op.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    prompt.push_str(&format!("\n### Supported operators: {}\n", operators));
    prompt.push_str("### Supported metrics: sum, avg, min, max\n\n");

    prompt.push_str(&format!(
        "### Columns of table {} (schema version {}):\n",
        schema.table, schema.version
    ));
    for column in schema.visible_columns() {
        let mut line = format!("- {} ({})", column.name, kind_name(column.kind));
        if column.compensation {
            line.push_str(" [part of total compensation]");
        }
        if column.loan.is_some() {
            line.push_str(" [loan]");
        }
        prompt.push_str(&line);
        prompt.push('\n');
    }

    prompt
}

/// The user turn: the question plus the names returned by the previous answer.
pub fn build_user_prompt(query: &str, context_names: &[String]) -> String {
    let mut prompt = format!("Query: {}", query.trim());
    if !context_names.is_empty() {
        let shown = &context_names[..context_names.len().min(MAX_CONTEXT_NAMES)];
        prompt.push_str("\n\nConversation context - employees in the previous answer: ");
        prompt.push_str(&shown.join(", "));
    }
    prompt
}
