//! One conversational turn, from question to user-facing answer.

use crate::format::{self, FormattedResponse, ResponseType};
use crate::intent::{Intent, IntentError, IntentKind};
use crate::router;
use crate::store::Row;
use crate::util::lang::{detect_language, Language};
use crate::web::state::AppState;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub message: String,
    pub response_type: ResponseType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<IntentKind>,
    pub language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_list: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_results: Option<Vec<Map<String, Value>>>,
}

impl ChatReply {
    fn new(formatted: FormattedResponse, intent: Option<IntentKind>, language: Language) -> Self {
        Self {
            message: formatted.message,
            response_type: formatted.response_type,
            intent,
            language,
            summary_list: None,
            detailed_results: None,
        }
    }
}

/// Answers one question for one session. Every failure ends up as a
/// message for the user; the session memo is updated on every path.
pub async fn answer(state: &AppState, session_id: &str, query: &str, detailed: bool) -> ChatReply {
    let lang = detect_language(query);
    let schema = state.schema.as_ref();
    debug!("Session {} asked ({}): {}", session_id, lang, query);

    let context = state.sessions.context(session_id).await;
    let context_names: Vec<String> = context
        .iter()
        .filter_map(|row| row.get(&schema.name_column).and_then(Value::as_str))
        .map(str::to_string)
        .collect();

    let classification = state.llm_manager.classify(query, &context_names).await;

    let intent = match Intent::from_classification(&classification, schema) {
        Ok(intent) => intent,
        Err(e) => {
            warn!("Rejected classification {}: {}", classification, e);
            state.sessions.clear(session_id).await;
            let formatted = match e {
                IntentError::UnknownIntent(_) | IntentError::NotAnObject => format::generic_failure(lang),
                _ => format::processing_error(lang),
            };
            return ChatReply::new(formatted, None, lang);
        }
    };
    let kind = intent.kind();
    info!("Session {} intent: {}", session_id, kind);

    let plan = router::plan(&intent, schema);
    let result = match router::execute(state.store.as_ref(), plan).await {
        Ok(result) => result,
        Err(e) => {
            error!("Error executing intent '{}': {}", kind, e);
            state.sessions.clear(session_id).await;
            return ChatReply::new(format::processing_error(lang), Some(kind), lang);
        }
    };

    let formatted = format::format_response(&intent, &result, schema, lang);
    let rows = result.rows();
    state.sessions.record(session_id, Some(kind), rows).await;

    let mut reply = ChatReply::new(formatted, Some(kind), lang);
    if detailed && kind.is_list_producing() && !rows.is_empty() {
        reply.summary_list = Some(
            rows.iter()
                .map(|row| format::row_name(row, schema, lang))
                .collect(),
        );
        reply.detailed_results = Some(detailed_results(rows, state, lang));
    }
    reply
}

fn detailed_results(rows: &[Row], state: &AppState, lang: Language) -> Vec<Map<String, Value>> {
    rows.iter()
        .map(|row| format::detailed_record(row, &state.schema, lang))
        .collect()
}
