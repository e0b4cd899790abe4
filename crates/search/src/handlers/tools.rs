//! Tool handlers
//!
//! One POST endpoint per retrieval tool. "No results" is never an error:
//! searches return an empty list and id lookups return `null`. Bodies that
//! fail to parse are answered with the same 400 envelope as invalid values.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use question_rag_common::{
    errors::{AppError, Result},
    Document,
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::tools::{tool_definitions, ToolDefinition};
use crate::AppState;

/// Arguments of `retrieve_exam_questions`
#[derive(Debug, Deserialize, Validate)]
pub struct QuestionSearchRequest {
    #[validate(length(min = 1, max = 1000))]
    pub query: String,

    #[validate(range(min = 1, max = 50))]
    pub top_k: Option<usize>,
}

/// Arguments of `retrieve_questions_by_concept`
#[derive(Debug, Deserialize, Validate)]
pub struct ConceptSearchRequest {
    #[validate(length(min = 1, max = 200))]
    pub concept: String,

    #[validate(range(min = 1, max = 50))]
    pub top_k: Option<usize>,
}

/// Arguments of `retrieve_question_by_id`
#[derive(Debug, Deserialize, Validate)]
pub struct QuestionLookupRequest {
    #[validate(length(min = 1, max = 100))]
    pub question_id: String,
}

fn validation_error(e: validator::ValidationErrors) -> AppError {
    let field = e.field_errors().keys().next().map(|k| k.to_string());
    AppError::Validation {
        message: e.to_string(),
        field,
    }
}

/// Reject values that are empty once trimmed
fn require_text(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation {
            message: format!("{} must not be blank", field),
            field: Some(field.to_string()),
        });
    }
    Ok(())
}

/// List the tools this service exposes
pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolDefinition>> {
    Json(tool_definitions(state.default_top_k))
}

/// `retrieve_exam_questions`
pub async fn retrieve_exam_questions(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QuestionSearchRequest>, JsonRejection>,
) -> Result<Json<Vec<Document>>> {
    let Json(request) = payload?;
    request.validate().map_err(validation_error)?;
    require_text(&request.query, "query")?;

    let top_k = request.top_k.unwrap_or(state.default_top_k);
    let docs = state.retriever.search(&request.query, top_k).await?;

    info!(top_k, results = docs.len(), "Exam questions retrieved");
    Ok(Json(docs))
}

/// `retrieve_questions_by_concept`
pub async fn retrieve_questions_by_concept(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ConceptSearchRequest>, JsonRejection>,
) -> Result<Json<Vec<Document>>> {
    let Json(request) = payload?;
    request.validate().map_err(validation_error)?;
    require_text(&request.concept, "concept")?;

    let top_k = request.top_k.unwrap_or(state.default_top_k);
    let docs = state
        .retriever
        .search_by_concept(&request.concept, top_k)
        .await?;

    info!(concept = %request.concept, top_k, results = docs.len(), "Questions by concept retrieved");
    Ok(Json(docs))
}

/// `retrieve_question_by_id`
pub async fn retrieve_question_by_id(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QuestionLookupRequest>, JsonRejection>,
) -> Result<Json<Option<Document>>> {
    let Json(request) = payload?;
    request.validate().map_err(validation_error)?;
    require_text(&request.question_id, "question_id")?;

    let doc = state.retriever.get_by_id(&request.question_id).await?;

    info!(question_id = %request.question_id, found = doc.is_some(), "Question lookup");
    Ok(Json(doc))
}
