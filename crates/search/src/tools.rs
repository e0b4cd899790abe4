//! Tool definitions advertised to agent harnesses

use serde::Serialize;
use serde_json::{json, Value};

pub const RETRIEVE_EXAM_QUESTIONS: &str = "retrieve_exam_questions";
pub const RETRIEVE_QUESTIONS_BY_CONCEPT: &str = "retrieve_questions_by_concept";
pub const RETRIEVE_QUESTION_BY_ID: &str = "retrieve_question_by_id";

/// Largest `top_k` a caller may request
pub const MAX_TOP_K: u64 = 50;

/// One callable tool: name, description and JSON schema of its arguments
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

pub fn tool_definitions(default_top_k: usize) -> Vec<ToolDefinition> {
    let top_k = json!({
        "type": "integer",
        "minimum": 1,
        "maximum": MAX_TOP_K,
        "default": default_top_k,
        "description": "Maximum number of questions to return"
    });

    vec![
        ToolDefinition {
            name: RETRIEVE_EXAM_QUESTIONS,
            description: "Find exam questions relevant to a free-text query.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "What to search for" },
                    "top_k": top_k
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: RETRIEVE_QUESTIONS_BY_CONCEPT,
            description: "Find exam questions tagged with a concept. Falls back to the closest \
                          matches when no question carries the tag.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "concept": { "type": "string", "description": "Concept name, matched case-insensitively" },
                    "top_k": top_k
                },
                "required": ["concept"]
            }),
        },
        ToolDefinition {
            name: RETRIEVE_QUESTION_BY_ID,
            description: "Fetch one exam question by id (for example q_001). Best effort: \
                          returns null when the question is not among the top search hits for its id.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "question_id": { "type": "string", "description": "Question id such as q_001" }
                },
                "required": ["question_id"]
            }),
        },
    ]
}
