//! Structured output for week generation: the tool schema and reply parsing

use serde::Deserialize;
use tracing::debug;

use super::GenerationError;
use crate::llm::{CompletionResponse, ToolDefinition};

/// Name of the tool the model is forced to call
pub const SUBMIT_TOOL: &str = "submit_week_plan";

/// One entry of the model's plan array
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    /// 0 for the week start, 1 for the next day, ...
    pub day_offset: i64,
    pub theme: String,
    pub description: String,
    #[serde(default)]
    pub pillar: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlanPayload {
    plans: Vec<PlanEntry>,
}

/// Tool definition carrying the plan schema
pub fn submit_tool() -> ToolDefinition {
    ToolDefinition::new(
        SUBMIT_TOOL,
        "Submit the 7-day content plan. Provide one entry per day of the week.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "plans": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "dayOffset": {
                                "type": "integer",
                                "description": "0 for the start date, 1 for the next day, etc."
                            },
                            "theme": {
                                "type": "string",
                                "description": "Short, punchy title for the content."
                            },
                            "description": {
                                "type": "string",
                                "description": "A 1-sentence summary."
                            },
                            "pillar": {
                                "type": "string",
                                "description": "The exact name of the Content Pillar assigned to this day."
                            }
                        },
                        "required": ["dayOffset", "theme", "description"]
                    }
                }
            },
            "required": ["plans"]
        }),
    )
}

/// Pull the plan entries out of a completion
///
/// The forced tool call is preferred. Providers that answer in prose get
/// their text parsed as JSON, with a fenced block tolerated.
pub fn parse_plans(response: &CompletionResponse) -> Result<Vec<PlanEntry>, GenerationError> {
    if let Some(call) = response.tool_call(SUBMIT_TOOL) {
        debug!(id = %call.id, "parse_plans: using tool call input");
        let payload: PlanPayload =
            serde_json::from_value(call.input.clone()).map_err(|e| GenerationError::Malformed(e.to_string()))?;
        return Ok(payload.plans);
    }

    let text = response.content.as_deref().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(GenerationError::Empty);
    }

    debug!(len = text.len(), "parse_plans: falling back to text content");
    let payload: PlanPayload =
        serde_json::from_str(extract_json(text)).map_err(|e| GenerationError::Malformed(e.to_string()))?;
    Ok(payload.plans)
}

/// Strip a ```json fence, or narrow to the outermost braces
fn extract_json(text: &str) -> &str {
    if let Some(rest) = text.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        let body = rest.trim_end().strip_suffix("```").unwrap_or(rest);
        return body.trim();
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}
