use thiserror::Error;

use crate::inspection::domain::analysis_result::AnalysisResult;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("response is not JSON: {0}")]
    NotJson(#[source] serde_json::Error),
    #[error("response JSON is not an object")]
    NotAnObject,
    #[error("response does not match the report schema: {0}")]
    Schema(#[source] serde_json::Error),
}

/// Decodes a provider's text answer into an [`AnalysisResult`].
///
/// Surrounding whitespace and one enclosing Markdown code fence are
/// ignored. Anything else that is not a JSON object fails.
pub fn parse_response(text: &str) -> Result<AnalysisResult, ParseError> {
    let body = strip_code_fence(text.trim());
    let value: serde_json::Value = serde_json::from_str(body).map_err(ParseError::NotJson)?;
    if !value.is_object() {
        return Err(ParseError::NotAnObject);
    }
    serde_json::from_value(value).map_err(ParseError::Schema)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(inner) = text
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return text;
    };
    // Drop the info string ("json") on the opening fence line.
    match inner.find('\n') {
        Some(newline) => inner[newline + 1..].trim(),
        None => inner.trim(),
    }
}
