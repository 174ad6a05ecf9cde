use crate::error::ErrorCategory;

fn openai_error_type(cat: ErrorCategory) -> &'static str {
    match cat {
        ErrorCategory::InvalidRequest => "invalid_request_error",
        ErrorCategory::Relay => "relay_error",
        ErrorCategory::ServerError => "server_error",
    }
}

#[must_use]
pub(crate) fn openai_error_payload(
    cat: ErrorCategory,
    message: &str,
    details: Option<&str>,
) -> serde_json::Value {
    let mut error = serde_json::json!({
        "message": message,
        "type": openai_error_type(cat),
    });
    if let (Some(details), Some(object)) = (details, error.as_object_mut()) {
        object.insert(
            "details".to_string(),
            serde_json::Value::String(details.to_string()),
        );
    }
    serde_json::json!({ "error": error })
}
