//! Error bodies returned by chat-completion endpoints.

use serde::Deserialize;

/// `{"error": {"message": "...", "code": ...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

/// Best available message for a failed response: the parsed error message,
/// or `status code N` when the body is empty or not in the expected shape.
pub fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|r| r.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("status code {}", status))
}

/// Pass successful responses through; read the body of failed ones and turn
/// it into an error with `map(status, message)`.
pub(crate) async fn check_response(
    response: reqwest::Response,
    map: impl FnOnce(u16, String) -> crate::Error,
) -> crate::Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status, body_len = body.len(), "Chat endpoint returned an error");
    Err(map(status, error_message(status, &body)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_error_message() {
        let body = r#"{"error":{"message":"model not found","code":"NotFound"}}"#;
        assert_eq!(error_message(404, body), "model not found");
    }

    #[test]
    fn test_falls_back_to_status() {
        assert_eq!(error_message(502, "<html>bad gateway</html>"), "status code 502");
        assert_eq!(error_message(500, r#"{"error":{"message":""}}"#), "status code 500");
    }

    #[test]
    fn test_numeric_code() {
        let parsed: ErrorResponse =
            serde_json::from_str(r#"{"error":{"message":"x","code":429}}"#).unwrap();
        assert_eq!(parsed.error.code, Some(serde_json::json!(429)));
    }
}
