use serde::{Deserialize, Serialize};

/// 标准API响应格式
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            count: None,
            message: None,
            error: None,
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(data)
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.message().to_string())
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn list(data: Vec<T>) -> Self {
        Self {
            count: Some(data.len()),
            ..Self::success(data)
        }
    }
}

/// Error payload; older backends send a bare string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Detail(ErrorDetail),
    Message(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn message(&self) -> &str {
        match self {
            ErrorBody::Detail(detail) => &detail.message,
            ErrorBody::Message(message) => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_response_carries_count() {
        let value = serde_json::to_value(ApiResponse::list(vec![1, 2, 3])).unwrap();
        assert_eq!(value, json!({ "success": true, "data": [1, 2, 3], "count": 3 }));
    }

    #[test]
    fn reads_both_error_shapes() {
        let legacy: ApiResponse<()> =
            serde_json::from_value(json!({ "success": false, "error": "boom" })).unwrap();
        assert_eq!(legacy.error_message().as_deref(), Some("boom"));

        let detailed: ApiResponse<()> = serde_json::from_value(json!({
            "success": false,
            "error": { "code": "NOT_FOUND", "message": "IT account not found" }
        }))
        .unwrap();
        assert_eq!(detailed.error_message().as_deref(), Some("IT account not found"));
    }
}
