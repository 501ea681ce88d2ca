//! 对话 DTO
//!
//! 定义对话请求和响应数据结构。

use serde::{Deserialize, Serialize};

/// 对话请求
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct TalkRequest {
    /// 用户输入
    pub input: String,
    /// 用户标识
    pub userid: String,
    /// bot 标识
    pub botid: String,
}

/// 对话响应
#[derive(Debug, Serialize, Deserialize)]
pub struct TalkResponse {
    /// 回复文本（可能为空串：无匹配分类）
    pub reply: String,
    /// 用户标识
    pub userid: String,
    /// bot 标识
    pub botid: String,
    /// 本次响应耗时（毫秒）
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_talk_request_defaults_for_missing_fields() {
        let request: TalkRequest = serde_json::from_str(r#"{"input":"hi"}"#).unwrap();
        assert_eq!(request.input, "hi");
        assert!(request.userid.is_empty());
    }

    #[test]
    fn test_talk_response_roundtrip() {
        let response = TalkResponse {
            reply: "Hi there!".into(),
            userid: "alice".into(),
            botid: "demo".into(),
            elapsed_ms: 3,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"reply\":\"Hi there!\""));
    }
}
