use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::deserialize_timestamp;

/// Text-generation backends the server can route a request to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum AiModel {
    #[default]
    Deepseek,
    Zhipu,
    Qwen,
    Kimi,
}

impl AiModel {
    pub const ALL: [AiModel; 4] = [AiModel::Deepseek, AiModel::Zhipu, AiModel::Qwen, AiModel::Kimi];

    pub fn as_str(&self) -> &'static str {
        match self {
            AiModel::Deepseek => "deepseek",
            AiModel::Zhipu => "zhipu",
            AiModel::Qwen => "qwen",
            AiModel::Kimi => "kimi",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AiModel::Deepseek => "DeepSeek (recommended)",
            AiModel::Zhipu => "Zhipu AI",
            AiModel::Qwen => "Qwen",
            AiModel::Kimi => "Kimi",
        }
    }
}

impl FromStr for AiModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| format!("Unknown model '{}'", s))
    }
}

/// Body of `POST /api/comment/generate`
#[derive(Debug, Clone, Serialize)]
pub struct GenerateCommentRequest {
    pub student_name: String,
    pub student_info: String,
    pub ai_model: AiModel,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GenerateCommentResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub comment: Option<String>,
    pub comment_id: Option<i64>,
}

/// A stored comment as returned by the history endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommentRecord {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub student_name: String,
    #[serde(default)]
    pub student_info: String,
    pub generated_comment: String,
    #[serde(default)]
    pub ai_model: Option<String>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CommentHistoryResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeleteCommentResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_model_from_str() {
        assert_eq!("deepseek".parse::<AiModel>(), Ok(AiModel::Deepseek));
        assert_eq!(" Kimi ".parse::<AiModel>(), Ok(AiModel::Kimi));
        assert!("gpt".parse::<AiModel>().is_err());
        assert_eq!(AiModel::default(), AiModel::Deepseek);
    }

    #[test]
    fn test_generate_request_serializes_model_lowercase() {
        let body = serde_json::to_value(GenerateCommentRequest {
            student_name: "Li Lei".to_string(),
            student_info: "diligent".to_string(),
            ai_model: AiModel::Qwen,
        })
        .unwrap();
        assert_eq!(body["ai_model"], "qwen");
    }

    #[test]
    fn test_parse_history_response() {
        let json = r#"{"success": true, "comments": [
            {"id": 3, "user_id": 7, "student_name": "Li Lei", "student_info": "diligent",
             "generated_comment": "Keeps up the good work.", "ai_model": "deepseek",
             "created_at": "2024-09-01 08:30:15"},
            {"id": 2, "student_name": "Han Meimei", "generated_comment": "Bright.",
             "created_at": "not a date"}
        ]}"#;
        let resp: CommentHistoryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.comments.len(), 2);
        assert!(resp.comments[0].created_at.is_some());
        assert_eq!(resp.comments[1].created_at, None);
        assert_eq!(resp.comments[1].ai_model, None);
    }
}
