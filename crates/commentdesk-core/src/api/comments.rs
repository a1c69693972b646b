//! Comment-generation endpoints.
//!
//! These are plain pass-through calls; authorization is handled by the
//! `ApiClient` pipeline.

use super::{ApiClient, ApiError};
use crate::models::{
    CommentHistoryResponse, DeleteCommentResponse, GenerateCommentRequest,
    GenerateCommentResponse, UserInfoResponse,
};

const USER_INFO_PATH: &str = "/api/user/info";
const GENERATE_COMMENT_PATH: &str = "/api/comment/generate";
const COMMENT_HISTORY_PATH: &str = "/api/comment/history";

/// Number of history entries requested when the caller does not say
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

fn comment_path(id: i64) -> String {
    format!("/api/comment/{}", id)
}

impl ApiClient {
    /// Fetch the profile of the logged-in user
    pub async fn user_info(&self) -> Result<UserInfoResponse, ApiError> {
        self.get(USER_INFO_PATH, &[]).await
    }

    pub async fn generate_comment(
        &self,
        request: &GenerateCommentRequest,
    ) -> Result<GenerateCommentResponse, ApiError> {
        self.post(GENERATE_COMMENT_PATH, request).await
    }

    /// Most recent comments first
    pub async fn comment_history(&self, limit: Option<u32>) -> Result<CommentHistoryResponse, ApiError> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        self.get(COMMENT_HISTORY_PATH, &[("limit", limit.to_string())])
            .await
    }

    pub async fn delete_comment(&self, id: i64) -> Result<DeleteCommentResponse, ApiError> {
        self.delete(&comment_path(id)).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::Method;
    use serde_json::json;

    use super::*;
    use crate::models::AiModel;
    use crate::test_support::{session_store, FakeTransport, RecordingNavigator};

    fn client() -> (ApiClient, Arc<FakeTransport>) {
        let transport = Arc::new(FakeTransport::new());
        let session = session_store();
        session.set("T1", 7, "alice").unwrap();
        let client = ApiClient::new(transport.clone(), session, Arc::new(RecordingNavigator::new()));
        (client, transport)
    }

    #[tokio::test]
    async fn test_generate_comment() {
        let (client, transport) = client();
        transport.push_json(
            200,
            json!({"success": true, "comment": "Works hard.", "comment_id": 12}),
        );

        let resp = client
            .generate_comment(&GenerateCommentRequest {
                student_name: "Li Lei".to_string(),
                student_info: "diligent, quiet".to_string(),
                ai_model: AiModel::Kimi,
            })
            .await
            .unwrap();

        assert_eq!(resp.comment.as_deref(), Some("Works hard."));
        assert_eq!(resp.comment_id, Some(12));

        let requests = transport.requests();
        let request = &requests[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, GENERATE_COMMENT_PATH);
        assert_eq!(request.body.as_ref().unwrap()["ai_model"], "kimi");
        assert_eq!(request.authorization(), Some("Bearer T1"));
    }

    #[tokio::test]
    async fn test_comment_history_default_limit() {
        let (client, transport) = client();
        transport.push_json(200, json!({"success": true, "comments": []}));

        let resp = client.comment_history(None).await.unwrap();
        assert!(resp.comments.is_empty());
        assert_eq!(
            transport.requests()[0].query,
            vec![("limit".to_string(), "50".to_string())]
        );
    }

    #[tokio::test]
    async fn test_delete_comment_not_found() {
        let (client, transport) = client();
        transport.push_json(404, json!({"success": false, "message": "Comment not found"}));

        let err = client.delete_comment(99).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(err.server_message().as_deref(), Some("Comment not found"));

        let requests = transport.requests();
        let request = &requests[0];
        assert_eq!(request.method, Method::DELETE);
        assert_eq!(request.path, "/api/comment/99");
    }

    #[tokio::test]
    async fn test_user_info() {
        let (client, transport) = client();
        transport.push_json(
            200,
            json!({"success": true, "user": {"id": 7, "username": "alice", "email": "a@example.com",
                   "created_at": "2024-09-01 08:30:15"}}),
        );

        let resp = client.user_info().await.unwrap();
        let user = resp.user.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email.as_deref(), Some("a@example.com"));
    }
}
