use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::models::UserId;
use crate::services::{CollaboratorError, ConversationId, ConversationService, Notification, NotificationService};

fn build_client(timeout: Duration) -> Result<Client, CollaboratorError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, CollaboratorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(CollaboratorError::UnexpectedStatus {
        status: status.as_u16(),
        body,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OpenConversation {
    user_a: UserId,
    user_b: UserId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConversationCreated {
    conversation_id: ConversationId,
}

/// Chat service client
///
/// `POST {base_url}/conversations` with both user ids; the service returns the
/// existing conversation when the pair already has one.
pub struct HttpConversationClient {
    base_url: String,
    client: Client,
}

impl HttpConversationClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CollaboratorError> {
        Ok(Self {
            base_url: base_url.into(),
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl ConversationService for HttpConversationClient {
    async fn open_or_reuse(&self, a: UserId, b: UserId) -> Result<ConversationId, CollaboratorError> {
        let url = format!("{}/conversations", self.base_url.trim_end_matches('/'));

        tracing::debug!("Opening conversation between {} and {}", a, b);

        let response = self
            .client
            .post(&url)
            .json(&OpenConversation { user_a: a, user_b: b })
            .send()
            .await?;

        let json: Value = ensure_success(response).await?.json().await?;

        // Some deployments wrap the payload in a `data` envelope
        let data = json.get("data").unwrap_or(&json);

        serde_json::from_value::<ConversationCreated>(data.clone())
            .map(|created| created.conversation_id)
            .map_err(|e| CollaboratorError::InvalidResponse(format!("Failed to parse conversation: {}", e)))
    }
}

/// Notification service client: `POST {base_url}/notifications`.
pub struct HttpNotificationClient {
    base_url: String,
    client: Client,
}

impl HttpNotificationClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CollaboratorError> {
        Ok(Self {
            base_url: base_url.into(),
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl NotificationService for HttpNotificationClient {
    async fn notify(&self, notification: &Notification) -> Result<(), CollaboratorError> {
        let url = format!("{}/notifications", self.base_url.trim_end_matches('/'));

        let response = self.client.post(&url).json(notification).send().await?;
        ensure_success(response).await?;

        tracing::debug!(
            event_id = %notification.event_id,
            recipient_id = notification.recipient_id,
            "Notification delivered"
        );
        Ok(())
    }
}

/// Fallback used when no notification service is configured.
#[derive(Debug, Default, Clone)]
pub struct LoggingNotifier;

#[async_trait]
impl NotificationService for LoggingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), CollaboratorError> {
        tracing::info!(
            event_id = %notification.event_id,
            recipient_id = notification.recipient_id,
            kind = ?notification.kind,
            "{}",
            notification.message
        );
        Ok(())
    }
}

/// Fallback used when no chat service is configured.
///
/// Hands out a stable id per unordered pair so repeated opens reuse it.
#[derive(Debug, Default, Clone)]
pub struct LoggingConversations;

#[async_trait]
impl ConversationService for LoggingConversations {
    async fn open_or_reuse(&self, a: UserId, b: UserId) -> Result<ConversationId, CollaboratorError> {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let id = low.wrapping_mul(1_000_003).wrapping_add(high);
        tracing::info!("Conversation {} between {} and {}", id, a, b);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::NotificationKind;

    #[tokio::test]
    async fn test_open_conversation() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/conversations")
            .match_body(mockito::Matcher::Json(serde_json::json!({"userA": 1, "userB": 2})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"conversationId": 77}"#)
            .create_async()
            .await;

        let client = HttpConversationClient::new(server.url(), Duration::from_secs(5)).unwrap();
        assert_eq!(client.open_or_reuse(1, 2).await.unwrap(), 77);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_conversation_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/conversations")
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let client = HttpConversationClient::new(server.url(), Duration::from_secs(5)).unwrap();
        let err = client.open_or_reuse(1, 2).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::UnexpectedStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_notify_posts_event() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/notifications")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "recipientId": 2,
                "kind": "LIKE_CANCELED",
                "senderId": 1
            })))
            .with_status(202)
            .create_async()
            .await;

        let client = HttpNotificationClient::new(format!("{}/", server.url()), Duration::from_secs(5)).unwrap();
        let notification = Notification::new(2, NotificationKind::LikeCanceled, "cancelled".into(), 1, "Kim");
        client.notify(&notification).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_logging_conversations_are_symmetric() {
        let conversations = LoggingConversations;
        assert_eq!(
            conversations.open_or_reuse(3, 9).await.unwrap(),
            conversations.open_or_reuse(9, 3).await.unwrap()
        );
    }
}
