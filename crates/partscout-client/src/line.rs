//! LINE Messaging API client used to deliver replies.

use std::time::Duration;

use partscout_core::error::AppError;
use partscout_core::traits::{ReplyHandle, ReplySender};
use reqwest::Client;
use serde::Serialize;

/// LINE accepts at most this many messages per reply or push call.
pub const MAX_MESSAGES_PER_CALL: usize = 5;

const DEFAULT_BASE_URL: &str = "https://api.line.me";

#[derive(Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: Vec<TextMessage<'a>>,
}

#[derive(Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: Vec<TextMessage<'a>>,
}

fn text_messages(blocks: &[String]) -> Vec<TextMessage<'_>> {
    blocks
        .iter()
        .map(|text| TextMessage {
            kind: "text",
            text: text.as_str(),
        })
        .collect()
}

/// Sends text blocks through the LINE reply and push endpoints.
#[derive(Clone)]
pub struct LineMessenger {
    client: Client,
    base_url: String,
    access_token: String,
}

impl LineMessenger {
    pub fn new(access_token: &str) -> Result<Self, AppError> {
        Self::with_base_url(access_token, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(access_token: &str, base_url: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        })
    }

    async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<(), AppError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::DeliveryError(format!("LINE request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::DeliveryError(format!(
                "LINE API returned HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }
        Ok(())
    }
}

impl ReplySender for LineMessenger {
    /// The first batch uses the reply token. Later batches are pushed to the
    /// user, which needs a user id; without one they are dropped.
    async fn send(&self, handle: &ReplyHandle, blocks: &[String]) -> Result<(), AppError> {
        let mut batches = blocks.chunks(MAX_MESSAGES_PER_CALL);
        let Some(first) = batches.next() else {
            return Ok(());
        };

        self.post(
            "/v2/bot/message/reply",
            &ReplyRequest {
                reply_token: &handle.reply_token,
                messages: text_messages(first),
            },
        )
        .await?;
        tracing::debug!(messages = first.len(), "Sent LINE reply");

        for batch in batches {
            let Some(user_id) = handle.user_id.as_deref() else {
                tracing::warn!(
                    dropped = blocks.len() - MAX_MESSAGES_PER_CALL,
                    "Reply exceeds one LINE call and no user id to push to"
                );
                break;
            };
            self.post(
                "/v2/bot/message/push",
                &PushRequest {
                    to: user_id,
                    messages: text_messages(batch),
                },
            )
            .await?;
            tracing::debug!(messages = batch.len(), "Pushed LINE overflow messages");
        }
        Ok(())
    }
}
