use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;

use super::{MessagingProvider, ReplyToken};

/// LINE caps a single text message at 5000 characters.
pub const MAX_TEXT_CHARS: usize = 5000;

pub struct LineMessaging {
    api_base: String,
    access_token: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: [TextMessage; 1],
}

#[derive(Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: [TextMessage; 1],
}

#[derive(Serialize)]
struct TextMessage {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

impl TextMessage {
    fn new(text: &str) -> Self {
        let total = text.chars().count();
        if total > MAX_TEXT_CHARS {
            tracing::warn!(chars = total, limit = MAX_TEXT_CHARS, "message text truncated");
        }
        Self {
            kind: "text",
            text: text.chars().take(MAX_TEXT_CHARS).collect(),
        }
    }
}

impl LineMessaging {
    pub fn new(api_base: String, access_token: String) -> Self {
        Self {
            api_base,
            access_token,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v2/bot/message/{path}", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl MessagingProvider for LineMessaging {
    async fn reply(&self, token: ReplyToken, text: &str) -> anyhow::Result<()> {
        let body = ReplyRequest {
            reply_token: token.as_str(),
            messages: [TextMessage::new(text)],
        };

        self.client
            .post(self.endpoint("reply"))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .context("failed to send LINE reply")?
            .error_for_status()
            .context("LINE API returned error")?;

        Ok(())
    }

    async fn push(&self, to: &str, text: &str) -> anyhow::Result<()> {
        let body = PushRequest {
            to,
            messages: [TextMessage::new(text)],
        };

        self.client
            .post(self.endpoint("push"))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .context("failed to send LINE push")?
            .error_for_status()
            .context("LINE API returned error")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_body_shape() {
        let body = ReplyRequest {
            reply_token: "rt-1",
            messages: [TextMessage::new("hi")],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"replyToken": "rt-1", "messages": [{"type": "text", "text": "hi"}]})
        );
    }

    #[test]
    fn test_text_is_truncated() {
        let long = "x".repeat(MAX_TEXT_CHARS + 10);
        assert_eq!(TextMessage::new(&long).text.len(), MAX_TEXT_CHARS);
    }

    #[test]
    fn test_endpoint() {
        let line = LineMessaging::new("https://api.line.me/".to_string(), "t".to_string());
        assert_eq!(line.endpoint("push"), "https://api.line.me/v2/bot/message/push");
    }
}
