pub mod line;

use async_trait::async_trait;

/// One-time handle binding a reply to the inbound event that carried it.
/// Sending consumes the token, so a second reply to the same event does not compile.
#[derive(Debug, PartialEq, Eq)]
pub struct ReplyToken(String);

impl ReplyToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
pub trait MessagingProvider: Send + Sync {
    async fn reply(&self, token: ReplyToken, text: &str) -> anyhow::Result<()>;

    async fn push(&self, to: &str, text: &str) -> anyhow::Result<()>;
}
