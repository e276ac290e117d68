use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub reply_token: Option<String>,
    pub source: EventSource,
    #[serde(default)]
    pub message: Option<EventMessage>,
    #[serde(default)]
    pub postback: Option<Postback>,
}

impl WebhookEvent {
    /// The command text carried by the event: a text message body or postback data.
    pub fn command_text(&self) -> Option<&str> {
        match self.kind.as_str() {
            "message" => self
                .message
                .as_ref()
                .filter(|m| m.kind == "text")
                .and_then(|m| m.text.as_deref()),
            "postback" => self.postback.as_ref().map(|p| p.data.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub room_id: Option<String>,
}

impl EventSource {
    /// Group chats book on behalf of the group, not the individual sender.
    pub fn requester_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or(self.room_id.as_deref())
            .or(self.user_id.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postback {
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_group_text_event() {
        let json = r#"{
            "destination": "Uxxx",
            "events": [{
                "type": "message",
                "replyToken": "rt-1",
                "source": {"type": "group", "groupId": "C42", "userId": "U7"},
                "message": {"type": "text", "id": "m1", "text": "list"}
            }]
        }"#;
        let payload: WebhookPayload = serde_json::from_str(json).unwrap();
        let event = &payload.events[0];
        assert_eq!(event.reply_token.as_deref(), Some("rt-1"));
        assert_eq!(event.source.requester_id(), Some("C42"));
        assert_eq!(event.command_text(), Some("list"));
    }

    #[test]
    fn test_postback_and_non_text() {
        let json = r#"{"events": [
            {"type": "postback", "replyToken": "rt", "source": {"type": "user", "userId": "U1"},
             "postback": {"data": "select 1"}},
            {"type": "message", "replyToken": "rt2", "source": {"type": "user", "userId": "U1"},
             "message": {"type": "sticker", "id": "m2"}},
            {"type": "follow", "source": {"type": "user", "userId": "U1"}}
        ]}"#;
        let payload: WebhookPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.events[0].command_text(), Some("select 1"));
        assert_eq!(payload.events[0].source.requester_id(), Some("U1"));
        assert_eq!(payload.events[1].command_text(), None);
        assert_eq!(payload.events[2].command_text(), None);
    }
}
