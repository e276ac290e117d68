use crate::errors::ValidationError;

pub const SELECT_USAGE: &str = "select <number> <message>";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List,
    Select { reference: usize, message: String },
    GroupId,
    Text(String),
}

impl Command {
    /// Classifies a chat message. Only a `select` with a bad reference is an error;
    /// anything unrecognised is free text.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let text = text.trim();
        let (keyword, rest) = match text.split_once(char::is_whitespace) {
            Some((k, r)) => (k, r.trim()),
            None => (text, ""),
        };

        match keyword.to_lowercase().as_str() {
            "list" if rest.is_empty() => Ok(Command::List),
            "groupid" if rest.is_empty() => Ok(Command::GroupId),
            "select" => {
                let (reference, message) = match rest.split_once(char::is_whitespace) {
                    Some((r, m)) => (r, m.trim()),
                    None => (rest, ""),
                };
                let reference = reference
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or(ValidationError::Malformed { usage: SELECT_USAGE })?;
                Ok(Command::Select {
                    reference,
                    message: message.to_string(),
                })
            }
            _ => Ok(Command::Text(text.to_string())),
        }
    }
}
