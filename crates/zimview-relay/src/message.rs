//! Relay messages

use serde::{Deserialize, Serialize};
use zimview_archive::Resource;

use crate::RelayError;

/// One message on the relay channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RelayMessage {
    /// Request for the content behind a title
    AskForContent { title: String },

    /// Answer to a request; empty content means "not available"
    GiveContent {
        title: String,
        #[serde(default)]
        content: Vec<u8>,
        #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
}

impl RelayMessage {
    pub fn ask(title: &str) -> Self {
        RelayMessage::AskForContent { title: title.to_string() }
    }

    pub fn give(title: &str, resource: Resource) -> Self {
        RelayMessage::GiveContent {
            title: title.to_string(),
            content: resource.content,
            mime_type: Some(resource.mime_type),
        }
    }

    /// Failure answer for `title`
    pub fn empty(title: &str) -> Self {
        RelayMessage::GiveContent {
            title: title.to_string(),
            content: Vec::new(),
            mime_type: None,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            RelayMessage::AskForContent { title } | RelayMessage::GiveContent { title, .. } => title,
        }
    }

    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn encode(&self) -> Result<String, RelayError> {
        Ok(serde_json::to_string(self)?)
    }
}
