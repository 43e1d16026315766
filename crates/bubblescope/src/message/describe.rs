use super::MessageRecord;
use crate::classifier::MessageType;
use crate::config::MessageMarkers;
use crate::registry::WindowRegistry;
use crate::types::{Attribution, Direction};
use serde::Serialize;
use tracing::debug;

/// Control properties included in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlSnapshot {
    pub class_name: String,
    pub automation_id: String,
    pub control_type: String,
    /// First 100 characters of the accessible name
    pub name: String,
}

/// Diagnostic view of a message, e.g. for logs or an agent transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageSnapshot {
    pub msg_id: String,
    /// `hash`, `runtime_id` or `unknown`
    pub msg_id_type: &'static str,
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub attr: Attribution,
    pub direction: Option<Direction>,
    pub direction_distance: Option<f64>,
    pub chat_name: Option<String>,
    pub sender: Option<String>,
    pub control: ControlSnapshot,
    pub receive_time: String,
}

impl MessageRecord {
    /// Assemble a [`MessageSnapshot`].
    ///
    /// Only values cached at classification time, the registry, and plain
    /// property reads of the message control are used. No children are
    /// enumerated and no input is sent: probing sub-controls of a bubble can
    /// activate them.
    pub fn describe(&self, registry: &WindowRegistry, markers: &MessageMarkers) -> MessageSnapshot {
        let (msg_id, msg_id_type) = match (&self.header.id, self.message_hash) {
            (Some(id), false) => (id.to_string(), "runtime_id"),
            _ if !self.header.hash.is_empty() => (self.header.hash.clone(), "hash"),
            _ => (String::new(), "unknown"),
        };

        let chat_name = registry.chat_name(self.chat, markers);
        let sender = match self.header.attr {
            Attribution::SelfSent => Some(markers.self_sender_name.clone()),
            // Group membership is unknown without opening the chat info panel,
            // so friend messages are attributed to the chat itself.
            Attribution::Friend => chat_name.clone(),
            Attribution::System => None,
        };

        let control_type = self.control.control_type().unwrap_or_else(|e| {
            debug!("Control type unavailable for snapshot: {}", e);
            String::new()
        });

        MessageSnapshot {
            msg_id,
            msg_id_type,
            content: self.header.content.clone(),
            message_type: self.message_type(),
            attr: self.header.attr,
            direction: self.header.direction,
            direction_distance: self.header.direction_distance,
            chat_name,
            sender,
            control: ControlSnapshot {
                class_name: self.control_info.class_name.clone(),
                automation_id: self.control_info.automation_id.clone(),
                control_type,
                name: self.control_info.name.chars().take(100).collect(),
            },
            receive_time: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}
