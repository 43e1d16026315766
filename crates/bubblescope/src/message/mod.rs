//! Classified message records
//!
//! A [`MessageRecord`] is built fresh on every scan. It pairs a common
//! [`MessageHeader`] with a [`MessageKind`] carrying the per-type payload, and
//! keeps the originating control plus non-owning ids of its chat and window.
//!
//! Generic field access (`keys`, `get`, `to_dict`, ...) flattens the header and
//! the payload into one ordered list of JSON values. The control and the
//! chat/window links are never part of it.

mod actions;
mod describe;

pub use describe::{ControlSnapshot, MessageSnapshot};

use crate::classifier::{parse_quote, MessageType};
use crate::config::MessageMarkers;
use crate::element::Control;
use crate::registry::{ChatId, WindowId};
use crate::types::{Attribution, Direction, Rect, RuntimeId};
use crate::AutomationError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Prefix of [`MessageRecord::summary`].
pub const PROJECT_NAME: &str = "bubblescope";

/// Fields shared by every message type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageHeader {
    pub id: Option<RuntimeId>,
    pub content: String,
    pub attr: Attribution,
    pub direction: Option<Direction>,
    pub direction_distance: Option<f64>,
    /// `"({height},{width}){content}"`, the input of `hash`
    pub hash_text: String,
    pub hash: String,
}

/// Message type plus the fields only that type carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Quote {
        text: String,
        quoted_author: String,
        quoted_content: String,
    },
    Image,
    Emoji,
    Voice,
    PersonalCard,
    Link {
        title: String,
    },
    Location {
        address: String,
    },
    File {
        filename: String,
        size: Option<String>,
    },
    Video,
    Other,
}

impl MessageKind {
    /// Derive the payload of `message_type` from the extracted content.
    pub fn from_content(message_type: MessageType, content: &str, markers: &MessageMarkers) -> Self {
        match message_type {
            MessageType::Text => MessageKind::Text,
            MessageType::Quote => match parse_quote(content) {
                Some(parts) => MessageKind::Quote {
                    text: parts.text,
                    quoted_author: parts.quoted_author,
                    quoted_content: parts.quoted_content,
                },
                None => MessageKind::Text,
            },
            MessageType::Image => MessageKind::Image,
            MessageType::Emoji => MessageKind::Emoji,
            MessageType::Voice => MessageKind::Voice,
            MessageType::PersonalCard => MessageKind::PersonalCard,
            MessageType::Link => MessageKind::Link {
                title: strip_marker(content, &markers.link_prefix),
            },
            MessageType::Location => MessageKind::Location {
                address: strip_marker(content, &markers.location_prefix),
            },
            MessageType::File => {
                let rest = content.strip_prefix(&markers.file_prefix).unwrap_or(content);
                let mut lines = rest.lines().map(str::trim).filter(|l| !l.is_empty());
                MessageKind::File {
                    filename: lines.next().unwrap_or_default().to_string(),
                    size: lines.next().map(str::to_string),
                }
            }
            MessageType::Video => MessageKind::Video,
            MessageType::Other => MessageKind::Other,
        }
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            MessageKind::Text => MessageType::Text,
            MessageKind::Quote { .. } => MessageType::Quote,
            MessageKind::Image => MessageType::Image,
            MessageKind::Emoji => MessageType::Emoji,
            MessageKind::Voice => MessageType::Voice,
            MessageKind::PersonalCard => MessageType::PersonalCard,
            MessageKind::Link { .. } => MessageType::Link,
            MessageKind::Location { .. } => MessageType::Location,
            MessageKind::File { .. } => MessageType::File,
            MessageKind::Video => MessageType::Video,
            MessageKind::Other => MessageType::Other,
        }
    }

    fn payload_fields(&self) -> Vec<(&'static str, Value)> {
        match self {
            MessageKind::Quote {
                text,
                quoted_author,
                quoted_content,
            } => vec![
                ("text", Value::from(text.as_str())),
                ("quoted_author", Value::from(quoted_author.as_str())),
                ("quoted_content", Value::from(quoted_content.as_str())),
            ],
            MessageKind::Link { title } => vec![("title", Value::from(title.as_str()))],
            MessageKind::Location { address } => vec![("address", Value::from(address.as_str()))],
            MessageKind::File { filename, size } => vec![
                ("filename", Value::from(filename.as_str())),
                ("size", size.as_deref().map(Value::from).unwrap_or(Value::Null)),
            ],
            _ => Vec::new(),
        }
    }
}

fn strip_marker(content: &str, marker: &str) -> String {
    content
        .strip_prefix(marker)
        .unwrap_or(content)
        .trim()
        .to_string()
}

/// Content address of a bubble: digest of `"({height},{width}){content}"`.
///
/// Returns the composite text and its hex digest. A missing rectangle counts
/// as `0x0`.
pub fn content_hash(rect: Option<&Rect>, content: &str) -> (String, String) {
    let (height, width) = rect.map(|r| (r.height(), r.width())).unwrap_or((0, 0));
    let hash_text = format!("({height},{width}){content}");
    let hash = blake3::hash(hash_text.as_bytes()).to_hex().to_string();
    (hash_text, hash)
}

/// Key under which a record is deduplicated across scans.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    Runtime(RuntimeId),
    Content(String),
}

/// Control properties captured at classification time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ControlInfo {
    pub class_name: String,
    pub automation_id: String,
    pub name: String,
}

/// One classified chat bubble.
///
/// With `message_hash` on, `==` is not transitive: two records with
/// different ids are unequal, yet an id-less record with the same content
/// hash equals both. A `HashSet<MessageRecord>` then keeps a different
/// number of records depending on insertion order. Deduplicate by
/// [`MessageRecord::identity_key`] instead, as [`crate::NewMessageTracker`]
/// does.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    header: MessageHeader,
    kind: MessageKind,
    control: Control,
    control_info: ControlInfo,
    chat: ChatId,
    window: WindowId,
    message_hash: bool,
}

impl MessageRecord {
    pub(crate) fn new(
        header: MessageHeader,
        kind: MessageKind,
        control: Control,
        control_info: ControlInfo,
        (chat, window): (ChatId, WindowId),
        message_hash: bool,
    ) -> Self {
        Self {
            header,
            kind,
            control,
            control_info,
            chat,
            window,
            message_hash,
        }
    }

    pub fn header(&self) -> &MessageHeader {
        &self.header
    }

    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    pub fn message_type(&self) -> MessageType {
        self.kind.message_type()
    }

    pub fn id(&self) -> Option<&RuntimeId> {
        self.header.id.as_ref()
    }

    pub fn content(&self) -> &str {
        &self.header.content
    }

    pub fn attr(&self) -> Attribution {
        self.header.attr
    }

    pub fn direction(&self) -> Option<Direction> {
        self.header.direction
    }

    pub fn direction_distance(&self) -> Option<f64> {
        self.header.direction_distance
    }

    pub fn hash(&self) -> &str {
        &self.header.hash
    }

    pub fn control(&self) -> &Control {
        &self.control
    }

    pub fn chat(&self) -> ChatId {
        self.chat
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    pub fn is_self(&self) -> bool {
        self.header.attr == Attribution::SelfSent
    }

    pub fn is_friend(&self) -> bool {
        self.header.attr == Attribution::Friend
    }

    pub fn is_system(&self) -> bool {
        self.header.attr == Attribution::System
    }

    /// Public fields in order: header first, then the type's payload. `hash`
    /// is only listed when content-hash identity is enabled.
    pub fn fields(&self) -> Vec<(&'static str, Value)> {
        let h = &self.header;
        let mut fields = vec![
            (
                "id",
                h.id.as_ref()
                    .map(|id| Value::from(id.to_string()))
                    .unwrap_or(Value::Null),
            ),
            ("type", Value::from(self.message_type().as_str())),
            ("attr", Value::from(h.attr.as_str())),
            ("content", Value::from(h.content.as_str())),
            (
                "direction",
                h.direction
                    .map(|d| Value::from(d.as_str()))
                    .unwrap_or(Value::Null),
            ),
            (
                "direction_distance",
                h.direction_distance.map(Value::from).unwrap_or(Value::Null),
            ),
            ("hash_text", Value::from(h.hash_text.as_str())),
        ];
        if self.message_hash {
            fields.push(("hash", Value::from(h.hash.as_str())));
        }
        fields.extend(self.kind.payload_fields());
        fields
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.fields().into_iter().map(|(k, _)| k).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.fields().into_iter().map(|(_, v)| v).collect()
    }

    pub fn items(&self) -> Vec<(&'static str, Value)> {
        self.fields()
    }

    pub fn len(&self) -> usize {
        self.fields().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields().iter().any(|(k, _)| *k == key)
    }

    pub fn get(&self, key: &str, default: Value) -> Value {
        self.field(key).unwrap_or(default)
    }

    /// Indexed lookup; unknown keys are an error.
    pub fn field(&self, key: &str) -> Result<Value, AutomationError> {
        self.fields()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
            .ok_or_else(|| AutomationError::FieldNotFound(key.to_string()))
    }

    pub fn to_dict(&self) -> Map<String, Value> {
        self.fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    /// True when every condition names a public field holding that value.
    pub fn matches(&self, conditions: &[(&str, Value)]) -> bool {
        let dict = self.to_dict();
        conditions
            .iter()
            .all(|(key, value)| dict.get(*key) == Some(value))
    }

    /// Namespaced class tag, e.g. `SelfTextMessage` or `SystemMessage`.
    pub fn type_name(&self) -> String {
        match self.header.attr {
            Attribution::System => "SystemMessage".to_string(),
            attr => format!("{}{}", attr.tag_prefix(), self.message_type().tag()),
        }
    }

    /// Short representation, e.g. `<bubblescope - FriendTextMessage(see you...)>`.
    pub fn summary(&self) -> String {
        format!(
            "<{} - {}({})>",
            PROJECT_NAME,
            self.type_name(),
            truncate(&self.header.content, 8)
        )
    }

    /// Key for deduplication across scans: the content hash when hash
    /// identity is enabled or no runtime id is known, else the runtime id.
    pub fn identity_key(&self) -> IdentityKey {
        match (&self.header.id, self.message_hash) {
            (Some(id), false) => IdentityKey::Runtime(id.clone()),
            _ => IdentityKey::Content(self.header.hash.clone()),
        }
    }
}

fn truncate(s: &str, n: usize) -> String {
    let cleaned: String = s.replace('\n', "");
    let cleaned = cleaned.trim();
    if cleaned.chars().count() <= n {
        cleaned.to_string()
    } else {
        let head: String = cleaned.chars().take(n).collect();
        format!("{head}...")
    }
}

impl fmt::Display for MessageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.header.content.is_empty() {
            f.write_str(&self.summary())
        } else {
            f.write_str(&self.header.content)
        }
    }
}

// Runtime ids decide when both sides have one. Otherwise the content hash
// decides if hash identity is on, and control identity if it is off. A record
// with an id never equals one without an id unless hashing is on.
impl PartialEq for MessageRecord {
    fn eq(&self, other: &Self) -> bool {
        match (&self.header.id, &other.header.id) {
            (Some(a), Some(b)) => a == b,
            _ if self.message_hash && other.message_hash => self.header.hash == other.header.hash,
            (None, None) => self.control.ptr_eq(&other.control),
            _ => false,
        }
    }
}

impl Eq for MessageRecord {}

impl Hash for MessageRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // With hash identity on, an id-equal pair may differ in content and a
        // hash-equal pair may differ in id, so nothing finer is consistent.
        if self.message_hash {
            PROJECT_NAME.hash(state);
            return;
        }
        match &self.header.id {
            Some(id) => id.hash(state),
            None => self.control.ptr_addr().hash(state),
        }
    }
}
