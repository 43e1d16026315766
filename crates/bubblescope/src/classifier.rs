//! Message type classification
//!
//! An ordered list of pure rules over a [`ControlView`], first match wins.
//! The host application reuses generic bubble classes for many kinds of
//! content, so class names are backed up by child inspection and by
//! accessible-name heuristics. The last rule always answers, which makes the
//! cascade total.

use crate::config::{ClassifierConfig, MessageMarkers, UiClassNames};
use crate::element::ControlView;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content kind of a chat bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    Quote,
    Image,
    Emoji,
    Voice,
    PersonalCard,
    Link,
    Location,
    File,
    Video,
    Other,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Quote => "quote",
            MessageType::Image => "image",
            MessageType::Emoji => "emoji",
            MessageType::Voice => "voice",
            MessageType::PersonalCard => "personal_card",
            MessageType::Link => "link",
            MessageType::Location => "location",
            MessageType::File => "file",
            MessageType::Video => "video",
            MessageType::Other => "other",
        }
    }

    /// Un-namespaced tag, e.g. `TextMessage`.
    pub fn tag(&self) -> &'static str {
        match self {
            MessageType::Text => "TextMessage",
            MessageType::Quote => "QuoteMessage",
            MessageType::Image => "ImageMessage",
            MessageType::Emoji => "EmojiMessage",
            MessageType::Voice => "VoiceMessage",
            MessageType::PersonalCard => "PersonalCardMessage",
            MessageType::Link => "LinkMessage",
            MessageType::Location => "LocationMessage",
            MessageType::File => "FileMessage",
            MessageType::Video => "VideoMessage",
            MessageType::Other => "OtherMessage",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a rule may look at besides the control projection.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub class_names: &'a UiClassNames,
    pub markers: &'a MessageMarkers,
}

impl<'a> From<&'a ClassifierConfig> for RuleContext<'a> {
    fn from(config: &'a ClassifierConfig) -> Self {
        Self {
            class_names: &config.class_names,
            markers: &config.markers,
        }
    }
}

/// One step of the cascade.
pub type Rule = fn(&ControlView, &RuleContext<'_>) -> Option<MessageType>;

/// The cascade in evaluation order.
pub const CASCADE: &[Rule] = &[
    by_class_name,
    by_bubble_structure,
    by_refer_item,
    by_text_item,
];

/// Classify a control projection. Never fails: unmatched input is `Other`.
pub fn classify(view: &ControlView, ctx: &RuleContext<'_>) -> MessageType {
    CASCADE
        .iter()
        .find_map(|rule| rule(view, ctx))
        .unwrap_or(MessageType::Other)
}

/// Classes that identify their content kind on their own.
pub fn type_for_class(class_name: &str, class_names: &UiClassNames) -> Option<MessageType> {
    if class_name == class_names.voice_item {
        Some(MessageType::Voice)
    } else if class_name == class_names.personal_card_item {
        Some(MessageType::PersonalCard)
    } else {
        None
    }
}

/// Exact-name rules for images and emoji.
pub fn type_for_name(name: &str, markers: &MessageMarkers) -> Option<MessageType> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    if name == markers.image_name {
        Some(MessageType::Image)
    } else if name == markers.animated_emoji_name || name.contains(&markers.emoji_marker) {
        Some(MessageType::Emoji)
    } else {
        None
    }
}

/// Prefix rules for links, locations, files and videos.
pub fn type_for_name_prefix(name: &str, markers: &MessageMarkers) -> Option<MessageType> {
    if name.starts_with(&markers.link_prefix) {
        Some(MessageType::Link)
    } else if name.starts_with(&markers.location_prefix) {
        Some(MessageType::Location)
    } else if name.starts_with(&markers.file_prefix) {
        Some(MessageType::File)
    } else if name.starts_with(&markers.video_prefix) {
        Some(MessageType::Video)
    } else {
        None
    }
}

static QUOTE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(.*?)\s*\n引用\s+(.+?)\s+的消息\s*:\s*(.*)$")
        .expect("quote pattern is a valid regex")
});

/// Parts of a quote bubble: the new text, the quoted author and the quoted body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteParts {
    pub text: String,
    pub quoted_author: String,
    pub quoted_content: String,
}

/// Split a text bubble of the form `<text>\n引用 <author> 的消息: <body>`.
pub fn parse_quote(name: &str) -> Option<QuoteParts> {
    let captures = QUOTE_PATTERN.captures(name)?;
    Some(QuoteParts {
        text: captures.get(1)?.as_str().to_string(),
        quoted_author: captures.get(2)?.as_str().to_string(),
        quoted_content: captures.get(3)?.as_str().to_string(),
    })
}

pub fn is_quote(name: &str) -> bool {
    QUOTE_PATTERN.is_match(name)
}

/// Step 1: unambiguous class names.
fn by_class_name(view: &ControlView, ctx: &RuleContext<'_>) -> Option<MessageType> {
    type_for_class(&view.class_name, ctx.class_names)
}

/// Step 2a: generic bubble containers. The informative part often sits in a
/// child; the parent stays the message control either way.
fn by_bubble_structure(view: &ControlView, ctx: &RuleContext<'_>) -> Option<MessageType> {
    if view.class_name != ctx.class_names.bubble_item {
        return None;
    }
    Some(
        type_from_children(view, ctx)
            .or_else(|| type_for_name_prefix(&view.name, ctx.markers))
            .or_else(|| type_for_name(&view.name, ctx.markers))
            .unwrap_or(MessageType::Other),
    )
}

/// Step 2b: standalone refer items (stickers and similar attachments).
fn by_refer_item(view: &ControlView, ctx: &RuleContext<'_>) -> Option<MessageType> {
    if view.class_name != ctx.class_names.refer_item {
        return None;
    }
    Some(type_for_name(&view.name, ctx.markers).unwrap_or(MessageType::Other))
}

/// Step 2c: plain text items, possibly quoting another message.
fn by_text_item(view: &ControlView, ctx: &RuleContext<'_>) -> Option<MessageType> {
    if view.class_name != ctx.class_names.text_item {
        return None;
    }
    if is_quote(&view.name) {
        Some(MessageType::Quote)
    } else {
        Some(MessageType::Text)
    }
}

fn type_from_children(view: &ControlView, ctx: &RuleContext<'_>) -> Option<MessageType> {
    view.children.iter().find_map(|child| {
        let by_name = if child.class_name == ctx.class_names.refer_item {
            type_for_name(&child.name, ctx.markers)
        } else {
            None
        };
        by_name.or_else(|| type_for_class(&child.class_name, ctx.class_names))
    })
}

/// Display text of a message. Image children win over animated emoji
/// children; otherwise the control's own name is used.
pub fn extract_content(view: &ControlView, ctx: &RuleContext<'_>) -> String {
    let mut content: Option<&str> = None;
    for child in &view.children {
        if child.class_name != ctx.class_names.refer_item {
            continue;
        }
        if child.name == ctx.markers.image_name {
            return child.name.clone();
        }
        if child.name == ctx.markers.animated_emoji_name {
            content = Some(&child.name);
        }
    }
    content.unwrap_or(&view.name).to_string()
}
