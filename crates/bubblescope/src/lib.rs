//! Sender and content-type classification of chat bubbles
//!
//! Reads the accessibility tree of a desktop messenger and turns each bubble
//! control of an open conversation into a [`MessageRecord`]: who sent it
//! (self, friend or system), what kind of content it holds, and a stable
//! content identity. Geometry against the message list decides the sender
//! first; a screenshot-based pixel detector only steps in when geometry
//! cannot.
//!
//! Everything runs synchronously on the calling thread. Platform access goes
//! through the capability traits in [`services`]; the Windows backend lives in
//! [`platforms`].

use tracing::{debug, instrument};

pub mod arbiter;
pub mod chat;
pub mod classifier;
pub mod config;
pub mod element;
pub mod errors;
pub mod message;
pub mod platforms;
pub mod position;
pub mod registry;
pub mod screenshot;
pub mod services;
#[cfg(test)]
mod tests;
pub mod types;
pub mod visual;

pub use arbiter::{DirectionArbiter, Resolution};
pub use chat::{ChatView, NewMessageTracker};
pub use classifier::{classify, MessageType, RuleContext};
pub use config::ClassifierConfig;
pub use element::{Control, ControlImpl, ControlView};
pub use errors::AutomationError;
pub use message::{IdentityKey, MessageHeader, MessageKind, MessageRecord, MessageSnapshot};
pub use position::PositionAnalyzer;
pub use registry::{ChatId, WindowId, WindowRegistry};
pub use screenshot::CapturedImage;
pub use services::{
    ClipboardService, ControlSource, InputInjector, PixelDirectionDetector, ScreenshotService,
    Services,
};
pub use types::{Attribution, ClickType, Direction, DirectionSignal, Rect, RuntimeId, VisualSignal};
pub use visual::EdgeScanDetector;

/// Classify one message control of `container`.
///
/// Never fails: unreadable properties degrade to empty values, an
/// undecidable type to [`MessageType::Other`], and the sender always resolves
/// to self, friend or system.
#[instrument(level = "debug", skip_all, fields(chat = %chat, window = %window))]
pub fn classify_message(
    control: &Control,
    container: &Control,
    chat: ChatId,
    window: WindowId,
    services: &Services<'_>,
    config: &ClassifierConfig,
) -> MessageRecord {
    classify_with_siblings(control, container, None, (chat, window), services, config)
}

/// Like [`classify_message`], for callers that already enumerated the
/// container's children. The neighbor fallback reuses `siblings` instead of
/// reading the list again.
#[instrument(level = "debug", skip_all, fields(chat = %chat, window = %window, siblings = siblings.len()))]
pub fn classify_message_among(
    control: &Control,
    container: &Control,
    siblings: &[Control],
    chat: ChatId,
    window: WindowId,
    services: &Services<'_>,
    config: &ClassifierConfig,
) -> MessageRecord {
    classify_with_siblings(control, container, Some(siblings), (chat, window), services, config)
}

fn classify_with_siblings(
    control: &Control,
    container: &Control,
    siblings: Option<&[Control]>,
    (chat, window): (ChatId, WindowId),
    services: &Services<'_>,
    config: &ClassifierConfig,
) -> MessageRecord {
    let view = ControlView::capture(control, &config.class_names);

    let arbiter = DirectionArbiter::new(config, services.screenshots, services.detector);
    let resolution = arbiter.resolve(control, container, siblings, &view);

    let ctx = RuleContext::from(config);
    let message_type = if resolution.attr == Attribution::System {
        MessageType::Other
    } else {
        classify(&view, &ctx)
    };
    let content = classifier::extract_content(&view, &ctx);
    let (hash_text, hash) = message::content_hash(view.rect.as_ref(), &content);

    let id = match control.runtime_id() {
        Ok(id) if !id.0.is_empty() => Some(id),
        Ok(_) => None,
        Err(e) => {
            debug!("Runtime id unavailable: {}", e);
            None
        }
    };

    let kind = MessageKind::from_content(message_type, &content, &config.markers);
    let header = MessageHeader {
        id,
        content,
        attr: resolution.attr,
        direction: resolution.direction,
        direction_distance: resolution.distance,
        hash_text,
        hash,
    };
    let info = message::ControlInfo {
        class_name: view.class_name,
        automation_id: view.automation_id,
        name: view.name,
    };

    let record = MessageRecord::new(
        header,
        kind,
        control.clone(),
        info,
        (chat, window),
        config.message_hash,
    );
    debug!("Classified {}", record.summary());
    record
}
