//! Windows and chat surfaces known to the caller
//!
//! Message records never own the window or chat they came from. They carry a
//! [`WindowId`] / [`ChatId`] into a [`WindowRegistry`] that the caller owns,
//! so there is no parent/child reference cycle.

use crate::config::{MessageMarkers, UiClassNames};
use crate::element::Control;
use crate::services::ControlSource;
use crate::AutomationError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, info};

/// Index of a window entry in a [`WindowRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub usize);

/// Index of a chat surface in a [`WindowRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(pub usize);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chat#{}", self.0)
    }
}

/// A top-level messenger window.
#[derive(Debug, Clone)]
pub struct WindowEntry {
    pub control: Control,
    /// Window title at registration; for chat sub-windows this is the chat name
    pub nickname: String,
}

/// One open conversation: its window and the scrollable message list.
#[derive(Debug, Clone)]
pub struct ChatEntry {
    pub window: WindowId,
    pub container: Control,
    /// Name of the conversation partner as typed by the caller, if known
    pub who: Option<String>,
}

/// Maximum depth searched below a window for the message list.
const MESSAGE_LIST_SEARCH_DEPTH: usize = 12;

#[derive(Debug, Default)]
pub struct WindowRegistry {
    windows: Vec<WindowEntry>,
    chats: Vec<ChatEntry>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a window control; its current name becomes the nickname.
    pub fn add_window(&mut self, control: Control) -> WindowId {
        let nickname = control.name().unwrap_or_else(|e| {
            debug!("Window title unavailable: {}", e);
            String::new()
        });
        self.windows.push(WindowEntry { control, nickname });
        WindowId(self.windows.len() - 1)
    }

    /// Register every top-level messenger window the source can see.
    pub fn discover(
        &mut self,
        source: &dyn ControlSource,
        class_names: &UiClassNames,
    ) -> Result<Vec<WindowId>, AutomationError> {
        let found = source.find_windows(&class_names.window, None)?;
        info!("Discovered {} messenger window(s)", found.len());
        Ok(found
            .into_iter()
            .map(|control| self.add_window(control))
            .collect())
    }

    /// Register a chat surface with an already located message list.
    pub fn add_chat(
        &mut self,
        window: WindowId,
        container: Control,
        who: Option<String>,
    ) -> Result<ChatId, AutomationError> {
        if self.window(window).is_none() {
            return Err(AutomationError::InvalidArgument(format!(
                "unknown {window}"
            )));
        }
        self.chats.push(ChatEntry {
            window,
            container,
            who,
        });
        Ok(ChatId(self.chats.len() - 1))
    }

    /// Locate the message list below `window` and register it as a chat.
    pub fn open_chat(
        &mut self,
        window: WindowId,
        class_names: &UiClassNames,
        who: Option<String>,
    ) -> Result<ChatId, AutomationError> {
        let entry = self
            .window(window)
            .ok_or_else(|| AutomationError::InvalidArgument(format!("unknown {window}")))?;
        let container = find_descendant(
            &entry.control,
            &class_names.message_list,
            MESSAGE_LIST_SEARCH_DEPTH,
        )?
        .ok_or_else(|| {
            AutomationError::ElementNotFound(format!(
                "no '{}' below {}",
                class_names.message_list, window
            ))
        })?;
        self.add_chat(window, container, who)
    }

    pub fn window(&self, id: WindowId) -> Option<&WindowEntry> {
        self.windows.get(id.0)
    }

    pub fn chat(&self, id: ChatId) -> Option<&ChatEntry> {
        self.chats.get(id.0)
    }

    pub fn windows(&self) -> impl Iterator<Item = (WindowId, &WindowEntry)> {
        self.windows
            .iter()
            .enumerate()
            .map(|(i, entry)| (WindowId(i), entry))
    }

    pub fn chats_of(&self, window: WindowId) -> impl Iterator<Item = (ChatId, &ChatEntry)> {
        self.chats
            .iter()
            .enumerate()
            .filter(move |(_, entry)| entry.window == window)
            .map(|(i, entry)| (ChatId(i), entry))
    }

    /// Best-effort chat name: the window nickname, then the chat's `who`
    /// unless it is an input placeholder. Reads only cached values.
    pub fn chat_name(&self, chat: ChatId, markers: &MessageMarkers) -> Option<String> {
        let entry = self.chat(chat)?;
        let nickname = self
            .window(entry.window)
            .map(|w| w.nickname.trim())
            .filter(|n| !n.is_empty());
        if let Some(nickname) = nickname {
            return Some(nickname.to_string());
        }
        entry
            .who
            .as_deref()
            .map(str::trim)
            .filter(|who| !who.is_empty() && !markers.ignored_chat_names.iter().any(|i| i == who))
            .map(str::to_string)
    }
}

/// Breadth-first search for the first descendant with `class_name`.
pub fn find_descendant(
    root: &Control,
    class_name: &str,
    max_depth: usize,
) -> Result<Option<Control>, AutomationError> {
    let mut queue = VecDeque::from([(root.clone(), 0usize)]);
    while let Some((control, depth)) = queue.pop_front() {
        if depth > 0 && control.class_name().ok().as_deref() == Some(class_name) {
            return Ok(Some(control));
        }
        if depth >= max_depth {
            continue;
        }
        let children = match control.children() {
            Ok(children) => children,
            Err(e) if depth == 0 => return Err(e),
            Err(e) => {
                debug!("Skipping subtree at depth {}: {}", depth, e);
                continue;
            }
        };
        queue.extend(children.into_iter().map(|child| (child, depth + 1)));
    }
    Ok(None)
}
