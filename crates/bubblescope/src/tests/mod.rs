//! Scenario tests over fake accessibility trees

mod message_tests;
mod pipeline_tests;

use crate::config::ClassifierConfig;
use crate::message::MessageRecord;
use crate::registry::{ChatId, WindowId, WindowRegistry};
use crate::services::Services;
use crate::types::{Direction, Rect};
use crate::classify_message;
use fakes::{FakeControl, FakeDetector, FakeInput, FakeScreenshots};

/// The message list used by most scenarios: 200px wide.
pub(crate) fn list_rect() -> Rect {
    Rect::new(0, 0, 200, 600)
}

/// A message control with an automation id, i.e. a human message.
pub(crate) fn message(class_name: &str, name: &str, rect: Rect) -> FakeControl {
    FakeControl::builder(class_name)
        .name(name)
        .automation_id("msg")
        .rect(rect)
        .build()
}

pub(crate) fn text_message(name: &str, rect: Rect) -> FakeControl {
    message(&ClassifierConfig::default().class_names.text_item, name, rect)
}

/// A window with one chat whose message list holds `messages`.
pub(crate) struct Harness {
    pub config: ClassifierConfig,
    pub screenshots: FakeScreenshots,
    pub detector: FakeDetector,
    pub input: FakeInput,
    pub registry: WindowRegistry,
    pub window: WindowId,
    pub chat: ChatId,
    pub window_control: FakeControl,
    pub container: FakeControl,
}

impl Harness {
    pub fn new(messages: &[FakeControl]) -> Self {
        let config = ClassifierConfig::default();
        let mut container = FakeControl::builder(&config.class_names.message_list)
            .rect(list_rect());
        for m in messages {
            container = container.child(m);
        }
        let container = container.build();

        let chat_page = FakeControl::builder(&config.class_names.chat_page)
            .child(&container)
            .build();
        let window_control = FakeControl::builder(&config.class_names.window)
            .name("Alice")
            .child(&chat_page)
            .build();

        let mut registry = WindowRegistry::new();
        let window = registry.add_window(window_control.control.clone());
        let chat = registry
            .add_chat(window, container.control.clone(), None)
            .unwrap();

        Self {
            config,
            screenshots: FakeScreenshots::new(),
            detector: FakeDetector::answering(Direction::Left, 500.0),
            input: FakeInput::new(),
            registry,
            window,
            chat,
            window_control,
            container,
        }
    }

    pub fn services(&self) -> Services<'_> {
        Services {
            screenshots: &self.screenshots,
            detector: &self.detector,
            input: &self.input,
        }
    }

    pub fn classify(&self, message: &FakeControl) -> MessageRecord {
        classify_message(
            &message.control,
            &self.container.control,
            self.chat,
            self.window,
            &self.services(),
            &self.config,
        )
    }
}
