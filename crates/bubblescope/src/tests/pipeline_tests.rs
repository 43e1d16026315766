//! End-to-end classification of single controls

use super::fakes::{FakeControl, FakeDetector, FakeScreenshots};
use super::{message, text_message, Harness};
use crate::classifier::MessageType;
use crate::message::MessageKind;
use crate::types::{Attribution, Direction, Rect};
use serde_json::Value;

#[test]
fn test_geometry_beats_pixels() {
    // Centres at 150 and 50 in a 200px list: ratio +0.5 and -0.5.
    let right = text_message("on the right", Rect::new(120, 10, 180, 40));
    let left = text_message("on the left", Rect::new(20, 50, 80, 80));
    let mut h = Harness::new(&[right.clone(), left.clone()]);
    h.detector = FakeDetector::answering(Direction::Left, 3.0);

    let r = h.classify(&right);
    assert_eq!(r.direction(), Some(Direction::Right));
    assert_eq!(r.attr(), Attribution::SelfSent);
    assert_eq!(r.direction_distance(), Some(500.0));

    let l = h.classify(&left);
    assert_eq!(l.direction(), Some(Direction::Left));
    assert_eq!(l.attr(), Attribution::Friend);

    assert_eq!(h.detector.calls.get(), 0);
    assert_eq!(h.screenshots.capture_count(), 0);
}

#[test]
fn test_missing_automation_id_is_system() {
    let config = crate::ClassifierConfig::default();
    let notice = FakeControl::builder(&config.class_names.text_item)
        .name("You recalled a message")
        .rect(Rect::new(150, 10, 199, 30))
        .build();
    let mut h = Harness::new(&[notice.clone()]);
    h.detector = FakeDetector::answering(Direction::Right, 1.0);

    let record = h.classify(&notice);
    assert!(record.is_system());
    assert_eq!(record.message_type(), MessageType::Other);
    assert_eq!(record.direction(), None);
    assert_eq!(record.type_name(), "SystemMessage");
    assert_eq!(h.detector.calls.get(), 0);
}

#[test]
fn test_wrapper_uses_bubble_child() {
    let h0 = Harness::new(&[]);
    let names = h0.config.class_names.clone();

    let inner = FakeControl::builder(&names.text_item)
        .rect(Rect::new(120, 10, 190, 40))
        .build();
    let wrapper = FakeControl::builder(&names.bubble_item)
        .name("hello")
        .automation_id("msg")
        // 195px wide in a 200px list: a row wrapper, centred slightly left
        .rect(Rect::new(0, 5, 195, 45))
        .child(&inner)
        .build();
    let h = Harness::new(&[wrapper.clone()]);

    let record = h.classify(&wrapper);
    assert_eq!(record.direction(), Some(Direction::Right));
    assert!(record.is_self());
}

#[test]
fn test_wrapper_without_bubble_child_samples_neighbors() {
    let h0 = Harness::new(&[]);
    let names = h0.config.class_names.clone();

    let above = text_message("a", Rect::new(10, 0, 70, 30));
    let wrapper = FakeControl::builder(&names.bubble_item)
        .name("b")
        .automation_id("msg")
        // Own centre is right of the list centre; must not be used.
        .rect(Rect::new(5, 40, 200, 80))
        .build();
    let below = text_message("c", Rect::new(10, 90, 90, 120));
    let h = Harness::new(&[above, wrapper.clone(), below]);

    let record = h.classify(&wrapper);
    // Neighbor offsets -60 and -50 average to -55.
    assert_eq!(record.direction(), Some(Direction::Left));
    assert!(record.is_friend());
    assert!(wrapper.node.children_calls() >= 1);
}

#[test]
fn test_pixels_decide_when_geometry_is_silent() {
    let centred = text_message("mid", Rect::new(50, 10, 150, 40));
    let mut h = Harness::new(&[centred.clone()]);
    h.detector = FakeDetector::answering(Direction::Right, 12.0);

    let record = h.classify(&centred);
    assert_eq!(record.direction(), Some(Direction::Right));
    assert_eq!(record.direction_distance(), Some(12.0));

    assert_eq!(h.screenshots.capture_count(), 1);
    assert!(h.detector.saw_existing_file.get());
    for path in h.screenshots.captured.borrow().iter() {
        assert!(!path.exists(), "{} left behind", path.display());
    }
}

#[test]
fn test_screenshot_removed_when_detector_fails() {
    let centred = text_message("mid", Rect::new(50, 10, 150, 40));
    let mut h = Harness::new(&[centred.clone()]);
    h.detector = FakeDetector::failing("no foreground");

    let record = h.classify(&centred);
    // Nothing usable: the configured last resort decides.
    assert_eq!(record.direction(), Some(h.config.arbiter.last_resort_direction));
    assert_eq!(
        record.direction_distance(),
        Some(h.config.arbiter.weak_position_score)
    );

    assert_eq!(h.screenshots.capture_count(), 1);
    assert!(h.detector.saw_existing_file.get());
    assert!(!h.screenshots.captured.borrow()[0].exists());
}

#[test]
fn test_capture_failure_is_not_fatal() {
    let centred = text_message("mid", Rect::new(50, 10, 150, 40));
    let mut h = Harness::new(&[centred.clone()]);
    h.screenshots = FakeScreenshots::failing();

    let record = h.classify(&centred);
    assert!(record.is_self() || record.is_friend());
    assert_eq!(h.detector.calls.get(), 0);
}

#[test]
fn test_stale_control_still_yields_a_record() {
    let gone = text_message("bye", Rect::new(120, 10, 180, 40));
    let h = Harness::new(&[gone.clone()]);
    gone.node.remove();

    let record = h.classify(&gone);
    assert_eq!(record.message_type(), MessageType::Other);
    assert_eq!(record.content(), "");
    assert!(!record.exists());
}

#[test]
fn test_hash_depends_on_size_and_content_only() {
    let a = text_message("same", Rect::new(120, 10, 180, 40));
    let b = text_message("same", Rect::new(20, 300, 80, 330));
    let c = text_message("different", Rect::new(120, 10, 180, 40));
    let h = Harness::new(&[a.clone(), b.clone(), c.clone()]);

    let (ra, rb, rc) = (h.classify(&a), h.classify(&b), h.classify(&c));
    assert_eq!(ra.hash(), rb.hash());
    assert_ne!(ra.hash(), rc.hash());
    assert_eq!(ra.header().hash_text, "(30,60)same");
}

#[test]
fn test_quote_payload() {
    let quote = text_message("hi\n引用 Alice 的消息: hello", Rect::new(20, 10, 120, 60));
    let h = Harness::new(&[quote.clone()]);

    let record = h.classify(&quote);
    assert_eq!(record.message_type(), MessageType::Quote);
    assert_eq!(record.type_name(), "FriendQuoteMessage");
    assert_eq!(
        record.kind(),
        &MessageKind::Quote {
            text: "hi".to_string(),
            quoted_author: "Alice".to_string(),
            quoted_content: "hello".to_string(),
        }
    );
    assert_eq!(record.field("quoted_author").unwrap(), Value::from("Alice"));
}

#[test]
fn test_image_child_sets_type_and_content() {
    let h0 = Harness::new(&[]);
    let names = h0.config.class_names.clone();

    let picture = FakeControl::builder(&names.refer_item)
        .name("图片")
        .rect(Rect::new(130, 10, 190, 70))
        .build();
    let bubble = message(&names.bubble_item, "", Rect::new(120, 5, 195, 75));
    bubble.node.set_children(&[picture]);
    let h = Harness::new(&[bubble.clone()]);

    let record = h.classify(&bubble);
    assert_eq!(record.message_type(), MessageType::Image);
    assert_eq!(record.content(), "图片");
    assert_eq!(record.type_name(), "SelfImageMessage");
}

#[test]
fn test_voice_class_wins() {
    let h0 = Harness::new(&[]);
    let voice = message(&h0.config.class_names.voice_item, "3\"", Rect::new(20, 10, 90, 40));
    let h = Harness::new(&[voice.clone()]);
    let record = h.classify(&voice);
    assert_eq!(record.message_type(), MessageType::Voice);
    assert!(record.is_friend());
}
