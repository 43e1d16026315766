//! Field access, identity, snapshots and actions of message records

use super::fakes::{FakeControl, FakeInput};
use super::{text_message, Harness};
use crate::message::IdentityKey;
use crate::types::{ClickType, Rect, RuntimeId};
use crate::AutomationError;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

#[test]
fn test_public_fields_hide_hash_by_default() {
    let m = text_message("hello", Rect::new(120, 10, 180, 40));
    let h = Harness::new(&[m.clone()]);
    let record = h.classify(&m);

    assert_eq!(
        record.keys(),
        vec!["id", "type", "attr", "content", "direction", "direction_distance", "hash_text"]
    );
    assert!(!record.contains("hash"));
    assert!(!record.contains("control"));
    assert!(!record.contains("parent"));
    assert_eq!(record.len(), 7);
}

#[test]
fn test_hash_field_listed_when_enabled() {
    let m = text_message("hello", Rect::new(120, 10, 180, 40));
    let mut h = Harness::new(&[m.clone()]);
    h.config.message_hash = true;
    let record = h.classify(&m);

    assert!(record.contains("hash"));
    assert_eq!(record.field("hash").unwrap(), Value::from(record.hash()));
}

#[test]
fn test_mapping_access() {
    let m = text_message("hello", Rect::new(120, 10, 180, 40));
    let h = Harness::new(&[m.clone()]);
    let record = h.classify(&m);

    assert_eq!(record.field("content").unwrap(), Value::from("hello"));
    assert_eq!(record.get("attr", Value::Null), Value::from("self"));
    assert_eq!(record.get("missing", Value::from(7)), Value::from(7));
    assert!(matches!(
        record.field("missing"),
        Err(AutomationError::FieldNotFound(key)) if key == "missing"
    ));

    let dict = record.to_dict();
    assert_eq!(dict.get("type"), Some(&Value::from("text")));
    assert_eq!(dict.len(), record.values().len());
    assert_eq!(record.items()[0].0, "id");
}

#[test]
fn test_matches_all_conditions() {
    let m = text_message("hello", Rect::new(120, 10, 180, 40));
    let h = Harness::new(&[m.clone()]);
    let record = h.classify(&m);

    assert!(record.matches(&[("attr", Value::from("self")), ("type", Value::from("text"))]));
    assert!(!record.matches(&[("attr", Value::from("friend"))]));
    assert!(!record.matches(&[("nope", Value::Null)]));
    assert!(record.matches(&[]));
}

#[test]
fn test_rendering() {
    let m = text_message("see you tomorrow", Rect::new(20, 10, 80, 40));
    let h = Harness::new(&[m.clone()]);
    let record = h.classify(&m);

    assert_eq!(record.to_string(), "see you tomorrow");
    assert_eq!(record.summary(), "<bubblescope - FriendTextMessage(see you ...)>");
}

#[test]
fn test_equal_runtime_ids_mean_equal_records() {
    let id = RuntimeId(vec![42, 9001]);
    let config = crate::ClassifierConfig::default();
    let first = FakeControl::builder(&config.class_names.text_item)
        .name("v1")
        .automation_id("msg")
        .runtime_id(Some(id.clone()))
        .rect(Rect::new(120, 10, 180, 40))
        .build();
    let rescanned = FakeControl::builder(&config.class_names.text_item)
        .name("v1 edited")
        .automation_id("msg")
        .runtime_id(Some(id))
        .rect(Rect::new(120, 10, 180, 40))
        .build();
    let h = Harness::new(&[first.clone()]);

    let a = h.classify(&first);
    let b = h.classify(&rescanned);
    assert_eq!(a, b);

    let set: HashSet<_> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_distinct_ids_are_distinct_even_with_equal_hash() {
    let a = text_message("same", Rect::new(120, 10, 180, 40));
    let b = text_message("same", Rect::new(120, 50, 180, 80));
    let h = Harness::new(&[a.clone(), b.clone()]);

    let (ra, rb) = (h.classify(&a), h.classify(&b));
    assert_eq!(ra.hash(), rb.hash());
    assert_ne!(ra, rb);
}

#[test]
fn test_hash_identity_without_runtime_ids() {
    let config = crate::ClassifierConfig::default();
    let build = |top: i32| {
        FakeControl::builder(&config.class_names.text_item)
            .name("same")
            .automation_id("msg")
            .runtime_id(None)
            .rect(Rect::new(120, top, 180, top + 30))
            .build()
    };
    let (a, b) = (build(10), build(50));
    let mut h = Harness::new(&[a.clone(), b.clone()]);

    // Hash identity off: only the same control is equal.
    let (ra, rb) = (h.classify(&a), h.classify(&b));
    assert_ne!(ra, rb);
    assert_eq!(ra, h.classify(&a));

    h.config.message_hash = true;
    let (ra, rb) = (h.classify(&a), h.classify(&b));
    assert_eq!(ra, rb);
    assert_eq!(ra.identity_key(), IdentityKey::Content(ra.hash().to_string()));
    let set: HashSet<_> = [ra, rb].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_describe_has_no_side_effects() {
    let other = text_message("other", Rect::new(20, 100, 80, 130));
    let target = text_message("target", Rect::new(120, 10, 180, 40));
    let h = Harness::new(&[target.clone(), other.clone()]);

    let before = h.classify(&other);
    let record = h.classify(&target);
    let calls_before = (
        target.node.children_calls(),
        h.container.node.children_calls(),
        h.window_control.node.children_calls(),
    );

    let snapshot = record.describe(&h.registry, &h.config.markers);

    assert_eq!(h.input.click_count(), 0);
    assert!(h.input.scrolls.borrow().is_empty());
    assert_eq!(
        (
            target.node.children_calls(),
            h.container.node.children_calls(),
            h.window_control.node.children_calls(),
        ),
        calls_before
    );

    let after = h.classify(&other);
    assert_eq!(before.attr(), after.attr());
    assert_eq!(before.message_type(), after.message_type());

    assert_eq!(snapshot.content, "target");
    assert_eq!(snapshot.chat_name.as_deref(), Some("Alice"));
    assert_eq!(snapshot.sender.as_deref(), Some("我"));
    assert_eq!(snapshot.msg_id_type, "runtime_id");
    assert_eq!(snapshot.control.control_type, "ListItem");
    assert_eq!(snapshot.control.automation_id, "msg");

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["type"], Value::from("text"));
    assert_eq!(json["attr"], Value::from("self"));
}

#[test]
fn test_friend_snapshot_sender_is_chat() {
    let m = text_message("hey", Rect::new(20, 10, 80, 40));
    let h = Harness::new(&[m.clone()]);
    let snapshot = h.classify(&m).describe(&h.registry, &h.config.markers);
    assert_eq!(snapshot.sender.as_deref(), Some("Alice"));
}

#[test]
fn test_click_anchors_by_sender() {
    let mine = text_message("mine", Rect::new(100, 200, 190, 260));
    let theirs = text_message("theirs", Rect::new(10, 300, 100, 360));
    let h = Harness::new(&[mine.clone(), theirs.clone()]);

    h.classify(&mine).click(&h.input, &h.config).unwrap();
    h.classify(&theirs).right_click(&h.input, &h.config).unwrap();
    h.classify(&theirs).double_click(&h.input, &h.config).unwrap();

    let clicks = h.input.clicks.borrow();
    assert_eq!(clicks[0], (100, 230, ClickType::Left));
    assert_eq!(clicks[1], (55, 330, ClickType::Right));
    assert_eq!(clicks[2], (99, 330, ClickType::Double));
}

#[test]
fn test_actions_on_stale_and_system_messages() {
    let m = text_message("soon gone", Rect::new(120, 10, 180, 40));
    let config = crate::ClassifierConfig::default();
    let notice = FakeControl::builder(&config.class_names.text_item)
        .name("notice")
        .rect(Rect::new(50, 50, 150, 70))
        .build();
    let h = Harness::new(&[m.clone(), notice.clone()]);

    let system = h.classify(&notice);
    assert!(matches!(
        system.click(&h.input, &h.config),
        Err(AutomationError::UnsupportedOperation(_))
    ));

    let record = h.classify(&m);
    assert!(record.exists());
    m.node.remove();
    assert!(!record.exists());
    assert!(matches!(
        record.right_click(&h.input, &h.config),
        Err(AutomationError::StaleControl(_))
    ));
    assert!(matches!(
        record.roll_into_view(&h.registry, &h.input, &h.config),
        Err(AutomationError::StaleControl(_))
    ));
    assert_eq!(h.input.click_count(), 0);
}

#[test]
fn test_roll_into_view_scrolls_until_visible() {
    let m = text_message("far below", Rect::new(120, 10, 180, 40));
    let mut h = Harness::new(&[m.clone()]);
    h.config.scroll_step = 3;

    let record = h.classify(&m);
    // Now below the 600px list; each notch moves content by 40px.
    m.node.set_rect(Rect::new(120, 700, 180, 730));
    let hook_node = Arc::clone(&m.node);
    h.input = FakeInput::with_scroll_hook(move |notches| {
        let r = hook_node.rect();
        let dy = notches * 40;
        hook_node.set_rect(Rect::new(r.left, r.top + dy, r.right, r.bottom + dy));
    });

    record.roll_into_view(&h.registry, &h.input, &h.config).unwrap();

    let scrolls = h.input.scrolls.borrow();
    assert!(!scrolls.is_empty());
    assert!(scrolls.iter().all(|&(x, y, n)| x == 100 && y == 300 && n == -3));
    assert!(crate::tests::list_rect().contains_rows_of(&m.node.rect()));
}

#[test]
fn test_roll_into_view_gives_up() {
    let m = text_message("stuck", Rect::new(120, 700, 180, 730));
    let mut h = Harness::new(&[m.clone()]);
    h.config.max_scroll_attempts = 4;

    let record = h.classify(&m);
    assert!(matches!(
        record.roll_into_view(&h.registry, &h.input, &h.config),
        Err(AutomationError::ActionFailed(_))
    ));
    assert_eq!(h.input.scrolls.borrow().len(), 4);
}

#[test]
fn test_copy_content() {
    let m = text_message("copy me", Rect::new(20, 10, 80, 40));
    let h = Harness::new(&[m.clone()]);
    let record = h.classify(&m);

    record.copy_content(&h.input).unwrap();
    assert_eq!(h.input.clipboard.borrow().as_deref(), Some("copy me"));

    m.node.remove();
    assert!(matches!(
        record.copy_content(&h.input),
        Err(AutomationError::StaleControl(_))
    ));
}

#[test]
fn test_click_control_hits_centre() {
    use crate::services::InputInjector;

    let m = text_message("centre", Rect::new(20, 10, 80, 40));
    let h = Harness::new(&[m.clone()]);
    h.input.click_control(&m.control, ClickType::Left).unwrap();
    assert_eq!(h.input.clicks.borrow()[0], (50, 25, ClickType::Left));

    m.node.set_rect(Rect::new(20, 10, 20, 10));
    assert!(h.input.click_control(&m.control, ClickType::Left).is_err());
}

#[test]
fn test_identity_key_dedup_ignores_insertion_order() {
    let config = crate::ClassifierConfig::default();
    let build = |id: Option<RuntimeId>| {
        FakeControl::builder(&config.class_names.text_item)
            .name("same")
            .automation_id("msg")
            .runtime_id(id)
            .rect(Rect::new(120, 10, 180, 40))
            .build()
    };
    let a = build(Some(RuntimeId(vec![42, 7001])));
    let b = build(Some(RuntimeId(vec![42, 7002])));
    let c = build(None);
    let mut h = Harness::new(&[a.clone(), b.clone(), c.clone()]);
    h.config.message_hash = true;
    let (ra, rb, rc) = (h.classify(&a), h.classify(&b), h.classify(&c));

    // Record equality is not transitive here: a != b, yet c equals both.
    assert_ne!(ra, rb);
    assert_eq!(rc, ra);
    assert_eq!(rc, rb);

    for order in [[&ra, &rb, &rc], [&rc, &ra, &rb], [&rb, &rc, &ra]] {
        let keys: HashSet<IdentityKey> = order.iter().map(|r| r.identity_key()).collect();
        assert_eq!(keys.len(), 1);
    }
}
