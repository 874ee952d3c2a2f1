use agentloom::channels::errors::{ErrorEvent, LadderError};
use agentloom::channels::{Channel, ErrorsChannel, ExtrasChannel, MessagesChannel};
use agentloom::message::Message;
use agentloom::types::ChannelType;
use rustc_hash::FxHashMap;
use serde_json::json;

#[test]
fn messages_channel_reports_type_and_len() {
    let channel = MessagesChannel::new(vec![Message::user("hi")], 1);
    assert_eq!(channel.get_channel_type(), ChannelType::Message);
    assert_eq!(channel.len(), 1);
    assert!(!channel.is_empty());
    assert!(channel.persistent());
}

#[test]
fn messages_channel_get_mut_appends_without_touching_version() {
    let mut channel = MessagesChannel::new(vec![], 1);
    channel.get_mut().push(Message::assistant("reply"));
    channel.get_mut().push(Message::tool("output"));

    assert_eq!(channel.len(), 2);
    assert_eq!(channel.version(), 1);
}

#[test]
fn extras_channel_snapshot_deep_copies() {
    let mut map = FxHashMap::default();
    map.insert("theme".to_string(), json!("dark"));
    let mut channel = ExtrasChannel::new(map, 1);

    let snapshot = channel.snapshot();
    channel.get_mut().insert("language".to_string(), json!("ja"));

    assert_eq!(snapshot.len(), 1);
    assert_eq!(channel.len(), 2);
}

#[test]
fn errors_channel_holds_structured_events() {
    let mut channel = ErrorsChannel::new(vec![], 1);
    channel.get_mut().push(ErrorEvent::node(
        "Custom:chat",
        2,
        LadderError::msg("completion failed"),
    ));

    assert_eq!(channel.get_channel_type(), ChannelType::Error);
    assert_eq!(channel.len(), 1);
    assert_eq!(channel.snapshot()[0].error.message, "completion failed");
}

#[test]
fn set_version_overwrites_counter() {
    let mut channel = MessagesChannel::new(vec![], 1);
    channel.set_version(7);
    assert_eq!(channel.version(), 7);
}
