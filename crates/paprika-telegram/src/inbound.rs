// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping raw Telegram updates into inbound events.
//!
//! Only the identifying fields are extracted -- update id, chat, user, and
//! the effective text (message text or callback data). Everything else rides
//! along as the raw payload for the audit trail. Updates without a sender or
//! chat cannot be processed and map to `None`.

use paprika_core::types::InboundEvent;
use teloxide::types::{Update, UpdateKind};

/// Convert a Telegram update into an [`InboundEvent`], if it carries enough
/// identity to process.
pub fn to_inbound_event(update: &Update) -> Option<InboundEvent> {
    let raw_payload = serde_json::to_value(update).unwrap_or(serde_json::Value::Null);
    let event_id = i64::from(update.id.0);

    match &update.kind {
        UpdateKind::Message(msg) => {
            let user = msg.from.as_ref()?;
            Some(InboundEvent {
                event_id,
                chat_id: msg.chat.id.0,
                user_id: user.id.0 as i64,
                text: msg.text().map(String::from),
                raw_payload,
            })
        }
        UpdateKind::CallbackQuery(query) => {
            let chat_id = query.message.as_ref().map(|m| m.chat().id.0)?;
            Some(InboundEvent {
                event_id,
                chat_id,
                user_id: query.from.id.0 as i64,
                text: query.data.clone(),
                raw_payload,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a mock update from JSON, matching the Telegram Bot API structure.
    fn message_update(update_id: i64, user_id: u64, chat_id: i64, text: &str) -> Update {
        let json = serde_json::json!({
            "update_id": update_id,
            "message": {
                "message_id": 1,
                "date": 1700000000i64,
                "chat": {
                    "id": chat_id,
                    "type": "private",
                    "first_name": "Test",
                },
                "from": {
                    "id": user_id,
                    "is_bot": false,
                    "first_name": "Test",
                },
                "text": text,
            },
        });
        // teloxide's `Update` uses `#[serde(flatten)]`, which is incompatible
        // with `serde_json::from_value`; parse from the wire form (a string),
        // exactly as the production update listener does.
        serde_json::from_str(&json.to_string()).expect("failed to deserialize mock update")
    }

    fn callback_update(update_id: i64, user_id: u64, chat_id: i64, data: &str) -> Update {
        let json = serde_json::json!({
            "update_id": update_id,
            "callback_query": {
                "id": "cq-1",
                "chat_instance": "ci-1",
                "from": {
                    "id": user_id,
                    "is_bot": false,
                    "first_name": "Test",
                },
                "data": data,
                "message": {
                    "message_id": 5,
                    "date": 1700000000i64,
                    "chat": {
                        "id": chat_id,
                        "type": "private",
                        "first_name": "Test",
                    },
                    "text": "pick a category",
                },
            },
        });
        serde_json::from_str(&json.to_string()).expect("failed to deserialize mock callback update")
    }

    #[test]
    fn message_update_maps_fields() {
        let update = message_update(42, 200, 100, "dinner ideas");
        let event = to_inbound_event(&update).unwrap();
        assert_eq!(event.event_id, 42);
        assert_eq!(event.chat_id, 100);
        assert_eq!(event.user_id, 200);
        assert_eq!(event.text.as_deref(), Some("dinner ideas"));
        assert_eq!(event.raw_payload["update_id"], 42);
    }

    #[test]
    fn callback_query_uses_data_as_text() {
        let update = callback_update(43, 200, 100, "breakfast");
        let event = to_inbound_event(&update).unwrap();
        assert_eq!(event.event_id, 43);
        assert_eq!(event.chat_id, 100);
        assert_eq!(event.user_id, 200);
        assert_eq!(event.text.as_deref(), Some("breakfast"));
    }

    #[test]
    fn message_without_sender_is_skipped() {
        let json = serde_json::json!({
            "update_id": 44,
            "message": {
                "message_id": 1,
                "date": 1700000000i64,
                "chat": {
                    "id": 100i64,
                    "type": "private",
                    "first_name": "Test",
                },
                "text": "hello",
            },
        });
        let update: Update = serde_json::from_str(&json.to_string()).unwrap();
        assert!(to_inbound_event(&update).is_none());
    }

    #[test]
    fn media_only_message_keeps_none_text() {
        let json = serde_json::json!({
            "update_id": 45,
            "message": {
                "message_id": 1,
                "date": 1700000000i64,
                "chat": {
                    "id": 100i64,
                    "type": "private",
                    "first_name": "Test",
                },
                "from": {
                    "id": 200u64,
                    "is_bot": false,
                    "first_name": "Test",
                },
                "photo": [{
                    "file_id": "f1",
                    "file_unique_id": "u1",
                    "width": 100,
                    "height": 100,
                }],
            },
        });
        let update: Update = serde_json::from_str(&json.to_string()).unwrap();
        let event = to_inbound_event(&update).unwrap();
        assert_eq!(event.text, None);
    }
}
