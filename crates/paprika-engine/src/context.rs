// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded conversation context: the rolling message window and the
//! size-capped structured summary.
//!
//! The window is an explicit fixed-capacity ordered buffer with FIFO
//! eviction, not an unbounded list with ad hoc truncation. The summary cap
//! is enforced here; compacting an over-budget summary is an external
//! collaborator concern.

use std::collections::VecDeque;

use paprika_core::types::MessageFragment;
use paprika_storage::database::now_timestamp;

/// Fixed-capacity FIFO window over recent message fragments.
#[derive(Debug)]
pub struct MessageWindow {
    capacity: usize,
    fragments: VecDeque<MessageFragment>,
}

impl MessageWindow {
    /// Wrap existing fragments, evicting from the front if they already
    /// exceed `capacity`.
    pub fn from_fragments(capacity: usize, fragments: Vec<MessageFragment>) -> Self {
        let mut window = Self {
            capacity: capacity.max(1),
            fragments: fragments.into(),
        };
        window.evict();
        window
    }

    /// Append one user/assistant exchange, evicting the oldest fragments
    /// beyond capacity. The assistant fragment is truncated to
    /// `fragment_max_bytes` for storage.
    pub fn push_exchange(&mut self, user_text: &str, reply_text: &str, fragment_max_bytes: usize) {
        let ts = now_timestamp();
        self.fragments.push_back(MessageFragment {
            role: "user".to_string(),
            content: truncate_utf8(user_text, fragment_max_bytes),
            ts: ts.clone(),
        });
        self.fragments.push_back(MessageFragment {
            role: "assistant".to_string(),
            content: truncate_utf8(reply_text, fragment_max_bytes),
            ts,
        });
        self.evict();
    }

    fn evict(&mut self) {
        while self.fragments.len() > self.capacity {
            self.fragments.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn into_fragments(self) -> Vec<MessageFragment> {
        self.fragments.into()
    }
}

/// Merge `delta`'s keys into `summary`, subject to a serialized-size cap.
///
/// Returns `false` (summary unchanged) when the merge would exceed
/// `max_bytes`; the caller decides whether to request compaction. A `Null`
/// delta is a no-op; a null value inside the delta removes that key.
pub fn merge_summary(
    summary: &mut serde_json::Value,
    delta: &serde_json::Value,
    max_bytes: usize,
) -> bool {
    let delta_map = match delta {
        serde_json::Value::Null => return true,
        serde_json::Value::Object(map) if map.is_empty() => return true,
        serde_json::Value::Object(map) => map,
        _ => return false,
    };

    let mut merged = match summary {
        serde_json::Value::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    };
    for (key, value) in delta_map {
        if value.is_null() {
            merged.remove(key);
        } else {
            merged.insert(key.clone(), value.clone());
        }
    }

    let candidate = serde_json::Value::Object(merged);
    if candidate.to_string().len() > max_bytes {
        return false;
    }
    *summary = candidate;
    true
}

/// Truncate to a byte budget without splitting a UTF-8 code point.
pub fn truncate_utf8(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}
