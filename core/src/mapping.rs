//! Projection of backend documents into `TodoItem`.
//!
//! Lenient by construction: a missing or mistyped field is replaced by a
//! default instead of rejecting the document.
//!
//! | field         | source        | default            |
//! |---------------|---------------|--------------------|
//! | `id`          | `$id`         | empty string       |
//! | `title`       | `title`       | empty string       |
//! | `is_completed`| `isCompleted` | `false`            |
//! | `created_at`  | `$createdAt`  | now (at call time) |

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::types::TodoItem;

pub fn document_to_todo(doc: &Value) -> TodoItem {
    document_to_todo_at(doc, Utc::now())
}

/// Same as [`document_to_todo`] with an explicit "now".
pub fn document_to_todo_at(doc: &Value, now: DateTime<Utc>) -> TodoItem {
    let id = doc.get("$id").and_then(Value::as_str).unwrap_or_default().to_string();

    let title = match doc.get("title").and_then(Value::as_str) {
        Some(title) => title.to_string(),
        None => {
            debug!(document = %id, "document has no string title, defaulting to empty");
            String::new()
        }
    };

    let is_completed = match doc.get("isCompleted").and_then(Value::as_bool) {
        Some(flag) => flag,
        None => {
            debug!(document = %id, "document has no boolean isCompleted, defaulting to false");
            false
        }
    };

    let created_at = match doc.get("$createdAt").and_then(Value::as_str) {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(e) => {
                debug!(document = %id, error = %e, "unparsable $createdAt, defaulting to now");
                now
            }
        },
        None => {
            debug!(document = %id, "document has no $createdAt, defaulting to now");
            now
        }
    };

    TodoItem {
        id,
        title,
        is_completed,
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    use super::*;

    #[test]
    fn maps_a_complete_document() {
        let doc = json!({
            "$id": "doc-1",
            "$createdAt": "2024-03-01T10:15:00.000+00:00",
            "title": "Buy milk",
            "isCompleted": true
        });
        let todo = document_to_todo(&doc);
        assert_eq!(todo.id, "doc-1");
        assert_eq!(todo.title, "Buy milk");
        assert!(todo.is_completed);
        assert_eq!(todo.created_at, Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap());
    }

    #[test]
    fn missing_is_completed_defaults_to_false() {
        let doc = json!({"$id": "a", "title": "t", "$createdAt": "2024-03-01T10:15:00Z"});
        assert!(!document_to_todo(&doc).is_completed);
    }

    #[test]
    fn mistyped_is_completed_defaults_to_false() {
        let doc = json!({"$id": "a", "title": "t", "isCompleted": "yes"});
        assert!(!document_to_todo(&doc).is_completed);
    }

    #[test]
    fn missing_title_defaults_to_empty() {
        let doc = json!({"$id": "a", "isCompleted": false});
        assert_eq!(document_to_todo(&doc).title, "");
    }

    #[test]
    fn missing_created_at_defaults_to_now() {
        let doc = json!({"$id": "a", "title": "t"});
        let before = Utc::now();
        let todo = document_to_todo(&doc);
        let after = Utc::now();
        assert!(todo.created_at >= before - Duration::seconds(1));
        assert!(todo.created_at <= after + Duration::seconds(1));
    }

    #[test]
    fn unparsable_created_at_uses_supplied_now() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let doc = json!({"$id": "a", "$createdAt": "yesterday"});
        assert_eq!(document_to_todo_at(&doc, now).created_at, now);
    }

    #[test]
    fn id_is_copied_verbatim() {
        let doc = json!({"$id": "  Odd/Id  "});
        assert_eq!(document_to_todo(&doc).id, "  Odd/Id  ");
    }
}
