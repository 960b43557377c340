//! Push-channel frame definitions.
//!
//! Frames are JSON objects tagged by a `type` discriminator.

use serde::{Deserialize, Serialize};

use crate::models::RemoteNotification;

/// WebSocket close code for a normal, intentional closure.
pub const CLOSE_NORMAL: u16 = 1000;

/// Query parameter carrying the credential on the push endpoint.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Frames sent by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// A newly created notification for the connected user.
    Notification {
        #[serde(alias = "data")]
        notification: RemoteNotification,
    },
    /// Informational unread counter maintained by the backend.
    UnreadCount {
        #[serde(alias = "unread_count")]
        count: u64,
    },
    /// Any frame type this client does not understand.
    #[serde(other)]
    Unknown,
}

/// Frames sent by the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    MarkRead { notification_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_notification_frame() {
        let json = r#"{"type": "notification", "notification": {"id": "n1", "title": "Hi"}}"#;
        let frame: ServerFrame = serde_json::from_str(json).unwrap();
        match frame {
            ServerFrame::Notification { notification } => {
                assert_eq!(notification.id.as_deref(), Some("n1"));
                assert_eq!(notification.title, "Hi");
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_parse_notification_frame_with_data_key() {
        let json = r#"{"type": "notification", "data": {"id": 12, "title": "Hi"}}"#;
        let frame: ServerFrame = serde_json::from_str(json).unwrap();
        assert!(matches!(frame, ServerFrame::Notification { .. }));
    }

    #[test]
    fn test_parse_unread_count() {
        let frame: ServerFrame =
            serde_json::from_str(r#"{"type": "unread_count", "count": 4}"#).unwrap();
        assert_eq!(frame, ServerFrame::UnreadCount { count: 4 });
    }

    #[test]
    fn test_unknown_type_is_tolerated() {
        let frame: ServerFrame =
            serde_json::from_str(r#"{"type": "presence", "user": "x"}"#).unwrap();
        assert_eq!(frame, ServerFrame::Unknown);
    }

    #[test]
    fn test_missing_type_is_an_error() {
        assert!(serde_json::from_str::<ServerFrame>(r#"{"count": 1}"#).is_err());
    }

    #[test]
    fn test_mark_read_wire_shape() {
        let frame = ClientFrame::MarkRead {
            notification_id: "n1".to_string(),
        };
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "mark_read", "notification_id": "n1"})
        );
    }
}
