use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lightweight reference to a user embedded in messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

impl UserRef {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender: UserRef,
    pub recipient: UserRef,
    pub subject: String,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    /// Present on replies, pointing at the thread root
    pub parent_id: Option<String>,
    #[serde(default)]
    pub replies: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub recipient_id: String,
    pub subject: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Announcement priority, drives the badge styling in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Normal,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Normal, Priority::Low];
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "High"),
            Priority::Normal => write!(f, "Normal"),
            Priority::Low => write!(f, "Low"),
        }
    }
}

/// Who an announcement goes to: everyone, or a specific recipient list.
/// On the wire: "all" or {"specific": ["usr_1", ...]}.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientScope {
    All,
    Specific(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub content: String,
    pub priority: Priority,
    pub recipients: RecipientScope,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementPayload {
    pub title: String,
    pub content: String,
    pub priority: Priority,
    pub recipients: RecipientScope,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_thread() {
        let json = r#"{
            "id": "msg_010",
            "sender": {"id": "usr_200", "firstName": "Michelle", "lastName": "Wilson"},
            "recipient": {"id": "usr_123", "firstName": "Sarah", "lastName": "Johnson"},
            "subject": "Pickup arrangements for Friday",
            "content": "Emma's grandfather will collect her at 4pm.",
            "read": false,
            "createdAt": "2025-04-09T14:32:00Z",
            "parentId": null,
            "replies": [{
                "id": "msg_011",
                "sender": {"id": "usr_123", "firstName": "Sarah", "lastName": "Johnson"},
                "recipient": {"id": "usr_200", "firstName": "Michelle", "lastName": "Wilson"},
                "subject": "Re: Pickup arrangements for Friday",
                "content": "Noted, thanks for letting us know.",
                "read": true,
                "createdAt": "2025-04-09T15:01:00Z",
                "parentId": "msg_010"
            }]
        }"#;

        let msg: Message = serde_json::from_str(json).expect("valid message JSON");
        assert!(!msg.read);
        assert_eq!(msg.sender.full_name(), "Michelle Wilson");
        assert_eq!(msg.replies.len(), 1);
        assert_eq!(msg.replies[0].parent_id.as_deref(), Some("msg_010"));
    }

    #[test]
    fn test_recipient_scope_wire_format() {
        assert_eq!(serde_json::to_string(&RecipientScope::All).unwrap(), "\"all\"");

        let specific = RecipientScope::Specific(vec!["usr_1".to_string(), "usr_2".to_string()]);
        let json = serde_json::to_string(&specific).unwrap();
        assert_eq!(json, "{\"specific\":[\"usr_1\",\"usr_2\"]}");
        assert_eq!(serde_json::from_str::<RecipientScope>(&json).unwrap(), specific);
    }

    #[test]
    fn test_unknown_priority_rejected() {
        assert!(serde_json::from_str::<Priority>("\"urgent\"").is_err());
    }
}
